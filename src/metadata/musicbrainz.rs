//! MusicBrainz disc-ID lookup.
//!
//! One GET per session: the disc fingerprint goes in as a `toc` query
//! parameter and comes back as a list of candidate releases. We only
//! deserialize the fields the resolver needs.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Include-flags: artist credits, recordings, release groups, genres, and
/// the recording-level artist relations that carry composer attribution.
const INC_FLAGS: &str =
    "artist-credits+recordings+release-groups+genres+recording-level-rels+artist-rels";

/// A candidate release for the disc. Read-only once fetched.
#[derive(Debug, Clone)]
pub struct ReleaseCandidate {
    pub artist: String,
    pub title: String,
    pub year: String,
    pub mbid: String,
    pub track_titles: Vec<String>,
    /// One entry per track: the first composer relation on the recording,
    /// or `None`.
    pub composers: Vec<Option<String>>,
    pub genres: Vec<String>,
    pub has_cover_art: bool,
}

/// Build the lookup URL for a disc fingerprint.
pub fn lookup_url(fingerprint: &str) -> String {
    format!("https://musicbrainz.org/ws/2/discid/-?toc={fingerprint}&fmt=json&inc={INC_FLAGS}")
}

/// Query MusicBrainz for releases matching a disc fingerprint.
///
/// When `scratch` is given, the raw response body is dumped there for
/// later inspection; the dump lives and dies with the session.
pub fn lookup(
    fingerprint: &str,
    timeout: Duration,
    scratch: Option<&Path>,
) -> Result<Vec<ReleaseCandidate>> {
    let url = lookup_url(fingerprint);
    log::debug!("Querying {url}");

    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .new_agent();

    let body = agent
        .get(&url)
        .header("User-Agent", crate::USER_AGENT)
        .call()
        .context("Disc lookup request failed")?
        .body_mut()
        .read_to_string()
        .context("Failed to read disc lookup response")?;

    if let Some(dir) = scratch {
        if let Err(e) = std::fs::write(dir.join("discid_response.json"), &body) {
            log::debug!("Could not dump provider response: {e}");
        }
    }

    let response: DiscIdResponse =
        serde_json::from_str(&body).context("Failed to parse disc lookup JSON")?;

    Ok(response.releases.iter().map(candidate_from_release).collect())
}

#[derive(Debug, Deserialize)]
struct DiscIdResponse {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    id: String,
    title: String,
    date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    media: Vec<Medium>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(rename = "cover-art-archive")]
    cover_art_archive: Option<CoverArtArchive>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Medium {
    #[serde(default)]
    tracks: Vec<MediumTrack>,
}

#[derive(Debug, Deserialize)]
struct MediumTrack {
    title: String,
    recording: Option<Recording>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    #[serde(default)]
    relations: Vec<Relation>,
}

#[derive(Debug, Deserialize)]
struct Relation {
    #[serde(rename = "type")]
    kind: Option<String>,
    artist: Option<RelatedArtist>,
}

#[derive(Debug, Deserialize)]
struct RelatedArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CoverArtArchive {
    #[serde(default)]
    front: bool,
}

fn candidate_from_release(release: &Release) -> ReleaseCandidate {
    let artist = release
        .artist_credit
        .first()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Unknown Artist".to_string());

    // Year is the leading 4-digit component of the release date
    let year = release
        .date
        .as_deref()
        .and_then(|d| d.get(..4))
        .unwrap_or("")
        .to_string();

    let (track_titles, composers): (Vec<String>, Vec<Option<String>>) = match release.media.first()
    {
        Some(medium) => medium
            .tracks
            .iter()
            .map(|t| (t.title.clone(), composer_of(t)))
            .unzip(),
        None => (Vec::new(), Vec::new()),
    };

    ReleaseCandidate {
        artist,
        title: release.title.clone(),
        year,
        mbid: release.id.clone(),
        track_titles,
        composers,
        genres: release.genres.iter().map(|g| g.name.clone()).collect(),
        has_cover_art: release
            .cover_art_archive
            .as_ref()
            .map(|c| c.front)
            .unwrap_or(false),
    }
}

/// First composer relation on the track's recording, if any.
fn composer_of(track: &MediumTrack) -> Option<String> {
    track
        .recording
        .as_ref()?
        .relations
        .iter()
        .find(|r| r.kind.as_deref() == Some("composer"))
        .and_then(|r| r.artist.as_ref())
        .map(|a| a.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "releases": [{
            "id": "b1a9c0e5-d987-4042-ae91-78d6a3267d69",
            "title": "Hounds of Love",
            "date": "1985-09-16",
            "artist-credit": [{"name": "Kate Bush"}],
            "media": [{
                "track-count": 2,
                "tracks": [
                    {"title": "Running Up That Hill",
                     "recording": {"relations": [
                         {"type": "composer", "artist": {"name": "Kate Bush"}},
                         {"type": "producer", "artist": {"name": "Someone Else"}}
                     ]}},
                    {"title": "Hounds of Love",
                     "recording": {"relations": [
                         {"type": "producer", "artist": {"name": "Someone Else"}}
                     ]}}
                ]
            }],
            "genres": [{"name": "art pop"}, {"name": "synth-pop"}],
            "cover-art-archive": {"front": true}
        }]
    }"#;

    #[test]
    fn test_candidate_from_full_release() {
        let resp: DiscIdResponse = serde_json::from_str(RESPONSE).unwrap();
        let c = candidate_from_release(&resp.releases[0]);
        assert_eq!(c.artist, "Kate Bush");
        assert_eq!(c.title, "Hounds of Love");
        assert_eq!(c.year, "1985");
        assert_eq!(c.mbid, "b1a9c0e5-d987-4042-ae91-78d6a3267d69");
        assert_eq!(c.track_titles, vec!["Running Up That Hill", "Hounds of Love"]);
        // Composer is the first composer-typed relation; producer credits ignored
        assert_eq!(c.composers, vec![Some("Kate Bush".to_string()), None]);
        assert_eq!(c.genres, vec!["art pop", "synth-pop"]);
        assert!(c.has_cover_art);
    }

    #[test]
    fn test_empty_releases() {
        let resp: DiscIdResponse = serde_json::from_str(r#"{"releases": []}"#).unwrap();
        assert!(resp.releases.is_empty());
    }

    #[test]
    fn test_missing_releases_key() {
        let resp: DiscIdResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.releases.is_empty());
    }

    #[test]
    fn test_sparse_release_defaults() {
        let json = r#"{"releases": [{"id": "x", "title": "Untitled"}]}"#;
        let resp: DiscIdResponse = serde_json::from_str(json).unwrap();
        let c = candidate_from_release(&resp.releases[0]);
        assert_eq!(c.artist, "Unknown Artist");
        assert_eq!(c.year, "");
        assert!(c.track_titles.is_empty());
        assert!(c.genres.is_empty());
        assert!(!c.has_cover_art);
    }

    #[test]
    fn test_lookup_url() {
        let url = lookup_url("1+2+36382+0+16440");
        assert!(url.starts_with("https://musicbrainz.org/ws/2/discid/-?toc=1+2+36382+0+16440"));
        assert!(url.contains("fmt=json"));
        assert!(url.contains("genres"));
        assert!(url.contains("artist-credits"));
    }
}
