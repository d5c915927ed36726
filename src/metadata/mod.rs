//! Metadata resolution: provider lookup, interactive disambiguation, and
//! manual-entry fallback.
//!
//! The flow is `Querying → {NoMatch, SingleMatch, MultiMatch} →
//! {Confirmed, Rejected} → Resolved`. Every degraded path (provider
//! unreachable, malformed response, rejected match) lands in manual entry;
//! nothing here is fatal to the session.

pub mod musicbrainz;
pub mod prompt;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::toc::DiscToc;
use musicbrainz::ReleaseCandidate;
use prompt::Prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    Provider,
    Manual,
}

impl MetadataSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Provider => "MusicBrainz",
            Self::Manual => "Manual entry",
        }
    }
}

/// Canonical album metadata. Created once per session, never mutated
/// after resolution completes.
#[derive(Debug, Clone)]
pub struct AlbumMetadata {
    pub artist: String,
    pub title: String,
    pub year: String,
    /// Empty string = no genre tag.
    pub genre: String,
    pub track_titles: Vec<String>,
    pub composers: Vec<Option<String>>,
    /// Multi-disc subdirectory number (manual entry only).
    pub disc_subdir: Option<u32>,
    /// Provider lookup URL, recorded in the rip log.
    pub source_url: Option<String>,
    /// Release identifier for the cover art fetch.
    pub mbid: Option<String>,
    pub has_cover_art: bool,
    pub source: MetadataSource,
}

impl AlbumMetadata {
    /// Title for a 1-based track index, with a placeholder when the
    /// resolved release has fewer titles than the disc has tracks.
    pub fn track_title(&self, index: u32) -> String {
        index
            .checked_sub(1)
            .and_then(|i| self.track_titles.get(i as usize))
            .filter(|t| !t.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Track {index:02}"))
    }

    pub fn composer(&self, index: u32) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.composers.get(i as usize))
            .and_then(|c| c.as_deref())
    }
}

/// Resolve metadata for a disc: query the provider, then drive
/// disambiguation or manual entry through `prompt`.
///
/// A transport error or malformed response degrades to manual entry
/// rather than aborting the session.
pub fn resolve_disc(
    toc: &DiscToc,
    timeout: Duration,
    scratch: Option<&Path>,
    prompt: &mut dyn Prompt,
) -> Result<AlbumMetadata> {
    let fingerprint = toc.fingerprint();
    log::debug!("Disc fingerprint: {fingerprint}");

    let url = musicbrainz::lookup_url(&fingerprint);
    let candidates = match musicbrainz::lookup(&fingerprint, timeout, scratch) {
        Ok(candidates) => candidates,
        // A status error means the provider answered and knows no such
        // disc; the no-candidates path reports that. Only transport
        // failures get the "unreachable" warning.
        Err(e) if lookup_was_answered(&e) => {
            log::info!("Disc lookup: {e:#}");
            Vec::new()
        }
        Err(e) => {
            log::warn!("Disc lookup failed: {e:#}");
            prompt.say("Metadata provider unreachable, falling back to manual entry.");
            Vec::new()
        }
    };

    resolve(toc.track_count(), candidates, url, prompt)
}

fn lookup_was_answered(e: &anyhow::Error) -> bool {
    matches!(e.downcast_ref::<ureq::Error>(), Some(ureq::Error::StatusCode(_)))
}

/// The resolver state machine proper, separated from the HTTP call so it
/// can run against canned candidates and a scripted prompt.
pub fn resolve(
    track_count: usize,
    candidates: Vec<ReleaseCandidate>,
    source_url: String,
    prompt: &mut dyn Prompt,
) -> Result<AlbumMetadata> {
    match candidates.len() {
        0 => {
            prompt.say("No matching release found for this disc.");
            manual_entry(track_count, prompt)
        }
        1 => {
            let candidate = &candidates[0];
            prompt.say(&format!("Found one release: {}", describe(candidate)));
            if ask_yes_no(prompt, "Use this release? [y/n]")? {
                confirmed(candidate, source_url, prompt)
            } else {
                prompt.say("Release rejected. Please enter the details manually.");
                manual_entry(track_count, prompt)
            }
        }
        n => {
            prompt.say("Multiple releases found:");
            for (i, candidate) in candidates.iter().enumerate() {
                prompt.say(&format!("  {}) {}", i + 1, describe(candidate)));
            }
            prompt.say("  0) None of these, enter details manually");
            let choice = ask_choice(prompt, &format!("Select a release [0-{n}]:"), 0, n)?;
            if choice == 0 {
                manual_entry(track_count, prompt)
            } else {
                confirmed(&candidates[choice - 1], source_url, prompt)
            }
        }
    }
}

fn describe(candidate: &ReleaseCandidate) -> String {
    if candidate.year.is_empty() {
        format!("{} - {}", candidate.artist, candidate.title)
    } else {
        format!("{} - {} ({})", candidate.artist, candidate.title, candidate.year)
    }
}

/// Confirmed → Resolved: pick a genre and freeze the candidate.
fn confirmed(
    candidate: &ReleaseCandidate,
    source_url: String,
    prompt: &mut dyn Prompt,
) -> Result<AlbumMetadata> {
    let genre = select_genre(&candidate.genres, prompt)?;

    Ok(AlbumMetadata {
        artist: candidate.artist.clone(),
        title: candidate.title.clone(),
        year: candidate.year.clone(),
        genre,
        track_titles: candidate.track_titles.clone(),
        composers: candidate.composers.clone(),
        disc_subdir: None,
        source_url: Some(source_url),
        mbid: Some(candidate.mbid.clone()),
        has_cover_art: candidate.has_cover_art,
        source: MetadataSource::Provider,
    })
}

/// Genre rule: empty list leaves the genre unset, a single entry is used
/// directly, more than one asks for a 1-based pick.
fn select_genre(genres: &[String], prompt: &mut dyn Prompt) -> Result<String> {
    match genres.len() {
        0 => Ok(String::new()),
        1 => Ok(genres[0].clone()),
        n => {
            prompt.say("Genres for this release:");
            for (i, genre) in genres.iter().enumerate() {
                prompt.say(&format!("  {}) {genre}", i + 1));
            }
            let choice = ask_choice(prompt, &format!("Select a genre [1-{n}]:"), 1, n)?;
            Ok(genres[choice - 1].clone())
        }
    }
}

fn manual_entry(track_count: usize, prompt: &mut dyn Prompt) -> Result<AlbumMetadata> {
    let artist = ask_nonempty(prompt, "Artist:")?;
    let title = ask_nonempty(prompt, "Album title:")?;
    let year = prompt.ask("Year:")?;
    let genre = prompt.ask("Genre (blank for none):")?;

    // A non-numeric disc number silently proceeds without a subdirectory.
    let disc_raw = prompt.ask("Disc number (blank for a single disc):")?;
    let disc_subdir = if disc_raw.is_empty() {
        None
    } else {
        match disc_raw.parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => {
                log::debug!("Non-numeric disc number {disc_raw:?}, skipping subdirectory");
                None
            }
        }
    };

    let mut track_titles = Vec::with_capacity(track_count);
    for i in 1..=track_count {
        let entered = prompt.ask(&format!("Title for track {i}:"))?;
        if entered.is_empty() {
            track_titles.push(format!("Track {i:02}"));
        } else {
            track_titles.push(entered);
        }
    }

    Ok(AlbumMetadata {
        artist,
        title,
        year,
        genre,
        track_titles,
        composers: vec![None; track_count],
        disc_subdir,
        source_url: None,
        mbid: None,
        has_cover_art: false,
        source: MetadataSource::Manual,
    })
}

fn ask_nonempty(prompt: &mut dyn Prompt, question: &str) -> Result<String> {
    loop {
        let answer = prompt.ask(question)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        prompt.say("A value is required.");
    }
}

fn ask_yes_no(prompt: &mut dyn Prompt, question: &str) -> Result<bool> {
    loop {
        let answer = prompt.ask(question)?.to_lowercase();
        match answer.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => prompt.say("Please answer y or n."),
        }
    }
}

/// Ask for a number in `[min, max]`; out-of-range or non-numeric input
/// re-prompts rather than failing.
fn ask_choice(prompt: &mut dyn Prompt, question: &str, min: usize, max: usize) -> Result<usize> {
    loop {
        let answer = prompt.ask(question)?;
        match answer.parse::<usize>() {
            Ok(n) if n >= min && n <= max => return Ok(n),
            _ => prompt.say("Invalid selection."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::prompt::Scripted;

    fn candidate(title: &str, genres: &[&str]) -> ReleaseCandidate {
        ReleaseCandidate {
            artist: "Boards of Canada".to_string(),
            title: title.to_string(),
            year: "1998".to_string(),
            mbid: "mbid-1234".to_string(),
            track_titles: vec!["Wildlife Analysis".to_string(), "An Eagle in Your Mind".to_string()],
            composers: vec![Some("M. Sandison".to_string()), None],
            genres: genres.iter().map(|g| g.to_string()).collect(),
            has_cover_art: true,
        }
    }

    fn url() -> String {
        "https://musicbrainz.org/ws/2/discid/-?toc=test".to_string()
    }

    #[test]
    fn test_status_error_is_a_no_match_not_an_outage() {
        use anyhow::Context;
        let status = Err::<(), _>(ureq::Error::StatusCode(404))
            .context("Disc lookup request failed")
            .unwrap_err();
        assert!(lookup_was_answered(&status));

        let transport = anyhow::Error::new(std::io::Error::other("connection refused"));
        assert!(!lookup_was_answered(&transport));
    }

    #[test]
    fn test_no_match_reaches_manual_entry() {
        let mut prompt = Scripted::new(&[
            "The Knife",
            "Silent Shout",
            "2006",
            "electronic",
            "",
            "Silent Shout",
            "Neverland",
        ]);
        let meta = resolve(2, Vec::new(), url(), &mut prompt).unwrap();
        assert_eq!(meta.source, MetadataSource::Manual);
        assert_eq!(meta.artist, "The Knife");
        assert_eq!(meta.year, "2006");
        assert_eq!(meta.genre, "electronic");
        assert!(meta.disc_subdir.is_none());
        assert_eq!(meta.track_titles, vec!["Silent Shout", "Neverland"]);
        assert_eq!(meta.composers, vec![None, None]);
        assert!(meta.source_url.is_none());
        assert!(prompt.transcript.iter().any(|l| l.contains("No matching release found")));
    }

    #[test]
    fn test_single_match_confirmed() {
        let mut prompt = Scripted::new(&["y"]);
        let meta = resolve(2, vec![candidate("Music Has the Right to Children", &["idm"])], url(), &mut prompt)
            .unwrap();
        assert_eq!(meta.source, MetadataSource::Provider);
        assert_eq!(meta.title, "Music Has the Right to Children");
        assert_eq!(meta.genre, "idm");
        assert_eq!(meta.mbid.as_deref(), Some("mbid-1234"));
        assert!(meta.has_cover_art);
        assert!(meta.source_url.is_some());
    }

    #[test]
    fn test_single_match_rejected_falls_back_to_manual() {
        let mut prompt = Scripted::new(&["n", "Artist", "Album", "1999", "", "", "A", "B"]);
        let meta = resolve(2, vec![candidate("Wrong Album", &[])], url(), &mut prompt).unwrap();
        assert_eq!(meta.source, MetadataSource::Manual);
        assert_eq!(meta.title, "Album");
        assert_eq!(meta.genre, "");
    }

    #[test]
    fn test_multi_match_out_of_range_reprompts() {
        let candidates = vec![candidate("First", &["idm"]), candidate("Second", &["idm"])];
        // 9 is out of range, "x" is not a number; 2 finally selects
        let mut prompt = Scripted::new(&["9", "x", "2"]);
        let meta = resolve(2, candidates, url(), &mut prompt).unwrap();
        assert_eq!(meta.title, "Second");
        assert_eq!(meta.source, MetadataSource::Provider);
    }

    #[test]
    fn test_multi_match_zero_selects_manual() {
        let candidates = vec![candidate("First", &[]), candidate("Second", &[])];
        let mut prompt = Scripted::new(&["0", "Artist", "Album", "", "", "", "A", "B"]);
        let meta = resolve(2, candidates, url(), &mut prompt).unwrap();
        assert_eq!(meta.source, MetadataSource::Manual);
        // Both candidates were enumerated before the 0 option
        assert!(prompt.transcript.iter().any(|l| l.contains("1) ") && l.contains("First")));
        assert!(prompt.transcript.iter().any(|l| l.contains("2) ") && l.contains("Second")));
    }

    #[test]
    fn test_genre_selection_multiple() {
        let mut prompt = Scripted::new(&["y", "0", "3"]);
        let meta = resolve(2, vec![candidate("Album", &["idm", "ambient", "downtempo"])], url(), &mut prompt)
            .unwrap();
        // 0 is out of the 1-based range and re-prompts
        assert_eq!(meta.genre, "downtempo");
    }

    #[test]
    fn test_genre_empty_list_leaves_genre_unset() {
        let mut prompt = Scripted::new(&["y"]);
        let meta = resolve(2, vec![candidate("Album", &[])], url(), &mut prompt).unwrap();
        assert_eq!(meta.genre, "");
    }

    #[test]
    fn test_exhausted_script_errors_instead_of_looping() {
        // Bad selections forever would hang; an exhausted script must error out
        let candidates = vec![candidate("First", &[]), candidate("Second", &[])];
        let mut prompt = Scripted::new(&["nope"]);
        assert!(resolve(2, candidates, url(), &mut prompt).is_err());
    }

    #[test]
    fn test_manual_disc_number() {
        let mut prompt = Scripted::new(&["A", "B", "", "", "2", "T1"]);
        let meta = resolve(1, Vec::new(), url(), &mut prompt).unwrap();
        assert_eq!(meta.disc_subdir, Some(2));
    }

    #[test]
    fn test_manual_non_numeric_disc_number_degrades() {
        let mut prompt = Scripted::new(&["A", "B", "", "", "two", "T1"]);
        let meta = resolve(1, Vec::new(), url(), &mut prompt).unwrap();
        assert!(meta.disc_subdir.is_none());
    }

    #[test]
    fn test_manual_blank_track_title_gets_placeholder() {
        let mut prompt = Scripted::new(&["A", "B", "", "", "", "", "Real Title"]);
        let meta = resolve(2, Vec::new(), url(), &mut prompt).unwrap();
        assert_eq!(meta.track_titles, vec!["Track 01", "Real Title"]);
    }

    #[test]
    fn test_track_title_fallback_past_resolved_titles() {
        let mut prompt = Scripted::new(&["y"]);
        let meta = resolve(3, vec![candidate("Album", &[])], url(), &mut prompt).unwrap();
        // Candidate only carries two titles; track 3 gets a placeholder
        assert_eq!(meta.track_title(1), "Wildlife Analysis");
        assert_eq!(meta.track_title(3), "Track 03");
        assert_eq!(meta.composer(1), Some("M. Sandison"));
        assert_eq!(meta.composer(3), None);
    }
}
