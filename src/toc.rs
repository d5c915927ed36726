//! Table-of-contents parsing and disc fingerprinting.
//!
//! The ripper's query mode (`cdparanoia -Q`) reports one line per audio
//! track plus a TOTAL line. We parse that report into a typed [`DiscToc`]
//! and derive the fingerprint string used for the MusicBrainz lookup.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TocError {
    #[error("no audio tracks found in TOC report")]
    NoAudioTracks,

    #[error("malformed track line: {0:?}")]
    MalformedTrackLine(String),

    #[error("TOC report has no TOTAL line")]
    MissingTotal,

    #[error("track numbering is not contiguous (expected {expected}, saw {found})")]
    NonContiguous { expected: u32, found: u32 },
}

/// Start sector of one track as reported by the drive. The hidden
/// pre-gap track can begin at a negative sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSector {
    pub index: u32,
    pub start_sector: i64,
}

/// Parsed disc layout. Immutable once read from the drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscToc {
    /// Ordinary tracks, indices contiguous starting at 1.
    pub tracks: Vec<TrackSector>,
    /// Pre-gap audio before track 1, reported as a `0.` line.
    pub hidden_track: Option<TrackSector>,
    pub total_sectors: i64,
    pub leadout_sector: i64,
}

impl DiscToc {
    /// Parse the ripper's textual TOC report.
    ///
    /// A line whose first token is `N.` is a track line; its fourth
    /// whitespace-separated field is the start sector. The `TOTAL` line
    /// supplies the disc length in sectors.
    pub fn parse(report: &str) -> Result<Self, TocError> {
        let mut tracks = Vec::new();
        let mut hidden_track = None;
        let mut total_sectors = None;

        for line in report.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let Some(first) = fields.first() else {
                continue;
            };

            if let Some(index) = parse_track_number(first) {
                let start_sector = fields
                    .get(3)
                    .and_then(|f| f.parse::<i64>().ok())
                    .ok_or_else(|| TocError::MalformedTrackLine(line.to_string()))?;

                let sector = TrackSector { index, start_sector };
                if index == 0 {
                    hidden_track = Some(sector);
                } else {
                    tracks.push(sector);
                }
            } else if *first == "TOTAL" {
                total_sectors = fields.get(1).and_then(|f| f.parse::<i64>().ok());
            }
        }

        if tracks.is_empty() {
            return Err(TocError::NoAudioTracks);
        }
        for (i, track) in tracks.iter().enumerate() {
            let expected = i as u32 + 1;
            if track.index != expected {
                return Err(TocError::NonContiguous {
                    expected,
                    found: track.index,
                });
            }
        }

        let total_sectors = total_sectors.ok_or(TocError::MissingTotal)?;
        let leadout_sector = tracks[0].start_sector + total_sectors;

        Ok(DiscToc {
            tracks,
            hidden_track,
            total_sectors,
            leadout_sector,
        })
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Build the provider lookup key: `1+count+leadout+offset1+offset2+…`
    ///
    /// The hidden pre-gap track is excluded; provider TOCs always start
    /// at track 1.
    pub fn fingerprint(&self) -> String {
        let offsets: Vec<String> = self
            .tracks
            .iter()
            .map(|t| t.start_sector.to_string())
            .collect();
        format!(
            "1+{}+{}+{}",
            self.tracks.len(),
            self.leadout_sector,
            offsets.join("+")
        )
    }
}

/// `"3."` → `Some(3)`, anything else → `None`.
fn parse_track_number(token: &str) -> Option<u32> {
    token.strip_suffix('.')?.parse().ok()
}
