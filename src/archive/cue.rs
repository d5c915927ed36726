//! Cue sheet construction.
//!
//! Built incrementally alongside the rip loop, so tracks that fail to
//! rip still appear with their planned metadata.

use std::io;
use std::path::Path;

use crate::metadata::AlbumMetadata;

#[derive(Debug)]
pub struct CueSheet {
    text: String,
}

impl CueSheet {
    pub fn new(meta: &AlbumMetadata) -> Self {
        let mut text = String::new();
        text.push_str(&format!("PERFORMER \"{}\"\n", quote(&meta.artist)));
        text.push_str(&format!("TITLE \"{}\"\n", quote(&meta.title)));
        if !meta.year.is_empty() {
            text.push_str(&format!("REM DATE {}\n", meta.year));
        }
        if !meta.genre.is_empty() {
            text.push_str(&format!("REM GENRE \"{}\"\n", quote(&meta.genre)));
        }
        Self { text }
    }

    /// Append one FILE/TRACK/INDEX block.
    pub fn add_track(
        &mut self,
        number: u32,
        title: &str,
        performer: &str,
        composer: Option<&str>,
        filename: &str,
    ) {
        self.text.push_str(&format!("FILE \"{}\" WAVE\n", quote(filename)));
        self.text.push_str(&format!("  TRACK {number:02} AUDIO\n"));
        self.text.push_str(&format!("    TITLE \"{}\"\n", quote(title)));
        self.text.push_str(&format!("    PERFORMER \"{}\"\n", quote(performer)));
        if let Some(composer) = composer {
            self.text.push_str(&format!("    SONGWRITER \"{}\"\n", quote(composer)));
        }
        self.text.push_str("    INDEX 01 00:00:00\n");
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, &self.text)
    }
}

/// The cue format has no escape sequence for double quotes; swap them
/// for apostrophes.
fn quote(value: &str) -> String {
    value.replace('"', "'")
}
