//! Output planning: sanitized directory layout and file naming.
//!
//! Layout is `{saveRoot}/{Artist}/{Album}[/Disc N]/` containing
//! `NN. Title.ext` per track, `00. Hidden Track.ext` for pre-gap audio,
//! `{Album}.cue`, and `rip_log.txt`.

use std::path::{Path, PathBuf};

use crate::error::FatalError;
use crate::metadata::AlbumMetadata;

pub const LOG_FILENAME: &str = "rip_log.txt";

/// Where everything for this session gets written.
#[derive(Debug, Clone)]
pub struct OutputPlan {
    pub dir: PathBuf,
    pub cue_path: PathBuf,
    pub log_path: PathBuf,
}

impl OutputPlan {
    pub fn new(save_root: &Path, meta: &AlbumMetadata) -> Self {
        let mut dir = save_root
            .join(sanitize(&meta.artist))
            .join(sanitize(&meta.title));
        if let Some(disc) = meta.disc_subdir {
            dir = dir.join(format!("Disc {disc}"));
        }
        let cue_path = dir.join(format!("{}.cue", sanitize(&meta.title)));
        let log_path = dir.join(LOG_FILENAME);
        Self { dir, cue_path, log_path }
    }

    /// Create the output directory tree. Failing here is fatal; there is
    /// nowhere to write.
    pub fn create_dir(&self) -> Result<(), FatalError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| FatalError::OutputDir {
            path: self.dir.clone(),
            source,
        })
    }

}

/// `"{NN}. {Title}.{ext}"`
pub fn track_filename(index: u32, title: &str, extension: &str) -> String {
    format!("{index:02}. {}.{extension}", sanitize(title))
}

pub fn hidden_track_filename(extension: &str) -> String {
    format!("00. Hidden Track.{extension}")
}

/// Replace path separators (and NUL) with underscores and trim trailing
/// dots/whitespace so titles can't escape or break the output tree.
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();
    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
