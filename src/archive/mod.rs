//! Archival bookkeeping: the rip log and its post-processing pass.
//!
//! The log is assembled in sections (header, tool versions, drive
//! identity, TOC dump, per-track status, checksums, summary) and written
//! once at the end of the session. Per-track lines are ordered by track
//! index regardless of the order results arrive in.

pub mod checksum;
pub mod cue;

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Local;

use crate::metadata::{AlbumMetadata, MetadataSource};
use crate::rip::drive;
use crate::rip::encoder::Format;
use crate::rip::{AlbumRip, TrackResult};

pub const METAFLAC: &str = "metaflac";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accumulated rip log text.
#[derive(Debug, Default)]
pub struct RipLog {
    text: String,
}

impl RipLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    pub fn section(&mut self, title: &str) {
        self.blank();
        self.line(format!("==== {title} ===="));
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.text)
    }
}

pub fn write_header(log: &mut RipLog, meta: &AlbumMetadata, format: Format, cover_embedded: bool) {
    log.line(format!("spindown {} rip log", env!("CARGO_PKG_VERSION")));
    log.line(format!("Started: {}", Local::now().format(TIME_FORMAT)));
    log.blank();
    log.line(format!("Album:  {} - {}", meta.artist, meta.title));
    if let Some(disc) = meta.disc_subdir {
        log.line(format!("Disc:   {disc}"));
    }
    if !meta.year.is_empty() {
        log.line(format!("Year:   {}", meta.year));
    }
    if !meta.genre.is_empty() {
        log.line(format!("Genre:  {}", meta.genre));
    }
    log.line(format!("Format: {}", format.label()));
    match meta.source {
        MetadataSource::Manual => log.line("Metadata entered manually."),
        MetadataSource::Provider => {
            let url = meta.source_url.as_deref().unwrap_or("unknown");
            log.line(format!("Metadata source: {} ({url})", meta.source.label()));
        }
    }
    log.line(if cover_embedded {
        "Cover art: embedded"
    } else {
        "Cover art: not available"
    });
}

/// Version-probe every external tool this session used.
pub fn write_tool_versions(log: &mut RipLog, format: Format, replay_gain: bool) {
    log.section("Tool versions");
    log.line(drive::tool_version(drive::RIPPER));
    if let Some(tool) = format.tool() {
        log.line(drive::tool_version(tool));
    }
    if replay_gain && format == Format::Flac {
        log.line(drive::tool_version(METAFLAC));
    }
}

pub fn write_drive(log: &mut RipLog, device: &str, toc_report: &str) {
    log.section("Drive");
    log.line(format!("Device: {device}"));
    if let Some(banner) = drive::toc_banner(toc_report) {
        log.line(banner);
    }
}

/// Literal TOC dump, exactly as the ripper reported it.
pub fn write_toc_dump(log: &mut RipLog, toc_report: &str) {
    log.section("Table of contents");
    for line in toc_report.lines() {
        log.line(line);
    }
}

/// Per-track status, ordered by track index no matter the append order.
pub fn write_track_results(log: &mut RipLog, rip: &AlbumRip) {
    log.section("Tracks");
    let mut ordered: Vec<&TrackResult> = rip.tracks.iter().collect();
    ordered.sort_by_key(|t| t.index);
    for track in ordered {
        log.line(status_line(track));
    }
    if let Some(hidden) = &rip.hidden {
        log.line(format!(
            "Hidden track: {}  {}",
            if hidden.is_ok() { "OK" } else { "FAILED" },
            file_name(&hidden.output_path),
        ));
    }
}

fn status_line(track: &TrackResult) -> String {
    if track.is_ok() {
        format!("Track {:02}: OK      {}", track.index, file_name(&track.output_path))
    } else {
        format!("Track {:02}: FAILED  {}", track.index, track.title)
    }
}

/// MD5 of every produced output file. A file we cannot read gets noted
/// rather than aborting the log.
pub fn write_checksums(log: &mut RipLog, files: &[&Path]) {
    log.section("MD5 checksums");
    for file in files {
        match checksum::md5_file(file) {
            Ok(digest) => log.line(format!("{digest}  {}", file_name(file))),
            Err(e) => log.line(format!("unavailable ({e})  {}", file_name(file))),
        }
    }
}

pub fn write_summary(log: &mut RipLog, rip: &AlbumRip) {
    log.section("Summary");
    log.line(format!(
        "Successfully ripped and encoded {} of {} tracks",
        rip.success_count(),
        rip.tracks.len()
    ));
    for file in rip.produced_files() {
        log.line(format!("  {}", file_name(file)));
    }
    log.line(format!("Completed: {}", Local::now().format(TIME_FORMAT)));
}

/// ReplayGain scan over every FLAC file in the output directory. Applied
/// once, after all tracks are on disk; failure is advisory.
pub fn apply_replaygain(dir: &Path) -> Result<usize> {
    let mut flacs: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("cannot list {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("flac"))
        .collect();
    flacs.sort();

    if flacs.is_empty() {
        return Ok(0);
    }

    let status = Command::new(METAFLAC)
        .arg("--add-replay-gain")
        .args(&flacs)
        .status()
        .with_context(|| format!("failed to run {METAFLAC}"))?;
    if !status.success() {
        bail!("{METAFLAC} exited with {status}");
    }
    Ok(flacs.len())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
