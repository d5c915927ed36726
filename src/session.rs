//! Session controller: sequences TOC read, metadata resolution, output
//! planning, the rip loop, archival output, and ejection.
//!
//! Fatal conditions (no drive, no tracks, no writable output directory)
//! abort before anything lands on disk. Everything after directory
//! creation is absorbed and recorded instead.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::archive::{self, RipLog, cue::CueSheet};
use crate::cover;
use crate::error::FatalError;
use crate::metadata::{self, AlbumMetadata, prompt::Prompt};
use crate::plan::OutputPlan;
use crate::rip::encoder::Format;
use crate::rip::{self, RipRequest, drive};
use crate::toc::{DiscToc, TocError};

pub struct SessionOptions {
    /// Device path; auto-discovered when `None`.
    pub device: Option<String>,
    pub format: Format,
    pub save_root: PathBuf,
    pub eject: bool,
    pub replay_gain: bool,
    pub rip_hidden: bool,
    pub request_timeout: Duration,
}

/// State owned for the lifetime of one rip. Built up stage by stage and
/// discarded after the log and cue sheet are flushed.
struct RipSession {
    device: String,
    toc_report: String,
    toc: DiscToc,
    meta: AlbumMetadata,
    format: Format,
    plan: OutputPlan,
    cover_art: Option<PathBuf>,
    log: RipLog,
}

/// Run one complete rip session.
pub fn run(opts: &SessionOptions, prompt: &mut dyn Prompt) -> Result<()> {
    let device = match &opts.device {
        Some(device) => device.clone(),
        None => drive::discover_device().ok_or(FatalError::NoDevice)?,
    };
    log::info!("Using drive {device}");

    // Scratch space for the TOC dump, provider response, and cover art.
    // Dropping the TempDir removes it on every exit path, early abort
    // included.
    let scratch = tempfile::tempdir().context("cannot create scratch directory")?;

    let toc_report = drive::read_toc(&device)?;
    if let Err(e) = std::fs::write(scratch.path().join("toc.txt"), &toc_report) {
        log::debug!("Could not dump TOC report: {e}");
    }

    let toc = DiscToc::parse(&toc_report).map_err(|e| match e {
        TocError::NoAudioTracks => FatalError::NoAudioTracks { device: device.clone() },
        other => FatalError::TocRead {
            device: device.clone(),
            detail: other.to_string(),
        },
    })?;
    println!(
        "Found {} audio tracks{}",
        toc.track_count(),
        if toc.hidden_track.is_some() { " plus a hidden pre-gap track" } else { "" }
    );

    let meta = metadata::resolve_disc(&toc, opts.request_timeout, Some(scratch.path()), prompt)?;

    let plan = OutputPlan::new(&opts.save_root, &meta);
    // Last fatal check; nothing has been written before this point
    plan.create_dir()?;
    log::info!("Output directory: {}", plan.dir.display());

    // Cover art is fetched only when the release reports front art and
    // the chosen format can embed it; any failure is advisory.
    let cover_art = if meta.has_cover_art && opts.format.supports_cover_art() {
        match meta.mbid.as_deref() {
            Some(mbid) => {
                match cover::fetch_front_cover(mbid, scratch.path(), opts.request_timeout) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        log::warn!("Cover art unavailable: {e:#}");
                        None
                    }
                }
            }
            None => None,
        }
    } else {
        None
    };

    let mut session = RipSession {
        device,
        toc_report,
        toc,
        meta,
        format: opts.format,
        plan,
        cover_art,
        log: RipLog::new(),
    };

    archive::write_header(
        &mut session.log,
        &session.meta,
        session.format,
        session.cover_art.is_some(),
    );
    archive::write_tool_versions(&mut session.log, session.format, opts.replay_gain);
    archive::write_drive(&mut session.log, &session.device, &session.toc_report);
    archive::write_toc_dump(&mut session.log, &session.toc_report);

    let mut cue = CueSheet::new(&session.meta);
    let request = RipRequest {
        device: &session.device,
        toc: &session.toc,
        meta: &session.meta,
        format: session.format,
        plan: &session.plan,
        cover_art: session.cover_art.as_deref(),
        rip_hidden: opts.rip_hidden,
    };
    let rip = rip::rip_album(&request, &mut cue);

    archive::write_track_results(&mut session.log, &rip);

    if session.format == Format::Flac && opts.replay_gain {
        match archive::apply_replaygain(&session.plan.dir) {
            Ok(count) => session.log.line(format!("ReplayGain applied to {count} files")),
            Err(e) => {
                log::warn!("ReplayGain scan failed: {e:#}");
                session.log.line(format!("ReplayGain scan failed: {e}"));
            }
        }
    }

    archive::write_checksums(&mut session.log, &rip.produced_files());
    archive::write_summary(&mut session.log, &rip);

    cue.write_to(&session.plan.cue_path)
        .with_context(|| format!("failed to write {}", session.plan.cue_path.display()))?;
    session
        .log
        .write_to(&session.plan.log_path)
        .with_context(|| format!("failed to write {}", session.plan.log_path.display()))?;

    println!(
        "Successfully ripped and encoded {} of {} tracks",
        rip.success_count(),
        session.toc.track_count()
    );
    println!("Saved to {}", session.plan.dir.display());

    if opts.eject {
        if let Err(e) = drive::eject(&session.device) {
            log::warn!("Eject failed: {e:#}");
        }
    }

    Ok(())
}
