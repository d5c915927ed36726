//! The per-track rip→encode pipeline.
//!
//! Tracks are processed strictly in ascending index order; the optical
//! drive is mechanically serial, so this is a sequential loop by
//! necessity. A failing track is logged and counted; it never aborts the
//! session.

pub mod drive;
pub mod encoder;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use indicatif::{ProgressBar, ProgressStyle};

use crate::archive::cue::CueSheet;
use crate::error::TrackError;
use crate::metadata::AlbumMetadata;
use crate::plan::{self, OutputPlan};
use crate::toc::DiscToc;
use drive::RIPPER;
use encoder::{Format, TrackTags, encoder_args};

pub const HIDDEN_TRACK_TITLE: &str = "Hidden Track";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

/// Outcome of one ripped track. Appended in index order, never reordered.
#[derive(Debug, Clone)]
pub struct TrackResult {
    pub index: u32,
    pub title: String,
    pub outcome: Outcome,
    pub output_path: PathBuf,
}

impl TrackResult {
    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }
}

/// Everything the pipeline needs for one album.
pub struct RipRequest<'a> {
    pub device: &'a str,
    pub toc: &'a DiscToc,
    pub meta: &'a AlbumMetadata,
    pub format: Format,
    pub plan: &'a OutputPlan,
    pub cover_art: Option<&'a Path>,
    pub rip_hidden: bool,
}

/// Results for the whole disc. The hidden pre-gap track is tracked
/// separately so it never skews the ordinary success count.
pub struct AlbumRip {
    pub tracks: Vec<TrackResult>,
    pub hidden: Option<TrackResult>,
}

impl AlbumRip {
    pub fn success_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_ok()).count()
    }

    /// Paths of every file actually produced, hidden track included.
    pub fn produced_files(&self) -> Vec<&Path> {
        self.tracks
            .iter()
            .chain(self.hidden.iter())
            .filter(|t| t.is_ok())
            .map(|t| t.output_path.as_path())
            .collect()
    }
}

/// Rip and encode every track in order, appending each planned track to
/// the cue sheet as it goes. Failed tracks still appear in the cue with
/// their planned metadata. The hidden pre-gap track is the exception: it
/// joins the cue as TRACK 00 only once its file actually exists, so the
/// cue and the checksum section always cover the same set of files.
pub fn rip_album(req: &RipRequest, cue: &mut CueSheet) -> AlbumRip {
    let total = req.toc.track_count();
    let rip_hidden = req.rip_hidden && req.toc.hidden_track.is_some();

    let pb = ProgressBar::new((total + usize::from(rip_hidden)) as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} tracks {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );

    let cover = if req.format.supports_cover_art() {
        req.cover_art
    } else {
        None
    };

    let mut tracks = Vec::with_capacity(total);
    for sector in &req.toc.tracks {
        let index = sector.index;
        let title = req.meta.track_title(index);
        let filename = plan::track_filename(index, &title, req.format.extension());
        let output_path = req.plan.dir.join(&filename);

        cue.add_track(index, &title, &req.meta.artist, req.meta.composer(index), &filename);
        pb.set_message(title.clone());

        let tags = TrackTags {
            artist: &req.meta.artist,
            album: &req.meta.title,
            title: &title,
            track_number: index,
            year: &req.meta.year,
            genre: &req.meta.genre,
            composer: req.meta.composer(index),
        };

        let outcome = match rip_one(req.device, index, req.format, &tags, cover, &output_path) {
            Ok(()) => {
                log::info!("Track {index:02} done: {title}");
                Outcome::Ok
            }
            Err(e) => {
                log::warn!("Track {index:02} FAILED: {e}");
                // Don't leave a truncated file behind
                let _ = std::fs::remove_file(&output_path);
                Outcome::Failed
            }
        };

        tracks.push(TrackResult { index, title, outcome, output_path });
        pb.inc(1);
    }

    let hidden = if rip_hidden {
        let format = req.format.hidden_track_format();
        let filename = plan::hidden_track_filename(format.extension());
        let output_path = req.plan.dir.join(&filename);
        pb.set_message(HIDDEN_TRACK_TITLE);

        let tags = TrackTags {
            artist: &req.meta.artist,
            album: &req.meta.title,
            title: HIDDEN_TRACK_TITLE,
            track_number: 0,
            year: &req.meta.year,
            genre: &req.meta.genre,
            composer: None,
        };

        let outcome = match rip_one(req.device, 0, format, &tags, cover, &output_path) {
            Ok(()) => {
                cue.add_track(0, HIDDEN_TRACK_TITLE, &req.meta.artist, None, &filename);
                Outcome::Ok
            }
            Err(e) => {
                log::warn!("Hidden track FAILED: {e}");
                let _ = std::fs::remove_file(&output_path);
                Outcome::Failed
            }
        };
        pb.inc(1);

        Some(TrackResult {
            index: 0,
            title: HIDDEN_TRACK_TITLE.to_string(),
            outcome,
            output_path,
        })
    } else {
        None
    };

    let rip = AlbumRip { tracks, hidden };
    pb.finish_with_message(format!("{} of {} tracks ripped", rip.success_count(), total));
    rip
}

/// Rip one track. WAV goes straight to the destination file; everything
/// else pipes the ripper's PCM stream into the encoder's stdin.
fn rip_one(
    device: &str,
    track: u32,
    format: Format,
    tags: &TrackTags,
    cover_art: Option<&Path>,
    output: &Path,
) -> Result<(), TrackError> {
    match encoder_args(format, tags, cover_art, output) {
        None => {
            let result = Command::new(RIPPER)
                .args(["-q", "-d", device])
                .arg(track.to_string())
                .arg(output)
                .output()
                .map_err(|source| TrackError::Spawn { tool: RIPPER, source })?;
            if !result.status.success() {
                return Err(TrackError::Tool {
                    tool: RIPPER,
                    track,
                    status: result.status.to_string(),
                    detail: stderr_snippet(&result.stderr),
                });
            }
            Ok(())
        }
        Some((tool, args)) => {
            let mut ripper = Command::new(RIPPER)
                .args(["-q", "-d", device])
                .arg(track.to_string())
                .arg("-")
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|source| TrackError::Spawn { tool: RIPPER, source })?;

            let pcm = ripper.stdout.take().ok_or_else(|| TrackError::Pipe {
                track,
                source: io::Error::other("ripper stdout was not captured"),
            })?;

            let enc = Command::new(tool)
                .args(&args)
                .stdin(Stdio::from(pcm))
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .spawn();

            let enc = match enc {
                Ok(child) => child,
                Err(source) => {
                    let _ = ripper.kill();
                    let _ = ripper.wait();
                    return Err(TrackError::Spawn { tool, source });
                }
            };

            let enc_result = enc
                .wait_with_output()
                .map_err(|source| TrackError::Pipe { track, source })?;
            let rip_status = ripper
                .wait()
                .map_err(|source| TrackError::Pipe { track, source })?;

            if !rip_status.success() {
                return Err(TrackError::Tool {
                    tool: RIPPER,
                    track,
                    status: rip_status.to_string(),
                    detail: String::new(),
                });
            }
            if !enc_result.status.success() {
                return Err(TrackError::Tool {
                    tool,
                    track,
                    status: enc_result.status.to_string(),
                    detail: stderr_snippet(&enc_result.stderr),
                });
            }
            Ok(())
        }
    }
}

fn stderr_snippet(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().chars().take(300).collect()
}
