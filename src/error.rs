use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Conditions that abort the whole session before any output is written.
///
/// Everything else (a failed track, a missing cover, an unreachable
/// metadata provider) is absorbed, logged, and the session continues.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("no CD drive found under /dev (expected /dev/sr*)")]
    NoDevice,

    #[error("no audio tracks found on {device}")]
    NoAudioTracks { device: String },

    #[error("cannot read disc in {device}: {detail}")]
    TocRead { device: String, detail: String },

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single track failing to rip or encode. Logged and counted in the
/// session summary, never fatal.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status} on track {track}: {detail}")]
    Tool {
        tool: &'static str,
        track: u32,
        status: String,
        detail: String,
    },

    #[error("pipe error on track {track}: {source}")]
    Pipe {
        track: u32,
        #[source]
        source: io::Error,
    },
}
