pub mod archive;
pub mod config;
pub mod cover;
pub mod error;
pub mod metadata;
pub mod plan;
pub mod rip;
pub mod session;
pub mod toc;

/// Application name for XDG paths
pub const APP_NAME: &str = "spindown";

/// User-Agent sent with every provider request (MusicBrainz requires one).
pub const USER_AGENT: &str = concat!("spindown/", env!("CARGO_PKG_VERSION"));
