//! Front cover download from the Cover Art Archive.
//!
//! Only called when the resolved release reports front art. Any failure
//! here is advisory: the session proceeds without embedded art and the
//! rip log records the absence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Download the 250px front cover for a release into the session scratch
/// directory. Returns the path to the saved image.
pub fn fetch_front_cover(mbid: &str, scratch: &Path, timeout: Duration) -> Result<PathBuf> {
    let url = format!("https://coverartarchive.org/release/{mbid}/front-250");
    log::debug!("Fetching cover art from {url}");

    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .new_agent();

    let bytes = agent
        .get(&url)
        .header("User-Agent", crate::USER_AGENT)
        .call()
        .context("Cover art request failed")?
        .body_mut()
        .read_to_vec()
        .context("Failed to read cover art body")?;

    if bytes.is_empty() {
        bail!("Cover art response was empty");
    }

    let dest = scratch.join("cover.jpg");
    std::fs::write(&dest, &bytes)
        .with_context(|| format!("Failed to save cover art to {}", dest.display()))?;

    log::info!("Saved cover art ({} bytes)", bytes.len());
    Ok(dest)
}
