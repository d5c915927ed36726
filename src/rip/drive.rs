//! Subprocess boundary to the drive-side tools: TOC query, device
//! discovery, version probing, and tray eject.
//!
//! Exit codes are translated into the typed error taxonomy here; raw
//! statuses never leave this module.

use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::error::FatalError;

pub const RIPPER: &str = "cdparanoia";
pub const EJECT: &str = "eject";

/// First optical drive under /dev (`/dev/sr0`, `/dev/sr1`, …), if any.
pub fn discover_device() -> Option<String> {
    let entries = std::fs::read_dir("/dev").ok()?;
    pick_device(
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok()),
    )
}

/// Lowest-numbered `srN` entry; the suffix is compared numerically so
/// `sr2` beats `sr10`.
fn pick_device(names: impl Iterator<Item = String>) -> Option<String> {
    let mut drives: Vec<(u32, String)> = names
        .filter_map(|name| {
            let number: u32 = name.strip_prefix("sr")?.parse().ok()?;
            Some((number, name))
        })
        .collect();
    drives.sort();
    drives.into_iter().next().map(|(_, name)| format!("/dev/{name}"))
}

/// Run the ripper's query mode and return the raw TOC report.
/// cdparanoia prints the table of contents on stderr.
pub fn read_toc(device: &str) -> Result<String, FatalError> {
    let output = Command::new(RIPPER)
        .args(["-Q", "-d", device])
        .output()
        .map_err(|e| FatalError::TocRead {
            device: device.to_string(),
            detail: format!("failed to run {RIPPER}: {e}"),
        })?;

    let report = String::from_utf8_lossy(&output.stderr).to_string();
    if !output.status.success() {
        return Err(FatalError::TocRead {
            device: device.to_string(),
            detail: report.trim().to_string(),
        });
    }
    Ok(report)
}

/// The tool's own banner line from the TOC report, for the rip log's
/// drive section.
pub fn toc_banner(report: &str) -> Option<&str> {
    report.lines().map(str::trim).find(|l| !l.is_empty())
}

/// First line of `tool --version` output, or a placeholder when the tool
/// is missing. Version probing never fails the session.
pub fn tool_version(tool: &str) -> String {
    let output = match Command::new(tool).arg("--version").output() {
        Ok(output) => output,
        Err(_) => return format!("{tool}: not available"),
    };
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.to_string())
        .unwrap_or_else(|| format!("{tool}: version unknown"))
}

/// Release the disc. Failure is advisory; the rip is already on disk.
pub fn eject(device: &str) -> Result<()> {
    let status = Command::new(EJECT)
        .arg(device)
        .status()
        .with_context(|| format!("failed to run {EJECT}"))?;
    if !status.success() {
        bail!("{EJECT} exited with {status} for {device}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_pick_device_numeric_order() {
        assert_eq!(pick_device(names(&["sr10", "sr2"])), Some("/dev/sr2".to_string()));
        assert_eq!(pick_device(names(&["sr1", "sr0", "loop0"])), Some("/dev/sr0".to_string()));
    }

    #[test]
    fn test_pick_device_ignores_non_drives() {
        assert_eq!(pick_device(names(&["sda", "srx", "sr", "tty0"])), None);
        assert_eq!(pick_device(names(&[])), None);
    }

    #[test]
    fn test_toc_banner() {
        let report = "\n\ncdparanoia III release 10.2 (September 11, 2008)\n\ntrack ...\n";
        assert_eq!(toc_banner(report), Some("cdparanoia III release 10.2 (September 11, 2008)"));
        assert_eq!(toc_banner(""), None);
    }

    #[test]
    fn test_tool_version_missing_tool() {
        let v = tool_version("definitely-not-a-real-binary-5309");
        assert_eq!(v, "definitely-not-a-real-binary-5309: not available");
    }
}
