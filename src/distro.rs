use std::borrow::Cow;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{PaktError, Result};

/// Source of the host's distro id (`ID=` in os-release).
pub trait DistroDetector {
    fn detect(&self) -> Result<String>;
}

/// Reads the id field out of an os-release file through the shell.
#[derive(Debug, Clone)]
pub struct OsRelease {
    path: PathBuf,
}

impl Default for OsRelease {
    fn default() -> Self {
        OsRelease::at("/etc/os-release")
    }
}

impl OsRelease {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        OsRelease { path: path.into() }
    }
}

impl DistroDetector for OsRelease {
    fn detect(&self) -> Result<String> {
        let file = shell_escape::escape(Cow::from(self.path.to_string_lossy().into_owned()));
        let script = format!("grep '^ID=' {file} | cut -d'=' -f2 | tr -d '\\n'");
        log::debug!("detecting distro: {}", script);
        let out = Command::new("sh")
            .args(["-c", &script])
            .output()
            .map_err(|e| PaktError::Detection(format!("running sh: {e}")))?;
        if !out.status.success() {
            return Err(PaktError::Detection(format!("could not read ID from {}", self.path.display())));
        }
        Ok(normalize(&String::from_utf8_lossy(&out.stdout)))
    }
}

/// A detector that always answers the same.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Fixed(pub String);

#[cfg(test)]
impl DistroDetector for Fixed {
    fn detect(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub fn normalize(raw: &str) -> String {
    unquote(raw).to_ascii_lowercase()
}

fn unquote(s: &str) -> String {
    let t = s.trim();
    if t.len() >= 2 && ((t.starts_with('"') && t.ends_with('"')) || (t.starts_with('\'') && t.ends_with('\''))) {
        t[1..t.len() - 1].to_string()
    } else { t.to_string() }
}

/// System package manager for a distro id; `None` for anything unrecognised.
pub fn manager_for_distro(id: &str) -> Option<&'static str> {
    match id {
        "fedora" => Some("dnf"),
        "ubuntu" | "linuxmint" => Some("apt"),
        "arch" => Some("pacman"),
        _ => None,
    }
}

/// Detect the distro and map it to its manager. Unknown distros and failed
/// detection are both errors.
pub fn system_manager(detector: &dyn DistroDetector) -> Result<&'static str> {
    let id = detector.detect()?;
    manager_for_distro(&id).ok_or(PaktError::UnknownDistro(if id.is_empty() { "unknown".into() } else { id }))
}
