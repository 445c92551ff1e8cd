//! # chrome-auto
//!
//! Locate a Chrome or Chromium executable at runtime, so that CDP clients
//! (such as `chromiumoxide`) can launch a headless browser without the user
//! wiring up paths by hand.
//!
//! ## How it works
//!
//! On first call to [`locate_browser`]:
//!
//! 1. Checks `CHROME_PATH`: an explicit executable path always wins.
//! 2. Searches every directory on `PATH` for the platform's executable names
//!    (`google-chrome`, `chromium`, `chrome.exe`, …).
//! 3. Falls back to well-known system and per-user install locations
//!    (application bundles on macOS, Program Files on Windows, Flatpak exports
//!    on Linux).
//!
//! The first hit is cached for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrome_auto::{is_browser_available, locate_browser};
//!
//! if is_browser_available() {
//!     let chrome = locate_browser().expect("browser vanished");
//!     println!("Using {}", chrome.display());
//! }
//! ```
//!
//! ## Platform support
//!
//! | OS      | Executables searched on `PATH`                                        |
//! |---------|-----------------------------------------------------------------------|
//! | macOS   | `google-chrome`, `chromium`, `chrome` + `.app` bundles                |
//! | Linux   | `google-chrome`, `google-chrome-stable`, `chromium`, `chromium-browser`, `chrome` |
//! | Windows | `chrome.exe`, `msedge.exe` + Program Files installs                   |
//!
//! ## Environment variable overrides
//!
//! - `CHROME_PATH`: path to a browser executable; skips discovery.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-auto operations.
#[derive(Error, Debug)]
pub enum ChromeAutoError {
    /// The current OS/architecture combination is not supported.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No candidate location held an executable browser.
    #[error(
        "No Chrome or Chromium executable found (checked {searched} locations).\n\
Install Google Chrome or Chromium, or set CHROME_PATH=/path/to/chrome."
    )]
    NotFound { searched: usize },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Executable file names looked up on `PATH`.
    executable_names: &'static [&'static str],
    /// Absolute system-wide install locations.
    install_paths: &'static [&'static str],
}

fn detect_platform() -> Result<PlatformInfo, ChromeAutoError> {
    let os = std::env::consts::OS;

    match os {
        "macos" => Ok(PlatformInfo {
            executable_names: &["google-chrome", "chromium", "chrome"],
            install_paths: &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
                "/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary",
            ],
        }),
        "linux" | "freebsd" | "openbsd" => Ok(PlatformInfo {
            executable_names: &[
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
                "chrome",
            ],
            install_paths: &[
                "/opt/google/chrome/chrome",
                "/usr/lib/chromium/chromium",
                "/snap/bin/chromium",
                "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
                "/var/lib/flatpak/exports/bin/com.google.Chrome",
            ],
        }),
        "windows" => Ok(PlatformInfo {
            executable_names: &["chrome.exe", "msedge.exe"],
            install_paths: &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
            ],
        }),
        os => Err(ChromeAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }),
    }
}

/// Per-user install locations, resolved against the user's directories.
fn user_install_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    match std::env::consts::OS {
        "macos" => {
            if let Some(home) = dirs::home_dir() {
                paths.push(home.join("Applications/Google Chrome.app/Contents/MacOS/Google Chrome"));
                paths.push(home.join("Applications/Chromium.app/Contents/MacOS/Chromium"));
            }
        }
        "windows" => {
            if let Some(local) = dirs::data_local_dir() {
                paths.push(local.join(r"Google\Chrome\Application\chrome.exe"));
                paths.push(local.join(r"Chromium\Application\chrome.exe"));
            }
        }
        _ => {
            if let Some(data) = dirs::data_dir() {
                paths.push(data.join("flatpak/exports/bin/org.chromium.Chromium"));
                paths.push(data.join("flatpak/exports/bin/com.google.Chrome"));
            }
        }
    }
    paths
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns `true` if a browser executable can be found (no launch attempted).
pub fn is_browser_available() -> bool {
    locate_browser().is_ok()
}

/// Every location [`locate_browser`] would try, in lookup order.
///
/// Includes `CHROME_PATH` (when set) and the `PATH` expansion of each
/// executable name, so the list is also useful for diagnostics.
pub fn candidate_paths() -> Result<Vec<PathBuf>, ChromeAutoError> {
    let info = detect_platform()?;
    let mut candidates = Vec::new();

    if let Ok(env_path) = std::env::var("CHROME_PATH") {
        if !env_path.is_empty() {
            candidates.push(PathBuf::from(env_path));
        }
    }

    if let Some(path_var) = std::env::var_os("PATH") {
        candidates.extend(path_candidates(info.executable_names, &path_var));
    }

    candidates.extend(info.install_paths.iter().map(PathBuf::from));
    candidates.extend(user_install_paths());
    Ok(candidates)
}

/// Returns the path of a usable Chrome/Chromium executable.
///
/// - If `CHROME_PATH` is set (and the file exists), that path is used.
/// - Otherwise `PATH` is searched, then well-known install locations.
///
/// # Thread safety
///
/// Safe to call from multiple threads; discovery runs at most once per
/// process that succeeds.
pub fn locate_browser() -> Result<PathBuf, ChromeAutoError> {
    // Fast path: already resolved in this process.
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    if let Ok(env_path) = std::env::var("CHROME_PATH") {
        let p = PathBuf::from(&env_path);
        if !env_path.is_empty() && !is_executable(&p) {
            // Fall through: env var set but unusable → keep searching.
            eprintln!(
                "chrome-auto: CHROME_PATH '{}' is not an executable file; searching …",
                p.display()
            );
        }
    }

    let candidates = candidate_paths()?;
    let path = first_executable(&candidates).ok_or(ChromeAutoError::NotFound {
        searched: candidates.len(),
    })?;

    // Best-effort cache in the OnceLock (ignore race; both will succeed).
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Expands each executable name against every directory of a `PATH`-style value.
fn path_candidates(names: &[&str], path_var: &OsStr) -> Vec<PathBuf> {
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .collect()
}

fn first_executable(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| is_executable(p)).cloned()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_platform_is_supported() {
        detect_platform().expect("current platform should be supported");
    }

    #[test]
    fn platform_info_fields_nonempty() {
        let info = detect_platform().unwrap();
        assert!(!info.executable_names.is_empty());
        assert!(!info.install_paths.is_empty());
    }

    #[test]
    fn path_candidates_cross_dirs_and_names() {
        let dirs = std::env::join_paths([PathBuf::from("/a"), PathBuf::from("/b")]).unwrap();
        let found = path_candidates(&["x", "y"], &dirs);
        assert_eq!(
            found,
            vec![
                PathBuf::from("/a/x"),
                PathBuf::from("/a/y"),
                PathBuf::from("/b/x"),
                PathBuf::from("/b/y"),
            ]
        );
    }

    #[test]
    fn path_candidates_skip_empty_entries() {
        let found = path_candidates(&["chrome"], OsStr::new(""));
        assert!(found.is_empty());
    }

    #[test]
    fn first_executable_skips_missing_files() {
        let missing = PathBuf::from("/definitely/not/here/chrome");
        assert_eq!(first_executable(&[missing]), None);
    }

    #[cfg(unix)]
    #[test]
    fn first_executable_requires_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        let exe = dir.path().join("chromium");
        std::fs::write(&plain, b"").unwrap();
        std::fs::write(&exe, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(first_executable(&[plain, exe.clone()]), Some(exe));
    }

    #[test]
    fn not_found_message_mentions_override() {
        let e = ChromeAutoError::NotFound { searched: 7 };
        let msg = e.to_string();
        assert!(msg.contains("7 locations"), "got: {msg}");
        assert!(msg.contains("CHROME_PATH"), "got: {msg}");
    }
}
