//! File-backed credential sources.
//!
//! Reading the live system files needs root. The host is expected to copy
//! them somewhere readable first (or restore a settings backup); these
//! sources only ever read the copy.

use super::{backup_xml, supplicant, CredentialSource, ScanError, WifiCredential};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Locations of saved Wi-Fi configuration on Android, newest first.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "/data/misc/apexdata/com.android.wifi/WifiConfigStore*.xml",
    "/data/misc/wifi/WifiConfigStore*.xml",
    "/data/misc/wifi/wpa_supplicant.conf",
];

/// A copy of `wpa_supplicant.conf`.
#[derive(Debug, Clone)]
pub struct SupplicantFile {
    path: PathBuf,
}

impl SupplicantFile {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSource for SupplicantFile {
    fn name(&self) -> &str {
        "wpa_supplicant"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn find_password(&self, ssid: &str) -> Result<Option<String>, ScanError> {
        let file = File::open(&self.path)?;
        supplicant::find_password_in(BufReader::new(file), ssid)
    }

    fn list(&self) -> Result<Vec<WifiCredential>, ScanError> {
        let text = fs::read_to_string(&self.path)?;
        Ok(supplicant::parse_networks(&text))
    }
}

/// A restored settings backup or `WifiConfigStore.xml`.
#[derive(Debug, Clone)]
pub struct BackupXmlFile {
    path: PathBuf,
}

impl BackupXmlFile {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSource for BackupXmlFile {
    fn name(&self) -> &str {
        "backup-xml"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn find_password(&self, ssid: &str) -> Result<Option<String>, ScanError> {
        let file = File::open(&self.path)?;
        backup_xml::find_password(BufReader::new(file), ssid)
    }

    fn list(&self) -> Result<Vec<WifiCredential>, ScanError> {
        let file = File::open(&self.path)?;
        backup_xml::parse_networks(BufReader::new(file))
    }
}

/// Pick the source type for a file by its extension.
pub fn source_for_path(path: impl Into<PathBuf>) -> Box<dyn CredentialSource> {
    let path = path.into();
    let is_xml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    if is_xml {
        Box::new(BackupXmlFile::new(path))
    } else {
        Box::new(SupplicantFile::new(path))
    }
}

/// Find readable credential files matching `patterns`, in pattern order.
///
/// Unreadable matches are skipped with a warning.
pub fn discover_sources(patterns: &[&str]) -> Vec<Box<dyn CredentialSource>> {
    let mut sources = Vec::new();

    for pattern in patterns {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Invalid pattern {:?}: {}", pattern, e);
                continue;
            }
        };

        for path in paths.flatten() {
            match File::open(&path) {
                Ok(_) => {
                    info!("Found credential file {:?}", path);
                    sources.push(source_for_path(path));
                }
                Err(e) => warn!("Could not read {:?}: {}", path, e),
            }
        }
    }

    sources
}

/// Delete a cached copy of the supplicant file.
///
/// A missing file is not an error.
pub fn flush_cached_copy(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("Flushed cached credentials {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No cached credentials at {:?}", path);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
