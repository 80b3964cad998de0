//! Saved Wi-Fi credential recovery.
//!
//! # Components
//!
//! - [`supplicant`] - scanner for plaintext `wpa_supplicant.conf`
//! - [`backup_xml`] - scanner for Android settings-backup XML
//! - [`source`] - file-backed [`CredentialSource`] implementations
//!
//! Both scanners are stateless: raw text or a stream in, an optional
//! password out. "Not found" is `None`, never an error.

pub mod backup_xml;
pub mod source;
pub mod supplicant;

pub use source::{
    discover_sources, flush_cached_copy, source_for_path, BackupXmlFile, SupplicantFile,
    DEFAULT_PATTERNS,
};

use std::fmt;
use std::io;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One saved network and its key, if the source had one.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct WifiCredential {
    /// Network SSID, without surrounding quotes.
    pub ssid: String,
    /// PSK or first WEP key. `None` for open or enterprise networks.
    pub password: Option<String>,
}

impl WifiCredential {
    /// Create a credential entry.
    pub fn new(ssid: impl Into<String>, password: Option<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password,
        }
    }
}

// Keep keys out of debug logs.
impl fmt::Debug for WifiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredential")
            .field("ssid", &self.ssid)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

/// A place saved Wi-Fi credentials can be read from.
///
/// The host picks an implementation depending on what the platform exposes:
/// a copy of the live supplicant file or a restored settings backup.
pub trait CredentialSource {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &str;

    /// File the source reads.
    fn path(&self) -> &Path;

    /// Look up the key for one SSID.
    fn find_password(&self, ssid: &str) -> Result<Option<String>, ScanError>;

    /// List every network the source knows.
    fn list(&self) -> Result<Vec<WifiCredential>, ScanError>;
}

/// Errors that can occur while scanning a credential source.
#[derive(Debug)]
pub enum ScanError {
    /// Reading the underlying file or stream failed.
    Io(io::Error),
    /// The XML document is malformed.
    Xml(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "read failed: {}", e),
            Self::Xml(msg) => write!(f, "malformed XML: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Xml(_) => None,
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(e: io::Error) -> Self {
        ScanError::Io(e)
    }
}

impl From<quick_xml::Error> for ScanError {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(io) => {
                ScanError::Io(io::Error::new(io.kind(), io.to_string()))
            }
            other => ScanError::Xml(other.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for ScanError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ScanError::Xml(e.to_string())
    }
}

/// Remove one pair of surrounding double quotes, if present.
pub(crate) fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
