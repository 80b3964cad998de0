//! `WIFI:` barcode payload.
//!
//! Format: `WIFI:T:<type>;S:<ssid>;P:<password>;;`. Values are written as-is,
//! without escaping, so an SSID containing `;` does not survive a round trip.
//!
//! # Example
//!
//! ```
//! use wifi_barcode::{NetworkType, WifiConfig};
//!
//! let config = WifiConfig::new("Home", "secret123", NetworkType::Wpa).unwrap();
//! assert_eq!(config.to_payload(), "WIFI:T:WPA;S:Home;P:secret123;;");
//!
//! let scanned = WifiConfig::from_payload("WIFI:S:Home;T:WPA;P:secret123;;").unwrap();
//! assert_eq!(scanned, config);
//! ```

use crate::config::{NetworkType, WifiConfig};
use log::debug;
use std::fmt;

/// Payload prefix.
pub const PREFIX: &str = "WIFI:";

/// Password field value for open networks.
const NOPASS: &str = "nopass";

impl WifiConfig {
    /// Encode as a barcode payload.
    pub fn to_payload(&self) -> String {
        let password = if self.is_open() {
            NOPASS
        } else {
            self.password.as_str()
        };
        format!(
            "{}T:{};S:{};P:{};;",
            PREFIX,
            self.network_type.as_str(),
            self.ssid,
            password
        )
    }

    /// Decode a scanned barcode payload.
    ///
    /// The result is not validated: scanned codes are taken as they are.
    pub fn from_payload(text: &str) -> Result<Self, PayloadError> {
        let body = text
            .trim_end_matches(['\r', '\n'])
            .strip_prefix(PREFIX)
            .ok_or(PayloadError::MissingPrefix)?;

        let mut ssid = None;
        let mut password = None;
        let mut network_type = None;

        // At most three fields; the last one keeps any `;` inside it.
        for field in body.splitn(3, ';') {
            if let Some(value) = field.strip_prefix("S:") {
                ssid = Some(strip_terminator(value));
            } else if let Some(value) = field.strip_prefix("P:") {
                password = Some(strip_terminator(value));
            } else if let Some(value) = field.strip_prefix("T:") {
                network_type = parse_type(value);
            } else if !field.is_empty() {
                debug!("ignoring payload field {:?}", field);
            }
        }

        let ssid = ssid.filter(|s| !s.is_empty()).ok_or(PayloadError::MissingSsid)?;
        let network_type = network_type.unwrap_or(if password.is_some_and(|p| !p.is_empty()) {
            NetworkType::Wpa
        } else {
            NetworkType::Open
        });
        let password = match network_type {
            NetworkType::Open => String::new(),
            _ => password.unwrap_or_default().to_string(),
        };

        Ok(Self {
            ssid: ssid.to_string(),
            password,
            network_type,
        })
    }
}

/// Drop a trailing `;` or `;;`.
fn strip_terminator(value: &str) -> &str {
    let value = value.strip_suffix(';').unwrap_or(value);
    value.strip_suffix(';').unwrap_or(value)
}

/// Prefix match on the type field, so `WPA2` reads as WPA.
fn parse_type(value: &str) -> Option<NetworkType> {
    let value = value.to_uppercase();
    if value.starts_with("NOPASS") {
        Some(NetworkType::Open)
    } else if value.starts_with("WEP") {
        Some(NetworkType::Wep)
    } else if value.starts_with("WPA") {
        Some(NetworkType::Wpa)
    } else {
        None
    }
}

/// Errors that can occur while decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Text does not start with `WIFI:`.
    MissingPrefix,
    /// No `S:` field, or an empty one.
    MissingSsid,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "not a Wi-Fi barcode (missing {})", PREFIX),
            Self::MissingSsid => write!(f, "barcode has no SSID"),
        }
    }
}

impl std::error::Error for PayloadError {}
