//! Wi-Fi network form.
//!
//! # Example
//!
//! ```
//! use wifi_barcode::{NetworkType, WifiConfig};
//!
//! let config = WifiConfig::new("MyNetwork", "MyPassword", NetworkType::Wpa).unwrap();
//! assert!(config.validate().is_ok());
//!
//! let kind: NetworkType = "wep".parse().unwrap();
//! assert_eq!(kind, NetworkType::Wep);
//! ```

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Security type of a network, as encoded in the `T:` barcode field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkType {
    /// Open network, no key.
    Open,
    /// Legacy WEP.
    Wep,
    /// WPA/WPA2 personal.
    #[default]
    Wpa,
}

impl NetworkType {
    /// Value of the `T:` barcode field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "nopass",
            Self::Wep => "WEP",
            Self::Wpa => "WPA",
        }
    }
}

impl std::str::FromStr for NetworkType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nopass" | "open" | "none" => Ok(Self::Open),
            "wep" => Ok(Self::Wep),
            "wpa" | "wpa2" => Ok(Self::Wpa),
            _ => Err(ConfigError::UnknownNetworkType(s.to_string())),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A network as entered in the form or read from a barcode.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct WifiConfig {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// Network key. Empty for open networks.
    pub password: String,
    /// Security type.
    #[zeroize(skip)]
    pub network_type: NetworkType,
}

impl WifiConfig {
    /// Create a new network configuration.
    ///
    /// Returns an error if the SSID or key are invalid for the type.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        network_type: NetworkType,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
            network_type,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration for an open network (no password).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new(), NetworkType::Open)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }

        match self.network_type {
            NetworkType::Open => {
                if !self.password.is_empty() {
                    return Err(ConfigError::PasswordNotAllowed);
                }
            }
            NetworkType::Wep => {
                if self.password.is_empty() {
                    return Err(ConfigError::PasswordTooShort { len: 0, min: 1 });
                }
                if self.password.len() > MAX_PASSWORD_LEN {
                    return Err(ConfigError::PasswordTooLong {
                        len: self.password.len(),
                        max: MAX_PASSWORD_LEN,
                    });
                }
            }
            NetworkType::Wpa => {
                if self.password.len() < MIN_PASSWORD_LEN {
                    return Err(ConfigError::PasswordTooShort {
                        len: self.password.len(),
                        min: MIN_PASSWORD_LEN,
                    });
                }
                if self.password.len() > MAX_PASSWORD_LEN {
                    return Err(ConfigError::PasswordTooLong {
                        len: self.password.len(),
                        max: MAX_PASSWORD_LEN,
                    });
                }
            }
        }

        Ok(())
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.network_type == NetworkType::Open
    }
}

impl fmt::Debug for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiConfig")
            .field("ssid", &self.ssid)
            .field("password", &"****")
            .field("network_type", &self.network_type)
            .finish()
    }
}

/// Errors that can occur during configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for the network type.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Open networks carry no password.
    PasswordNotAllowed,
    /// Unknown network type string.
    UnknownNetworkType(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::PasswordNotAllowed => write!(f, "open networks have no password"),
            Self::UnknownNetworkType(t) => {
                write!(f, "unknown network type: {} (expected nopass, wep or wpa)", t)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
