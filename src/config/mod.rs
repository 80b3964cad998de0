//! Configuration.
//!
//! # Components
//!
//! - [`wifi`] - the network form: SSID, key and security type
//! - [`settings`] - cache location and chart options, resolved from the
//!   environment

mod settings;
mod wifi;

pub use settings::{Settings, ENV_CACHE_DIR, ENV_CHART_BG, ENV_CHART_SIZE, ENV_CHART_URL};
pub use wifi::{
    ConfigError, NetworkType, WifiConfig, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN,
};
