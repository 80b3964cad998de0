//! Runtime settings resolved from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `WIFI_BARCODE_CACHE_DIR` | `~/.wifi-barcode` |
//! | `WIFI_BARCODE_CHART_URL` | `http://chart.apis.google.com/chart` |
//! | `WIFI_BARCODE_SIZE` | `200` |
//! | `WIFI_BARCODE_BG` | `ffffff` |

use crate::barcode::ChartOptions;
use log::warn;
use reqwest::Url;
use std::path::PathBuf;

/// Cache directory override.
pub const ENV_CACHE_DIR: &str = "WIFI_BARCODE_CACHE_DIR";

/// Chart service base URL override.
pub const ENV_CHART_URL: &str = "WIFI_BARCODE_CHART_URL";

/// Barcode edge length in pixels.
pub const ENV_CHART_SIZE: &str = "WIFI_BARCODE_SIZE";

/// Barcode background colour (hex RGB).
pub const ENV_CHART_BG: &str = "WIFI_BARCODE_BG";

/// Directory name under `$HOME`.
const DEFAULT_DIR_NAME: &str = ".wifi-barcode";

/// Resolved settings for the host layer.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of all cached data.
    pub cache_dir: PathBuf,
    /// Chart service parameters.
    pub chart: ChartOptions,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`, falling back to defaults for
    /// missing or invalid values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_dir = match lookup(ENV_CACHE_DIR) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_cache_dir(lookup("HOME")),
        };

        let mut chart = ChartOptions::default();

        if let Some(url) = lookup(ENV_CHART_URL) {
            match Url::parse(&url) {
                Ok(url) => chart.base_url = url,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_CHART_URL, url, e),
            }
        }

        if let Some(size) = lookup(ENV_CHART_SIZE) {
            match size.trim().parse::<u32>() {
                Ok(size) if size > 0 => chart.size = size,
                _ => warn!("Ignoring {}={:?}: not a positive integer", ENV_CHART_SIZE, size),
            }
        }

        if let Some(bg) = lookup(ENV_CHART_BG) {
            let bg = bg.trim().trim_start_matches('#');
            if bg.len() == 6 && bg.chars().all(|c| c.is_ascii_hexdigit()) {
                chart.background = bg.to_lowercase();
            } else {
                warn!("Ignoring {}={:?}: expected RRGGBB", ENV_CHART_BG, bg);
            }
        }

        Self { cache_dir, chart }
    }

    /// Directory holding cached barcode images.
    pub fn barcode_dir(&self) -> PathBuf {
        self.cache_dir.join("barcodes")
    }

    /// Location of the cached `wpa_supplicant.conf` copy.
    pub fn supplicant_copy(&self) -> PathBuf {
        self.cache_dir.join("wpa_supplicant.conf")
    }
}

/// `$HOME/.wifi-barcode`, or a temp directory when `HOME` is not set.
fn default_cache_dir(home: Option<String>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_DIR_NAME),
        _ => {
            warn!("HOME not set, caching under the temp directory");
            std::env::temp_dir().join("wifi-barcode")
        }
    }
}
