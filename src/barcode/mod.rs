//! QR barcode rendering for Wi-Fi networks.
//!
//! This module provides:
//! - [`payload`]: the `WIFI:` text carried by the barcode, both directions
//! - [`chart`]: URL of the chart service that renders the barcode
//! - [`BarcodeCache`]: memory+disk cache for fetched images
//! - [`ChartFetcher`]: how images are fetched on a cache miss

mod cache;
pub mod chart;
mod fetch;
pub mod payload;

pub use cache::{
    BarcodeCache, BarcodeCacheConfig, BarcodeStorage, CacheError, FileStorage, MemoryStorage,
};
pub use chart::{chart_url, ChartOptions, DEFAULT_CHART_URL};
pub use fetch::{ChartFetcher, FetchError, HttpFetcher, DEFAULT_FETCH_TIMEOUT};
pub use payload::PayloadError;
