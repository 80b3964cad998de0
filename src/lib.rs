//! Wi-Fi barcode library.
//!
//! Recovers saved Wi-Fi keys from `wpa_supplicant.conf` and Android
//! settings-backup XML, and renders networks as `WIFI:` QR barcodes fetched
//! from a chart service through a memory+disk cache.

pub mod barcode;
pub mod config;
pub mod credentials;
pub mod export;

// Re-export commonly used items
pub use barcode::{
    chart_url, BarcodeCache, BarcodeCacheConfig, BarcodeStorage, CacheError, ChartFetcher,
    ChartOptions, FetchError, FileStorage, HttpFetcher, MemoryStorage, PayloadError,
};
pub use config::{ConfigError, NetworkType, Settings, WifiConfig};
pub use credentials::{
    backup_xml, supplicant, BackupXmlFile, CredentialSource, ScanError, SupplicantFile,
    WifiCredential,
};
