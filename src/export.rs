//! JSON export of recovered credentials.
//!
//! # Example Output
//!
//! ```json
//! [
//!   {
//!     "ssid": "Home",
//!     "password": "secret123"
//!   },
//!   {
//!     "ssid": "Office",
//!     "password": ""
//!   }
//! ]
//! ```

use crate::credentials::WifiCredential;
use serde::Serialize;

/// Serialized form of one credential. Missing keys become `""`.
#[derive(Serialize)]
struct ExportEntry<'a> {
    ssid: &'a str,
    password: &'a str,
}

/// Render credentials as a pretty-printed JSON array.
///
/// Entries with an empty SSID are dropped and the rest are sorted
/// case-insensitively by SSID.
pub fn to_json(creds: &[WifiCredential]) -> serde_json::Result<String> {
    let mut entries: Vec<ExportEntry<'_>> = creds
        .iter()
        .filter(|c| !c.ssid.is_empty())
        .map(|c| ExportEntry {
            ssid: &c.ssid,
            password: c.password.as_deref().unwrap_or(""),
        })
        .collect();
    entries.sort_by_key(|e| e.ssid.to_lowercase());
    serde_json::to_string_pretty(&entries)
}
