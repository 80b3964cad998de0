//! Scanner for plaintext `wpa_supplicant.conf`.
//!
//! The file is a list of stanzas:
//!
//! ```text
//! network={
//!     ssid="Home"
//!     psk="correct horse"
//!     key_mgmt=WPA-PSK
//! }
//! ```
//!
//! Lines are grouped into stanzas at every `network=` line and every line
//! that is exactly `}`. A stanza is only inspected once it is complete, so a
//! truncated trailing stanza is never reported.
//!
//! # Example
//!
//! ```
//! use wifi_barcode::supplicant;
//!
//! let conf = "network={\n\tssid=\"Home\"\n\tpsk=\"secret123\"\n}\n";
//! assert_eq!(supplicant::find_password(conf, "Home"), Some("secret123".to_string()));
//! assert_eq!(supplicant::find_password(conf, "Office"), None);
//! ```

use super::{strip_quotes, ScanError, WifiCredential};
use log::debug;
use std::io::BufRead;

/// Key holding the first WEP key. Preferred over `psk` when both exist.
const WEP_KEY: &str = "wep_key0";

/// Key holding the WPA passphrase (quoted) or raw 64-hex PSK.
const PSK_KEY: &str = "psk";

/// Find the key of the first stanza whose `ssid` matches.
///
/// `ssid` may be given bare (`Home`) or quoted as Android reports it
/// (`"Home"`). A stanza that matches but holds neither `wep_key0` nor `psk`
/// ends the scan with `None`.
pub fn find_password(config_text: &str, ssid: &str) -> Option<String> {
    let mut scanner = StanzaScanner::new(ssid);
    for line in config_text.lines() {
        if let Some(result) = scanner.push_line(line) {
            return result;
        }
    }
    None
}

/// Stream variant of [`find_password`].
///
/// I/O errors are propagated. Anything else that goes wrong (truncated
/// stanza, garbage lines) yields `Ok(None)`.
pub fn find_password_in<R: BufRead>(reader: R, ssid: &str) -> Result<Option<String>, ScanError> {
    let mut scanner = StanzaScanner::new(ssid);
    for line in reader.lines() {
        if let Some(result) = scanner.push_line(&line?) {
            return Ok(result);
        }
    }
    Ok(None)
}

/// List every complete stanza that carries an `ssid`.
pub fn parse_networks(config_text: &str) -> Vec<WifiCredential> {
    let mut out = Vec::new();
    let mut block = NetworkBlock::default();
    for line in config_text.lines() {
        if is_boundary(line) {
            if let Some(ssid) = block.value_of("ssid") {
                out.push(WifiCredential::new(strip_quotes(ssid), block.key()));
            }
            block.clear();
        }
        block.push(line);
    }
    out
}

fn is_boundary(line: &str) -> bool {
    line.starts_with("network=") || line == "}"
}

/// Incremental stanza matcher shared by the string and stream entry points.
struct StanzaScanner<'a> {
    ssid: &'a str,
    block: NetworkBlock,
}

impl<'a> StanzaScanner<'a> {
    fn new(ssid: &'a str) -> Self {
        Self {
            ssid: strip_quotes(ssid),
            block: NetworkBlock::default(),
        }
    }

    /// Feed one line. Returns `Some(result)` once the scan is decided.
    fn push_line(&mut self, line: &str) -> Option<Option<String>> {
        if is_boundary(line) {
            if self.block.matches_ssid(self.ssid) {
                let key = self.block.key();
                debug!(
                    "stanza for {:?} matched, key {}",
                    self.ssid,
                    if key.is_some() { "found" } else { "missing" }
                );
                return Some(key);
            }
            self.block.clear();
        }
        self.block.push(line);
        None
    }
}

/// Raw lines of one `network={...}` stanza.
#[derive(Default)]
struct NetworkBlock {
    lines: Vec<String>,
}

impl NetworkBlock {
    fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn clear(&mut self) {
        self.lines.clear();
    }

    /// Value of the first `key=value` line for `key`, untrimmed of quotes.
    fn value_of(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let (k, v) = line.trim().split_once('=')?;
            (k == key).then_some(v)
        })
    }

    fn matches_ssid(&self, ssid: &str) -> bool {
        self.lines.iter().any(|line| {
            line.trim()
                .strip_prefix("ssid=")
                .is_some_and(|v| strip_quotes(v) == ssid)
        })
    }

    fn key(&self) -> Option<String> {
        self.value_of(WEP_KEY)
            .or_else(|| self.value_of(PSK_KEY))
            .map(|v| strip_quotes(v).to_string())
    }
}
