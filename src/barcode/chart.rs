//! Chart service URL.
//!
//! The barcode image is rendered remotely by a Google-Chart-compatible
//! endpoint; the payload travels in the `chl` query parameter.

use crate::config::WifiConfig;
use reqwest::Url;

/// Default chart service endpoint.
pub const DEFAULT_CHART_URL: &str = "http://chart.apis.google.com/chart";

/// Rendering parameters for the chart service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// Endpoint the query is appended to.
    pub base_url: Url,
    /// Edge length of the square image in pixels.
    pub size: u32,
    /// Quiet-zone margin in modules (`chld`).
    pub margin: u32,
    /// Background colour as `rrggbb`.
    pub background: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_CHART_URL).expect("static URL"),
            size: 200,
            margin: 2,
            background: "ffffff".to_string(),
        }
    }
}

/// Build the chart URL rendering `config` as a QR code.
pub fn chart_url(config: &WifiConfig, options: &ChartOptions) -> Url {
    let mut url = options.base_url.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("cht", "qr")
        .append_pair("chs", &format!("{0}x{0}", options.size))
        .append_pair("chld", &options.margin.to_string())
        .append_pair("chf", &format!("bg,s,{}", options.background))
        .append_pair("chl", &config.to_payload());
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkType;

    #[test]
    fn test_chart_url() {
        let config = WifiConfig::new("Home", "secret123", NetworkType::Wpa).unwrap();
        let url = chart_url(&config, &ChartOptions::default());
        assert_eq!(
            url.as_str(),
            "http://chart.apis.google.com/chart?cht=qr&chs=200x200&chld=2&chf=bg%2Cs%2Cffffff\
             &chl=WIFI%3AT%3AWPA%3BS%3AHome%3BP%3Asecret123%3B%3B"
        );
    }

    #[test]
    fn test_chart_url_round_trips_payload() {
        let config = WifiConfig::new("My Net & Co", "p@ss w0rd", NetworkType::Wpa).unwrap();
        let url = chart_url(&config, &ChartOptions::default());
        let chl = url
            .query_pairs()
            .find(|(k, _)| k == "chl")
            .map(|(_, v)| v.into_owned());
        assert_eq!(chl.as_deref(), Some("WIFI:T:WPA;S:My Net & Co;P:p@ss w0rd;;"));
    }

    #[test]
    fn test_chart_url_replaces_base_query() {
        let options = ChartOptions {
            base_url: Url::parse("http://localhost:8080/chart?stale=1").unwrap(),
            size: 100,
            ..ChartOptions::default()
        };
        let url = chart_url(&WifiConfig::open("Cafe").unwrap(), &options);
        assert!(url.as_str().starts_with("http://localhost:8080/chart?cht=qr&chs=100x100"));
        assert!(!url.as_str().contains("stale"));
    }

    #[test]
    fn test_distinct_networks_distinct_urls() {
        let options = ChartOptions::default();
        let a = chart_url(&WifiConfig::open("A").unwrap(), &options);
        let b = chart_url(&WifiConfig::open("B").unwrap(), &options);
        assert_ne!(a, b);
    }
}
