//! End-to-end barcode fetching against an in-process chart server.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tiny_http::{Response, Server};
use wifi_barcode::{
    chart_url, BarcodeCache, BarcodeCacheConfig, CacheError, ChartFetcher, ChartOptions,
    FetchError, FileStorage, HttpFetcher, NetworkType, WifiConfig,
};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Mock chart service: `/chart?...` answers with a fake PNG, anything else 404.
struct MockChart {
    port: u16,
    requests: Arc<AtomicUsize>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockChart {
    fn start() -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind mock server");
        let port = server
            .server_addr()
            .to_ip()
            .expect("ip listener")
            .port();

        let requests = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (requests_clone, shutdown_clone) = (requests.clone(), shutdown.clone());

        let handle = thread::spawn(move || {
            while !shutdown_clone.load(Ordering::Acquire) {
                match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(request)) => {
                        requests_clone.fetch_add(1, Ordering::SeqCst);
                        let response = if request.url().starts_with("/chart?") {
                            Response::from_data(PNG.to_vec()).with_status_code(200)
                        } else {
                            Response::from_data(b"Not Found".to_vec()).with_status_code(404)
                        };
                        let _ = request.respond(response);
                    }
                    Ok(None) => {}
                    Err(_) => break,
                }
            }
        });

        Self {
            port,
            requests,
            shutdown,
            handle: Some(handle),
        }
    }

    fn options(&self, path: &str) -> ChartOptions {
        ChartOptions {
            base_url: format!("http://127.0.0.1:{}{}", self.port, path)
                .parse()
                .unwrap(),
            ..ChartOptions::default()
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockChart {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn home() -> WifiConfig {
    WifiConfig::new("Home", "secret123", NetworkType::Wpa).unwrap()
}

#[test]
fn test_http_fetcher_ok() {
    let server = MockChart::start();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

    let url = chart_url(&home(), &server.options("/chart"));
    assert_eq!(fetcher.fetch(&url).unwrap(), PNG);
    assert_eq!(server.requests(), 1);
}

#[test]
fn test_http_fetcher_not_found() {
    let server = MockChart::start();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

    let url = chart_url(&home(), &server.options("/missing"));
    assert_eq!(fetcher.fetch(&url), Err(FetchError::Status(404)));
}

#[test]
fn test_cache_fetches_once_and_persists() {
    let server = MockChart::start();
    let dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let url = chart_url(&home(), &server.options("/chart"));

    {
        let storage = FileStorage::new(dir.path()).unwrap();
        let mut cache = BarcodeCache::new(storage, BarcodeCacheConfig::default()).unwrap();
        assert_eq!(cache.get_or_fetch(&url, &fetcher).unwrap(), PNG);
        assert_eq!(cache.get_or_fetch(&url, &fetcher).unwrap(), PNG);
        assert_eq!(server.requests(), 1);
        assert!(cache.storage().path_for(url.as_str()).is_file());
    }

    // A fresh cache over the same directory needs no request
    let storage = FileStorage::new(dir.path()).unwrap();
    let mut cache = BarcodeCache::new(storage, BarcodeCacheConfig::default()).unwrap();
    assert_eq!(cache.get_or_fetch(&url, &fetcher).unwrap(), PNG);
    assert_eq!(server.requests(), 1);
}

#[test]
fn test_cache_does_not_store_failures() {
    let server = MockChart::start();
    let dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let url = chart_url(&home(), &server.options("/missing"));

    let storage = FileStorage::new(dir.path()).unwrap();
    let mut cache = BarcodeCache::new(storage, BarcodeCacheConfig::default()).unwrap();
    let result = cache.get_or_fetch(&url, &fetcher);
    assert!(matches!(result, Err(CacheError::Fetch(FetchError::Status(404)))));
    assert!(!cache.contains(url.as_str()));
}
