//! Barcode image cache.
//!
//! Images are keyed by their chart URL. Lookups go to a bounded in-memory
//! layer first and fall back to a [`BarcodeStorage`] backend; anything found
//! there is promoted to memory. On a miss, [`BarcodeCache::get_or_fetch`]
//! asks a [`ChartFetcher`] once and stores the result in both layers.
//!
//! The memory layer uses an LRU (Least Recently Used) eviction policy when
//! it reaches capacity. Evicted images stay in storage.

use super::fetch::{ChartFetcher, FetchError};
use log::{debug, info, warn};
use reqwest::Url;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extension of stored images.
const IMAGE_EXT: &str = "png";

/// Configuration for the barcode cache.
#[derive(Debug, Clone, Copy)]
pub struct BarcodeCacheConfig {
    /// Maximum number of images held in memory.
    pub max_entries: usize,
}

impl Default for BarcodeCacheConfig {
    fn default() -> Self {
        Self { max_entries: 32 }
    }
}

impl BarcodeCacheConfig {
    /// Validate configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_entries` is 0.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Persistent backend behind the memory layer.
pub trait BarcodeStorage {
    /// Load the image stored under `key`, if any.
    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any previous image.
    fn store(&mut self, key: &str, bytes: &[u8]) -> io::Result<()>;

    /// Check whether an image is stored under `key`.
    fn contains(&self, key: &str) -> bool;

    /// Remove the image stored under `key`. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> io::Result<()>;

    /// Remove every stored image.
    fn clear(&mut self) -> io::Result<()>;
}

/// One file per image in a cache directory.
///
/// File names are the hex SHA-256 of the key, so any URL maps to a safe,
/// fixed-length name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for storage, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds (or would hold) the image for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{:x}.{}", digest, IMAGE_EXT))
    }
}

impl BarcodeStorage for FileStorage {
    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);
        // Write then rename so a reader never sees a half-written image
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        debug!("stored {} bytes at {:?}", bytes.len(), path);
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn clear(&mut self) -> io::Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == IMAGE_EXT) {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Storage that lives only as long as the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl BarcodeStorage for MemoryStorage {
    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.images.get(key).cloned())
    }

    fn store(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.images.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.images.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.images.clear();
        Ok(())
    }
}

/// Image held in the memory layer.
#[derive(Debug)]
struct MemoryEntry {
    bytes: Vec<u8>,
    /// Access tick, for LRU eviction.
    last_used: u64,
}

/// Two-level cache of barcode images keyed by chart URL.
///
/// # Example
///
/// ```
/// use wifi_barcode::{BarcodeCache, BarcodeCacheConfig, MemoryStorage};
///
/// let mut cache = BarcodeCache::new(MemoryStorage::new(), BarcodeCacheConfig::default()).unwrap();
/// cache.put("http://chart/?chl=A", vec![1, 2, 3]).unwrap();
/// assert_eq!(cache.get("http://chart/?chl=A"), Some(&[1u8, 2, 3][..]));
/// assert_eq!(cache.get("http://chart/?chl=B"), None);
/// ```
pub struct BarcodeCache<S> {
    config: BarcodeCacheConfig,
    storage: S,
    memory: HashMap<String, MemoryEntry>,
    tick: u64,
}

impl<S: BarcodeStorage> BarcodeCache<S> {
    /// Create a cache over `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(storage: S, config: BarcodeCacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            config,
            storage,
            memory: HashMap::with_capacity(config.max_entries),
            tick: 0,
        })
    }

    /// Look up an image, promoting it from storage on a memory miss.
    ///
    /// A storage read failure is logged and treated as a miss.
    pub fn get(&mut self, key: &str) -> Option<&[u8]> {
        if !self.memory.contains_key(key) {
            match self.storage.load(key) {
                Ok(Some(bytes)) => {
                    info!("Loaded barcode from storage");
                    self.insert_memory(key, bytes);
                }
                Ok(None) => {
                    debug!("cache miss for {}", key);
                    return None;
                }
                Err(e) => {
                    warn!("Failed to read cached barcode: {}", e);
                    return None;
                }
            }
        }

        self.tick += 1;
        let tick = self.tick;
        self.memory.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.bytes.as_slice()
        })
    }

    /// Store an image in both layers.
    pub fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<&[u8], CacheError> {
        self.storage.store(key, &bytes)?;
        Ok(self.insert_memory(key, bytes))
    }

    /// Return the image for `url`, fetching and storing it on a miss.
    ///
    /// The fetcher is called at most once. If it fails nothing is cached.
    pub fn get_or_fetch<F>(&mut self, url: &Url, fetcher: &F) -> Result<&[u8], CacheError>
    where
        F: ChartFetcher + ?Sized,
    {
        let key = url.as_str();
        if self.get(key).is_none() {
            info!("Barcode not cached, fetching it");
            let bytes = fetcher.fetch(url)?;
            return self.put(key, bytes);
        }
        self.get(key)
            .ok_or_else(|| CacheError::Io(io::ErrorKind::NotFound.into()))
    }

    /// Check if an image is cached in either layer (without promoting it).
    pub fn contains(&self, key: &str) -> bool {
        self.memory.contains_key(key) || self.storage.contains(key)
    }

    /// Remove an image from both layers.
    pub fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        self.memory.remove(key);
        self.storage.remove(key)?;
        Ok(())
    }

    /// Remove every image from both layers.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.memory.clear();
        self.storage.clear()?;
        Ok(())
    }

    /// Number of images in the memory layer.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Check if the memory layer is empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &BarcodeCacheConfig {
        &self.config
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn insert_memory(&mut self, key: &str, bytes: Vec<u8>) -> &[u8] {
        if !self.memory.contains_key(key) && self.memory.len() >= self.config.max_entries {
            self.evict_lru();
        }

        self.tick += 1;
        let tick = self.tick;
        let entry = self
            .memory
            .entry(key.to_string())
            .or_insert_with(|| MemoryEntry {
                bytes: Vec::new(),
                last_used: tick,
            });
        entry.bytes = bytes;
        entry.last_used = tick;
        entry.bytes.as_slice()
    }

    /// Evict the least recently used memory entry.
    ///
    /// This performs a full scan (O(n) in number of entries), which is fine
    /// for the small number of images held.
    fn evict_lru(&mut self) {
        let lru_key = self
            .memory
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = lru_key {
            debug!("evicting {} from memory", key);
            self.memory.remove(&key);
        }
    }
}

/// Error type for barcode cache operations.
#[derive(Debug)]
pub enum CacheError {
    /// Invalid configuration parameter.
    InvalidConfig(&'static str),
    /// Storage backend failure.
    Io(io::Error),
    /// Fetching a missing image failed.
    Fetch(FetchError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            Self::Io(e) => write!(f, "cache storage error: {}", e),
            Self::Fetch(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::Io(e) => Some(e),
            Self::Fetch(e) => Some(e),
        }
    }
}

impl From<io::Error> for CacheError {
    fn from(e: io::Error) -> Self {
        CacheError::Io(e)
    }
}

impl From<FetchError> for CacheError {
    fn from(e: FetchError) -> Self {
        CacheError::Fetch(e)
    }
}
