use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use tracing::{debug, warn};

use crate::locks::{lock_or_recover, read_or_recover, write_or_recover};

use super::image_source::{DecodedImage, DiskImageSource, ImageLoadError, ImageSource};

static SHARED_IMAGE_CACHE: OnceLock<Arc<ImageCache>> = OnceLock::new();

/// Decoded look images keyed by file path.
///
/// `cached_image` is a pure lookup. `load_image_from_disk` populates the
/// cache and decodes a given path at most once: concurrent loaders of the
/// same path serialize on a per-path guard and re-check the cache before
/// decoding. Failed loads leave no entry behind, so a later call may retry.
pub struct ImageCache {
    source: Box<dyn ImageSource>,
    entries: RwLock<HashMap<PathBuf, Arc<DecodedImage>>>,
    load_guards: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    warned_failed_paths: Mutex<HashSet<PathBuf>>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::with_source(DiskImageSource)
    }
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: impl ImageSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            entries: RwLock::new(HashMap::new()),
            load_guards: Mutex::new(HashMap::new()),
            warned_failed_paths: Mutex::new(HashSet::new()),
        }
    }

    /// Process-wide cache backed by the disk image source.
    pub fn shared() -> Arc<ImageCache> {
        Arc::clone(SHARED_IMAGE_CACHE.get_or_init(|| Arc::new(ImageCache::new())))
    }

    pub fn cached_image(&self, path: &Path) -> Option<Arc<DecodedImage>> {
        read_or_recover(&self.entries, "image_cache_read")
            .get(path)
            .cloned()
    }

    pub fn load_image_from_disk(&self, path: &Path) {
        if self.contains(path) {
            return;
        }

        let guard = self.load_guard_for(path);
        {
            let _loading = lock_or_recover(&guard, "image_cache_load_guard");
            if !self.contains(path) {
                match self.source.decode(path) {
                    Ok(image) => {
                        debug!(
                            path = %path.display(),
                            width = image.width(),
                            height = image.height(),
                            "image_cache_populated"
                        );
                        write_or_recover(&self.entries, "image_cache_insert")
                            .entry(path.to_path_buf())
                            .or_insert_with(|| Arc::new(image));
                    }
                    Err(error) => self.warn_load_failure_once(path, &error),
                }
            }
        }
        self.release_load_guard(path, &guard);
    }

    /// Decodes `path` without touching the cache. Used as the last resort
    /// when population did not produce an entry.
    pub fn read_image_from_disk(&self, path: &Path) -> Result<Arc<DecodedImage>, ImageLoadError> {
        self.source.decode(path).map(Arc::new)
    }

    pub fn len(&self) -> usize {
        read_or_recover(&self.entries, "image_cache_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, path: &Path) -> bool {
        read_or_recover(&self.entries, "image_cache_contains").contains_key(path)
    }

    fn load_guard_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut guards = lock_or_recover(&self.load_guards, "image_cache_guards");
        Arc::clone(
            guards
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    // The entry is inserted before the guard is dropped from the map, so a
    // loader that creates a fresh guard afterwards always sees the hit.
    fn release_load_guard(&self, path: &Path, guard: &Arc<Mutex<()>>) {
        let mut guards = lock_or_recover(&self.load_guards, "image_cache_guards");
        if let Some(current) = guards.get(path) {
            if Arc::ptr_eq(current, guard) && Arc::strong_count(guard) <= 2 {
                guards.remove(path);
            }
        }
    }

    fn warn_load_failure_once(&self, path: &Path, error: &ImageLoadError) {
        let mut warned = lock_or_recover(&self.warned_failed_paths, "image_cache_warned");
        if !warned.insert(path.to_path_buf()) {
            return;
        }
        warn!(
            path = %path.display(),
            error = %error,
            "image_cache_decode_failed"
        );
    }
}
