use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mirage_shader::normalize_path;
use thiserror::Error;

/// Boxed error produced by a loader.
pub type LoadError = Box<dyn std::error::Error + Send + Sync + 'static>;

type FileLoader<C> = Rc<dyn Fn(&C, &Path) -> Result<Rc<dyn Any>, LoadError>>;

// ── CacheKey ──────────────────────────────────────────────────────────────

/// Identity of a cached resource: one file, or the ordered file list of a
/// resource linked from several files (e.g. a program).
///
/// Paths are lexically normalized, so `a/./b.vert` and `a/b.vert` share an
/// entry. Order is significant. A linked key never equals a file key, even
/// when it names a single path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    File(PathBuf),
    Linked(Vec<PathBuf>),
}

impl CacheKey {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(normalize_path(path.as_ref()))
    }

    pub fn linked<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::Linked(paths.into_iter().map(|p| normalize_path(p.as_ref())).collect())
    }

    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::File(path) => std::slice::from_ref(path),
            Self::Linked(paths) => paths,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.paths().iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "`{}`", p.display())?;
        }
        Ok(())
    }
}

// ── CacheError ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CacheError {
    /// The loader failed; no entry was stored for `key`.
    #[error("failed to load {key}")]
    Load {
        key: CacheKey,
        #[source]
        source: LoadError,
    },

    #[error("no loader registered for extension `{extension}` (requested {key})")]
    NoLoader { key: CacheKey, extension: String },

    #[error("{key} is cached with a different type than `{expected}`")]
    TypeMismatch { key: CacheKey, expected: &'static str },
}

// ── ResourceCache ─────────────────────────────────────────────────────────

/// Keyed store of shared resources, each constructed at most once.
///
/// `C` is the construction context handed to file loaders (the GPU device in
/// the renderer). Entries live until [`clear`](Self::clear); there is no
/// per-entry eviction.
///
/// Single-threaded: entries are `Rc`.
pub struct ResourceCache<C> {
    entries: HashMap<CacheKey, Rc<dyn Any>>,
    loaders: HashMap<String, FileLoader<C>>,
}

impl<C> Default for ResourceCache<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            loaders: HashMap::new(),
        }
    }
}

impl<C> ResourceCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the default loader for files ending in `.{extension}`.
    ///
    /// Replaces any loader previously registered for the extension.
    pub fn register_loader<T, E, F>(&mut self, extension: &str, loader: F)
    where
        T: Any,
        E: Into<LoadError>,
        F: Fn(&C, &Path) -> Result<T, E> + 'static,
    {
        let erased: FileLoader<C> = Rc::new(move |ctx: &C, path: &Path| {
            loader(ctx, path)
                .map(|v| Rc::new(v) as Rc<dyn Any>)
                .map_err(Into::into)
        });
        self.loaders.insert(extension.to_string(), erased);
    }

    pub fn has_loader(&self, extension: &str) -> bool {
        self.loaders.contains_key(extension)
    }

    /// Returns the entry for `key`, constructing it with `load` on first use.
    ///
    /// `load` receives the cache so composite resources can fetch their
    /// parts. A failing `load` stores nothing.
    pub fn get_or_load<T, E, F>(&mut self, key: CacheKey, load: F) -> Result<Rc<T>, CacheError>
    where
        T: Any,
        E: Into<LoadError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        if let Some(entry) = self.entries.get(&key) {
            return downcast(&key, entry.clone());
        }

        let value = match load(self) {
            Ok(v) => Rc::new(v),
            Err(e) => {
                return Err(CacheError::Load {
                    key,
                    source: e.into(),
                });
            }
        };

        log::debug!("cached {key} as {}", type_name::<T>());
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    /// Loads `path` with the loader registered for its extension.
    pub fn load_file<T: Any>(&mut self, ctx: &C, path: impl AsRef<Path>) -> Result<Rc<T>, CacheError> {
        let path = normalize_path(path.as_ref());
        let key = CacheKey::File(path.clone());
        if let Some(entry) = self.entries.get(&key) {
            return downcast(&key, entry.clone());
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let Some(loader) = self.loaders.get(&extension).cloned() else {
            return Err(CacheError::NoLoader { key, extension });
        };

        let value = loader(ctx, &path).map_err(|source| CacheError::Load {
            key: key.clone(),
            source,
        })?;

        log::debug!("loaded {key}");
        self.entries.insert(key.clone(), value.clone());
        downcast(&key, value)
    }

    /// Loads every path in `paths` as a `U` (through the extension loaders),
    /// then combines the parts with `link`. The combined resource is cached
    /// under the whole path sequence; the parts are cached individually.
    pub fn load_linked<U, T, E, F, P>(&mut self, ctx: &C, paths: &[P], link: F) -> Result<Rc<T>, CacheError>
    where
        U: Any,
        T: Any,
        E: Into<LoadError>,
        F: FnOnce(&C, Vec<Rc<U>>) -> Result<T, E>,
        P: AsRef<Path>,
    {
        let key = CacheKey::linked(paths);
        let parts = key.paths().to_vec();

        self.get_or_load(key, |cache| -> Result<T, LoadError> {
            let units = parts
                .iter()
                .map(|p| cache.load_file::<U>(ctx, p))
                .collect::<Result<Vec<_>, _>>()?;
            link(ctx, units).map_err(Into::into)
        })
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    ///
    /// Call once at shutdown, after every holder has released its handles
    /// and before the GPU context goes away. Entries still referenced
    /// elsewhere are logged; their GPU objects outlive this call.
    pub fn clear(&mut self) {
        for (key, entry) in &self.entries {
            let holders = Rc::strong_count(entry) - 1;
            if holders > 0 {
                log::warn!("{key} is still referenced by {holders} holder(s) at cache clear");
            }
        }

        let n = self.entries.len();
        self.entries.clear();
        log::info!("resource cache cleared ({n} entries)");
    }
}

fn downcast<T: Any>(key: &CacheKey, entry: Rc<dyn Any>) -> Result<Rc<T>, CacheError> {
    entry.downcast::<T>().map_err(|_| CacheError::TypeMismatch {
        key: key.clone(),
        expected: type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;

    /// Load context that counts loader invocations.
    #[derive(Default)]
    struct Counter {
        calls: Cell<usize>,
    }

    #[derive(Debug, PartialEq)]
    struct Unit(String);

    #[derive(Debug)]
    struct Linked(Vec<Rc<Unit>>);

    fn cache() -> ResourceCache<Counter> {
        let mut cache = ResourceCache::new();
        cache.register_loader("vert", |ctx: &Counter, path: &Path| {
            ctx.calls.set(ctx.calls.get() + 1);
            Ok::<_, io::Error>(Unit(path.display().to_string()))
        });
        cache.register_loader("frag", |ctx: &Counter, path: &Path| {
            ctx.calls.set(ctx.calls.get() + 1);
            Ok::<_, io::Error>(Unit(path.display().to_string()))
        });
        cache.register_loader("bad", |_: &Counter, _: &Path| {
            Err::<Unit, _>(io::Error::new(io::ErrorKind::InvalidData, "broken"))
        });
        cache
    }

    // ── get_or_load ──

    #[test]
    fn same_key_loads_once_and_shares_instance() {
        let mut cache: ResourceCache<()> = ResourceCache::new();
        let mut calls = 0;

        let a = cache
            .get_or_load(CacheKey::file("x.res"), |_| {
                calls += 1;
                Ok::<_, io::Error>(42u32)
            })
            .unwrap();
        let b = cache
            .get_or_load(CacheKey::file("./x.res"), |_| {
                calls += 1;
                Ok::<_, io::Error>(7u32)
            })
            .unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(*b, 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn failed_load_leaves_no_entry_and_can_retry() {
        let mut cache: ResourceCache<()> = ResourceCache::new();
        let key = CacheKey::file("shader.frag");

        let err = cache
            .get_or_load(key.clone(), |_| {
                Err::<u32, _>(io::Error::new(io::ErrorKind::NotFound, "missing"))
            })
            .unwrap_err();
        assert!(matches!(err, CacheError::Load { .. }));
        assert!(!cache.contains(&key));

        let v = cache.get_or_load(key.clone(), |_| Ok::<_, io::Error>(1u32)).unwrap();
        assert_eq!(*v, 1);
        assert!(cache.contains(&key));
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut cache: ResourceCache<()> = ResourceCache::new();
        let key = CacheKey::file("a");
        cache.get_or_load(key.clone(), |_| Ok::<_, io::Error>(1u32)).unwrap();
        let err = cache
            .get_or_load(key, |_| Ok::<_, io::Error>(String::new()))
            .unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch { .. }));
    }

    // ── extension dispatch ──

    #[test]
    fn file_loads_dispatch_by_extension() {
        let mut cache = cache();
        let ctx = Counter::default();

        let a: Rc<Unit> = cache.load_file(&ctx, "s/a.vert").unwrap();
        let again: Rc<Unit> = cache.load_file(&ctx, "s/x/../a.vert").unwrap();
        assert!(Rc::ptr_eq(&a, &again));
        assert_eq!(a.0, "s/a.vert");
        assert_eq!(ctx.calls.get(), 1);

        let err = cache.load_file::<Unit>(&ctx, "s/a.geom").unwrap_err();
        assert!(matches!(err, CacheError::NoLoader { ref extension, .. } if extension == "geom"));
    }

    #[test]
    fn file_loader_failure_stores_nothing() {
        let mut cache = cache();
        let ctx = Counter::default();
        assert!(cache.load_file::<Unit>(&ctx, "x.bad").is_err());
        assert!(cache.is_empty());
    }

    // ── composite keys ──

    #[test]
    fn linked_resources_share_units_and_cache_combination() {
        let mut cache = cache();
        let ctx = Counter::default();
        let mut links = 0;

        let p1: Rc<Linked> = cache
            .load_linked(&ctx, &["a.vert", "a.frag"], |_, units: Vec<Rc<Unit>>| {
                links += 1;
                Ok::<_, io::Error>(Linked(units))
            })
            .unwrap();
        let p2: Rc<Linked> = cache
            .load_linked(&ctx, &["a.vert", "a.frag"], |_, units: Vec<Rc<Unit>>| {
                links += 1;
                Ok::<_, io::Error>(Linked(units))
            })
            .unwrap();
        assert!(Rc::ptr_eq(&p1, &p2));
        assert_eq!(links, 1);

        // A second program reuses the cached vertex unit.
        let p3: Rc<Linked> = cache
            .load_linked(&ctx, &["a.vert", "b.frag"], |_, units: Vec<Rc<Unit>>| {
                Ok::<_, io::Error>(Linked(units))
            })
            .unwrap();
        assert!(Rc::ptr_eq(&p1.0[0], &p3.0[0]));
        assert_eq!(ctx.calls.get(), 3);

        // Two programs + three units.
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn single_file_link_keeps_unit_entry() {
        let mut cache = cache();
        let ctx = Counter::default();

        let linked: Rc<Linked> = cache
            .load_linked(&ctx, &["s/a.vert"], |_, units: Vec<Rc<Unit>>| {
                Ok::<_, io::Error>(Linked(units))
            })
            .unwrap();
        let unit: Rc<Unit> = cache.load_file(&ctx, "s/a.vert").unwrap();

        assert!(Rc::ptr_eq(&linked.0[0], &unit));
        assert_eq!(ctx.calls.get(), 1);
        assert_eq!(cache.len(), 2);
        assert_ne!(CacheKey::linked(["s/a.vert"]), CacheKey::file("s/a.vert"));
    }

    #[test]
    fn failing_unit_aborts_link_without_entry() {
        let mut cache = cache();
        let ctx = Counter::default();
        let err = cache
            .load_linked(&ctx, &["a.vert", "b.bad"], |_, units: Vec<Rc<Unit>>| {
                Ok::<_, io::Error>(Linked(units))
            })
            .unwrap_err();
        assert!(matches!(err, CacheError::Load { .. }));
        assert!(!cache.contains(&CacheKey::linked(["a.vert", "b.bad"])));
        // The unit that did load stays cached.
        assert!(cache.contains(&CacheKey::file("a.vert")));
    }

    #[test]
    fn clear_drops_entries() {
        let mut cache = cache();
        let ctx = Counter::default();
        let held: Rc<Unit> = cache.load_file(&ctx, "a.vert").unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(Rc::strong_count(&held), 1);
    }

    #[test]
    fn key_display_joins_paths() {
        let key = CacheKey::linked(["a.vert", "b.frag"]);
        assert_eq!(key.to_string(), "`a.vert` + `b.frag`");
    }
}
