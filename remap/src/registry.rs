//! Path-keyed, memoizing template loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::fs::resolve_path;
use crate::{Error, Template};

/// A memoizing template loader.
///
/// Templates are cached by resolved path, so repeated lookups of the same
/// file reuse the parsed value. The cache is never invalidated: a registry
/// is created per run and discarded at the end of it, and callers that need
/// to pick up on-disk changes construct a fresh one.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    cache: RwLock<HashMap<PathBuf, Arc<Template>>>,
}

impl TemplateRegistry {
    /// Constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the template at the given path, reusing the cached copy if this
    /// registry has loaded it before.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Template>, Error> {
        let key = resolve_path(path.as_ref());
        if let Some(template) = self
            .cache
            .read()
            .expect("template cache lock poisoned")
            .get(&key)
        {
            debug!("Reusing cached template for {}", key.display());
            return Ok(Arc::clone(template));
        }
        // The lock is not held across the load: two racing callers may both
        // parse the same file, and the last writer wins with a functionally
        // identical value.
        let template = Arc::new(Template::load(&key)?);
        debug!("Loaded template {} from {}", template.name, key.display());
        self.cache
            .write()
            .expect("template cache lock poisoned")
            .insert(key, Arc::clone(&template));
        Ok(template)
    }
}
