//! Keyed lookups against external delimited files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use csv::ReaderBuilder;
use log::debug;

use crate::fs::resolve_path;
use crate::Error;

/// A key-to-value mapping loaded from a lookup file.
pub type LookupMap = HashMap<String, String>;

/// Loads and memoizes key/value maps from delimited lookup files.
///
/// Maps are cached by `(resolved path, key column, value column)` identity
/// and never invalidated: a file changed on disk is not re-read. Like the
/// template registry, a provider is created per run; callers needing fresh
/// data construct a fresh one.
#[derive(Debug, Default)]
pub struct Lookups {
    cache: RwLock<HashMap<(PathBuf, String, String), Arc<LookupMap>>>,
}

impl Lookups {
    /// Constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the key-to-value map for the given lookup file and column pair.
    ///
    /// Column names and every key/value cell are whitespace-trimmed before
    /// the map is built. When a key occurs more than once in the file, the
    /// last occurrence wins.
    pub fn get_map<P: AsRef<Path>>(
        &self,
        file: P,
        key_column: &str,
        value_column: &str,
    ) -> Result<Arc<LookupMap>, Error> {
        let key_column = key_column.trim();
        let value_column = value_column.trim();
        let id = (
            resolve_path(file.as_ref()),
            key_column.to_string(),
            value_column.to_string(),
        );
        if let Some(map) = self
            .cache
            .read()
            .expect("lookup cache lock poisoned")
            .get(&id)
        {
            debug!("Reusing cached lookup map for {}", id.0.display());
            return Ok(Arc::clone(map));
        }
        let map = Arc::new(load_map(&id.0, key_column, value_column)?);
        debug!(
            "Loaded {} lookup entries from {}",
            map.len(),
            id.0.display()
        );
        self.cache
            .write()
            .expect("lookup cache lock poisoned")
            .insert(id, Arc::clone(&map));
        Ok(map)
    }
}

fn load_map(file: &Path, key_column: &str, value_column: &str) -> Result<LookupMap, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(file)?;
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<String>>();
    let column_index = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingLookupColumn {
                file: file.to_path_buf(),
                column: name.to_string(),
            })
    };
    let key_index = column_index(key_column)?;
    let value_index = column_index(value_column)?;
    let mut map = LookupMap::new();
    for record in reader.records() {
        let record = record?;
        let key = record.get(key_index).unwrap_or("").trim().to_string();
        let value = record.get(value_index).unwrap_or("").trim().to_string();
        map.insert(key, value);
    }
    Ok(map)
}
