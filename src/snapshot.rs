//! Snapshot export and import.
//!
//! A [`Snapshot`] is the full set of entries physically present in a cache,
//! each with its absolute expiration instant. Restoring merges it into a
//! cache: keys holding a live entry are kept, absent or expired ones are
//! overwritten. Because deadlines are absolute, restored entries keep the
//! same remaining lifetime they had when exported (minus elapsed time).
//!
//! Snapshots are encoded as JSON. Nothing is fsynced; a snapshot file is a
//! convenience, not a durability guarantee.

use crate::cache::Cache;
use crate::error::Result;
use crate::storage::Entry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// A point-in-time copy of a cache's entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<V> {
    pub entries: HashMap<String, Entry<V>>,
}

impl<V> Default for Snapshot<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> Snapshot<V> {
    pub fn new(entries: HashMap<String, Entry<V>>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Snapshot<V> {
    /// Encodes the snapshot to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

impl<V: DeserializeOwned> Snapshot<V> {
    /// Decodes a snapshot from `reader`.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(reader))?)
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Exports every physically present entry, including expired ones that
    /// have not been reaped yet.
    pub fn snapshot(&self) -> Snapshot<V> {
        Snapshot::new(self.all_entries())
    }

    /// Merges `snapshot` into the cache, skipping keys that hold a live
    /// entry. Returns how many entries were written.
    pub fn restore(&self, snapshot: Snapshot<V>) -> usize {
        let offered = snapshot.len();
        let mut written = 0;
        for (key, entry) in snapshot.entries {
            if self.merge_entry(key, entry) {
                written += 1;
            }
        }
        debug!(offered, written, "Snapshot restored");
        written
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + Serialize + 'static,
{
    /// Writes a snapshot of the cache to `writer`.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        self.snapshot().write_to(writer)
    }

    /// Writes a snapshot to `path`, creating or truncating the file.
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.save(file)?;
        debug!(path = %path.as_ref().display(), "Snapshot saved");
        Ok(())
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + DeserializeOwned + 'static,
{
    /// Reads a snapshot from `reader` and merges it into the cache.
    ///
    /// On a decode error the cache is left unchanged.
    pub fn load<R: Read>(&self, reader: R) -> Result<usize> {
        let snapshot = Snapshot::read_from(reader)?;
        Ok(self.restore(snapshot))
    }

    /// Reads a snapshot file and merges it into the cache.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let file = File::open(path.as_ref())?;
        self.load(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, Expiration};
    use crate::storage::ManualClock;
    use crate::Value;
    use std::sync::Arc;
    use std::time::Duration;

    fn manual_cache() -> (Cache, Arc<ManualClock>) {
        let source = Arc::new(ManualClock::new(1_000));
        let cache = Cache::with_time_source(CacheConfig::default(), source.clone()).unwrap();
        cache.close();
        (cache, source)
    }

    #[test]
    fn test_snapshot_includes_unreaped_entries() {
        let (cache, source) = manual_cache();
        cache.set("live", 1i32, Expiration::Never);
        cache.set("stale", 2i32, Duration::from_secs(1));
        source.advance(Duration::from_secs(2));
        cache.clock().refresh();

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(cache.items().len(), 1);
    }

    #[test]
    fn test_restore_skips_live_keys() {
        let (source_cache, _) = manual_cache();
        source_cache.set("a", "from-snapshot", Expiration::Never);
        source_cache.set("b", "from-snapshot", Expiration::Never);
        source_cache.set("c", "from-snapshot", Expiration::Never);
        let snapshot = source_cache.snapshot();

        let (target, clock) = manual_cache();
        target.set("a", "live", Expiration::Never);
        target.set("b", "stale", Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        target.clock().refresh();

        assert_eq!(target.restore(snapshot), 2);
        assert_eq!(target.get("a"), Some(Value::from("live")));
        assert_eq!(target.get("b"), Some(Value::from("from-snapshot")));
        assert_eq!(target.get("c"), Some(Value::from("from-snapshot")));
    }

    #[test]
    fn test_save_and_load_buffer() {
        let (cache, _) = manual_cache();
        cache.set("n", 42u32, Duration::from_secs(30));
        cache.set("s", "hello", Expiration::Never);

        let mut buf = Vec::new();
        cache.save(&mut buf).unwrap();

        let (restored, _) = manual_cache();
        assert_eq!(restored.load(buf.as_slice()).unwrap(), 2);
        assert_eq!(restored.get("n"), Some(Value::from(42u32)));
        assert_eq!(
            restored.get_with_expiration("n").map(|(_, e)| e),
            cache.get_with_expiration("n").map(|(_, e)| e)
        );
    }

    #[test]
    fn test_load_garbage_leaves_cache_unchanged() {
        let (cache, _) = manual_cache();
        cache.set("k", 1i32, Expiration::Never);
        let err = cache.load(&b"not json"[..]).unwrap_err();
        assert!(matches!(err, crate::CacheError::Serialization(_)));
        assert_eq!(cache.item_count(), 1);
    }
}
