//! # Aggregation Store
//! Latest record list per source, shared between the scheduler (sole writer)
//! and any number of HTTP readers.
//!
//! Each entry is an `Arc<Vec<Record>>` built outside the lock, so `put` holds
//! the write lock only for one swap and `snapshot` holds the read lock only to
//! clone a handful of `Arc`s. A reader therefore always sees, for every key,
//! a complete list from some finished refresh.

use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ingest::types::Record;

/// One source's published list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub key: String,
    pub records: Arc<Vec<Record>>,
}

/// Point-in-time view of every source. Keys keep first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "ser_sources", deserialize_with = "de_sources")]
    pub sources: Vec<SourceEntry>,
}

impl Snapshot {
    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.sources
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.records.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|e| e.key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn ser_sources<S: Serializer>(sources: &[SourceEntry], s: S) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(sources.len()))?;
    for e in sources {
        map.serialize_entry(&e.key, e.records.as_slice())?;
    }
    map.end()
}

fn de_sources<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<SourceEntry>, D::Error> {
    struct OrderedSources;

    impl<'de> Visitor<'de> for OrderedSources {
        type Value = Vec<SourceEntry>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of source key to record list")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut out: Vec<SourceEntry> = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, records)) = access.next_entry::<String, Vec<Record>>()? {
                let records = Arc::new(records);
                match out.iter_mut().find(|e| e.key == key) {
                    Some(e) => e.records = records,
                    None => out.push(SourceEntry { key, records }),
                }
            }
            Ok(out)
        }
    }

    d.deserialize_map(OrderedSources)
}

/// Cloneable handle to the shared store.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Snapshot>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a previously persisted snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Replace the entry for `key` wholesale. New keys are appended.
    pub fn put(&self, key: &str, records: Vec<Record>) {
        let records = Arc::new(records);
        let now = Utc::now();

        let mut snap = self.inner.write().unwrap_or_else(|p| p.into_inner());
        match snap.sources.iter_mut().find(|e| e.key == key) {
            Some(e) => e.records = records,
            None => snap.sources.push(SourceEntry {
                key: key.to_string(),
                records,
            }),
        }
        snap.generated_at = Some(now);
    }

    /// Consistent copy of the whole mapping.
    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<Record>>> {
        let snap = self.inner.read().unwrap_or_else(|p| p.into_inner());
        snap.sources
            .iter()
            .find(|e| e.key == key)
            .map(|e| Arc::clone(&e.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn recs(tag: &str, n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("{tag}-{i}"), format!("https://x/{tag}/{i}")))
            .collect()
    }

    #[test]
    fn put_replaces_without_merging() {
        let store = Store::new();
        store.put("a", recs("old", 3));
        store.put("a", recs("new", 1));
        let snap = store.snapshot();
        assert_eq!(snap.get("a").unwrap(), recs("new", 1).as_slice());
        assert_eq!(snap.sources.len(), 1);
    }

    #[test]
    fn keys_keep_first_insertion_order() {
        let store = Store::new();
        store.put("zhihu", recs("z", 1));
        store.put("weibo", recs("w", 1));
        store.put("zhihu", recs("z2", 2));
        let keys: Vec<_> = store.snapshot().keys().map(str::to_string).collect();
        assert_eq!(keys, vec!["zhihu", "weibo"]);
    }

    #[test]
    fn snapshot_is_detached_from_later_puts() {
        let store = Store::new();
        store.put("a", recs("v1", 2));
        let before = store.snapshot();
        store.put("a", recs("v2", 5));
        assert_eq!(before.get("a").unwrap().len(), 2);
        assert_eq!(store.snapshot().get("a").unwrap().len(), 5);
    }

    #[test]
    fn readers_never_see_partial_lists() {
        let store = Store::new();
        store.put("k", recs("g0", 50));

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for g in 1..200 {
                    store.put("k", recs(&format!("g{g}"), 50));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = store.snapshot();
                        let list = snap.get("k").unwrap();
                        assert_eq!(list.len(), 50);
                        let gen = list[0].title.split('-').next().unwrap().to_string();
                        assert!(list.iter().all(|r| r.title.starts_with(&format!("{gen}-"))));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }

    #[test]
    fn json_keeps_html_characters_literal() {
        let store = Store::new();
        store.put("s", vec![Record::new("<b>A & B</b>", "https://x/?a=1&b=2")]);
        let json = serde_json::to_string(&store.snapshot()).unwrap();
        assert!(json.contains(r#""<b>A & B</b>""#), "{json}");
        assert!(json.contains("a=1&b=2"));
        assert!(!json.contains("\\u003c"));
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let store = Store::new();
        store.put("b", recs("b", 1));
        store.put("a", recs("a", 2));
        let snap = store.snapshot();
        let back: Snapshot = serde_json::from_str(&serde_json::to_string(&snap).unwrap()).unwrap();
        assert_eq!(back, snap);
    }
}
