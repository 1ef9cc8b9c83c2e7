//! In-process tree store with optional JSON file persistence.

use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};
use uuid::Uuid;

use crate::adapter::{Subscription, TreeStore};
use crate::error::StoreError;
use crate::path::StorePath;

/// Tree store held in memory, optionally mirrored to a JSON file.
///
/// Null values and empty objects never exist in the tree: writing them removes
/// the node, and parents left empty are pruned.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    persist_to: Option<PathBuf>,
}

struct Inner {
    root: Value,
    watchers: Vec<Watcher>,
}

struct Watcher {
    path: StorePath,
    tx: watch::Sender<Option<Value>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store without persistence.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()), None)
    }

    /// Store seeded with an initial tree.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidPath`] when the tree uses reserved keys.
    pub fn from_value(tree: Value) -> Result<Self, StoreError> {
        validate_keys(&StorePath::root(), &tree)?;
        let root = normalize(tree).unwrap_or_else(|| Value::Object(Map::new()));
        Ok(Self::with_root(root, None))
    }

    /// Open a store persisted at `file`, loading the tree if the file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(file: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = file.as_ref().to_path_buf();
        let root = match tokio::fs::read(&file).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Value::Object(Map::new()),
            Ok(bytes) => {
                let tree: Value = serde_json::from_slice(&bytes)?;
                validate_keys(&StorePath::root(), &tree)?;
                normalize(tree).unwrap_or_else(|| Value::Object(Map::new()))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
            Err(err) => return Err(err.into()),
        };
        info!(file = %file.display(), "Opened store");
        Ok(Self::with_root(root, Some(file)))
    }

    fn with_root(root: Value, persist_to: Option<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                root,
                watchers: Vec::new(),
            }),
            persist_to,
        }
    }

    /// File the tree is mirrored to, if any.
    #[must_use]
    pub fn persist_path(&self) -> Option<&Path> {
        self.persist_to.as_deref()
    }

    /// Apply `edit` to a copy of the tree, persist it, then commit and notify.
    ///
    /// The tree is left untouched if either step fails.
    async fn mutate<T: Send>(
        &self,
        changed: &StorePath,
        edit: impl FnOnce(&mut Value) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut next = inner.root.clone();
        let out = edit(&mut next)?;
        if next == inner.root {
            return Ok(out);
        }
        self.persist(&next).await?;
        inner.root = next;
        inner.notify(changed);
        drop(inner);
        Ok(out)
    }

    async fn persist(&self, tree: &Value) -> Result<(), StoreError> {
        let Some(file) = self.persist_to.clone() else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(tree)?;
        tokio::task::spawn_blocking(move || write_atomically(&file, &bytes))
            .await
            .map_err(|e| StoreError::Other(format!("Task join error: {e}")))?
    }
}

impl Inner {
    fn notify(&mut self, changed: &StorePath) {
        self.watchers.retain(|watcher| !watcher.tx.is_closed());
        for watcher in &self.watchers {
            if !watcher.path.overlaps(changed) {
                continue;
            }
            let fresh = snapshot_at(&self.root, &watcher.path);
            watcher.tx.send_if_modified(|current| {
                if *current == fresh {
                    false
                } else {
                    *current = fresh;
                    true
                }
            });
        }
    }
}

impl TreeStore for MemoryStore {
    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.watchers.retain(|watcher| !watcher.tx.is_closed());
        let (tx, rx) = watch::channel(snapshot_at(&inner.root, path));
        inner.watchers.push(Watcher {
            path: path.clone(),
            tx,
        });
        drop(inner);
        debug!(%path, "Registered subscription");
        Ok(Subscription::new(path.clone(), rx))
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        validate_keys(path, &value)?;
        self.mutate(path, |tree| {
            set_in(tree, path.segments(), normalize(value));
            Ok(())
        })
        .await?;
        debug!(%path, "Wrote node");
        Ok(())
    }

    async fn create(&self, path: &StorePath, value: Value) -> Result<bool, StoreError> {
        validate_keys(path, &value)?;
        let created = self
            .mutate(path, |tree| {
                if lookup(tree, path).is_some_and(|node| !is_empty_node(node)) {
                    return Ok(false);
                }
                set_in(tree, path.segments(), normalize(value));
                Ok(true)
            })
            .await?;
        debug!(%path, created, "Created node");
        Ok(created)
    }

    async fn push(&self, path: &StorePath, value: Value) -> Result<String, StoreError> {
        let key = Uuid::now_v7().simple().to_string();
        let target = path.child(&key)?;
        self.write(&target, value).await?;
        Ok(key)
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut targets = Vec::with_capacity(fields.len());
        for (field, value) in fields {
            let target = path.child(&field)?;
            validate_keys(&target, &value)?;
            targets.push((target, normalize(value)));
        }
        self.mutate(path, |tree| {
            if !lookup(tree, path).is_some_and(Value::is_object) {
                return Err(StoreError::NotFound(path.clone()));
            }
            for (target, value) in targets {
                set_in(tree, target.segments(), value);
            }
            Ok(())
        })
        .await?;
        debug!(%path, "Updated node");
        Ok(())
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        self.mutate(path, |tree| {
            set_in(tree, path.segments(), None);
            Ok(())
        })
        .await?;
        debug!(%path, "Removed node");
        Ok(())
    }

    async fn read_once(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(snapshot_at(&inner.root, path))
    }
}

fn lookup<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn snapshot_at(root: &Value, path: &StorePath) -> Option<Value> {
    lookup(root, path).filter(|node| !is_empty_node(node)).cloned()
}

fn is_empty_node(node: &Value) -> bool {
    node.is_null() || node.as_object().is_some_and(Map::is_empty)
}

/// Place `value` at `segments`, or remove the node when `value` is `None`,
/// pruning parents that end up empty.
fn set_in(node: &mut Value, segments: &[String], value: Option<Value>) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value.unwrap_or_else(|| Value::Object(Map::new()));
        return;
    };
    if !node.is_object() {
        if value.is_none() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        if rest.is_empty() {
            match value {
                Some(value) => {
                    map.insert(head.clone(), value);
                }
                None => {
                    map.remove(head);
                }
            }
            return;
        }
        if value.is_none() && !map.contains_key(head) {
            return;
        }
        let child = map.entry(head.clone()).or_insert(Value::Null);
        set_in(child, rest, value);
        if is_empty_node(child) {
            map.remove(head);
        }
    }
}

/// Drop null members and empty objects; `None` when nothing is left.
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, child)| normalize(child).map(|child| (key, child)))
                .collect();
            (!cleaned.is_empty()).then_some(Value::Object(cleaned))
        }
        other => Some(other),
    }
}

fn validate_keys(at: &StorePath, value: &Value) -> Result<(), StoreError> {
    if let Value::Object(map) = value {
        for (key, child) in map {
            validate_keys(&at.child(key)?, child)?;
        }
    }
    Ok(())
}

fn write_atomically(file: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(file).map_err(|err| StoreError::Io(err.error))?;
    debug!(file = %file.display(), "Persisted store");
    Ok(())
}
