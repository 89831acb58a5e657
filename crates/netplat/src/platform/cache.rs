//! The object cache.
//!
//! [`ObjectCache`] holds the single canonical copy of every platform object
//! and classifies each incoming candidate as added, updated or unchanged.
//! It is indexed by identity, by kind, by (kind, ifindex) and, for routes,
//! by weak identity. All iteration is in identity order, so two caches
//! with the same content iterate identically regardless of insertion order.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::{CacheOp, ObjectCache, NlmFlags};
//!
//! let mut cache = ObjectCache::new();
//! let update = cache.absorb(link.into_ref(), false, NlmFlags::NONE)?;
//! assert_eq!(update.op, CacheOp::Added);
//!
//! // Same object again: nothing to do.
//! let update = cache.absorb(update.new.unwrap(), false, NlmFlags::NONE)?;
//! assert_eq!(update.op, CacheOp::Unchanged);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use tracing::{debug, trace};

use super::error::Result;
use super::id::ObjectId;
use super::object::{Link, ObjectKind, ObjectRef, PlatformObject};
use super::types::route::NlmFlags;

/// Classification of a cache operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CacheOp {
    Added,
    Updated,
    Removed,
    Unchanged,
}

impl CacheOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        }
    }

    /// Returns true if the cache content changed.
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for CacheOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of an absorb or remove call.
#[derive(Debug, Clone)]
pub struct CacheUpdate {
    pub op: CacheOp,
    /// The entry before the call.
    pub old: Option<ObjectRef>,
    /// The entry after the call.
    pub new: Option<ObjectRef>,
    /// A route sharing the candidate's weak identity that the caller must
    /// remove to complete a replace.
    pub replaced: Option<ObjectRef>,
}

impl CacheUpdate {
    fn unchanged(existing: Option<ObjectRef>) -> Self {
        Self {
            op: CacheOp::Unchanged,
            old: existing.clone(),
            new: existing,
            replaced: None,
        }
    }

    /// The object this update is about (`new` if present, else `old`).
    pub fn object(&self) -> Option<&ObjectRef> {
        self.new.as_ref().or(self.old.as_ref())
    }

    /// Returns true if the cache content changed.
    pub fn is_change(&self) -> bool {
        self.op.is_change()
    }
}

/// What to remove: an object (by its identity) or an explicit id.
#[derive(Debug, Clone)]
pub enum RemoveTarget {
    Object(ObjectRef),
    Id(ObjectId),
}

impl RemoveTarget {
    fn id(&self) -> ObjectId {
        match self {
            Self::Object(obj) => obj.identity(),
            Self::Id(id) => *id,
        }
    }
}

impl From<ObjectRef> for RemoveTarget {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

impl From<&ObjectRef> for RemoveTarget {
    fn from(obj: &ObjectRef) -> Self {
        Self::Object(obj.clone())
    }
}

impl From<ObjectId> for RemoveTarget {
    fn from(id: ObjectId) -> Self {
        Self::Id(id)
    }
}

#[derive(Debug)]
struct Entry {
    obj: ObjectRef,
    /// Set by `mark_dirty`, cleared when a dump absorbs the entry again.
    dirty: bool,
}

/// Multi-index store of platform objects.
#[derive(Debug, Default)]
pub struct ObjectCache {
    entries: HashMap<ObjectId, Entry>,
    by_kind: BTreeMap<ObjectKind, BTreeSet<ObjectId>>,
    by_ifindex: HashMap<(ObjectKind, i32), BTreeSet<ObjectId>>,
    by_weak_id: HashMap<ObjectId, BTreeSet<ObjectId>>,
    links_by_name: HashMap<String, i32>,
}

impl ObjectCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of objects of one kind.
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.by_kind.get(&kind).map_or(0, BTreeSet::len)
    }

    // ========================================================================
    // Update protocol
    // ========================================================================

    /// Absorb a candidate object.
    ///
    /// Returns `Added` if no object with the candidate's identity exists,
    /// `Unchanged` if an equal one does (the existing handle is kept) and
    /// `Updated` otherwise.
    ///
    /// For routes absorbed with [`NlmFlags::REPLACE`], the first other route
    /// (in identity order) sharing the candidate's weak identity is returned
    /// in `replaced`. It stays in the cache until the caller removes it.
    ///
    /// Fails with `InvalidObject` if the candidate has no valid identity.
    pub fn absorb(
        &mut self,
        candidate: ObjectRef,
        is_dump: bool,
        flags: NlmFlags,
    ) -> Result<CacheUpdate> {
        candidate.validate()?;
        let id = candidate.identity();

        let replaced = if flags.is_replace() && id.kind().is_route() {
            self.weak_sibling(&id)
        } else {
            None
        };

        let Some(entry) = self.entries.get_mut(&id) else {
            debug!(id = %id, "cache: added");
            self.index(&id, &candidate);
            self.entries.insert(
                id,
                Entry {
                    obj: candidate.clone(),
                    dirty: false,
                },
            );
            return Ok(CacheUpdate {
                op: CacheOp::Added,
                old: None,
                new: Some(candidate),
                replaced,
            });
        };

        if is_dump {
            entry.dirty = false;
        }

        if *entry.obj == *candidate {
            trace!(id = %id, "cache: unchanged");
            let mut update = CacheUpdate::unchanged(Some(entry.obj.clone()));
            update.replaced = replaced;
            return Ok(update);
        }

        debug!(id = %id, "cache: updated");
        let old = std::mem::replace(&mut entry.obj, candidate.clone());
        if let (Some(prev), Some(next)) = (old.as_link(), candidate.as_link())
            && prev.name != next.name
        {
            self.links_by_name.remove(&prev.name);
            self.links_by_name.insert(next.name.clone(), next.ifindex);
        }

        Ok(CacheUpdate {
            op: CacheOp::Updated,
            old: Some(old),
            new: Some(candidate),
            replaced,
        })
    }

    /// Remove an object.
    ///
    /// Returns `Removed` with the removed object in `old`, or `Unchanged` if
    /// nothing with that identity exists. With `only_if_dirty`, entries that
    /// are not marked dirty are kept.
    pub fn remove(&mut self, target: impl Into<RemoveTarget>, only_if_dirty: bool) -> CacheUpdate {
        let id = target.into().id();

        match self.entries.get(&id) {
            None => {
                trace!(id = %id, "cache: remove of absent object");
                return CacheUpdate::unchanged(None);
            }
            Some(entry) if only_if_dirty && !entry.dirty => {
                trace!(id = %id, "cache: kept, not dirty");
                return CacheUpdate::unchanged(Some(entry.obj.clone()));
            }
            Some(_) => {}
        }

        let Some(entry) = self.entries.remove(&id) else {
            return CacheUpdate::unchanged(None);
        };
        debug!(id = %id, "cache: removed");
        self.unindex(&id, &entry.obj);

        CacheUpdate {
            op: CacheOp::Removed,
            old: Some(entry.obj),
            new: None,
            replaced: None,
        }
    }

    fn weak_sibling(&self, id: &ObjectId) -> Option<ObjectRef> {
        self.by_weak_id
            .get(&id.to_weak())?
            .iter()
            .find(|other| *other != id)
            .and_then(|other| self.entries.get(other))
            .map(|entry| entry.obj.clone())
    }

    fn index(&mut self, id: &ObjectId, obj: &PlatformObject) {
        let kind = obj.kind();
        self.by_kind.entry(kind).or_default().insert(*id);
        self.by_ifindex
            .entry((kind, obj.ifindex()))
            .or_default()
            .insert(*id);
        if kind.is_route() {
            self.by_weak_id.entry(id.to_weak()).or_default().insert(*id);
        }
        if let Some(link) = obj.as_link() {
            self.links_by_name.insert(link.name.clone(), link.ifindex);
        }
    }

    fn unindex(&mut self, id: &ObjectId, obj: &PlatformObject) {
        let kind = obj.kind();
        if let Some(set) = self.by_kind.get_mut(&kind) {
            set.remove(id);
        }
        remove_from(&mut self.by_ifindex, &(kind, obj.ifindex()), id);
        if kind.is_route() {
            remove_from(&mut self.by_weak_id, &id.to_weak(), id);
        }
        if let Some(link) = obj.as_link()
            && self.links_by_name.get(&link.name) == Some(&link.ifindex)
        {
            self.links_by_name.remove(&link.name);
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up an object by identity.
    pub fn get(&self, id: &ObjectId) -> Option<&ObjectRef> {
        self.entries.get(id).map(|entry| &entry.obj)
    }

    /// Check if an object with this identity exists.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    /// Iterate objects of `kind`, optionally restricted to one ifindex.
    pub fn lookup(
        &self,
        kind: ObjectKind,
        ifindex: Option<i32>,
    ) -> impl Iterator<Item = &ObjectRef> + '_ {
        let ids = match ifindex {
            Some(ifindex) => self.by_ifindex.get(&(kind, ifindex)),
            None => self.by_kind.get(&kind),
        };
        self.resolve_ids(ids)
    }

    /// Iterate objects sharing the weak identity of `obj`.
    ///
    /// For non-route objects this yields at most the object with the same
    /// identity.
    pub fn lookup_by_weak_id<'a>(
        &'a self,
        obj: &PlatformObject,
    ) -> impl Iterator<Item = &'a ObjectRef> + 'a {
        let weak = obj.weak_identity();
        let (ids, single) = if obj.kind().is_route() {
            (self.by_weak_id.get(&weak), None)
        } else {
            (None, self.get(&weak))
        };
        self.resolve_ids(ids).chain(single)
    }

    /// Iterate every object, in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> + '_ {
        self.by_kind
            .values()
            .flatten()
            .filter_map(|id| self.entries.get(id).map(|entry| &entry.obj))
    }

    /// Look up a link by ifindex.
    pub fn link_by_ifindex(&self, ifindex: i32) -> Option<&Link> {
        self.get(&ObjectId::Link(ifindex))
            .and_then(|obj| obj.as_link())
    }

    /// Look up a link by name.
    pub fn link_by_name(&self, name: &str) -> Option<&Link> {
        self.links_by_name
            .get(name)
            .and_then(|ifindex| self.link_by_ifindex(*ifindex))
    }

    /// Iterate links attached to `controller`.
    pub fn ports_of(&self, controller: i32) -> impl Iterator<Item = &Link> + '_ {
        self.lookup(ObjectKind::Link, None)
            .filter_map(|obj| obj.as_link())
            .filter(move |link| link.controller == controller)
    }

    fn resolve_ids<'a>(
        &'a self,
        ids: Option<&'a BTreeSet<ObjectId>>,
    ) -> impl Iterator<Item = &'a ObjectRef> + 'a {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id).map(|entry| &entry.obj))
    }

    // ========================================================================
    // Dump support
    // ========================================================================

    /// Mark every entry of `kind` dirty ahead of a full dump.
    pub fn mark_dirty(&mut self, kind: ObjectKind) {
        let Some(ids) = self.by_kind.get(&kind) else {
            return;
        };
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.dirty = true;
            }
        }
    }

    /// Ids of entries of `kind` still marked dirty, in identity order.
    pub fn dirty_ids(&self, kind: ObjectKind) -> Vec<ObjectId> {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|id| self.entries.get(id).is_some_and(|entry| entry.dirty))
            .copied()
            .collect()
    }

    /// Check if the entry with this identity is marked dirty.
    pub fn is_dirty(&self, id: &ObjectId) -> bool {
        self.entries.get(id).is_some_and(|entry| entry.dirty)
    }

    /// Remove every entry of `kind` still marked dirty.
    pub fn prune_dirty(&mut self, kind: ObjectKind) -> Vec<CacheUpdate> {
        self.dirty_ids(kind)
            .into_iter()
            .map(|id| self.remove(id, true))
            .filter(CacheUpdate::is_change)
            .collect()
    }
}

/// Drop `id` from the set under `key`, removing the key once empty.
fn remove_from<K: Eq + std::hash::Hash>(
    index: &mut HashMap<K, BTreeSet<ObjectId>>,
    key: &K,
    id: &ObjectId,
) {
    if let Some(set) = index.get_mut(key) {
        set.remove(id);
        if set.is_empty() {
            index.remove(key);
        }
    }
}
