//! Dump reconciliation.
//!
//! A backend that re-reads the full kernel state for one object kind (a
//! "dump") hands the result to [`DumpSync`], which brings the cache in line:
//! dumped objects are absorbed, cached objects missing from the dump are
//! removed, and every change is published.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::{DumpSync, ObjectKind};
//!
//! let report = DumpSync::new(ObjectKind::Ip4Route).run(&mut cache, &mut notifier, dumped)?;
//! if !report.is_empty() {
//!     println!("{}", report.summary());
//! }
//! ```

use tracing::debug;

use super::cache::{CacheOp, CacheUpdate, ObjectCache};
use super::error::{Error, Result};
use super::events::Notifier;
use super::object::{ObjectKind, ObjectRef, PlatformObject};
use super::types::route::NlmFlags;

/// Outcome of a dump reconciliation.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub added: Vec<ObjectRef>,
    /// New versions of objects whose content changed.
    pub updated: Vec<ObjectRef>,
    pub removed: Vec<ObjectRef>,
    pub unchanged: usize,
}

impl SyncReport {
    /// Returns true if the dump changed nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Number of changed objects.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }

    /// Get a human-readable summary of the changes.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        for obj in &self.added {
            lines.push(format!("+ {} {}", obj.kind(), obj));
        }
        for obj in &self.updated {
            lines.push(format!("~ {} {}", obj.kind(), obj));
        }
        for obj in &self.removed {
            lines.push(format!("- {} {}", obj.kind(), obj));
        }

        if lines.is_empty() {
            "No changes".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn record(&mut self, update: &CacheUpdate) {
        match (update.op, update.object()) {
            (CacheOp::Added, Some(obj)) => self.added.push(obj.clone()),
            (CacheOp::Updated, Some(obj)) => self.updated.push(obj.clone()),
            (CacheOp::Removed, Some(obj)) => self.removed.push(obj.clone()),
            _ => self.unchanged += 1,
        }
    }
}

/// Reconciles the cache with a full dump of one object kind.
#[derive(Debug, Clone, Copy)]
pub struct DumpSync {
    kind: ObjectKind,
}

impl DumpSync {
    pub fn new(kind: ObjectKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Apply a dump.
    ///
    /// Every object must be of this sync's kind and have a valid identity;
    /// otherwise nothing is changed and an error is returned.
    pub fn run<I>(
        &self,
        cache: &mut ObjectCache,
        notifier: &mut Notifier,
        objects: I,
    ) -> Result<SyncReport>
    where
        I: IntoIterator<Item = PlatformObject>,
    {
        let objects: Vec<PlatformObject> = objects.into_iter().collect();
        for obj in &objects {
            if obj.kind() != self.kind {
                return Err(Error::InvalidArgument(format!(
                    "{} in a {} dump",
                    obj.kind(),
                    self.kind
                )));
            }
            obj.validate()?;
        }

        cache.mark_dirty(self.kind);

        let mut report = SyncReport::default();
        for obj in objects {
            let update = cache.absorb(obj.into_ref(), true, NlmFlags::NONE)?;
            notifier.publish(&update);
            report.record(&update);
        }
        for update in cache.prune_dirty(self.kind) {
            notifier.publish(&update);
            report.record(&update);
        }

        debug!(
            kind = %self.kind,
            added = report.added.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            unchanged = report.unchanged,
            "dump synced"
        );
        Ok(report)
    }
}
