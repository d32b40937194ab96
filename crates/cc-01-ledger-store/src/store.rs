//! # Ledger Store
//!
//! Registry of typed indexes driven through one shared undo discipline.

use crate::capacity::{CapacityMonitor, CapacityStatus};
use crate::domain::{Id, IndexKey, LedgerError, LedgerResult, Object, StoreConfig};
use crate::index::{AbstractIndex, Index};
use crate::session::Session;
use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::debug;

/// Identifies an open session by the revision it created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub(crate) i64);

impl SessionId {
    pub fn revision(&self) -> i64 {
        self.0
    }
}

/// Proof that an index for `T` is registered; resolves it without a type
/// lookup.
pub struct IndexHandle<T> {
    slot: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for IndexHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for IndexHandle<T> {}

impl<T: Object> IndexHandle<T> {
    pub fn index<'a>(&self, store: &'a LedgerStore) -> LedgerResult<&'a Index<T>> {
        store.indexes[self.slot]
            .as_any()
            .downcast_ref::<Index<T>>()
            .ok_or(LedgerError::UnknownIndex(T::TYPE_NAME))
    }
}

/// The versioned object store.
pub struct LedgerStore {
    indexes: Vec<Box<dyn AbstractIndex>>,
    by_type: HashMap<TypeId, usize>,
    open_sessions: Vec<i64>,
    revision: i64,
    capacity: CapacityMonitor,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl LedgerStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            indexes: Vec::new(),
            by_type: HashMap::new(),
            open_sessions: Vec::new(),
            revision: 0,
            capacity: CapacityMonitor::new(config),
        }
    }

    // =========================================================================
    // Index registration
    // =========================================================================

    /// Register the index for `T`. Core and collaborator-owned types use the
    /// same path and share session semantics.
    pub fn register_index<T: Object>(&mut self) -> LedgerResult<IndexHandle<T>> {
        let type_id = TypeId::of::<T>();
        if self.by_type.contains_key(&type_id) {
            return Err(LedgerError::DuplicateIndex(T::TYPE_NAME));
        }
        if !self.open_sessions.is_empty() {
            return Err(LedgerError::RegistrationDuringSession(T::TYPE_NAME));
        }
        let mut index = Index::<T>::new();
        // Keep the new index aligned with kept revisions.
        let depth = self.undo_depth() as i64;
        for revision in (self.revision - depth + 1)..=self.revision {
            index.start_undo(revision);
        }
        let slot = self.indexes.len();
        self.indexes.push(Box::new(index));
        self.by_type.insert(type_id, slot);
        debug!(object = T::TYPE_NAME, slot, "Registered index");
        Ok(IndexHandle {
            slot,
            _marker: PhantomData,
        })
    }

    pub fn has_index<T: Object>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    pub fn index<T: Object>(&self) -> LedgerResult<&Index<T>> {
        let slot = self
            .by_type
            .get(&TypeId::of::<T>())
            .ok_or(LedgerError::UnknownIndex(T::TYPE_NAME))?;
        self.indexes[*slot]
            .as_any()
            .downcast_ref::<Index<T>>()
            .ok_or(LedgerError::UnknownIndex(T::TYPE_NAME))
    }

    fn index_mut<T: Object>(&mut self) -> LedgerResult<&mut Index<T>> {
        let slot = self
            .by_type
            .get(&TypeId::of::<T>())
            .ok_or(LedgerError::UnknownIndex(T::TYPE_NAME))?;
        self.indexes[*slot]
            .as_any_mut()
            .downcast_mut::<Index<T>>()
            .ok_or(LedgerError::UnknownIndex(T::TYPE_NAME))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    fn tracking(&self) -> bool {
        !self.open_sessions.is_empty()
    }

    pub fn create<T, F>(&mut self, constructor: F) -> LedgerResult<Id<T>>
    where
        T: Object,
        F: FnOnce(Id<T>) -> T,
    {
        self.capacity.check_create()?;
        let track = self.tracking();
        let id = self.index_mut::<T>()?.create(constructor, track)?;
        self.refresh_capacity();
        Ok(id)
    }

    pub fn modify<T, F>(&mut self, id: Id<T>, mutator: F) -> LedgerResult<()>
    where
        T: Object,
        F: FnOnce(&mut T),
    {
        let track = self.tracking();
        self.index_mut::<T>()?.modify(id, mutator, track)
    }

    pub fn remove<T: Object>(&mut self, id: Id<T>) -> LedgerResult<T> {
        let track = self.tracking();
        let removed = self.index_mut::<T>()?.remove(id, track)?;
        self.refresh_capacity();
        Ok(removed)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn get<T: Object>(&self, id: Id<T>) -> LedgerResult<&T> {
        self.index::<T>()?.get(id)
    }

    pub fn find<T: Object>(&self, id: Id<T>) -> Option<&T> {
        self.index::<T>().ok().and_then(|index| index.find(id))
    }

    pub fn find_by<T: Object>(&self, index: &'static str, key: &IndexKey) -> LedgerResult<Option<&T>> {
        self.index::<T>()?.find_by(index, key)
    }

    pub fn get_by<T: Object>(&self, index: &'static str, key: &IndexKey) -> LedgerResult<&T> {
        self.index::<T>()?.get_by(index, key)
    }

    pub fn iter<T: Object>(&self) -> LedgerResult<impl DoubleEndedIterator<Item = &T> + '_> {
        Ok(self.index::<T>()?.iter())
    }

    pub fn iter_by<T: Object>(&self, index: &'static str) -> LedgerResult<impl DoubleEndedIterator<Item = &T> + '_> {
        self.index::<T>()?.iter_by(index)
    }

    pub fn range_from<T: Object>(
        &self,
        index: &'static str,
        key: &IndexKey,
    ) -> LedgerResult<impl Iterator<Item = &T> + '_> {
        self.index::<T>()?.range_from(index, key)
    }

    pub fn equal_range<T: Object>(
        &self,
        index: &'static str,
        prefix: &IndexKey,
    ) -> LedgerResult<impl Iterator<Item = &T> + '_> {
        self.index::<T>()?.equal_range(index, prefix)
    }

    pub fn len<T: Object>(&self) -> LedgerResult<usize> {
        Ok(self.index::<T>()?.len())
    }

    /// Total objects across every index.
    pub fn object_count(&self) -> usize {
        self.indexes.iter().map(|index| index.len()).sum()
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Current revision: number of undoable states (open or kept).
    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn open_session_count(&self) -> usize {
        self.open_sessions.len()
    }

    /// Number of undo states currently held (open sessions plus kept
    /// revisions).
    pub fn undo_depth(&self) -> usize {
        self.indexes
            .first()
            .map(|index| index.undo_depth())
            .unwrap_or(0)
    }

    /// Open a nested session.
    pub fn begin_session(&mut self) -> SessionId {
        self.revision += 1;
        for index in &mut self.indexes {
            index.start_undo(self.revision);
        }
        self.open_sessions.push(self.revision);
        SessionId(self.revision)
    }

    /// RAII session that rolls back on drop.
    pub fn start_session(&mut self) -> Session<'_> {
        let id = self.begin_session();
        Session::new(self, id)
    }

    fn close_innermost(&mut self, id: SessionId) -> LedgerResult<()> {
        match self.open_sessions.last() {
            Some(innermost) if *innermost == id.0 => {
                self.open_sessions.pop();
                Ok(())
            }
            other => Err(LedgerError::SessionOrder {
                expected: other.copied(),
                actual: id.0,
            }),
        }
    }

    /// Undo every change made since `id` was opened.
    pub fn rollback(&mut self, id: SessionId) -> LedgerResult<()> {
        self.close_innermost(id)?;
        for index in &mut self.indexes {
            index.undo();
        }
        self.revision -= 1;
        self.refresh_capacity();
        Ok(())
    }

    /// Fold `id` into its parent. Without a parent the changes become
    /// permanent.
    pub fn merge(&mut self, id: SessionId) -> LedgerResult<()> {
        self.close_innermost(id)?;
        for index in &mut self.indexes {
            index.squash();
        }
        self.revision -= 1;
        Ok(())
    }

    /// Close `id` but keep its changes undoable via [`LedgerStore::undo`].
    /// Only the outermost open session can be kept.
    pub fn keep(&mut self, id: SessionId) -> LedgerResult<()> {
        if self.open_sessions.len() != 1 {
            return Err(LedgerError::SessionOrder {
                expected: self.open_sessions.first().copied(),
                actual: id.0,
            });
        }
        self.close_innermost(id)
    }

    /// Reverse the newest kept revision.
    pub fn undo(&mut self) -> LedgerResult<()> {
        if !self.open_sessions.is_empty() {
            return Err(LedgerError::SessionOrder {
                expected: self.open_sessions.last().copied(),
                actual: self.revision,
            });
        }
        if self.undo_depth() == 0 {
            return Err(LedgerError::NothingToUndo);
        }
        for index in &mut self.indexes {
            index.undo();
        }
        self.revision -= 1;
        self.refresh_capacity();
        Ok(())
    }

    /// Reverse every kept revision.
    pub fn undo_all(&mut self) -> LedgerResult<()> {
        while self.undo_depth() > 0 {
            self.undo()?;
        }
        Ok(())
    }

    /// Forget undo history up to and including `revision`.
    pub fn commit(&mut self, revision: i64) {
        for index in &mut self.indexes {
            index.commit(revision);
        }
    }

    /// Run `f` in a nested session: merged on `Ok`, rolled back on `Err`.
    pub fn with_session<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut LedgerStore) -> Result<R, E>,
        E: From<LedgerError>,
    {
        let id = self.begin_session();
        match f(self) {
            Ok(value) => {
                self.merge(id)?;
                Ok(value)
            }
            Err(e) => {
                self.rollback(id)?;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    pub fn capacity_status(&self) -> CapacityStatus {
        self.capacity.status()
    }

    fn refresh_capacity(&mut self) {
        let objects = self.object_count();
        self.capacity.observe(objects);
    }
}
