//! # Typed Index
//!
//! Primary storage, secondary keys and undo history for one object type.

use crate::domain::{Id, IndexKey, IndexSpec, LedgerError, LedgerResult, Object};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::Bound;

/// Everything needed to reverse one revision of one index.
#[derive(Debug)]
struct UndoState<T> {
    old_values: BTreeMap<u64, T>,
    removed_values: BTreeMap<u64, T>,
    new_ids: BTreeSet<u64>,
    old_next_id: u64,
    revision: i64,
}

impl<T> UndoState<T> {
    fn new(old_next_id: u64, revision: i64) -> Self {
        Self {
            old_values: BTreeMap::new(),
            removed_values: BTreeMap::new(),
            new_ids: BTreeSet::new(),
            old_next_id,
            revision,
        }
    }
}

struct Secondary<T> {
    spec: IndexSpec<T>,
    entries: BTreeSet<(IndexKey, u64)>,
}

/// Storage for one object type.
pub struct Index<T: Object> {
    objects: BTreeMap<u64, T>,
    secondary: Vec<Secondary<T>>,
    next_id: u64,
    stack: VecDeque<UndoState<T>>,
}

impl<T: Object> Default for Index<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Object> Index<T> {
    pub fn new() -> Self {
        let secondary = T::indexes()
            .into_iter()
            .map(|spec| Secondary {
                spec,
                entries: BTreeSet::new(),
            })
            .collect();
        Self {
            objects: BTreeMap::new(),
            secondary,
            next_id: 0,
            stack: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Id the next `create` will assign.
    pub fn next_id(&self) -> Id<T> {
        Id::new(self.next_id)
    }

    pub fn find(&self, id: Id<T>) -> Option<&T> {
        self.objects.get(&id.raw())
    }

    pub fn get(&self, id: Id<T>) -> LedgerResult<&T> {
        self.find(id).ok_or_else(|| LedgerError::NotFound {
            object: T::TYPE_NAME,
            key: format!("id {}", id.raw()),
        })
    }

    /// All objects in id order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.objects.values()
    }

    fn secondary(&self, name: &'static str) -> LedgerResult<&Secondary<T>> {
        self.secondary
            .iter()
            .find(|s| s.spec.name == name)
            .ok_or(LedgerError::UnknownSecondaryIndex {
                object: T::TYPE_NAME,
                index: name,
            })
    }

    /// First object whose key equals `key` exactly.
    pub fn find_by(&self, index: &'static str, key: &IndexKey) -> LedgerResult<Option<&T>> {
        let secondary = self.secondary(index)?;
        let hit = secondary
            .entries
            .range((Bound::Included((key.clone(), 0)), Bound::Unbounded))
            .next()
            .filter(|(k, _)| k == key)
            .and_then(|(_, id)| self.objects.get(id));
        Ok(hit)
    }

    pub fn get_by(&self, index: &'static str, key: &IndexKey) -> LedgerResult<&T> {
        self.find_by(index, key)?.ok_or_else(|| LedgerError::NotFound {
            object: T::TYPE_NAME,
            key: format!("{index} {key:?}"),
        })
    }

    /// All objects ordered by a secondary key.
    pub fn iter_by(&self, index: &'static str) -> LedgerResult<impl DoubleEndedIterator<Item = &T> + '_> {
        let secondary = self.secondary(index)?;
        Ok(secondary
            .entries
            .iter()
            .filter_map(move |(_, id)| self.objects.get(id)))
    }

    /// Objects whose key is `>= key`, in key order.
    pub fn range_from(&self, index: &'static str, key: &IndexKey) -> LedgerResult<impl Iterator<Item = &T> + '_> {
        let secondary = self.secondary(index)?;
        Ok(secondary
            .entries
            .range((Bound::Included((key.clone(), 0)), Bound::Unbounded))
            .filter_map(move |(_, id)| self.objects.get(id)))
    }

    /// Objects whose key starts with `prefix`, in key order.
    pub fn equal_range(&self, index: &'static str, prefix: &IndexKey) -> LedgerResult<impl Iterator<Item = &T> + '_> {
        let secondary = self.secondary(index)?;
        let prefix = prefix.clone();
        Ok(secondary
            .entries
            .range((Bound::Included((prefix.clone(), 0)), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .filter_map(move |(_, id)| self.objects.get(id)))
    }

    fn check_unique(&self, obj: &T, ignore: Option<u64>) -> LedgerResult<()> {
        for secondary in self.secondary.iter().filter(|s| s.spec.unique) {
            let key = (secondary.spec.key)(obj);
            let clash = secondary
                .entries
                .range((
                    Bound::Included((key.clone(), 0)),
                    Bound::Included((key.clone(), u64::MAX)),
                ))
                .any(|(_, id)| Some(*id) != ignore);
            if clash {
                return Err(LedgerError::UniquenessViolation {
                    object: T::TYPE_NAME,
                    index: secondary.spec.name,
                    key: format!("{key:?}"),
                });
            }
        }
        Ok(())
    }

    fn insert_keys(&mut self, obj: &T, id: u64) {
        for secondary in &mut self.secondary {
            secondary.entries.insert(((secondary.spec.key)(obj), id));
        }
    }

    fn remove_keys(&mut self, obj: &T, id: u64) {
        for secondary in &mut self.secondary {
            secondary.entries.remove(&((secondary.spec.key)(obj), id));
        }
    }

    pub(crate) fn create<F>(&mut self, constructor: F, track: bool) -> LedgerResult<Id<T>>
    where
        F: FnOnce(Id<T>) -> T,
    {
        let id = self.next_id;
        let obj = constructor(Id::new(id));
        if obj.id().raw() != id {
            return Err(LedgerError::IdMismatch {
                object: T::TYPE_NAME,
                expected: id,
                actual: obj.id().raw(),
            });
        }
        self.check_unique(&obj, None)?;
        self.insert_keys(&obj, id);
        self.objects.insert(id, obj);
        self.next_id += 1;
        if track {
            if let Some(head) = self.stack.back_mut() {
                head.new_ids.insert(id);
            }
        }
        Ok(Id::new(id))
    }

    pub(crate) fn modify<F>(&mut self, id: Id<T>, mutator: F, track: bool) -> LedgerResult<()>
    where
        F: FnOnce(&mut T),
    {
        let old = self.get(id)?.clone();
        let mut new = old.clone();
        mutator(&mut new);
        if new.id() != id {
            return Err(LedgerError::IdMismatch {
                object: T::TYPE_NAME,
                expected: id.raw(),
                actual: new.id().raw(),
            });
        }
        self.check_unique(&new, Some(id.raw()))?;
        self.remove_keys(&old, id.raw());
        self.insert_keys(&new, id.raw());
        self.objects.insert(id.raw(), new);
        if track {
            self.on_modify(id.raw(), old);
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: Id<T>, track: bool) -> LedgerResult<T> {
        let obj = self.objects.remove(&id.raw()).ok_or_else(|| LedgerError::NotFound {
            object: T::TYPE_NAME,
            key: format!("id {}", id.raw()),
        })?;
        self.remove_keys(&obj, id.raw());
        if track {
            self.on_remove(id.raw(), obj.clone());
        }
        Ok(obj)
    }

    fn on_modify(&mut self, id: u64, old: T) {
        let Some(head) = self.stack.back_mut() else {
            return;
        };
        if head.new_ids.contains(&id) || head.old_values.contains_key(&id) {
            return;
        }
        head.old_values.insert(id, old);
    }

    fn on_remove(&mut self, id: u64, old: T) {
        let Some(head) = self.stack.back_mut() else {
            return;
        };
        if head.new_ids.remove(&id) {
            return;
        }
        if let Some(original) = head.old_values.remove(&id) {
            head.removed_values.insert(id, original);
            return;
        }
        head.removed_values.entry(id).or_insert(old);
    }

    /// Put `obj` back under `id` without uniqueness checks.
    fn restore(&mut self, id: u64, obj: T) {
        if let Some(current) = self.objects.remove(&id) {
            self.remove_keys(&current, id);
        }
        self.insert_keys(&obj, id);
        self.objects.insert(id, obj);
    }

    pub(crate) fn start_undo(&mut self, revision: i64) {
        self.stack.push_back(UndoState::new(self.next_id, revision));
    }

    pub(crate) fn undo(&mut self) {
        let Some(head) = self.stack.pop_back() else {
            return;
        };
        for id in &head.new_ids {
            if let Some(obj) = self.objects.remove(id) {
                self.remove_keys(&obj, *id);
            }
        }
        for (id, obj) in head.old_values {
            self.restore(id, obj);
        }
        for (id, obj) in head.removed_values {
            self.restore(id, obj);
        }
        self.next_id = head.old_next_id;
    }

    /// Fold the newest undo state into the one below it. Without a parent
    /// the changes simply become permanent.
    pub(crate) fn squash(&mut self) {
        let Some(state) = self.stack.pop_back() else {
            return;
        };
        let Some(prev) = self.stack.back_mut() else {
            return;
        };

        for (id, obj) in state.old_values {
            if prev.new_ids.contains(&id) || prev.old_values.contains_key(&id) {
                continue;
            }
            prev.old_values.insert(id, obj);
        }

        prev.new_ids.extend(state.new_ids);

        for (id, obj) in state.removed_values {
            if prev.new_ids.remove(&id) {
                continue;
            }
            if let Some(original) = prev.old_values.remove(&id) {
                prev.removed_values.insert(id, original);
                continue;
            }
            prev.removed_values.insert(id, obj);
        }
    }

    /// Drop undo states up to and including `revision`.
    pub(crate) fn commit(&mut self, revision: i64) {
        while self
            .stack
            .front()
            .is_some_and(|state| state.revision <= revision)
        {
            self.stack.pop_front();
        }
    }

    pub(crate) fn undo_depth(&self) -> usize {
        self.stack.len()
    }
}

/// Object-safe view used by the store to drive every index in lockstep.
pub(crate) trait AbstractIndex: Send + Sync {
    fn len(&self) -> usize;
    fn start_undo(&mut self, revision: i64);
    fn undo(&mut self);
    fn squash(&mut self);
    fn commit(&mut self, revision: i64);
    fn undo_depth(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Object> AbstractIndex for Index<T> {
    fn len(&self) -> usize {
        Index::len(self)
    }

    fn start_undo(&mut self, revision: i64) {
        Index::start_undo(self, revision);
    }

    fn undo(&mut self) {
        Index::undo(self);
    }

    fn squash(&mut self) {
        Index::squash(self);
    }

    fn commit(&mut self, revision: i64) {
        Index::commit(self, revision);
    }

    fn undo_depth(&self) -> usize {
        Index::undo_depth(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
