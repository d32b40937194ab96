//! # Fork Database
//!
//! Every block that has not yet become irreversible, across all branches.
//!
//! ```text
//!             ┌── B3 ── B4'          linked: parent known, reachable from the start block
//!  B1 ── B2 ──┤
//!             └── B3' ── B4 ── B5    head: highest block number, first seen wins ties
//!
//!  B9 (parent B8 unknown)            unlinked: parked until its parent arrives
//! ```
//!
//! The database does not apply blocks. It only tracks which one is the best
//! head; the chain database compares that head with its own and switches
//! branches when they differ.

use crate::domain::{ForkError, ForkItem, ForkResult, DEFAULT_MAX_SIZE};
use cc_02_protocol::SignedBlock;
use shared_types::BlockId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;


/// Blocks by id with a secondary ordering by number.
#[derive(Debug, Default)]
struct BlockIndex {
    items: HashMap<BlockId, Arc<ForkItem>>,
    by_num: BTreeMap<u32, Vec<BlockId>>,
}

impl BlockIndex {
    fn insert(&mut self, item: Arc<ForkItem>) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        self.by_num.entry(item.num).or_default().push(item.id);
        self.items.insert(item.id, item);
        true
    }

    fn remove(&mut self, id: &BlockId) -> Option<Arc<ForkItem>> {
        let item = self.items.remove(id)?;
        if let Some(ids) = self.by_num.get_mut(&item.num) {
            ids.retain(|other| other != id);
            if ids.is_empty() {
                self.by_num.remove(&item.num);
            }
        }
        Some(item)
    }

    fn get(&self, id: &BlockId) -> Option<&Arc<ForkItem>> {
        self.items.get(id)
    }

    fn contains(&self, id: &BlockId) -> bool {
        self.items.contains_key(id)
    }

    /// In insertion order.
    fn at(&self, num: u32) -> impl Iterator<Item = &Arc<ForkItem>> {
        self.by_num
            .get(&num)
            .into_iter()
            .flatten()
            .filter_map(|id| self.items.get(id))
    }

    fn children_of(&self, parent: &BlockId) -> Vec<Arc<ForkItem>> {
        let mut children: Vec<_> = self
            .items
            .values()
            .filter(|item| item.previous_id() == *parent)
            .cloned()
            .collect();
        children.sort_by_key(|item| item.num);
        children
    }

    fn prune_below(&mut self, min_num: u32) {
        let kept = self.by_num.split_off(&min_num);
        let pruned = std::mem::replace(&mut self.by_num, kept);
        for id in pruned.into_values().flatten() {
            self.items.remove(&id);
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.items.clear();
        self.by_num.clear();
    }
}

#[derive(Debug)]
pub struct ForkDatabase {
    index: BlockIndex,
    unlinked: BlockIndex,
    head: Option<Arc<ForkItem>>,
    max_size: u32,
}

impl Default for ForkDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ForkDatabase {
    pub fn new() -> Self {
        Self {
            index: BlockIndex::default(),
            unlinked: BlockIndex::default(),
            head: None,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    /// Add `block` to the buffer and return the best head afterwards. A
    /// block whose parent is unknown is parked, and linked once the parent
    /// arrives together with any of its own parked descendants.
    pub fn push_block(&mut self, block: SignedBlock) -> ForkResult<Arc<ForkItem>> {
        let item = Arc::new(ForkItem::new(block)?);
        if self.link(item.clone())? {
            self.push_next(&item);
        } else {
            debug!(block = %item.id, num = item.num, "Parked unlinked block");
            self.unlinked.insert(item);
        }
        self.head.clone().ok_or(ForkError::NoHead)
    }

    /// Insert `item` if its parent is known. Returns `false` when it cannot
    /// be linked yet.
    fn link(&mut self, item: Arc<ForkItem>) -> ForkResult<bool> {
        if let Some(head) = &self.head {
            let min_block_num = head.num.saturating_sub(self.max_size);
            if item.num <= min_block_num {
                return Err(ForkError::BlockTooOld {
                    block_num: item.num,
                    min_block_num: min_block_num + 1,
                });
            }
            if !self.index.contains(&item.previous_id()) {
                return Ok(false);
            }
        }

        self.index.insert(item.clone());
        if self.head.as_ref().map_or(true, |head| item.num > head.num) {
            self.head = Some(item);
            self.prune();
        }
        Ok(true)
    }

    fn push_next(&mut self, linked: &ForkItem) {
        let mut parents = vec![linked.id];
        while let Some(parent) = parents.pop() {
            for child in self.unlinked.children_of(&parent) {
                self.unlinked.remove(&child.id);
                match self.link(child.clone()) {
                    Ok(true) => parents.push(child.id),
                    Ok(false) => {
                        self.unlinked.insert(child);
                    }
                    Err(e) => debug!(block = %child.id, error = %e, "Dropped parked block"),
                }
            }
        }
    }

    fn prune(&mut self) {
        let Some(head) = &self.head else {
            return;
        };
        let min_num = head.num - self.max_size.min(head.num);
        self.index.prune_below(min_num);
        self.unlinked.prune_below(min_num);
    }

    pub fn head(&self) -> Option<Arc<ForkItem>> {
        self.head.clone()
    }

    pub fn set_head(&mut self, head: Arc<ForkItem>) {
        self.head = Some(head);
    }

    /// Keep at most `max_size` blocks behind the head.
    pub fn set_max_size(&mut self, max_size: u32) {
        self.max_size = max_size;
        self.prune();
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn is_known_block(&self, id: &BlockId) -> bool {
        self.index.contains(id) || self.unlinked.contains(id)
    }

    pub fn fetch_block(&self, id: &BlockId) -> Option<Arc<ForkItem>> {
        self.index
            .get(id)
            .or_else(|| self.unlinked.get(id))
            .cloned()
    }

    /// Linked blocks at `num` on any branch, first seen first.
    pub fn fetch_block_by_number(&self, num: u32) -> Vec<Arc<ForkItem>> {
        self.index.at(num).cloned().collect()
    }

    /// The block at `num` on the branch ending in the current head.
    pub fn fetch_block_on_main_branch_by_number(&self, num: u32) -> Option<Arc<ForkItem>> {
        let mut current = self.head.clone()?;
        while current.num > num {
            current = self.index.get(&current.previous_id())?.clone();
        }
        (current.num == num).then_some(current)
    }

    /// Walk both branches back to their common ancestor. Each returned
    /// branch runs from its tip down to the block just above the ancestor.
    pub fn fetch_branch_from(
        &self,
        first: &BlockId,
        second: &BlockId,
    ) -> ForkResult<(Vec<Arc<ForkItem>>, Vec<Arc<ForkItem>>)> {
        let mut first_branch = Vec::new();
        let mut second_branch = Vec::new();
        if first == second {
            return Ok((first_branch, second_branch));
        }
        let mut a = self.linked(first)?;
        let mut b = self.linked(second)?;

        while a.num > b.num {
            let previous = a.previous_id();
            first_branch.push(a);
            a = self.linked(&previous)?;
        }
        while b.num > a.num {
            let previous = b.previous_id();
            second_branch.push(b);
            b = self.linked(&previous)?;
        }
        while a.id != b.id {
            let (prev_a, prev_b) = (a.previous_id(), b.previous_id());
            first_branch.push(a);
            second_branch.push(b);
            if prev_a == prev_b {
                break;
            }
            a = self.linked(&prev_a)?;
            b = self.linked(&prev_b)?;
        }
        Ok((first_branch, second_branch))
    }

    fn linked(&self, id: &BlockId) -> ForkResult<Arc<ForkItem>> {
        self.index
            .get(id)
            .cloned()
            .ok_or(ForkError::UnknownBlock(*id))
    }

    pub fn remove(&mut self, id: &BlockId) {
        self.index.remove(id);
        self.unlinked.remove(id);
    }

    /// Move the head back to its parent. The popped block stays in the
    /// buffer. Returns the new head.
    pub fn pop_block(&mut self) -> ForkResult<Arc<ForkItem>> {
        let head = self.head.as_ref().ok_or(ForkError::NoHead)?;
        let previous = self
            .index
            .get(&head.previous_id())
            .cloned()
            .ok_or(ForkError::PopWouldEmpty(head.id))?;
        self.head = Some(previous.clone());
        Ok(previous)
    }

    /// Forget everything and start from `block`, typically the head of the
    /// chain being opened.
    pub fn start_block(&mut self, block: SignedBlock) -> ForkResult<Arc<ForkItem>> {
        self.reset();
        let item = Arc::new(ForkItem::new(block)?);
        self.index.insert(item.clone());
        self.head = Some(item.clone());
        Ok(item)
    }

    pub fn reset(&mut self) {
        self.index.clear();
        self.unlinked.clear();
        self.head = None;
    }

    /// Linked and parked block counts.
    pub fn block_counts(&self) -> (usize, usize) {
        (self.index.len(), self.unlinked.len())
    }
}
