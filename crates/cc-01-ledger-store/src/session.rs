//! # Session Guard
//!
//! Scoped undo session. Dropping the guard without calling [`Session::merge`]
//! or [`Session::keep`] rolls the session back.

use crate::domain::LedgerResult;
use crate::store::{LedgerStore, SessionId};
use std::ops::{Deref, DerefMut};
use tracing::warn;

pub struct Session<'a> {
    store: &'a mut LedgerStore,
    id: SessionId,
    open: bool,
}

impl<'a> Session<'a> {
    pub(crate) fn new(store: &'a mut LedgerStore, id: SessionId) -> Self {
        Self {
            store,
            id,
            open: true,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Fold into the parent scope.
    pub fn merge(mut self) -> LedgerResult<()> {
        self.open = false;
        self.store.merge(self.id)
    }

    /// Keep as an undoable revision.
    pub fn keep(mut self) -> LedgerResult<()> {
        self.open = false;
        self.store.keep(self.id)
    }

    /// Undo now instead of at drop.
    pub fn rollback(mut self) -> LedgerResult<()> {
        self.open = false;
        self.store.rollback(self.id)
    }
}

impl Deref for Session<'_> {
    type Target = LedgerStore;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.store.rollback(self.id) {
                warn!(session = self.id.revision(), error = %e, "Session rollback on drop failed");
            }
        }
    }
}
