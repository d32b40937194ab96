//! # Chain Handle
//!
//! Shares one [`ChainDatabase`] between threads. Writers are exclusive and
//! readers run concurrently. Notification subscribers run inside the write
//! lock and must not call back into the handle.

use crate::domain::{ChainConfig, ChainError, ChainResult};
use crate::service::ChainDatabase;
use cc_02_protocol::{SignedBlock, SignedTransaction};
use cc_03_chain_state::SkipFlags;
use parking_lot::{RwLock, RwLockWriteGuard};
use shared_crypto::PrivateKey;
use shared_types::{AccountName, TimePointSec};

pub struct Chain {
    db: RwLock<ChainDatabase>,
}

impl Chain {
    pub fn new(db: ChainDatabase) -> Self {
        Self { db: RwLock::new(db) }
    }

    pub fn open(config: ChainConfig) -> ChainResult<Self> {
        Ok(Self::new(ChainDatabase::open(config)?))
    }

    pub fn with_read_lock<R>(&self, f: impl FnOnce(&ChainDatabase) -> R) -> R {
        f(&self.db.read())
    }

    pub fn with_write_lock<R>(&self, f: impl FnOnce(&mut ChainDatabase) -> R) -> R {
        f(&mut self.db.write())
    }

    /// See [`ChainDatabase::push_block`].
    pub fn push_block(&self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<bool> {
        self.write(skip)?.push_block(block, skip)
    }

    /// See [`ChainDatabase::push_transaction`].
    pub fn push_transaction(&self, trx: &SignedTransaction, skip: SkipFlags) -> ChainResult<()> {
        self.write(skip)?.push_transaction(trx, skip)
    }

    /// See [`ChainDatabase::generate_block`].
    pub fn generate_block(
        &self,
        when: TimePointSec,
        witness: &AccountName,
        signing_key: &PrivateKey,
        skip: SkipFlags,
    ) -> ChainResult<SignedBlock> {
        self.write(skip)?.generate_block(when, witness, signing_key, skip)
    }

    /// See [`ChainDatabase::pop_block`].
    pub fn pop_block(&self, skip: SkipFlags) -> ChainResult<SignedBlock> {
        self.write(skip)?.pop_block()
    }

    /// Close the database once no other handle to it is left.
    pub fn close(self) -> ChainResult<()> {
        self.db.into_inner().close()
    }

    /// Under `DATABASE_LOCKING` the caller vouches that nobody else holds
    /// the database, so a contended lock is an error instead of a wait.
    fn write(&self, skip: SkipFlags) -> ChainResult<RwLockWriteGuard<'_, ChainDatabase>> {
        if skip.contains(SkipFlags::DATABASE_LOCKING) {
            return self.db.try_write().ok_or(ChainError::LockBusy);
        }
        Ok(self.db.write())
    }
}
