//! Block production from the pending pool.

use super::ChainDatabase;
use crate::domain::{ChainError, ChainResult};
use cc_02_protocol::config::{BLOCKCHAIN_HARDFORK_VERSION, BLOCKCHAIN_VERSION, MAX_BLOCK_SIZE};
use cc_02_protocol::{BlockHeader, BlockHeaderExtension, SignedBlock, SignedTransaction};
use cc_03_chain_state::SkipFlags;
use cc_05_consensus_params::domain::ConsensusError;
use cc_05_consensus_params::{get_scheduled_witness, get_slot_at_time};
use shared_crypto::PrivateKey;
use shared_types::{AccountName, TimePointSec};
use tracing::{debug, info, warn};

impl ChainDatabase {
    /// Build, sign and push the block `witness` produces at `when`.
    ///
    /// Pending transactions are packed in arrival order. Expired ones are
    /// left out, ones that would overflow the block are postponed, and ones
    /// that no longer apply are dropped.
    pub fn generate_block(
        &mut self,
        when: TimePointSec,
        witness: &AccountName,
        signing_key: &PrivateKey,
        skip: SkipFlags,
    ) -> ChainResult<SignedBlock> {
        self.with_producing(|db| db.generate_block_inner(when, witness, signing_key, skip))
    }

    fn generate_block_inner(
        &mut self,
        when: TimePointSec,
        witness: &AccountName,
        signing_key: &PrivateKey,
        skip: SkipFlags,
    ) -> ChainResult<SignedBlock> {
        let slot = get_slot_at_time(&self.state, when)?;
        if slot == 0 {
            return Err(ConsensusError::NoSlot(when).into());
        }
        if !skip.contains(SkipFlags::WITNESS_SCHEDULE_CHECK) {
            let scheduled = get_scheduled_witness(&self.state, slot)?;
            if scheduled.as_ref() != Some(witness) {
                return Err(ConsensusError::WrongWitness {
                    expected: scheduled.unwrap_or_default(),
                    actual: witness.clone(),
                }
                .into());
            }
        }
        if !skip.contains(SkipFlags::WITNESS_SIGNATURE) {
            let key = signing_key.public_key().map_err(cc_02_protocol::ProtocolError::from)?;
            if self.state.get_witness(witness)?.signing_key != key {
                return Err(ChainError::SigningKeyMismatch(witness.clone()));
            }
        }

        let mut block = SignedBlock::default();
        block.transactions = self.pack_pending(when, skip)?;

        let extensions = self.header_extensions(witness)?;
        let previous = self.state.head_block_id()?;
        let transaction_merkle_root = block.calculate_merkle_root()?;
        *block.header_mut() = BlockHeader {
            previous,
            timestamp: when,
            witness: witness.clone(),
            transaction_merkle_root,
            extensions,
        };
        if !skip.contains(SkipFlags::WITNESS_SIGNATURE) {
            block.sign(signing_key)?;
        }

        if !skip.contains(SkipFlags::BLOCK_SIZE_CHECK) {
            let size = block.pack_size()?;
            if size > MAX_BLOCK_SIZE as usize {
                return Err(ChainError::BlockTooLarge {
                    block_num: block.block_num(),
                    size,
                    max: MAX_BLOCK_SIZE as usize,
                });
            }
        }

        self.push_block(&block, skip)?;
        info!(
            block_num = block.block_num(),
            block = %block.id()?,
            %witness,
            transactions = block.transactions.len(),
            "Generated block"
        );
        Ok(block)
    }

    /// Re-apply the pending pool from the head and keep what fits. The
    /// pending session is left closed; pushing the block re-applies the
    /// pool on top of it.
    fn pack_pending(&mut self, when: TimePointSec, skip: SkipFlags) -> ChainResult<Vec<SignedTransaction>> {
        self.discard_pending_session()?;
        let session = self.state.begin_session();

        let max_block_size = self.state.dgp()?.maximum_block_size as usize;
        let mut total_size = SignedBlock::default().pack_size()? + 4;
        let mut packed = Vec::new();
        let mut postponed = 0usize;

        for trx in &self.pending {
            if trx.expiration() < when {
                continue;
            }
            let size = trx.pack_size()?;
            if total_size + size >= max_block_size {
                postponed += 1;
                continue;
            }
            let registry = &self.registry;
            match self
                .state
                .with_session(|state| registry.apply_transaction(state, trx, skip))
            {
                Ok(()) => {
                    total_size += size;
                    packed.push(trx.clone());
                }
                Err(e) => debug!(trx = %trx.id()?, error = %e, "Left transaction out of the block"),
            }
        }
        self.state.clear_applied_operations();
        self.state.rollback(session)?;

        if postponed > 0 {
            warn!(postponed, "Postponed transactions due to block size limit");
        }
        Ok(packed)
    }

    /// Announce the running version when the chain does not know it yet, and
    /// keep the hardfork vote in line with the hardforks this node knows.
    fn header_extensions(&self, witness: &AccountName) -> ChainResult<Vec<BlockHeaderExtension>> {
        let producer = self.state.get_witness(witness)?;
        let property = self.state.hardfork_property()?;
        let hardforks = self.consensus.hardforks();
        let mut extensions = Vec::new();

        if producer.running_version != BLOCKCHAIN_VERSION {
            extensions.push(BlockHeaderExtension::Version(BLOCKCHAIN_VERSION));
        }

        let vote = if property.current_hardfork_version < BLOCKCHAIN_HARDFORK_VERSION {
            hardforks
                .get(property.last_hardfork + 1)
                .filter(|&(version, time)| {
                    producer.hardfork_version_vote != version || producer.hardfork_time_vote != time
                })
        } else if producer.hardfork_version_vote > BLOCKCHAIN_HARDFORK_VERSION {
            hardforks.get(property.last_hardfork)
        } else {
            None
        };
        if let Some((version, time)) = vote {
            extensions.push(BlockHeaderExtension::HardforkVersionVote { version, time });
        }
        Ok(extensions)
    }
}
