//! # Blocks
//!
//! A header signed by the scheduled witness plus the transactions it
//! commits to through the merkle root.
//!
//! ## Identity
//!
//! The block id is the digest of the signed header with the block number
//! written into its first four bytes, so the height can be read from the
//! id alone.

use crate::errors::{ProtocolError, ProtocolResult};
use crate::transaction::SignedTransaction;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, CompactSignature, PrivateKey, PublicKey, Sha256Writer};
use shared_types::{AccountName, BlockId, Hash, TimePointSec};

/// Optional header data. At most one extension of each kind per header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockHeaderExtension {
    /// Software version the producing witness runs.
    Version(Version),
    /// Hardfork the producing witness votes for, and when.
    HardforkVersionVote {
        version: Version,
        time: TimePointSec,
    },
}

impl BlockHeaderExtension {
    fn kind(&self) -> u8 {
        match self {
            Self::Version(_) => 0,
            Self::HardforkVersionVote { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    pub previous: BlockId,
    pub timestamp: TimePointSec,
    pub witness: AccountName,
    pub transaction_merkle_root: Hash,
    pub extensions: Vec<BlockHeaderExtension>,
}

impl BlockHeader {
    pub fn block_num(&self) -> u32 {
        self.previous.block_num() + 1
    }

    /// Digest the witness signs.
    pub fn digest(&self) -> ProtocolResult<Hash> {
        Ok(sha256(&bincode::serialize(self)?))
    }

    /// Reject repeated extension kinds.
    pub fn validate_extensions(&self) -> ProtocolResult<()> {
        let mut seen = [false; 2];
        for ext in &self.extensions {
            let slot = &mut seen[ext.kind() as usize];
            if *slot {
                return Err(ProtocolError::invalid(
                    "extensions",
                    "duplicate header extension",
                ));
            }
            *slot = true;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedBlockHeader {
    pub header: BlockHeader,
    pub witness_signature: CompactSignature,
}

impl SignedBlockHeader {
    pub fn id(&self) -> ProtocolResult<BlockId> {
        let digest = sha256(&bincode::serialize(self)?);
        Ok(BlockId::new(self.header.block_num(), &digest))
    }

    /// Key that produced the witness signature.
    pub fn signee(&self) -> ProtocolResult<PublicKey> {
        Ok(PublicKey::recover(&self.header.digest()?, &self.witness_signature)?)
    }

    pub fn sign(&mut self, key: &PrivateKey) -> ProtocolResult<()> {
        self.witness_signature = key.sign_compact(&self.header.digest()?)?;
        Ok(())
    }

    pub fn validate_signee(&self, expected: &PublicKey) -> bool {
        self.signee().map(|k| &k == expected).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedBlock {
    pub signed_header: SignedBlockHeader,
    pub transactions: Vec<SignedTransaction>,
}

impl SignedBlock {
    pub fn header(&self) -> &BlockHeader {
        &self.signed_header.header
    }

    pub fn header_mut(&mut self) -> &mut BlockHeader {
        &mut self.signed_header.header
    }

    pub fn id(&self) -> ProtocolResult<BlockId> {
        self.signed_header.id()
    }

    pub fn block_num(&self) -> u32 {
        self.header().block_num()
    }

    pub fn previous(&self) -> BlockId {
        self.header().previous
    }

    pub fn timestamp(&self) -> TimePointSec {
        self.header().timestamp
    }

    pub fn witness(&self) -> &AccountName {
        &self.header().witness
    }

    pub fn signee(&self) -> ProtocolResult<PublicKey> {
        self.signed_header.signee()
    }

    pub fn sign(&mut self, key: &PrivateKey) -> ProtocolResult<()> {
        self.signed_header.sign(key)
    }

    pub fn validate_signee(&self, expected: &PublicKey) -> bool {
        self.signed_header.validate_signee(expected)
    }

    pub fn pack_size(&self) -> ProtocolResult<usize> {
        Ok(bincode::serialized_size(self)? as usize)
    }

    /// Pairwise sha256 over the transaction digests; an odd node is carried
    /// up unchanged. Empty blocks have the zero root.
    pub fn calculate_merkle_root(&self) -> ProtocolResult<Hash> {
        if self.transactions.is_empty() {
            return Ok(Hash::default());
        }
        let mut level = self
            .transactions
            .iter()
            .map(|trx| trx.merkle_digest())
            .collect::<ProtocolResult<Vec<_>>>()?;
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => {
                        let mut writer = Sha256Writer::new();
                        writer.update(left).update(right);
                        writer.finalize()
                    }
                    [single] => *single,
                    _ => Hash::default(),
                })
                .collect();
        }
        Ok(level[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::TransferOperation;
    use crate::transaction::Transaction;
    use shared_types::Asset;

    fn trx(amount: i64) -> SignedTransaction {
        Transaction::new(vec![TransferOperation {
            from: "alice".into(),
            to: "bob".into(),
            amount: Asset::cedar(amount),
            memo: String::new(),
        }
        .into()])
        .into()
    }

    #[test]
    fn test_block_id_carries_height() {
        let mut block = SignedBlock::default();
        block.header_mut().previous = BlockId::new(41, &[1u8; 32]);
        assert_eq!(block.block_num(), 42);
        assert_eq!(block.id().unwrap().block_num(), 42);
    }

    #[test]
    fn test_signee() {
        let key = PrivateKey::from_seed("initwitness").unwrap();
        let mut block = SignedBlock::default();
        block.header_mut().witness = "initwitness".into();
        block.sign(&key).unwrap();
        assert!(block.validate_signee(&key.public_key().unwrap()));

        let other = PrivateKey::from_seed("mallory").unwrap();
        assert!(!block.validate_signee(&other.public_key().unwrap()));
    }

    #[test]
    fn test_merkle_root_depends_on_order() {
        let mut block = SignedBlock::default();
        assert_eq!(block.calculate_merkle_root().unwrap(), Hash::default());

        block.transactions = vec![trx(1), trx(2), trx(3)];
        let root = block.calculate_merkle_root().unwrap();
        assert_ne!(root, Hash::default());

        block.transactions.swap(0, 1);
        assert_ne!(block.calculate_merkle_root().unwrap(), root);
    }

    #[test]
    fn test_single_transaction_root_is_its_digest() {
        let mut block = SignedBlock::default();
        block.transactions = vec![trx(5)];
        assert_eq!(
            block.calculate_merkle_root().unwrap(),
            block.transactions[0].merkle_digest().unwrap()
        );
    }

    #[test]
    fn test_duplicate_extensions_rejected() {
        let mut header = BlockHeader::default();
        header.extensions = vec![
            BlockHeaderExtension::Version(Version::new(0, 1, 0)),
            BlockHeaderExtension::HardforkVersionVote {
                version: Version::new(0, 2, 0),
                time: TimePointSec::from_secs(10),
            },
        ];
        assert!(header.validate_extensions().is_ok());
        header
            .extensions
            .push(BlockHeaderExtension::Version(Version::new(0, 2, 0)));
        assert!(header.validate_extensions().is_err());
    }
}
