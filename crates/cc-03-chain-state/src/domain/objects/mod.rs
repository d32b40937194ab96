//! Records stored in the ledger by the chain core.

mod account;
mod block;
mod content;
mod escrow;
mod globals;
mod market;
mod proposal;
mod witness;

pub use account::{Account, AccountAuthority, AccountRecoveryRequest, OwnerAuthorityHistory};
pub use block::{BlockSummary, TransactionObject};
pub use content::{Comment, CommentVote};
pub use escrow::Escrow;
pub use globals::{DynamicGlobalProperty, FeedHistory, HardforkProperty, WitnessSchedule};
pub use market::{ConvertRequest, LimitOrder, LiquidityRewardBalance};
pub use proposal::{Proposal, RequiredApproval};
pub use witness::{Witness, WitnessVote};
