pub mod error;
pub mod ledger;
mod record;

pub use error::LedgerError;
pub use ledger::{RewardLedger, Stats, XP_PER_LEVEL};
