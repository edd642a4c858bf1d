// Fund module - Contribution intake with limits, custody and a treasury
// set that emergency withdrawals may be routed to

mod config;
mod intake;
mod limits;
mod transfer;
mod treasury;

pub use config::IntakeConfig;
pub use intake::{Contribution, FundError, FundEvent, FundIntake, FundState};
pub use limits::ContributionLimits;
pub use transfer::{InMemoryToken, TransferError, ValueTransfer};
pub use treasury::TreasuryRegistry;
