// Service module - Single-writer wrappers for multi-threaded hosts
//
// Each wrapper owns its component behind one tokio mutex, so a mutating
// call (including the external transfer for the fund) runs as a single
// exclusive critical section.

mod fund;
mod ledger;

pub use fund::SharedFundIntake;
pub use ledger::SharedLedger;
