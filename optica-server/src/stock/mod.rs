//! Stock subsystem: ledger (counters + change log) and the
//! reservation coordinator that owns every stock mutation.

pub mod coordinator;
pub mod ledger;

pub use coordinator::{ReservationLine, ReservationReceipt, StockCoordinator, StockError};
pub use ledger::StockLedger;
