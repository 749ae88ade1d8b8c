//! Optica Server - order transaction and stock consistency engine
//!
//! # Architecture
//!
//! Back-office core for an optical goods retailer. Order creation runs
//! a fixed pipeline: schema validation, pricing, atomic stock
//! reservation, persistence. Stock is only ever mutated through the
//! reservation coordinator, and every mutation leaves an append-only
//! change log entry for reconciliation.
//!
//! # Module structure
//!
//! ```text
//! optica-server/src/
//! ├── core/          # Configuration, state, server
//! ├── api/           # HTTP routes and handlers
//! ├── orders/        # Validation, pricing, persistence, lifecycle
//! ├── stock/         # Stock ledger and reservation coordinator
//! ├── db/            # Embedded redb storage
//! └── utils/         # Errors, response envelope, logging
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod orders;
pub mod stock;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use orders::{OrderError, OrdersManager};
pub use stock::{StockCoordinator, StockLedger};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load the environment, create the working directory and set up
/// logging. Called once at startup.
pub fn setup_environment() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ____        __  _
  / __ \____  / /_(_)________ _
 / / / / __ \/ __/ / ___/ __ `/
/ /_/ / /_/ / /_/ / /__/ /_/ /
\____/ .___/\__/_/\___/\__,_/
    /_/
    "#
    );
}
