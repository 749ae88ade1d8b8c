use crate::core::{Config, Result};
use crate::db::Store;
use crate::orders::{OrderRepository, OrdersManager};
use crate::stock::{StockCoordinator, StockLedger};

/// Server state holding shared handles to every service
///
/// Cheap to clone; every field is either plain data or an Arc-backed
/// handle.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | config | Config | Configuration (immutable) |
/// | ledger | StockLedger | Product stock and change log |
/// | coordinator | StockCoordinator | Atomic stock reservation |
/// | orders | OrdersManager | Order pipeline and transitions |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub ledger: StockLedger,
    pub coordinator: StockCoordinator,
    pub orders: OrdersManager,
}

impl ServerState {
    /// Initialize all services against the configured database file
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store = Store::open(config.db_path())?;
        Ok(Self::from_store(config.clone(), store))
    }

    /// Build state over an in-memory store (tests)
    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Store::open_in_memory()?;
        Ok(Self::from_store(config, store))
    }

    fn from_store(config: Config, store: Store) -> Self {
        let ledger = StockLedger::new(store.clone());
        let coordinator = StockCoordinator::new(ledger.clone());
        let repository = OrderRepository::new(store);
        let orders = OrdersManager::new(repository, coordinator.clone(), ledger.clone());
        Self {
            config,
            ledger,
            coordinator,
            orders,
        }
    }
}
