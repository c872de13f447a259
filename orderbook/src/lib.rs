mod config;
mod engine;
mod errors;
mod events;
mod ledger;
mod numeric;
mod service;
pub mod store;
pub mod telemetry;
mod types;

// Core engine and matching functionality
pub use engine::{
    BalanceReceipt, CancelOrder, Deposit, FillReport, MatchingEngine, PlaceOrder, Trade,
    Withdrawal,
};

// Async service wrapping the engine
pub use service::Exchange;

// Error handling
pub use errors::{EngineError, IntoAnyhow};

// Domain vocabulary and numbers
pub use numeric::{Amount, Rate};
pub use types::{Account, Chain, Currency, Side, Symbol};

// Additional types for advanced usage
pub use config::EngineConfig;
pub use events::{MarketEvent, OrderStatus};
pub use ledger::Ledger;
pub use store::{MemoryStore, Order};

/// Type alias for order identifiers
pub type OrderId = u64;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
