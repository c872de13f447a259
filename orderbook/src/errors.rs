use thiserror::Error;

use crate::numeric::Amount;
use crate::types::Currency;
use crate::OrderId;

/// Engine-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Insufficient funds: {account} needs {required} {currency}, tradable {available}")]
    InsufficientFunds {
        account: String,
        currency: Currency,
        required: Amount,
        available: Amount,
    },

    #[error("Invalid pair: {0}")]
    InvalidPair(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Invalid chain: {0}")]
    InvalidChain(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Exchange service stopped")]
    ServiceStopped,
}

impl EngineError {
    /// Expected business outcomes, as opposed to infrastructure failures.
    pub fn is_business(&self) -> bool {
        !matches!(
            self,
            EngineError::StoreUnavailable(_) | EngineError::ServiceStopped
        )
    }
}

/// Trait to simplify converting domain-specific errors into `anyhow::Error`
pub trait IntoAnyhow<T> {
    /// Convert a domain-specific error into an `anyhow::Error`
    fn into_anyhow(self) -> anyhow::Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> IntoAnyhow<T> for Result<T, E> {
    fn into_anyhow(self) -> anyhow::Result<T> {
        self.map_err(anyhow::Error::new)
    }
}
