use serde::Deserialize;

use crate::errors::EngineError;
use crate::numeric::Amount;

/// Configuration for engine and service behavior
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum order amount allowed, in base units
    pub min_order_amount: Amount,
    /// Maximum order amount allowed, in base units
    pub max_order_amount: Option<Amount>,
    /// Skip resting orders owned by the incoming account instead of trading
    /// against them. Off by default; skipping can leave the book crossed.
    pub self_trade_prevention: bool,
    /// Capacity of the market event broadcast channel
    pub event_capacity: usize,
    /// Capacity of the error broadcast channel
    pub error_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_order_amount: Amount::from(1u64),
            max_order_amount: None,
            self_trade_prevention: false,
            event_capacity: 1000,
            error_capacity: 100,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_order_amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "min_order_amount must be positive".to_string(),
            ));
        }
        if let Some(max) = self.max_order_amount {
            if max < self.min_order_amount {
                return Err(EngineError::InvalidAmount(format!(
                    "max_order_amount {max} is below min_order_amount {}",
                    self.min_order_amount
                )));
            }
        }
        Ok(())
    }

    /// Check an order amount against the configured bounds.
    pub fn check_order_amount(&self, amount: Amount) -> Result<(), EngineError> {
        if amount < self.min_order_amount {
            return Err(EngineError::InvalidAmount(format!(
                "{amount} is below the minimum order amount {}",
                self.min_order_amount
            )));
        }
        match self.max_order_amount {
            Some(max) if amount > max => Err(EngineError::InvalidAmount(format!(
                "{amount} exceeds the maximum order amount {max}"
            ))),
            _ => Ok(()),
        }
    }
}
