//! Storage contract consumed by the engine.
//!
//! Every engine operation opens one transaction with [`Store::begin`], does
//! all of its reads and writes through [`StoreTx`], and finishes with
//! [`StoreTx::commit`]. A transaction dropped without committing must leave
//! no trace, so a failure half way through a match is never observable.
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::numeric::{Amount, Rate};
use crate::types::{Account, Currency, Side, Symbol};
use crate::OrderId;

pub mod memory;

pub use memory::MemoryStore;

/// A resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account: Account,
    pub symbol: Symbol,
    pub side: Side,
    pub rate: Rate,
    /// Base units still open. Never zero for a stored order.
    pub remaining: Amount,
}

impl Order {
    /// Amount of `currency` this order holds back from its owner's balance.
    ///
    /// Asks reserve their remaining base; bids reserve the quote needed to
    /// buy their remaining base at their own rate.
    pub fn reserved(&self, currency: Currency) -> Result<Amount, EngineError> {
        match self.side {
            Side::Ask if currency == self.symbol.base() => Ok(self.remaining),
            Side::Bid if currency == self.symbol.quote() => self.rate.quote_for(self.remaining),
            _ => Ok(Amount::ZERO),
        }
    }
}

/// Order to insert into the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub account: Account,
    pub symbol: Symbol,
    pub side: Side,
    pub rate: Rate,
    pub amount: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceDelta {
    Credit(Amount),
    Debit(Amount),
}

pub trait Store: Send + Sync {
    type Tx<'a>: StoreTx
    where
        Self: 'a;

    /// Open a transaction. Transactions are serializable with respect to
    /// each other.
    fn begin(&self) -> Result<Self::Tx<'_>, EngineError>;
}

pub trait StoreTx {
    /// Register an account. Registering twice is a no-op.
    fn upsert_account(&mut self, account: &Account) -> Result<(), EngineError>;

    /// Zero when the account never held `currency`.
    fn get_balance(&self, account: &Account, currency: Currency) -> Result<Amount, EngineError>;

    /// Apply `delta` and return the new balance. A debit larger than the
    /// balance fails with `InsufficientFunds` and changes nothing.
    fn modify_balance(
        &mut self,
        account: &Account,
        currency: Currency,
        delta: BalanceDelta,
    ) -> Result<Amount, EngineError>;

    fn insert_order(&mut self, order: NewOrder) -> Result<OrderId, EngineError>;

    /// Set the remaining amount of an open order. `remaining` must be
    /// nonzero; fully consumed orders are removed with `cancel_order`.
    fn reduce_order(&mut self, id: OrderId, remaining: Amount) -> Result<(), EngineError>;

    /// Remove an order owned by `account` on `symbol`.
    fn cancel_order(
        &mut self,
        id: OrderId,
        account: &Account,
        symbol: Symbol,
    ) -> Result<(), EngineError>;

    /// Open orders on one side of `symbol` whose rate is acceptable against
    /// `threshold`, best price first, oldest first within a price.
    ///
    /// Asks qualify when `rate <= threshold` and come cheapest first; bids
    /// qualify when `rate >= threshold` and come dearest first.
    fn query_open_orders(
        &self,
        symbol: Symbol,
        side: Side,
        threshold: Rate,
    ) -> Result<Vec<Order>, EngineError>;

    /// Every open order of one side of `symbol`, best price first.
    fn book_side(&self, symbol: Symbol, side: Side) -> Result<Vec<Order>, EngineError>;

    fn orders_for_account(&self, account: &Account) -> Result<Vec<Order>, EngineError>;

    fn commit(self) -> Result<(), EngineError>;
}
