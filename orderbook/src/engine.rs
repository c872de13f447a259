//! Core matching engine implementation for the order book.
//!
//! This module provides the `MatchingEngine` struct and the request and
//! result types of the four public operations: deposit, withdrawal, place
//! order and cancel order.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::ledger::Ledger;
use crate::numeric::{Amount, Rate};
use crate::store::{NewOrder, Order, Store, StoreTx};
use crate::types::{Account, Currency, Side, Symbol};
use crate::{EngineResult, OrderId};

// The engine keeps no state of its own. Every operation opens one store
// transaction, and either commits all of its writes or drops the
// transaction, which rolls them back.
//
// Order amounts are base units on both sides. A bid reserves the quote
// needed to buy its remainder at its own rate, an ask reserves its remainder
// of base. Matches always execute at the resting order's rate.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub account: Account,
    pub currency: Currency,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub account: Account,
    pub currency: Currency,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub account: Account,
    pub symbol: Symbol,
    pub side: Side,
    pub rate: Rate,
    /// Base units to buy or sell.
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub id: OrderId,
    pub account: Account,
    pub symbol: Symbol,
}

/// Balance after a deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReceipt {
    pub account: Account,
    pub currency: Currency,
    pub balance: Amount,
}

/// One match between the incoming order and a resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub maker_order_id: OrderId,
    pub maker: Account,
    pub taker: Account,
    pub symbol: Symbol,
    pub taker_side: Side,
    /// The resting order's rate.
    pub rate: Rate,
    pub base_amount: Amount,
    pub quote_amount: Amount,
    /// What is left of the resting order; zero when it was consumed or
    /// closed with a remainder worth less than one quote unit.
    pub maker_remaining: Amount,
}

/// Outcome of `place_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    /// Id of the resting remainder, absent when nothing was left to rest.
    /// A remainder worth less than one quote unit is dropped, not rested.
    pub order_id: Option<OrderId>,
    pub account: Account,
    pub symbol: Symbol,
    pub side: Side,
    /// Base units matched against resting orders.
    pub filled: Amount,
    pub trades: Vec<Trade>,
}

pub struct MatchingEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: Store> MatchingEngine<S> {
    /// Create an engine over `store` with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn upsert_account(&self, account: &Account) -> EngineResult<()> {
        let mut tx = self.store.begin()?;
        tx.upsert_account(account)?;
        tx.commit()
    }

    /// Credit `amount` to the account.
    pub fn deposit(&self, req: &Deposit) -> EngineResult<BalanceReceipt> {
        require_positive(req.amount)?;
        let mut tx = self.store.begin()?;
        tx.upsert_account(&req.account)?;
        let balance = tx.credit(&req.account, req.currency, req.amount)?;
        tx.commit()?;

        tracing::info!("Deposit of {} {} for {}", req.amount, req.currency, req.account);
        Ok(BalanceReceipt {
            account: req.account.clone(),
            currency: req.currency,
            balance,
        })
    }

    /// Debit `amount` if the account can spend it without touching funds
    /// reserved by its open orders.
    pub fn withdrawal(&self, req: &Withdrawal) -> EngineResult<BalanceReceipt> {
        require_positive(req.amount)?;
        let mut tx = self.store.begin()?;
        tx.ensure_tradable(&req.account, req.currency, req.amount)?;
        let balance = tx.debit(&req.account, req.currency, req.amount)?;
        tx.commit()?;

        tracing::info!("Withdrawal of {} {} for {}", req.amount, req.currency, req.account);
        Ok(BalanceReceipt {
            account: req.account.clone(),
            currency: req.currency,
            balance,
        })
    }

    /// Match an incoming order against the book and rest any remainder.
    pub fn place_order(&self, req: &PlaceOrder) -> EngineResult<FillReport> {
        require_positive(req.amount)?;
        self.config.check_order_amount(req.amount)?;

        let mut tx = self.store.begin()?;
        let report = self.match_order(&mut tx, req)?;
        tx.commit()?;

        tracing::info!(
            "{} {} {} @ {} for {}: filled {} in {} trades, resting {:?}",
            req.symbol,
            req.side,
            req.amount,
            req.rate,
            req.account,
            report.filled,
            report.trades.len(),
            report.order_id
        );
        Ok(report)
    }

    /// Remove an open order owned by the caller.
    pub fn cancel_order(&self, req: &CancelOrder) -> EngineResult<()> {
        let mut tx = self.store.begin()?;
        tx.cancel_order(req.id, &req.account, req.symbol)?;
        tx.commit()?;

        tracing::info!("Cancelled order {} on {} for {}", req.id, req.symbol, req.account);
        Ok(())
    }

    pub fn balance(&self, account: &Account, currency: Currency) -> EngineResult<Amount> {
        self.store.begin()?.get_balance(account, currency)
    }

    pub fn tradable_balance(&self, account: &Account, currency: Currency) -> EngineResult<Amount> {
        self.store.begin()?.tradable_balance(account, currency)
    }

    /// Resting orders on one side of the book, best price first.
    pub fn open_orders(&self, symbol: Symbol, side: Side) -> EngineResult<Vec<Order>> {
        self.store.begin()?.book_side(symbol, side)
    }

    pub fn orders_of(&self, account: &Account) -> EngineResult<Vec<Order>> {
        self.store.begin()?.orders_for_account(account)
    }

    fn match_order<T: StoreTx>(&self, tx: &mut T, req: &PlaceOrder) -> EngineResult<FillReport> {
        let worth = req.rate.quote_for(req.amount)?;
        if worth.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "{} {} at {} is worth less than one {}",
                req.amount,
                req.symbol.base(),
                req.rate,
                req.symbol.quote()
            )));
        }
        let spend = req.side.spend_currency(req.symbol);
        let required = match req.side {
            Side::Ask => req.amount,
            Side::Bid => worth,
        };
        tx.ensure_tradable(&req.account, spend, required)?;
        tx.upsert_account(&req.account)?;

        let candidates = tx.query_open_orders(req.symbol, req.side.opposite(), req.rate)?;
        let mut remaining = req.amount;
        let mut trades = Vec::new();

        for candidate in candidates {
            // A remainder worth less than one quote unit neither trades nor rests.
            if remaining.is_zero() || req.rate.quote_for(remaining)?.is_zero() {
                break;
            }
            if self.config.self_trade_prevention && candidate.account == req.account {
                tracing::debug!("Skipping own order {} for {}", candidate.id, req.account);
                continue;
            }

            // Equal ends the walk, Greater moves on to the next candidate.
            let (base, left) = match remaining.cmp(&candidate.remaining) {
                Ordering::Less => (remaining, candidate.remaining.saturating_sub(remaining)),
                Ordering::Equal | Ordering::Greater => (candidate.remaining, Amount::ZERO),
            };

            let maker_remaining = if left.is_zero() || candidate.rate.quote_for(left)?.is_zero() {
                if !left.is_zero() {
                    tracing::debug!("Closing order {} with dust remainder {}", candidate.id, left);
                }
                tx.cancel_order(candidate.id, &candidate.account, candidate.symbol)?;
                Amount::ZERO
            } else {
                tx.reduce_order(candidate.id, left)?;
                left
            };

            trades.push(settle(tx, req, &candidate, base, maker_remaining)?);
            remaining = remaining.saturating_sub(base);
        }

        let order_id = if remaining.is_zero() || req.rate.quote_for(remaining)?.is_zero() {
            None
        } else {
            Some(tx.insert_order(NewOrder {
                account: req.account.clone(),
                symbol: req.symbol,
                side: req.side,
                rate: req.rate,
                amount: remaining,
            })?)
        };

        Ok(FillReport {
            order_id,
            account: req.account.clone(),
            symbol: req.symbol,
            side: req.side,
            filled: req.amount.saturating_sub(remaining),
            trades,
        })
    }
}

/// Move `base` units and their quote value at the maker's rate between the
/// two accounts. Credits go first so a self-trade never dips below zero.
///
/// The quote leg truncates but never drops below one unit. Every resting
/// order and every incoming remainder that reaches this point is worth at
/// least one unit at its own rate, so the bump only applies to an incoming
/// bid taking part of a cheaper ask, and stays within that bid's budget.
fn settle<T: StoreTx>(
    tx: &mut T,
    req: &PlaceOrder,
    maker: &Order,
    base: Amount,
    maker_remaining: Amount,
) -> EngineResult<Trade> {
    let quote = maker.rate.quote_for(base)?.max(Amount::ONE);
    let (buyer, seller) = match req.side {
        Side::Bid => (&req.account, &maker.account),
        Side::Ask => (&maker.account, &req.account),
    };

    tx.credit(buyer, req.symbol.base(), base)?;
    tx.credit(seller, req.symbol.quote(), quote)?;
    tx.debit(buyer, req.symbol.quote(), quote)?;
    tx.debit(seller, req.symbol.base(), base)?;

    tracing::debug!(
        "Matched order {}: {} {} for {} {} at {}",
        maker.id,
        base,
        req.symbol.base(),
        quote,
        req.symbol.quote(),
        maker.rate
    );

    Ok(Trade {
        maker_order_id: maker.id,
        maker: maker.account.clone(),
        taker: req.account.clone(),
        symbol: req.symbol,
        taker_side: req.side,
        rate: maker.rate,
        base_amount: base,
        quote_amount: quote,
        maker_remaining,
    })
}

fn require_positive(amount: Amount) -> EngineResult<()> {
    if amount.is_zero() {
        return Err(EngineError::InvalidAmount("amount must be positive".to_string()));
    }
    Ok(())
}
