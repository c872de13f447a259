//! Market events derived from completed engine operations.
use serde::{Deserialize, Serialize};

use crate::engine::{BalanceReceipt, FillReport, Trade};
use crate::numeric::{Amount, Rate};
use crate::types::{Account, Side, Symbol};
use crate::OrderId;

/// Lifecycle state of an order as seen by subscribers.
///
/// `Filled` and `Cancelled` are terminal: the order no longer exists in the
/// store once either is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    Deposit(BalanceReceipt),
    Withdrawal(BalanceReceipt),
    Trade(Trade),
    /// A resting order changed state.
    OrderUpdated {
        order_id: OrderId,
        account: Account,
        symbol: Symbol,
        status: OrderStatus,
    },
    /// A new resting order was added to the book.
    OrderPlaced {
        order_id: OrderId,
        account: Account,
        symbol: Symbol,
        side: Side,
        rate: Rate,
        amount: Amount,
    },
}

impl MarketEvent {
    pub fn deposit(receipt: BalanceReceipt) -> Vec<MarketEvent> {
        vec![MarketEvent::Deposit(receipt)]
    }

    pub fn withdrawal(receipt: BalanceReceipt) -> Vec<MarketEvent> {
        vec![MarketEvent::Withdrawal(receipt)]
    }

    pub fn cancelled(order_id: OrderId, account: Account, symbol: Symbol) -> Vec<MarketEvent> {
        vec![MarketEvent::OrderUpdated {
            order_id,
            account,
            symbol,
            status: OrderStatus::Cancelled,
        }]
    }

    /// Trades in execution order, each followed by the maker's new state,
    /// then the placement of the incoming remainder if one rested.
    pub fn from_fill(report: &FillReport, rate: Rate, amount: Amount) -> Vec<MarketEvent> {
        let mut events = Vec::with_capacity(report.trades.len() * 2 + 1);
        for trade in &report.trades {
            events.push(MarketEvent::Trade(trade.clone()));
            let status = if trade.maker_remaining.is_zero() {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            events.push(MarketEvent::OrderUpdated {
                order_id: trade.maker_order_id,
                account: trade.maker.clone(),
                symbol: trade.symbol,
                status,
            });
        }
        if let Some(order_id) = report.order_id {
            events.push(MarketEvent::OrderPlaced {
                order_id,
                account: report.account.clone(),
                symbol: report.symbol,
                side: report.side,
                rate,
                amount: amount.saturating_sub(report.filled),
            });
        }
        events
    }
}
