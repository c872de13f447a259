//! In-memory reference store.
//!
//! A transaction holds the store's mutex for its whole lifetime, so
//! transactions run one at a time. Writes are applied in place and journaled;
//! dropping the transaction without committing replays the journal backwards.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::EngineError;
use crate::numeric::{Amount, Rate};
use crate::store::{BalanceDelta, NewOrder, Order, Store, StoreTx};
use crate::types::{Account, Currency, Side, Symbol};
use crate::OrderId;

#[derive(Debug, Default)]
struct State {
    accounts: BTreeSet<Account>,
    balances: HashMap<(Account, Currency), Amount>,
    orders: BTreeMap<OrderId, Order>,
    last_order_id: OrderId,
}

#[derive(Debug)]
enum Undo {
    AccountAdded(Account),
    Balance {
        key: (Account, Currency),
        previous: Option<Amount>,
    },
    OrderInserted {
        id: OrderId,
        previous_last_id: OrderId,
    },
    OrderChanged(Order),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered accounts, in address order.
    pub fn accounts(&self) -> Vec<Account> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.accounts.iter().cloned().collect()
    }
}

impl Store for MemoryStore {
    type Tx<'a> = MemoryTx<'a>;

    fn begin(&self) -> Result<MemoryTx<'_>, EngineError> {
        // A panicking transaction rolls back in `Drop` before the guard is
        // released, so a poisoned lock still guards consistent state.
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(MemoryTx {
            state,
            journal: Vec::new(),
            committed: false,
        })
    }
}

pub struct MemoryTx<'a> {
    state: MutexGuard<'a, State>,
    journal: Vec<Undo>,
    committed: bool,
}

impl MemoryTx<'_> {
    fn ensure_account(&mut self, account: &Account) {
        if self.state.accounts.insert(account.clone()) {
            self.journal.push(Undo::AccountAdded(account.clone()));
        }
    }

    fn rollback(&mut self) {
        let state = &mut *self.state;
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::AccountAdded(account) => {
                    state.accounts.remove(&account);
                }
                Undo::Balance { key, previous } => match previous {
                    Some(amount) => {
                        state.balances.insert(key, amount);
                    }
                    None => {
                        state.balances.remove(&key);
                    }
                },
                Undo::OrderInserted {
                    id,
                    previous_last_id,
                } => {
                    state.orders.remove(&id);
                    state.last_order_id = previous_last_id;
                }
                Undo::OrderChanged(order) => {
                    state.orders.insert(order.id, order);
                }
            }
        }
    }

    fn sorted(mut orders: Vec<Order>, side: Side) -> Vec<Order> {
        // Stable sorts keep id order among equal rates.
        match side {
            Side::Ask => orders.sort_by(|a, b| a.rate.cmp(&b.rate)),
            Side::Bid => orders.sort_by(|a, b| b.rate.cmp(&a.rate)),
        }
        orders
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.journal.is_empty() {
            tracing::debug!("Rolling back {} uncommitted store writes", self.journal.len());
            self.rollback();
        }
    }
}

impl StoreTx for MemoryTx<'_> {
    fn upsert_account(&mut self, account: &Account) -> Result<(), EngineError> {
        self.ensure_account(account);
        Ok(())
    }

    fn get_balance(&self, account: &Account, currency: Currency) -> Result<Amount, EngineError> {
        Ok(self
            .state
            .balances
            .get(&(account.clone(), currency))
            .copied()
            .unwrap_or(Amount::ZERO))
    }

    fn modify_balance(
        &mut self,
        account: &Account,
        currency: Currency,
        delta: BalanceDelta,
    ) -> Result<Amount, EngineError> {
        let key = (account.clone(), currency);
        let previous = self.state.balances.get(&key).copied();
        let current = previous.unwrap_or(Amount::ZERO);
        let updated = match delta {
            BalanceDelta::Credit(amount) => current.checked_add(amount)?,
            BalanceDelta::Debit(amount) => {
                current
                    .checked_sub(amount)
                    .ok_or_else(|| EngineError::InsufficientFunds {
                        account: account.to_string(),
                        currency,
                        required: amount,
                        available: current,
                    })?
            }
        };

        self.ensure_account(account);
        self.journal.push(Undo::Balance {
            key: key.clone(),
            previous,
        });
        self.state.balances.insert(key, updated);
        Ok(updated)
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<OrderId, EngineError> {
        if order.amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "resting order amount must be positive".to_string(),
            ));
        }
        self.ensure_account(&order.account);

        let previous_last_id = self.state.last_order_id;
        let id = previous_last_id + 1;
        self.state.last_order_id = id;
        self.state.orders.insert(
            id,
            Order {
                id,
                account: order.account,
                symbol: order.symbol,
                side: order.side,
                rate: order.rate,
                remaining: order.amount,
            },
        );
        self.journal.push(Undo::OrderInserted {
            id,
            previous_last_id,
        });
        Ok(id)
    }

    fn reduce_order(&mut self, id: OrderId, remaining: Amount) -> Result<(), EngineError> {
        if remaining.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "order {id} cannot rest with zero remaining"
            )));
        }
        let order = self
            .state
            .orders
            .get_mut(&id)
            .ok_or(EngineError::OrderNotFound(id))?;
        let previous = order.clone();
        order.remaining = remaining;
        self.journal.push(Undo::OrderChanged(previous));
        Ok(())
    }

    fn cancel_order(
        &mut self,
        id: OrderId,
        account: &Account,
        symbol: Symbol,
    ) -> Result<(), EngineError> {
        let owned = self
            .state
            .orders
            .get(&id)
            .is_some_and(|o| &o.account == account && o.symbol == symbol);
        if !owned {
            return Err(EngineError::OrderNotFound(id));
        }
        if let Some(removed) = self.state.orders.remove(&id) {
            self.journal.push(Undo::OrderChanged(removed));
        }
        Ok(())
    }

    fn query_open_orders(
        &self,
        symbol: Symbol,
        side: Side,
        threshold: Rate,
    ) -> Result<Vec<Order>, EngineError> {
        let acceptable = |o: &&Order| match side {
            Side::Ask => o.rate <= threshold,
            Side::Bid => o.rate >= threshold,
        };
        let orders = self
            .state
            .orders
            .values()
            .filter(|o| o.symbol == symbol && o.side == side)
            .filter(acceptable)
            .cloned()
            .collect();
        Ok(Self::sorted(orders, side))
    }

    fn book_side(&self, symbol: Symbol, side: Side) -> Result<Vec<Order>, EngineError> {
        let orders = self
            .state
            .orders
            .values()
            .filter(|o| o.symbol == symbol && o.side == side)
            .cloned()
            .collect();
        Ok(Self::sorted(orders, side))
    }

    fn orders_for_account(&self, account: &Account) -> Result<Vec<Order>, EngineError> {
        Ok(self
            .state
            .orders
            .values()
            .filter(|o| &o.account == account)
            .cloned()
            .collect())
    }

    fn commit(mut self) -> Result<(), EngineError> {
        self.committed = true;
        self.journal.clear();
        Ok(())
    }
}
