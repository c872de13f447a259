//! Balance ledger operations on top of a store transaction.
use crate::errors::EngineError;
use crate::numeric::Amount;
use crate::store::{BalanceDelta, StoreTx};
use crate::types::{Account, Currency};

/// Balance rules shared by every engine operation.
///
/// Implemented for every [`StoreTx`], so the checks run inside whatever
/// transaction the caller already holds.
pub trait Ledger: StoreTx {
    /// Balance minus what the account's own open orders reserve.
    fn tradable_balance(&self, account: &Account, currency: Currency) -> Result<Amount, EngineError> {
        let balance = self.get_balance(account, currency)?;
        let mut reserved = Amount::ZERO;
        for order in self.orders_for_account(account)? {
            if order.symbol.involves(currency) {
                reserved = reserved.checked_add(order.reserved(currency)?)?;
            }
        }
        if reserved > balance {
            tracing::error!(
                "Open orders of {} reserve {} {} against a balance of {}",
                account,
                reserved,
                currency,
                balance
            );
        }
        Ok(balance.saturating_sub(reserved))
    }

    /// Fail with `InsufficientFunds` unless `required` is tradable.
    fn ensure_tradable(
        &self,
        account: &Account,
        currency: Currency,
        required: Amount,
    ) -> Result<(), EngineError> {
        let available = self.tradable_balance(account, currency)?;
        if available < required {
            tracing::warn!(
                "Insufficient funds for {}: needs {} {}, tradable {}",
                account,
                required,
                currency,
                available
            );
            return Err(EngineError::InsufficientFunds {
                account: account.to_string(),
                currency,
                required,
                available,
            });
        }
        Ok(())
    }

    fn credit(&mut self, account: &Account, currency: Currency, amount: Amount) -> Result<Amount, EngineError> {
        let balance = self.modify_balance(account, currency, BalanceDelta::Credit(amount))?;
        tracing::debug!("Credited {} {} to {}, balance {}", amount, currency, account, balance);
        Ok(balance)
    }

    fn debit(&mut self, account: &Account, currency: Currency, amount: Amount) -> Result<Amount, EngineError> {
        let balance = self.modify_balance(account, currency, BalanceDelta::Debit(amount))?;
        tracing::debug!("Debited {} {} from {}, balance {}", amount, currency, account, balance);
        Ok(balance)
    }
}

impl<T: StoreTx> Ledger for T {}
