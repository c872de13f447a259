//! Basic usage example for the orderbook library
//!
//! This example drives the synchronous engine directly:
//! - Funding accounts
//! - Resting and matching orders
//! - Canceling orders and withdrawing funds
//! - Inspecting balances and the book

use orderbook::{
    Account, Amount, CancelOrder, Chain, Currency, Deposit, EngineResult, IntoAnyhow,
    MatchingEngine, MemoryStore, PlaceOrder, Side, Symbol, Withdrawal,
};

fn main() -> anyhow::Result<()> {
    orderbook::telemetry::init_tracing(false)?;
    println!("=== Orderbook Library Example ===\n");

    let engine = MatchingEngine::new(MemoryStore::new());
    let buyer = Account::new("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf", Chain::Ethereum);
    let seller = Account::new("eosio.trader", Chain::Eosio);

    println!("--- Funding Accounts ---");
    let receipt = engine.deposit(&Deposit {
        account: buyer.clone(),
        currency: Currency::Eth,
        amount: Amount::from(1_000u64),
    })?;
    println!("{} now holds {} {}", receipt.account, receipt.balance, receipt.currency);
    let receipt = engine.deposit(&Deposit {
        account: seller.clone(),
        currency: Currency::Eos,
        amount: Amount::from(500u64),
    })?;
    println!("{} now holds {} {}", receipt.account, receipt.balance, receipt.currency);

    println!("\n--- Resting Asks ---");
    for (rate, amount) in [("1.5", 100u64), ("1.8", 100), ("2.2", 100)] {
        let report = engine.place_order(&PlaceOrder {
            account: seller.clone(),
            symbol: Symbol::EosEth,
            side: Side::Ask,
            rate: rate.parse()?,
            amount: Amount::from(amount),
        })?;
        println!("Ask {} @ {} rests as order {:?}", amount, rate, report.order_id);
    }
    display_book(&engine).into_anyhow()?;

    println!("\n--- Matching Bid ---");
    let report = engine.place_order(&PlaceOrder {
        account: buyer.clone(),
        symbol: Symbol::EosEth,
        side: Side::Bid,
        rate: "2".parse()?,
        amount: Amount::from(250u64),
    })?;
    println!("Filled {} EOS in {} trades:", report.filled, report.trades.len());
    for trade in &report.trades {
        println!(
            "  Order {}: {} EOS for {} ETH at {}",
            trade.maker_order_id, trade.base_amount, trade.quote_amount, trade.rate
        );
    }
    if let Some(id) = report.order_id {
        println!("Remainder rests as bid {}", id);
    }
    display_book(&engine).into_anyhow()?;

    println!("\n--- Canceling The Remainder ---");
    if let Some(id) = report.order_id {
        engine.cancel_order(&CancelOrder {
            id,
            account: buyer.clone(),
            symbol: Symbol::EosEth,
        })?;
        println!("Cancelled order {}", id);
    }

    println!("\n--- Withdrawing ---");
    let tradable = engine.tradable_balance(&seller, Currency::Eos)?;
    println!("{} can withdraw {} EOS", seller, tradable);
    match engine.withdrawal(&Withdrawal {
        account: seller.clone(),
        currency: Currency::Eos,
        amount: Amount::from(500u64),
    }) {
        Ok(receipt) => println!("Withdrew, balance {}", receipt.balance),
        Err(e) => println!("Withdrawal rejected: {}", e),
    }

    println!("\n--- Final Balances ---");
    for account in [&buyer, &seller] {
        for currency in Currency::all() {
            println!(
                "  {} {}: {} (tradable {})",
                account,
                currency,
                engine.balance(account, *currency)?,
                engine.tradable_balance(account, *currency)?
            );
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}

fn display_book(engine: &MatchingEngine<MemoryStore>) -> EngineResult<()> {
    println!("Order Book {}:", Symbol::EosEth);
    for side in Side::all() {
        for order in engine.open_orders(Symbol::EosEth, *side)? {
            println!(
                "  {} #{} {} @ {} by {}",
                side, order.id, order.remaining, order.rate, order.account
            );
        }
    }
    Ok(())
}
