//! Exchange Demo
//!
//! This example demonstrates how to use the Exchange service to:
//! - Start the engine worker behind an async handle
//! - Subscribe to market data and error events
//! - Deposit, trade and cancel from concurrent tasks
//! - Observe rejected requests on the error channel

use orderbook::{
    Account, Amount, CancelOrder, Chain, Currency, Deposit, EngineConfig, EngineError, Exchange,
    MarketEvent, MatchingEngine, MemoryStore, PlaceOrder, Side, Symbol, Withdrawal,
};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orderbook::telemetry::init_tracing(false)?;

    println!("Starting Exchange Demo for {}", Symbol::EosEth);

    let config = EngineConfig::from_json(r#"{ "min_order_amount": "1", "event_capacity": 256 }"#)?;
    let exchange = Exchange::start(MatchingEngine::with_config(MemoryStore::new(), config));

    let mut market_data_rx = exchange.subscribe_to_market_data();
    let mut error_rx = exchange.subscribe_to_errors();

    let market_data_task = tokio::spawn(async move {
        println!("Market data handler started");
        while let Ok(event) = market_data_rx.recv().await {
            match event {
                MarketEvent::Deposit(receipt) | MarketEvent::Withdrawal(receipt) => {
                    println!(
                        "Balance changed: {} holds {} {}",
                        receipt.account, receipt.balance, receipt.currency
                    );
                }
                MarketEvent::Trade(trade) => {
                    println!(
                        "Trade: {} {} EOS at {} against order {}",
                        trade.taker, trade.base_amount, trade.rate, trade.maker_order_id
                    );
                }
                MarketEvent::OrderPlaced { order_id, side, rate, amount, .. } => {
                    println!("Order placed: ID={} {} {} @ {}", order_id, side, amount, rate);
                }
                MarketEvent::OrderUpdated { order_id, status, .. } => {
                    println!("Order updated: ID={} {:?}", order_id, status);
                }
            }
        }
        println!("Market data handler stopped");
    });

    let error_task = tokio::spawn(async move {
        println!("Error handler started");
        while let Ok(error) = error_rx.recv().await {
            match error {
                EngineError::InsufficientFunds { account, required, available, .. } => {
                    println!("Error: {} needs {}, has {}", account, required, available);
                }
                EngineError::OrderNotFound(order_id) => {
                    println!("Error: Order not found: {}", order_id);
                }
                other => println!("Error: {}", other),
            }
        }
        println!("Error handler stopped");
    });

    let alice = Account::new("0xA11CE", Chain::Ethereum);
    let bob = Account::new("bobbobbobbob", Chain::Eosio);

    exchange
        .deposit(Deposit {
            account: alice.clone(),
            currency: Currency::Eth,
            amount: Amount::from(100u64),
        })
        .await?;
    exchange
        .deposit(Deposit {
            account: bob.clone(),
            currency: Currency::Eos,
            amount: Amount::from(60u64),
        })
        .await?;

    println!("\nPlacing orders from two tasks");
    let bids = {
        let exchange = exchange.clone();
        let alice = alice.clone();
        tokio::spawn(async move {
            for rate in ["1.9", "2", "2.1"] {
                let order = PlaceOrder {
                    account: alice.clone(),
                    symbol: Symbol::EosEth,
                    side: Side::Bid,
                    rate: rate.parse()?,
                    amount: Amount::from(10u64),
                };
                exchange.place_order(order).await?;
            }
            anyhow::Ok(())
        })
    };
    let asks = {
        let exchange = exchange.clone();
        let bob = bob.clone();
        tokio::spawn(async move {
            for rate in ["2.2", "2"] {
                let order = PlaceOrder {
                    account: bob.clone(),
                    symbol: Symbol::EosEth,
                    side: Side::Ask,
                    rate: rate.parse()?,
                    amount: Amount::from(15u64),
                };
                exchange.place_order(order).await?;
            }
            anyhow::Ok(())
        })
    };
    bids.await??;
    asks.await??;

    println!("\nRequests that get rejected");
    let _ = exchange
        .withdrawal(Withdrawal {
            account: bob.clone(),
            currency: Currency::Eos,
            amount: Amount::from(1_000u64),
        })
        .await;
    let _ = exchange
        .cancel_order(CancelOrder {
            id: 42_000,
            account: bob.clone(),
            symbol: Symbol::EosEth,
        })
        .await;

    for account in [&alice, &bob] {
        for currency in Currency::all() {
            let balance = exchange.balance(account.clone(), *currency).await?;
            let tradable = exchange.tradable_balance(account.clone(), *currency).await?;
            println!("{} {}: {} (tradable {})", account, currency, balance, tradable);
        }
    }

    // Let the subscribers drain before shutting down
    sleep(Duration::from_millis(100)).await;
    drop(exchange);
    market_data_task.await?;
    error_task.await?;

    println!("\nDemo completed");
    Ok(())
}
