use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tokio::sync::{broadcast, oneshot};

use crate::engine::{
    BalanceReceipt, CancelOrder, Deposit, FillReport, MatchingEngine, PlaceOrder, Withdrawal,
};
use crate::errors::EngineError;
use crate::events::MarketEvent;
use crate::numeric::Amount;
use crate::store::Store;
use crate::types::{Account, Currency};
use crate::EngineResult;

type Reply<T> = oneshot::Sender<EngineResult<T>>;

/// Requests handled by the engine worker
enum Command {
    Deposit(Deposit, Reply<BalanceReceipt>),
    Withdrawal(Withdrawal, Reply<BalanceReceipt>),
    PlaceOrder(PlaceOrder, Reply<FillReport>),
    CancelOrder(CancelOrder, Reply<()>),
    Balance {
        account: Account,
        currency: Currency,
        tradable: bool,
        reply: Reply<Amount>,
    },
}

/// Exchange service
///
/// Owns the matching engine on a dedicated blocking worker and exposes it to
/// async callers:
/// - Routes requests to the worker over a channel, one at a time
/// - Replies to each caller on its own oneshot channel
/// - Broadcasts market events for every successful operation
/// - Broadcasts errors for every failed one
///
/// ## Architecture
///
/// 1. **Engine Worker**: a blocking task that drains the request channel and
///    runs each request to completion, restarted if it panics
/// 2. **Handles**: cheap clones of `Exchange` sharing the request channel
///
/// The worker executes requests in arrival order, so no two operations ever
/// interleave. A caller that drops its future after sending still gets its
/// request applied in full or not at all; only the reply is lost.
///
/// ## Usage Example
///
/// ```rust
/// use orderbook::{
///     Account, Amount, Chain, Currency, Deposit, Exchange, MatchingEngine, MemoryStore,
/// };
///
/// #[tokio::main]
/// async fn main() {
///     let exchange = Exchange::start(MatchingEngine::new(MemoryStore::new()));
///     let mut market_data = exchange.subscribe_to_market_data();
///
///     let receipt = exchange
///         .deposit(Deposit {
///             account: Account::new("eth1", Chain::Ethereum),
///             currency: Currency::Eth,
///             amount: Amount::from(10u64),
///         })
///         .await
///         .unwrap();
///     assert_eq!(receipt.balance, Amount::from(10u64));
///
///     let event = market_data.recv().await.unwrap();
///     println!("Market event: {:?}", event);
/// }
/// ```
#[derive(Clone)]
pub struct Exchange {
    commands: Sender<Command>,
    market_data_sender: broadcast::Sender<MarketEvent>,
    error_sender: broadcast::Sender<EngineError>,
}

impl Exchange {
    /// Starts the engine worker and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime. The worker exits once
    /// every handle has been dropped.
    pub fn start<S: Store + 'static>(engine: MatchingEngine<S>) -> Self {
        let (commands, command_receiver) = crossbeam_channel::unbounded::<Command>();
        let (market_data_sender, _) =
            broadcast::channel::<MarketEvent>(engine.config().event_capacity);
        let (error_sender, _) = broadcast::channel::<EngineError>(engine.config().error_capacity);

        Self::start_engine(
            Arc::new(engine),
            command_receiver,
            market_data_sender.clone(),
            error_sender.clone(),
        );

        Exchange {
            commands,
            market_data_sender,
            error_sender,
        }
    }

    fn start_engine<S: Store + 'static>(
        engine: Arc<MatchingEngine<S>>,
        command_receiver: Receiver<Command>,
        market_data_sender: broadcast::Sender<MarketEvent>,
        error_sender: broadcast::Sender<EngineError>,
    ) {
        tokio::task::spawn_blocking(move || loop {
            tracing::info!("Starting engine worker");
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                run(&engine, &command_receiver, &market_data_sender, &error_sender)
            }));
            match result {
                Ok(()) => {
                    tracing::info!("Engine worker exited normally");
                    break;
                }
                Err(panic_info) => {
                    tracing::error!("Engine worker panicked, restarting... Panic: {:?}", panic_info);
                }
            }
        });
    }

    pub async fn deposit(&self, req: Deposit) -> EngineResult<BalanceReceipt> {
        self.request(|reply| Command::Deposit(req, reply)).await
    }

    pub async fn withdrawal(&self, req: Withdrawal) -> EngineResult<BalanceReceipt> {
        self.request(|reply| Command::Withdrawal(req, reply)).await
    }

    pub async fn place_order(&self, req: PlaceOrder) -> EngineResult<FillReport> {
        self.request(|reply| Command::PlaceOrder(req, reply)).await
    }

    pub async fn cancel_order(&self, req: CancelOrder) -> EngineResult<()> {
        self.request(|reply| Command::CancelOrder(req, reply)).await
    }

    pub async fn balance(&self, account: Account, currency: Currency) -> EngineResult<Amount> {
        self.request(|reply| Command::Balance {
            account,
            currency,
            tradable: false,
            reply,
        })
        .await
    }

    pub async fn tradable_balance(
        &self,
        account: Account,
        currency: Currency,
    ) -> EngineResult<Amount> {
        self.request(|reply| Command::Balance {
            account,
            currency,
            tradable: true,
            reply,
        })
        .await
    }

    /// Subscribe to market data events.
    ///
    /// # Returns
    ///
    /// A broadcast receiver that will receive deposits, withdrawals, trades,
    /// order placements and order state changes.
    pub fn subscribe_to_market_data(&self) -> broadcast::Receiver<MarketEvent> {
        self.market_data_sender.subscribe()
    }

    /// Subscribe to engine error events.
    ///
    /// # Returns
    ///
    /// A broadcast receiver that will receive every error returned to a
    /// caller, such as insufficient funds or order not found.
    pub fn subscribe_to_errors(&self) -> broadcast::Receiver<EngineError> {
        self.error_sender.subscribe()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> EngineResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| EngineError::ServiceStopped)?;
        response.await.map_err(|_| EngineError::ServiceStopped)?
    }
}

fn run<S: Store>(
    engine: &MatchingEngine<S>,
    commands: &Receiver<Command>,
    market_data_sender: &broadcast::Sender<MarketEvent>,
    error_sender: &broadcast::Sender<EngineError>,
) {
    let publisher = Publisher {
        market_data_sender,
        error_sender,
    };

    while let Ok(command) = commands.recv() {
        match command {
            Command::Deposit(req, reply) => {
                let result = engine.deposit(&req);
                publisher.respond(result, reply, |r| MarketEvent::deposit(r.clone()));
            }
            Command::Withdrawal(req, reply) => {
                let result = engine.withdrawal(&req);
                publisher.respond(result, reply, |r| MarketEvent::withdrawal(r.clone()));
            }
            Command::PlaceOrder(req, reply) => {
                let result = engine.place_order(&req);
                publisher.respond(result, reply, |report| {
                    MarketEvent::from_fill(report, req.rate, req.amount)
                });
            }
            Command::CancelOrder(req, reply) => {
                let result = engine.cancel_order(&req);
                publisher.respond(result, reply, |_| {
                    MarketEvent::cancelled(req.id, req.account.clone(), req.symbol)
                });
            }
            Command::Balance {
                account,
                currency,
                tradable,
                reply,
            } => {
                let result = if tradable {
                    engine.tradable_balance(&account, currency)
                } else {
                    engine.balance(&account, currency)
                };
                publisher.respond(result, reply, |_| Vec::new());
            }
        }
    }
}

struct Publisher<'a> {
    market_data_sender: &'a broadcast::Sender<MarketEvent>,
    error_sender: &'a broadcast::Sender<EngineError>,
}

impl Publisher<'_> {
    fn respond<T>(
        &self,
        result: EngineResult<T>,
        reply: Reply<T>,
        events: impl FnOnce(&T) -> Vec<MarketEvent>,
    ) {
        match &result {
            Ok(value) => {
                for event in events(value) {
                    // No subscribers, which is fine
                    let _ = self.market_data_sender.send(event);
                }
            }
            Err(error) => {
                if error.is_business() {
                    tracing::warn!("Request rejected: {}", error);
                } else {
                    tracing::error!("Request failed: {}", error);
                }
                let _ = self.error_sender.send(error.clone());
            }
        }

        if reply.send(result).is_err() {
            tracing::debug!("Caller dropped before the reply was sent");
        }
    }
}
