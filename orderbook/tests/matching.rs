use orderbook::{
    Account, Amount, CancelOrder, Chain, Currency, Deposit, EngineError, MatchingEngine,
    MemoryStore, PlaceOrder, Side, Symbol, Withdrawal,
};

fn amt(v: u64) -> Amount {
    Amount::from(v)
}

fn fund(engine: &MatchingEngine<MemoryStore>, account: &Account, currency: Currency, amount: u64) {
    engine
        .deposit(&Deposit {
            account: account.clone(),
            currency,
            amount: amt(amount),
        })
        .unwrap();
}

fn place(account: &Account, side: Side, rate: &str, amount: u64) -> PlaceOrder {
    PlaceOrder {
        account: account.clone(),
        symbol: Symbol::EosEth,
        side,
        rate: rate.parse().unwrap(),
        amount: amt(amount),
    }
}

/// Three bidders at 2, 2.5 and 3 for 2, 3 and 2 EOS, and one seller with
/// 8 EOS.
fn bid_ladder() -> (MatchingEngine<MemoryStore>, [Account; 3], Account) {
    let engine = MatchingEngine::new(MemoryStore::new());
    let bidders = [
        Account::new("eth1", Chain::Ethereum),
        Account::new("eth2", Chain::Ethereum),
        Account::new("eth3", Chain::Ethereum),
    ];
    let seller = Account::new("eos1", Chain::Eosio);

    for bidder in &bidders {
        fund(&engine, bidder, Currency::Eth, 10);
    }
    fund(&engine, &seller, Currency::Eos, 8);

    engine.place_order(&place(&bidders[0], Side::Bid, "2", 2)).unwrap();
    engine.place_order(&place(&bidders[1], Side::Bid, "2.5", 3)).unwrap();
    engine.place_order(&place(&bidders[2], Side::Bid, "3", 2)).unwrap();

    (engine, bidders, seller)
}

#[test]
fn ask_only_takes_bids_at_or_above_its_rate() {
    let (engine, bidders, seller) = bid_ladder();

    let report = engine.place_order(&place(&seller, Side::Ask, "2.7", 8)).unwrap();

    assert_eq!(report.filled, amt(2));
    assert_eq!(report.trades.len(), 1);
    assert_eq!(report.trades[0].maker, bidders[2]);

    let asks = engine.open_orders(Symbol::EosEth, Side::Ask).unwrap();
    assert_eq!(asks.len(), 1);
    assert_eq!(Some(asks[0].id), report.order_id);
    assert_eq!(asks[0].remaining, amt(6));
    assert_eq!(asks[0].rate, "2.7".parse().unwrap());

    let bids = engine.open_orders(Symbol::EosEth, Side::Bid).unwrap();
    assert_eq!(bids.len(), 2);
    assert_eq!(bids[0].account, bidders[1]);
    assert_eq!(bids[1].account, bidders[0]);
}

#[test]
fn ask_walks_bids_best_price_first() {
    let (engine, bidders, seller) = bid_ladder();

    let report = engine.place_order(&place(&seller, Side::Ask, "2.5", 8)).unwrap();

    assert_eq!(report.filled, amt(5));
    let makers: Vec<_> = report.trades.iter().map(|t| t.maker.clone()).collect();
    assert_eq!(makers, vec![bidders[2].clone(), bidders[1].clone()]);
    assert_eq!(report.trades[0].quote_amount, amt(6));
    // 3 EOS at 2.5 is 7.5 ETH, truncated
    assert_eq!(report.trades[1].quote_amount, amt(7));

    let asks = engine.open_orders(Symbol::EosEth, Side::Ask).unwrap();
    assert_eq!(asks.len(), 1);
    assert_eq!(asks[0].remaining, amt(3));
    assert_eq!(asks[0].rate, "2.5".parse().unwrap());

    assert_eq!(engine.balance(&seller, Currency::Eth).unwrap(), amt(13));
    assert_eq!(engine.balance(&seller, Currency::Eos).unwrap(), amt(3));
    assert_eq!(engine.tradable_balance(&seller, Currency::Eos).unwrap(), Amount::ZERO);

    assert_eq!(engine.balance(&bidders[1], Currency::Eth).unwrap(), amt(3));
    assert_eq!(engine.balance(&bidders[1], Currency::Eos).unwrap(), amt(3));
    assert_eq!(engine.balance(&bidders[2], Currency::Eth).unwrap(), amt(4));
    assert_eq!(engine.balance(&bidders[2], Currency::Eos).unwrap(), amt(2));

    // the rate-2 bid is untouched and still reserves 4 ETH
    assert_eq!(engine.balance(&bidders[0], Currency::Eth).unwrap(), amt(10));
    assert_eq!(engine.tradable_balance(&bidders[0], Currency::Eth).unwrap(), amt(6));

    let total_eth: u64 = [&bidders[0], &bidders[1], &bidders[2], &seller]
        .iter()
        .map(|acc| engine.balance(acc, Currency::Eth).unwrap().as_u256().as_u64())
        .sum();
    assert_eq!(total_eth, 30);
}

#[test]
fn full_match_leaves_no_order() {
    let engine = MatchingEngine::new(MemoryStore::new());
    let seller = Account::new("eos1", Chain::Eosio);
    let buyer = Account::new("eth1", Chain::Ethereum);
    fund(&engine, &seller, Currency::Eos, 4);
    fund(&engine, &buyer, Currency::Eth, 20);

    let maker = engine.place_order(&place(&seller, Side::Ask, "4", 4)).unwrap();
    let maker_id = maker.order_id.unwrap();

    let report = engine.place_order(&place(&buyer, Side::Bid, "4", 4)).unwrap();
    assert_eq!(report.order_id, None);
    assert_eq!(report.filled, amt(4));
    assert!(engine
        .open_orders(Symbol::EosEth, Side::Ask)
        .unwrap()
        .iter()
        .all(|o| o.id != maker_id));
    assert_eq!(engine.balance(&buyer, Currency::Eth).unwrap(), amt(4));
    assert_eq!(engine.balance(&buyer, Currency::Eos).unwrap(), amt(4));
}

#[test]
fn cancelling_twice_reports_not_found() {
    let (engine, bidders, _) = bid_ladder();
    let id = engine.orders_of(&bidders[0]).unwrap()[0].id;
    let cancel = CancelOrder {
        id,
        account: bidders[0].clone(),
        symbol: Symbol::EosEth,
    };

    assert_eq!(engine.cancel_order(&cancel), Ok(()));
    assert_eq!(engine.cancel_order(&cancel), Err(EngineError::OrderNotFound(id)));
}

#[test]
fn failed_withdrawal_leaves_balance_unchanged() {
    let (engine, bidders, _) = bid_ladder();
    let acc = &bidders[1];
    let before = engine.balance(acc, Currency::Eth).unwrap();
    let tradable = engine.tradable_balance(acc, Currency::Eth).unwrap();
    assert_eq!(tradable, amt(3));

    let err = engine
        .withdrawal(&Withdrawal {
            account: acc.clone(),
            currency: Currency::Eth,
            amount: amt(4),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds { .. }));
    assert_eq!(engine.balance(acc, Currency::Eth).unwrap(), before);
}

#[test]
fn bids_and_asks_cross_in_both_directions() {
    let engine = MatchingEngine::new(MemoryStore::new());
    let eth = Account::new("0xAbC", Chain::Ethereum);
    let eos = Account::new("eosaccount", Chain::Eosio);
    fund(&engine, &eth, Currency::Eth, 100);
    fund(&engine, &eos, Currency::Eos, 100);

    engine.place_order(&place(&eth, Side::Bid, "1.2", 10)).unwrap();
    let report = engine.place_order(&place(&eos, Side::Ask, "1", 15)).unwrap();
    assert_eq!(report.filled, amt(10));
    assert_eq!(report.trades[0].quote_amount, amt(12));

    let report = engine.place_order(&place(&eth, Side::Bid, "1.5", 5)).unwrap();
    assert_eq!(report.filled, amt(5));
    assert_eq!(report.trades[0].rate, "1".parse().unwrap());
    assert_eq!(report.order_id, None);

    // addresses are case-insensitive
    let same = Account::new("0xabc", Chain::Ethereum);
    assert_eq!(engine.balance(&same, Currency::Eos).unwrap(), amt(15));
    assert_eq!(engine.balance(&same, Currency::Eth).unwrap(), amt(83));
    assert_eq!(engine.balance(&eos, Currency::Eth).unwrap(), amt(17));
    assert_eq!(engine.balance(&eos, Currency::Eos).unwrap(), amt(85));
}

#[test]
fn unfunded_account_cannot_buy_with_orders_worth_nothing() {
    let engine = MatchingEngine::new(MemoryStore::new());
    let seller = Account::new("eos1", Chain::Eosio);
    let broke = Account::new("eth9", Chain::Ethereum);
    fund(&engine, &seller, Currency::Eos, 10);

    engine.place_order(&place(&seller, Side::Ask, "0.9", 10)).unwrap();

    // 1 EOS at 0.9 truncates to 0 ETH, so it could not reserve anything.
    for _ in 0..3 {
        let err = engine.place_order(&place(&broke, Side::Bid, "0.9", 1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)), "{err}");
    }

    assert_eq!(engine.balance(&broke, Currency::Eos).unwrap(), Amount::ZERO);
    assert_eq!(engine.balance(&seller, Currency::Eth).unwrap(), Amount::ZERO);
    let asks = engine.open_orders(Symbol::EosEth, Side::Ask).unwrap();
    assert_eq!(asks[0].remaining, amt(10));
}
