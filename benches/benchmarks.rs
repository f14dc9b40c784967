use criterion::{black_box, criterion_group, criterion_main, Criterion};
use chrono::{Duration, NaiveDate};
use rusty_captrack::finance::{Portfolio, SecurityLedger, TransactionRecord};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap()
}

/// Alternating buys of 10 and sells of 5, one per day
fn trades(ticker: &str, count: i64) -> Vec<TransactionRecord> {
    (0..count)
        .map(|i| {
            let date = start_date() + Duration::days(i + 1);
            if i % 2 == 0 {
                TransactionRecord::buy(ticker, date, 1000.0 + i as f64, 10, 4.99).unwrap()
            } else {
                TransactionRecord::sell(ticker, date, 600.0 + i as f64, 5, 4.99).unwrap()
            }
        })
        .collect()
}

fn benchmark_front_insert(c: &mut Criterion) {
    let mut ledger = SecurityLedger::new("BNS");
    ledger.insert_all(trades("BNS", 5_000)).unwrap();

    // Every record after the front insert is recomputed
    c.bench_function("front_insert_5000", |b| {
        b.iter(|| {
            let mut ledger = ledger.clone();
            let record = TransactionRecord::buy("BNS", start_date(), 100.0, 1, 0.0).unwrap();
            black_box(ledger.insert(black_box(record)).unwrap());
        });
    });
}

fn benchmark_append(c: &mut Criterion) {
    c.bench_function("append_1000", |b| {
        b.iter(|| {
            let mut ledger = SecurityLedger::new("BNS");
            for record in trades("BNS", 1_000) {
                ledger.insert(black_box(record)).unwrap();
            }
            black_box(ledger.current_cost_base());
        });
    });
}

fn benchmark_portfolio_batch(c: &mut Criterion) {
    let tickers = ["AAPL", "BNS", "GOOG", "MSFT", "TD"];
    let batch: Vec<TransactionRecord> = tickers
        .iter()
        .flat_map(|ticker| trades(ticker, 1_000))
        .collect();

    c.bench_function("portfolio_batch_5x1000", |b| {
        b.iter(|| {
            let mut portfolio = Portfolio::new("Bench");
            for ticker in tickers {
                portfolio.add_security(ticker);
            }
            portfolio.add_transactions(black_box(batch.clone())).unwrap();
            black_box(portfolio.summary());
        });
    });
}

criterion_group!(
    benches,
    benchmark_front_insert,
    benchmark_append,
    benchmark_portfolio_batch
);
criterion_main!(benches);
