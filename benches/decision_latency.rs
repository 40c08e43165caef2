use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;

use fraudr::domain::{Action, RiskSignals, RuleParams, Transaction, UserTier};
use fraudr::engine::{DecisionEngine, ThresholdStore};
use fraudr::orchestrator::Orchestrator;
use fraudr::rules::RuleChain;
use fraudr::scoring::ModelFile;
use fraudr::testing::{FixedScorer, PassthroughPreprocessor};

fn quiet_transaction() -> Transaction {
    Transaction::new("user_1@upi", "shop_1@upi", Decimal::new(1500, 0), 14)
        .with_id("TXN_QUIET")
        .with_signals(RiskSignals {
            avg_amount_last_week: Some(Decimal::new(2000, 0)),
            preferred_device: Some("device_000".to_string()),
            ..Default::default()
        })
}

fn risky_transaction() -> Transaction {
    Transaction::new("user_2@upi", "new_1@upi", Decimal::new(60000, 0), 2)
        .with_id("TXN_RISKY")
        .with_signals(RiskSignals {
            avg_amount_last_week: Some(Decimal::new(2000, 0)),
            receiver_age_days: Some(2),
            receiver_fraud_reports: Some(5),
            geo_distance_from_last_txn: Some(850.0),
            transaction_frequency_last_24h: Some(14),
            is_unusual_hour: Some(true),
            user_type: Some(UserTier::Vip),
            preferred_device: Some("device_home".to_string()),
            device_mismatch: None,
        })
}

fn stub_orchestrator(score: f64) -> Orchestrator {
    Orchestrator::new(
        Arc::new(PassthroughPreprocessor),
        Arc::new(FixedScorer(score)),
        DecisionEngine::new(Arc::new(ThresholdStore::default())),
    )
}

fn bench_make_decision(c: &mut Criterion) {
    let engine = DecisionEngine::new(Arc::new(ThresholdStore::default()));
    let quiet = quiet_transaction();
    let risky = risky_transaction();

    c.bench_function("make_decision_no_context", |b| {
        b.iter(|| engine.make_decision(black_box(0.55), None))
    });

    c.bench_function("make_decision_quiet_context", |b| {
        b.iter(|| engine.make_decision(black_box(0.2), Some(black_box(&quiet))))
    });

    c.bench_function("make_decision_risky_context", |b| {
        b.iter(|| engine.make_decision(black_box(0.2), Some(black_box(&risky))))
    });
}

fn bench_overlay_chain(c: &mut Criterion) {
    let chain = RuleChain::from_params(&RuleParams::default());
    let quiet = quiet_transaction();
    let risky = risky_transaction();

    c.bench_function("overlay_chain_passthrough", |b| {
        b.iter(|| chain.apply(black_box(Action::Allow), black_box(&quiet)))
    });

    c.bench_function("overlay_chain_all_rules", |b| {
        b.iter(|| chain.apply(black_box(Action::Allow), black_box(&risky)))
    });
}

fn bench_predict(c: &mut Criterion) {
    let stub = stub_orchestrator(0.3);
    let builtin = Orchestrator::from_model(
        ModelFile::builtin(),
        Arc::new(ThresholdStore::default()),
    );
    let tx = risky_transaction();
    let payload = json!({
        "transaction_id": "TXN_BENCH",
        "sender_id": "user_1@upi",
        "receiver_id": "shop_1@upi",
        "amount": 1500.0,
        "transaction_time": 14,
        "device_id": "device_1",
        "ip_address": "10.0.0.1",
        "receiver_age_days": 400,
        "avg_amount_last_week": 2000.0,
        "preferred_device": "device_1"
    });

    c.bench_function("predict_stub_scorer", |b| {
        b.iter(|| stub.predict(black_box(&tx)))
    });

    c.bench_function("predict_builtin_model", |b| {
        b.iter(|| builtin.predict(black_box(&tx)))
    });

    c.bench_function("predict_fraud_from_json", |b| {
        b.iter(|| builtin.predict_fraud(black_box(&payload)))
    });
}

fn bench_batch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = stub_orchestrator(0.5);
    let items: Vec<_> = (0..100)
        .map(|i| {
            json!({
                "sender_id": format!("user_{}@upi", i),
                "receiver_id": "shop_1@upi",
                "amount": 100 + i,
                "transaction_time": i % 24,
                "device_id": "device_1",
                "ip_address": "10.0.0.1"
            })
        })
        .collect();

    c.bench_function("batch_predict_100_blocking", |b| {
        b.to_async(&runtime).iter(|| {
            let orchestrator = orchestrator.clone();
            let items = items.clone();
            async move {
                tokio::task::spawn_blocking(move || orchestrator.batch_predict(items))
                    .await
                    .unwrap()
            }
        })
    });
}

criterion_group!(
    benches,
    bench_make_decision,
    bench_overlay_chain,
    bench_predict,
    bench_batch,
);

criterion_main!(benches);
