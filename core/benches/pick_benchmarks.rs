use chrono::Utc;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::runtime::Runtime;
use wallet_flow::{
  settlement, FulfillmentOrchestrator, LineItem, MemoryLedgerStore, OrchestratorConfig, Order, OrderStatus, Seller,
};

fn order_with_items(id: &str, item_count: usize) -> Order {
  let items = (0..item_count)
    .map(|i| LineItem {
      name: format!("item_{}", i),
      price: Decimal::new(1999 + i as i64, 2),
      quantity: 1 + (i as i64 % 3),
      image_url: None,
    })
    .collect();
  Order::assigned(id, None, items, Decimal::ZERO, "admin", Utc::now())
}

fn fresh_store(item_count: usize) -> Arc<MemoryLedgerStore> {
  let store = Arc::new(MemoryLedgerStore::new());
  store.insert_order(order_with_items("bench-order", item_count));
  store.insert_seller(Seller::new("bench-seller", Decimal::new(1_000_000_00, 2), Utc::now()));
  store
}

// --- Benchmark Functions ---

fn bench_quote(c: &mut Criterion) {
  let mut group = c.benchmark_group("SettlementQuote");
  for item_count in [1usize, 10, 100] {
    let order = order_with_items("quote-order", item_count);
    group.throughput(Throughput::Elements(item_count as u64));
    group.bench_with_input(BenchmarkId::from_parameter(item_count), &order, |b, order| {
      b.iter(|| settlement::quote(order).unwrap())
    });
  }
  group.finish();
}

fn bench_pick_pipeline(c: &mut Criterion) {
  let mut group = c.benchmark_group("PickPipelineMemoryStore");
  let rt = Runtime::new().unwrap();

  for item_count in [1usize, 10, 50] {
    group.bench_with_input(BenchmarkId::from_parameter(item_count), &item_count, |b, &item_count| {
      b.to_async(&rt).iter_batched(
        || {
          let store = fresh_store(item_count);
          FulfillmentOrchestrator::new(store, OrchestratorConfig::default())
        },
        |orchestrator| async move {
          let order = orchestrator
            .pick_order("bench-order", "bench-seller", "bench-seller")
            .await
            .unwrap();
          assert_eq!(order.status, OrderStatus::Picked);
        },
        BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_full_lifecycle(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  c.bench_function("PickProcessRequestCompletion", |b| {
    b.to_async(&rt).iter_batched(
      || FulfillmentOrchestrator::new(fresh_store(5), OrchestratorConfig::default()),
      |orchestrator| async move {
        orchestrator
          .pick_order("bench-order", "bench-seller", "bench-seller")
          .await
          .unwrap();
        orchestrator
          .advance_status("bench-order", "bench-seller", OrderStatus::Processing)
          .await
          .unwrap();
        orchestrator
          .advance_status("bench-order", "bench-seller", OrderStatus::Completed)
          .await
          .unwrap();
      },
      BatchSize::SmallInput,
    );
  });
}

criterion_group!(benches, bench_quote, bench_pick_pipeline, bench_full_lifecycle);
criterion_main!(benches);
