// wallet_flow_service/src/seed.rs

//! Demo records for local runs (`SEED_DEMO_DATA=true`).

use crate::store::PgLedgerStore;
use chrono::Utc;
use rust_decimal::Decimal;
use wallet_flow::{LineItem, MemoryLedgerStore, Order, Seller, StoreError};

pub const DEMO_SELLER_ID: &str = "seller-demo";
pub const DEMO_ORDER_IDS: [&str; 2] = ["ord-demo-0001", "ord-demo-0002"];

fn item(name: &str, cents: i64, quantity: i64) -> LineItem {
  LineItem {
    name: name.to_string(),
    price: Decimal::new(cents, 2),
    quantity,
    image_url: None,
  }
}

/// One funded seller and two orders assigned to them.
pub fn demo_records() -> (Vec<Seller>, Vec<Order>) {
  let now = Utc::now();
  let sellers = vec![Seller::new(DEMO_SELLER_ID, Decimal::new(500_00, 2), now)];
  let orders = vec![
    Order::assigned(
      DEMO_ORDER_IDS[0],
      Some("1001".to_string()),
      vec![item("Ceramic mug", 2500, 2), item("Tea sampler", 575, 4)],
      Decimal::new(499, 2),
      "admin",
      now,
    ),
    Order::assigned(
      DEMO_ORDER_IDS[1],
      None,
      vec![item("Desk lamp", 4999, 1)],
      Decimal::ZERO,
      "admin",
      now,
    ),
  ];
  (sellers, orders)
}

pub fn seed_memory(store: &MemoryLedgerStore) {
  let (sellers, orders) = demo_records();
  for seller in sellers {
    store.insert_seller(seller);
  }
  for order in orders {
    store.insert_order(order);
  }
  tracing::info!("Seeded demo seller and orders into the memory ledger.");
}

/// Existing rows with the same ids are left alone.
pub async fn seed_postgres(store: &PgLedgerStore) -> Result<(), StoreError> {
  let (sellers, orders) = demo_records();
  for seller in &sellers {
    store.upsert_seller(seller).await?;
  }
  for order in &orders {
    store.upsert_order(order).await?;
  }
  tracing::info!("Seeded demo seller and orders into Postgres.");
  Ok(())
}
