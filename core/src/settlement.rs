// wallet_flow/src/settlement.rs

//! Wallet settlement for picked orders.
//!
//! Picking moves the order's product cost out of the seller's spendable
//! balance and into escrow. The escrow is sized for the eventual payout, so it
//! also carries the seller's margin on top of the cost. Releasing escrow is the
//! admin side's job and never happens here.

use crate::error::FulfillmentError;
use crate::model::{LedgerTransaction, Order, Seller, TransactionType};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

/// Seller margin credited to escrow on pick: 0.23.
pub const MARGIN_RATE: Decimal = Decimal::from_parts(23, 0, 0, false, 2);

/// Monetary amounts are kept to cents.
pub const DECIMAL_PLACES: u32 = 2;

/// Largest amount a ledger column holds: 999,999,999,999.99.
pub const MAX_LEDGER_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Totals derived from an order's line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundsQuote {
  /// `sum(price * quantity)`: debited from the wallet.
  pub total_product_price: Decimal,
  /// Margin on the product price. Credited to escrow alongside the price.
  pub total_additional_profit: Decimal,
}

impl FundsQuote {
  /// Amount added to `pending_amount`.
  pub fn escrow_amount(&self) -> Decimal {
    self.total_product_price + self.total_additional_profit
  }
}

/// The outcome of a successful reservation. Nothing is persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
  pub seller: Seller,
  pub transaction: LedgerTransaction,
  pub quote: FundsQuote,
}

/// Prices `order`, rejecting items the ledger cannot represent.
///
/// Prices must be non-negative whole cents and quantities at least 1. The
/// escrow for the whole order must stay within [`MAX_LEDGER_AMOUNT`].
pub fn quote(order: &Order) -> Result<FundsQuote, FulfillmentError> {
  let malformed = |item_index: usize, reason: String| FulfillmentError::MalformedOrder {
    order_id: order.id.clone(),
    item_index,
    reason,
  };

  let mut total_product_price = Decimal::ZERO;
  for (item_index, item) in order.items.iter().enumerate() {
    if item.price.is_sign_negative() && !item.price.is_zero() {
      return Err(malformed(item_index, format!("has negative price {}", item.price)));
    }
    if item.price.normalize().scale() > DECIMAL_PLACES {
      return Err(malformed(
        item_index,
        format!("has price {} with fractions of a cent", item.price),
      ));
    }
    if item.quantity < 1 {
      return Err(malformed(
        item_index,
        format!("has quantity {}, expected at least 1", item.quantity),
      ));
    }
    total_product_price = item
      .checked_line_total()
      .and_then(|line| total_product_price.checked_add(line))
      .ok_or_else(|| malformed(item_index, "amount overflows".to_string()))?;

    // Checked per item so the error names the item that crossed the limit.
    if total_product_price > MAX_LEDGER_AMOUNT
      || total_product_price + margin_for(total_product_price) > MAX_LEDGER_AMOUNT
    {
      return Err(malformed(
        item_index,
        format!("brings the escrow above the ledger limit {}", MAX_LEDGER_AMOUNT),
      ));
    }
  }

  Ok(FundsQuote {
    total_product_price,
    total_additional_profit: margin_for(total_product_price),
  })
}

/// Margin on `price`, rounded once to cents. Callers keep `price` within the
/// ledger limit.
fn margin_for(price: Decimal) -> Decimal {
  (price * MARGIN_RATE).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Reserves the funds for picking `order` out of `seller`'s wallet.
///
/// Fails with `InsufficientBalance` when the spendable balance does not cover
/// the product price. On success the returned seller has
/// `wallet_balance - price` and `pending_amount + price + margin`, and the
/// transaction debits `-price`.
pub fn reserve_funds(order: &Order, seller: &Seller, now: DateTime<Utc>) -> Result<Reservation, FulfillmentError> {
  let quote = quote(order)?;

  if seller.wallet_balance < quote.total_product_price {
    return Err(FulfillmentError::InsufficientBalance {
      seller_id: seller.id.clone(),
      order_id: order.id.clone(),
      available: seller.wallet_balance,
      required: quote.total_product_price,
    });
  }

  let mut updated = seller.clone();
  updated.wallet_balance -= quote.total_product_price;
  // Saturates instead of panicking; the store rejects anything past the ledger limit.
  updated.pending_amount = updated.pending_amount.saturating_add(quote.escrow_amount());
  updated.last_updated = now;

  let transaction = LedgerTransaction {
    id: Uuid::new_v4(),
    order_id: order.id.clone(),
    seller_id: seller.id.clone(),
    amount: -quote.total_product_price,
    kind: TransactionType::OrderPicked,
    affects_revenue: true,
    timestamp: now,
    note: format!(
      "Picked order #{}: {} reserved, {} margin escrowed",
      order.display_label(),
      quote.total_product_price,
      quote.total_additional_profit
    ),
  };

  Ok(Reservation {
    seller: updated,
    transaction,
    quote,
  })
}
