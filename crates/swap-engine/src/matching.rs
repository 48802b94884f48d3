//! # Order Matching
//!
//! Pure matching logic over book snapshots: complementary assets, a price
//! compatibility bound, and best-price-first ordering.

use swap_orders::OrderBookEntry;

/// Price of an entry: taker amount per unit of maker amount.
pub fn effective_price(entry: &OrderBookEntry) -> f64 {
    entry.signed.order.price()
}

/// Two orders are complementary when each offers what the other wants.
/// Asset comparison is case-insensitive.
pub fn is_complementary(target: &OrderBookEntry, candidate: &OrderBookEntry) -> bool {
    let t = &target.signed.order;
    let c = &candidate.signed.order;
    t.taker_asset.eq_ignore_ascii_case(&c.maker_asset)
        && t.maker_asset.eq_ignore_ascii_case(&c.taker_asset)
}

/// Price compatibility: the product of the two prices may exceed parity by
/// at most the slippage bound.
pub fn price_compatible(
    target: &OrderBookEntry,
    candidate: &OrderBookEntry,
    max_slippage: f64,
) -> bool {
    effective_price(target) * effective_price(candidate) <= 1.0 + max_slippage
}

/// Matches for `target` among `candidates`, best price first, oldest first
/// within a price. Self-matches (same order id) are rejected.
pub fn find_matches_in(
    target: &OrderBookEntry,
    candidates: &[OrderBookEntry],
    max_slippage: f64,
) -> Vec<OrderBookEntry> {
    let mut matches: Vec<OrderBookEntry> = candidates
        .iter()
        .filter(|c| c.order_id() != target.order_id())
        .filter(|c| is_complementary(target, c))
        .filter(|c| price_compatible(target, c, max_slippage))
        .cloned()
        .collect();
    matches.sort_by(|a, b| {
        effective_price(a)
            .partial_cmp(&effective_price(b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.created_at.cmp(&b.created_at))
    });
    matches
}
