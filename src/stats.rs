//! Dashboard aggregation engine.
//!
//! [`compute_stats`] is a pure function over a snapshot of the order ledger and two
//! collection counts. Nothing is cached between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{
    DashboardStats, Order, OrderStatus, RecentOrder, SalesPoint, StatusCount,
};

/// Width of the trailing sales window.
pub const SALES_WINDOW_DAYS: i64 = 7;
/// Maximum number of orders in the recent-orders projection.
pub const RECENT_ORDERS_LIMIT: usize = 10;

/// compute_stats
///
/// Builds the admin dashboard from the full ledger. `now` anchors the trailing
/// seven-day window; sales are bucketed by UTC calendar date.
pub fn compute_stats(
    orders: &[Order],
    total_users: i64,
    total_products: i64,
    now: DateTime<Utc>,
) -> DashboardStats {
    // Plain left-to-right accumulation; starts at +0.0 so an empty ledger reports 0.
    let total_sales = orders.iter().fold(0.0, |acc, o| acc + o.total_price);

    let order_status_data: Vec<StatusCount> = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: orders
                .iter()
                .filter(|o| o.status == status.as_str())
                .count() as i64,
        })
        .collect();

    let unrecognized_status_count = orders
        .iter()
        .filter(|o| OrderStatus::parse(&o.status).is_none())
        .count() as i64;
    if unrecognized_status_count > 0 {
        tracing::warn!(
            count = unrecognized_status_count,
            "Orders with non-canonical status excluded from status histogram"
        );
    }

    DashboardStats {
        total_sales,
        total_orders: orders.len() as i64,
        total_users,
        total_products,
        sales_data: sales_by_date(orders, now),
        order_status_data,
        unrecognized_status_count,
        recent_orders: recent_orders(orders),
    }
}

/// Sum of `total_price` per UTC date for orders created at or after `now - 7 days`.
fn sales_by_date(orders: &[Order], now: DateTime<Utc>) -> Vec<SalesPoint> {
    let window_start = now - Duration::days(SALES_WINDOW_DAYS);

    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.created_at >= window_start) {
        *buckets.entry(order.created_at.date_naive()).or_insert(0.0) += order.total_price;
    }

    buckets
        .into_iter()
        .map(|(date, sales)| SalesPoint {
            date: date.format("%Y-%m-%d").to_string(),
            sales,
        })
        .collect()
}

/// Newest `RECENT_ORDERS_LIMIT` orders. The sort is stable, so ties keep ledger order.
fn recent_orders(orders: &[Order]) -> Vec<RecentOrder> {
    let mut newest: Vec<&Order> = orders.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    newest
        .into_iter()
        .take(RECENT_ORDERS_LIMIT)
        .map(|order| RecentOrder {
            id: order.id,
            user: order.buyer.clone(),
            items: order.items.clone(),
            total_price: order.total_price,
            status: order.status.clone(),
            created_at: order.created_at,
        })
        .collect()
}
