//! Financial summaries over completed orders
//!
//! All amounts are integer currency units. Every split truncates toward
//! zero for non-negative values; the organization keeps the remainder.

use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};

use crate::config::FinanceConfig;
use crate::database::Store;
use crate::models::{Order, OrderItem};
use crate::utils::errors::Result;
use crate::utils::helpers::{day_start, week_start};

/// What one courier is owed for the period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourierPayout {
    /// Cost price the courier paid out of pocket
    pub cost_price: i64,
    pub salary: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinanceSummary {
    pub orders_count: usize,
    pub total_income: i64,
    pub total_cost: i64,
    pub profit: i64,
    pub courier_salaries: i64,
    pub organization_share: i64,
    pub commission: i64,
    pub net_profit: i64,
    pub couriers: BTreeMap<String, CourierPayout>,
}

fn percent_of(amount: i64, percent: i64) -> i64 {
    (amount * percent).div_euclid(100)
}

/// Split the profit of each line between its courier and the organization
pub fn summarize(orders: &[(Order, Vec<OrderItem>)], config: &FinanceConfig) -> FinanceSummary {
    let mut summary = FinanceSummary {
        orders_count: orders.len(),
        ..Default::default()
    };

    for (order, items) in orders {
        for item in items {
            let income = item.line_total();
            let cost = item.line_cost();
            let profit = income - cost;

            summary.total_income += income;
            summary.total_cost += cost;

            match &order.courier_username {
                Some(courier) => {
                    let salary = percent_of(profit, config.courier_share_percent);
                    let payout = summary.couriers.entry(courier.clone()).or_default();
                    payout.cost_price += cost;
                    payout.salary += salary;
                    summary.courier_salaries += salary;
                    summary.organization_share += profit - salary;
                }
                None => summary.organization_share += profit,
            }
        }
    }

    summary.profit = summary.total_income - summary.total_cost;
    summary.commission = percent_of(summary.organization_share, config.commission_percent);
    summary.net_profit = summary.organization_share - summary.commission;
    summary
}

pub fn format_daily_report(summary: &FinanceSummary) -> String {
    let mut message = String::from("📊 ЕЖЕДНЕВНЫЙ ОТЧЕТ\n\n");
    message.push_str(&format!("📦 Завершено заказов: {}\n", summary.orders_count));
    message.push_str(&format!("💰 За день поступило: {}р.\n\n", summary.total_income));
    message.push_str("💳 Необходимо выплатить себестоимость курьерам:\n");
    message.push_str(&format!("Всего: {}р.\n\n", summary.total_cost));

    if !summary.couriers.is_empty() {
        message.push_str("👥 По курьерам (себестоимость):\n");
        for (courier, payout) in &summary.couriers {
            message.push_str(&format!("• {}: {}р.\n", courier, payout.cost_price));
        }
        message.push('\n');
    }

    message.push_str(&format!("📈 Комиссия: {}р.\n", summary.commission));
    message.push_str(&format!("💵 Доход: {}р.", summary.net_profit));
    message
}

pub fn format_weekly_report(summary: &FinanceSummary) -> String {
    let mut message = String::from("📊 НЕДЕЛЬНЫЙ ОТЧЕТ\n\n");
    message.push_str(&format!("📦 Завершено заказов: {}\n", summary.orders_count));
    message.push_str(&format!("💰 Доход за неделю: {}р.\n\n", summary.profit));

    if !summary.couriers.is_empty() {
        message.push_str("💳 Зарплата курьерам:\n");
        for (courier, payout) in &summary.couriers {
            message.push_str(&format!("• {}: {}р.\n", courier, payout.salary));
        }
        message.push('\n');
    }

    message.push_str(&format!("🏢 Доля организации: {}р.\n", summary.organization_share));
    message.push_str(&format!("📈 Комиссия: {}р.\n", summary.commission));
    message.push_str(&format!("💵 Чистый доход: {}р.", summary.net_profit));
    message
}

/// Loads completed orders for a period and renders the report
#[derive(Clone)]
pub struct FinanceReporter {
    store: Arc<dyn Store>,
    config: FinanceConfig,
}

impl FinanceReporter {
    pub fn new(store: Arc<dyn Store>, config: FinanceConfig) -> Self {
        Self { store, config }
    }

    pub async fn summary_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<FinanceSummary> {
        let orders = self.store.completed_orders_between(from, to).await?;
        let mut with_items = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.store.order_items(order.id).await?;
            with_items.push((order, items));
        }
        Ok(summarize(&with_items, &self.config))
    }

    /// Report for the calendar day (UTC) containing `now`
    pub async fn daily_report(&self, now: DateTime<Utc>) -> Result<String> {
        let summary = self.summary_between(day_start(now.date_naive()), now).await?;
        Ok(format_daily_report(&summary))
    }

    /// Report from Monday of the current week up to `now`
    pub async fn weekly_report(&self, now: DateTime<Utc>) -> Result<String> {
        let summary = self.summary_between(week_start(now), now).await?;
        Ok(format_weekly_report(&summary))
    }
}
