//! Budget totals over the record list.

use serde::Serialize;

use crate::models::{Category, Record};

/// Spend for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: u64,
}

/// Spend against the trip budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    pub budget: u64,
    pub total_spent: u64,
    /// Never negative; an overspent budget reports 0
    pub remaining: u64,
    /// Every category in display order, including empty ones
    pub by_category: Vec<CategoryTotal>,
}

impl BudgetSummary {
    /// Sum `records` against `budget`.
    #[must_use]
    pub fn from_records(records: &[Record], budget: u64) -> Self {
        let mut by_category: Vec<CategoryTotal> = Category::ALL
            .iter()
            .map(|&category| CategoryTotal { category, total: 0 })
            .collect();

        let mut total_spent = 0u64;
        for record in records {
            total_spent = total_spent.saturating_add(record.amount_primary);
            if let Some(entry) = by_category
                .iter_mut()
                .find(|entry| entry.category == record.category)
            {
                entry.total = entry.total.saturating_add(record.amount_primary);
            }
        }

        Self {
            budget,
            total_spent,
            remaining: budget.saturating_sub(total_spent),
            by_category,
        }
    }

    #[must_use]
    pub const fn is_over_budget(&self) -> bool {
        self.total_spent > self.budget
    }

    /// Share of total spend for one category, 0.0 when nothing is spent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self, category: Category) -> f64 {
        if self.total_spent == 0 {
            return 0.0;
        }
        self.by_category
            .iter()
            .find(|entry| entry.category == category)
            .map_or(0.0, |entry| entry.total as f64 / self.total_spent as f64)
    }
}

/// Format an amount with thousands separators, e.g. `800,000`.
#[must_use]
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}
