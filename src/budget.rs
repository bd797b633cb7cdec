//! Category budget: allocations carved out of a fixed income, with spending
//! tracked against each allocation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::domain::{Name, Series, percent_of};
use crate::error::{FinanceError, Result, ensure_non_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub allocated: Decimal,
    pub consumed: Decimal,
}

impl CategoryEntry {
    pub fn remaining(&self) -> Decimal {
        self.allocated - self.consumed
    }

    /// `None` for a zero allocation.
    pub fn utilization(&self) -> Option<Decimal> {
        percent_of(self.consumed, self.allocated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownRow {
    pub label: String,
    pub allocated: Decimal,
    pub consumed: Decimal,
}

#[derive(Debug, Clone)]
pub struct Budget {
    income: Decimal,
    categories: BTreeMap<Name, CategoryEntry>,
}

impl Budget {
    pub fn new(income: Decimal) -> Self {
        Self {
            income,
            categories: BTreeMap::new(),
        }
    }

    pub fn income(&self) -> Decimal {
        self.income
    }

    pub fn categories(&self) -> &BTreeMap<Name, CategoryEntry> {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&CategoryEntry> {
        self.categories.get(name)
    }

    pub fn total_allocated(&self) -> Decimal {
        self.categories.values().map(|c| c.allocated).sum()
    }

    pub fn total_consumed(&self) -> Decimal {
        self.categories.values().map(|c| c.consumed).sum()
    }

    pub fn unallocated(&self) -> Decimal {
        self.income - self.total_allocated()
    }

    /// Inserts (or overwrites) a category.
    ///
    /// The check runs against every current allocation, including one about
    /// to be overwritten under the same name.
    pub fn add_category(&mut self, name: &str, allocated: Decimal, consumed: Decimal) -> Result<()> {
        let name = Name::parse(name)?;
        ensure_non_negative("allocated", allocated)?;
        ensure_non_negative("consumed", consumed)?;

        let available = self.unallocated();
        if available < allocated {
            return Err(FinanceError::OverAllocated {
                category: name.to_string(),
                requested: allocated,
                available,
            });
        }
        if consumed > allocated {
            return Err(FinanceError::OverConsumed {
                category: name.to_string(),
                allocated,
                consumed,
            });
        }

        debug!(category = %name, %allocated, %consumed, "budget category added");
        self.categories.insert(
            name,
            CategoryEntry {
                allocated,
                consumed,
            },
        );
        Ok(())
    }

    /// Replaces a category's allocation, keeping what it already consumed.
    pub fn adjust_allocation(&mut self, name: &str, new_allocated: Decimal) -> Result<()> {
        ensure_non_negative("allocated", new_allocated)?;
        let total = self.total_allocated();
        let Some(entry) = self.categories.get_mut(name) else {
            return Err(FinanceError::not_found("budget category", name));
        };

        let without_this = total - entry.allocated;
        if without_this + new_allocated > self.income {
            return Err(FinanceError::OverAllocated {
                category: name.to_string(),
                requested: new_allocated,
                available: self.income - without_this,
            });
        }

        debug!(category = name, old = %entry.allocated, new = %new_allocated, "allocation adjusted");
        entry.allocated = new_allocated;
        Ok(())
    }

    /// Adds to a category's consumption. Overspending is allowed and shows up
    /// in utilization and alerts.
    pub fn record_spend(&mut self, name: &str, amount: Decimal) -> Result<()> {
        ensure_non_negative("spend", amount)?;
        let Some(entry) = self.categories.get_mut(name) else {
            return Err(FinanceError::not_found("budget category", name));
        };
        entry.consumed = entry
            .consumed
            .checked_add(amount)
            .ok_or(FinanceError::Overflow {
                what: "category consumption",
            })?;
        if entry.consumed > entry.allocated {
            warn!(category = name, consumed = %entry.consumed, allocated = %entry.allocated, "category overspent");
        }
        Ok(())
    }

    pub fn remove_category(&mut self, name: &str) -> Result<CategoryEntry> {
        self.categories
            .remove(name)
            .ok_or_else(|| FinanceError::not_found("budget category", name))
    }

    pub fn utilization(&self, name: &str) -> Result<Decimal> {
        let entry = self
            .categories
            .get(name)
            .ok_or_else(|| FinanceError::not_found("budget category", name))?;
        entry.utilization().ok_or(FinanceError::DivisionUndefined {
            what: "utilization of a zero allocation",
        })
    }

    /// Splits categories into those below `threshold_percent` utilization and
    /// those at or above it. Zero allocations always land in the second set.
    pub fn partition_by_utilization(
        &self,
        threshold_percent: Decimal,
    ) -> (BTreeSet<Name>, BTreeSet<Name>) {
        let mut under = BTreeSet::new();
        let mut over_or_at = BTreeSet::new();
        for (name, entry) in &self.categories {
            match entry.utilization() {
                Some(pct) if pct < threshold_percent => {
                    under.insert(name.clone());
                }
                _ => {
                    over_or_at.insert(name.clone());
                }
            }
        }
        (under, over_or_at)
    }

    /// On-budget categories still have room (`consumed < allocated`); the
    /// rest are off-budget.
    pub fn partition_on_off_budget(&self) -> (BTreeSet<Name>, BTreeSet<Name>) {
        let (on, off): (Vec<_>, Vec<_>) = self
            .categories
            .iter()
            .partition(|(_, entry)| entry.consumed < entry.allocated);
        (
            on.into_iter().map(|(n, _)| n.clone()).collect(),
            off.into_iter().map(|(n, _)| n.clone()).collect(),
        )
    }

    /// Percent of income allocated and the percent left over.
    pub fn allocation_share(&self) -> Result<(Decimal, Decimal)> {
        let allocated = percent_of(self.total_allocated(), self.income).ok_or(
            FinanceError::DivisionUndefined {
                what: "allocation share of zero income",
            },
        )?;
        Ok((allocated, Decimal::ONE_HUNDRED - allocated))
    }

    /// Allocated vs consumed rows for the named categories (all of them when
    /// `only` is empty; unknown names are skipped), optionally followed by a
    /// total row.
    pub fn breakdown(&self, only: &[&str], include_total: bool) -> Vec<BreakdownRow> {
        let mut rows: Vec<BreakdownRow> = if only.is_empty() {
            self.categories
                .iter()
                .map(|(name, e)| BreakdownRow {
                    label: name.to_string(),
                    allocated: e.allocated,
                    consumed: e.consumed,
                })
                .collect()
        } else {
            only.iter()
                .filter_map(|name| {
                    self.categories.get(*name).map(|e| BreakdownRow {
                        label: name.to_string(),
                        allocated: e.allocated,
                        consumed: e.consumed,
                    })
                })
                .collect()
        };

        if include_total {
            let allocated = rows.iter().map(|r| r.allocated).sum();
            let consumed = rows.iter().map(|r| r.consumed).sum();
            rows.push(BreakdownRow {
                label: "Total".to_string(),
                allocated,
                consumed,
            });
        }
        rows
    }

    /// Allocation per category, for a chart of where income is planned to go.
    pub fn allocation_series(&self) -> Series {
        self.categories
            .iter()
            .map(|(name, e)| (name.to_string(), e.allocated))
            .collect()
    }

    /// Consumption per category, in the same order as [`Budget::allocation_series`].
    pub fn consumed_series(&self) -> Series {
        self.categories
            .iter()
            .map(|(name, e)| (name.to_string(), e.consumed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn names(set: &BTreeSet<Name>) -> Vec<&str> {
        set.iter().map(Name::as_str).collect()
    }

    fn sample() -> Budget {
        let mut b = Budget::new(dec!(1000));
        b.add_category("Food", dec!(300), dec!(100)).unwrap();
        b.add_category("Rent", dec!(500), dec!(500)).unwrap();
        b.add_category("Fun", dec!(100), dec!(85)).unwrap();
        b
    }

    #[test]
    fn total_allocated_sums_categories() {
        let b = sample();
        assert_eq!(b.total_allocated(), dec!(900));
        assert_eq!(b.unallocated(), dec!(100));
    }

    #[test]
    fn over_allocation_is_rejected_and_state_unchanged() {
        let mut b = sample();
        let err = b.add_category("Car", dec!(150), dec!(0)).unwrap_err();
        assert!(matches!(err, FinanceError::OverAllocated { available, .. } if available == dec!(100)));
        assert!(b.get("Car").is_none());
        assert_eq!(b.total_allocated(), dec!(900));
    }

    #[test]
    fn allocation_may_use_exactly_the_remaining_income() {
        let mut b = sample();
        b.add_category("Car", dec!(100), dec!(0)).unwrap();
        assert_eq!(b.unallocated(), Decimal::ZERO);
    }

    #[test]
    fn over_consumption_is_rejected_on_add() {
        let mut b = Budget::new(dec!(1000));
        let err = b.add_category("Food", dec!(100), dec!(120)).unwrap_err();
        assert!(matches!(err, FinanceError::OverConsumed { .. }));
        assert!(b.categories().is_empty());
    }

    #[test]
    fn allocation_invariant_holds_across_many_adds() {
        let mut b = Budget::new(dec!(500));
        for (i, amount) in [dec!(120), dec!(200), dec!(90), dec!(150), dec!(60), dec!(30)]
            .into_iter()
            .enumerate()
        {
            let _ = b.add_category(&format!("c{i}"), amount, Decimal::ZERO);
            assert!(b.total_allocated() <= b.income());
        }
    }

    #[test]
    fn adjust_allocation_replaces_old_amount_and_keeps_consumed() {
        let mut b = sample();
        b.adjust_allocation("Food", dec!(400)).unwrap();
        let food = b.get("Food").unwrap();
        assert_eq!(food.allocated, dec!(400));
        assert_eq!(food.consumed, dec!(100));

        let err = b.adjust_allocation("Food", dec!(401)).unwrap_err();
        assert!(matches!(err, FinanceError::OverAllocated { .. }));
        assert_eq!(b.get("Food").unwrap().allocated, dec!(400));
    }

    #[test]
    fn unknown_category_is_not_found() {
        let mut b = sample();
        assert!(matches!(
            b.adjust_allocation("Travel", dec!(1)),
            Err(FinanceError::NotFound { .. })
        ));
        assert!(matches!(
            b.record_spend("Travel", dec!(1)),
            Err(FinanceError::NotFound { .. })
        ));
        assert!(b.remove_category("Travel").is_err());
    }

    #[test]
    fn record_spend_allows_overspending() {
        let mut b = sample();
        b.record_spend("Fun", dec!(40)).unwrap();
        assert_eq!(b.get("Fun").unwrap().consumed, dec!(125));
        assert_eq!(b.utilization("Fun").unwrap(), dec!(125));
    }

    #[test]
    fn partition_uses_threshold_inclusively_for_over() {
        let mut b = sample();
        b.add_category("Gifts", dec!(50), dec!(40)).unwrap();
        let (under, over) = b.partition_by_utilization(dec!(80));
        assert_eq!(names(&under), vec!["Food"]);
        assert_eq!(names(&over), vec!["Fun", "Gifts", "Rent"]);
    }

    #[test]
    fn zero_allocation_counts_as_over() {
        let mut b = Budget::new(dec!(100));
        b.add_category("Empty", Decimal::ZERO, Decimal::ZERO).unwrap();
        let (under, over) = b.partition_by_utilization(dec!(80));
        assert!(under.is_empty());
        assert_eq!(names(&over), vec!["Empty"]);
        assert!(matches!(
            b.utilization("Empty"),
            Err(FinanceError::DivisionUndefined { .. })
        ));
    }

    #[test]
    fn on_off_budget_split() {
        let (on, off) = sample().partition_on_off_budget();
        assert_eq!(names(&on), vec!["Food", "Fun"]);
        assert_eq!(names(&off), vec!["Rent"]);
    }

    #[test]
    fn allocation_share_and_zero_income() {
        let (alloc, rest) = sample().allocation_share().unwrap();
        assert_eq!(alloc, dec!(90));
        assert_eq!(rest, dec!(10));
        assert!(Budget::new(Decimal::ZERO).allocation_share().is_err());
    }

    #[test]
    fn breakdown_filters_and_totals() {
        let rows = sample().breakdown(&["Rent", "Nope", "Food"], true);
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Rent", "Food", "Total"]);
        assert_eq!(rows[2].allocated, dec!(800));
        assert_eq!(rows[2].consumed, dec!(600));
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut b = sample();
        assert!(matches!(
            b.add_category("Bad", dec!(-1), Decimal::ZERO),
            Err(FinanceError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn amounts_above_the_ceiling_are_rejected() {
        let mut b = Budget::new(Decimal::MAX);
        assert!(matches!(
            b.add_category("Huge", Decimal::MAX, Decimal::ZERO),
            Err(FinanceError::AmountTooLarge { field: "allocated", .. })
        ));
        let mut b = sample();
        assert!(matches!(
            b.record_spend("Food", Decimal::MAX),
            Err(FinanceError::AmountTooLarge { .. })
        ));
        assert_eq!(b.get("Food").unwrap().consumed, dec!(100));
    }

    #[test]
    fn series_follow_category_order() {
        let b = sample();
        let allocated = b.allocation_series();
        assert_eq!(allocated.labels, vec!["Food", "Fun", "Rent"]);
        assert_eq!(allocated.values, vec![dec!(300), dec!(100), dec!(500)]);

        let consumed = b.consumed_series();
        assert_eq!(consumed.labels, allocated.labels);
        assert_eq!(consumed.values, vec![dec!(100), dec!(85), dec!(500)]);
        assert_eq!(b.total_consumed(), dec!(685));
    }
}
