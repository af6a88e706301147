use chrono::NaiveDate;

use super::error::SimError;
use super::scenario::ScenarioSource;
use super::types::{FinancialItem, ItemKind, PropertyPurchase};

/// Mutable financial position of one household, advanced one month at a time.
///
/// The aggregate fields are snapshots recomputed from `items` after every
/// transition; the items themselves are the source of truth.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(super) items: Vec<FinancialItem>,
    pub(super) current_date: NaiveDate,
    pub(super) months: u32,
    pub(super) monthly_growth: f64,
    pub(super) property_purchase: Option<PropertyPurchase>,
    pub(super) properties_bought: u32,
    pub(super) monthly_income: f64,
    pub(super) monthly_expenses: f64,
    pub(super) debt: f64,
    pub(super) cash: f64,
    pub(super) net_investments: f64,
    pub(super) net_worth: f64,
    pub(super) passive_income: f64,
    pub(super) financially_independent: bool,
}

impl Simulation {
    pub fn from_source<S: ScenarioSource + ?Sized>(source: &S) -> Result<Self, SimError> {
        let items = source.items()?;
        ensure_single_cash_item(&items)?;
        let current_date = source
            .start_date()
            .ok_or(SimError::MissingParameter("start_date"))?;

        let mut sim = Self {
            items,
            current_date,
            months: source.months(),
            monthly_growth: source.monthly_growth(),
            property_purchase: source.property_purchase()?,
            properties_bought: 0,
            monthly_income: 0.0,
            monthly_expenses: 0.0,
            debt: 0.0,
            cash: 0.0,
            net_investments: 0.0,
            net_worth: 0.0,
            passive_income: 0.0,
            financially_independent: false,
        };
        sim.monthly_expenses = total_expenses(&sim.items);
        sim.refresh_aggregates();
        Ok(sim)
    }

    /// Overrides the monthly stock growth factor (`1.0` disables growth).
    pub fn with_monthly_growth(mut self, factor: f64) -> Self {
        self.monthly_growth = factor;
        self
    }

    pub fn add_item(&mut self, item: FinancialItem) -> Result<(), SimError> {
        if item.is_kind(ItemKind::Cash) && self.items.iter().any(|i| i.is_kind(ItemKind::Cash)) {
            return Err(SimError::DuplicateCashItem);
        }
        self.items.push(item);
        self.refresh_aggregates();
        Ok(())
    }

    pub fn items(&self) -> &[FinancialItem] {
        &self.items
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn monthly_growth(&self) -> f64 {
        self.monthly_growth
    }

    pub fn properties_bought(&self) -> u32 {
        self.properties_bought
    }

    /// Working balance left unallocated; zero after every completed month.
    pub fn monthly_income(&self) -> f64 {
        self.monthly_income
    }

    pub fn monthly_expenses(&self) -> f64 {
        self.monthly_expenses
    }

    pub fn debt(&self) -> f64 {
        self.debt
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn net_investments(&self) -> f64 {
        self.net_investments
    }

    pub fn net_worth(&self) -> f64 {
        self.net_worth
    }

    pub fn passive_income(&self) -> f64 {
        self.passive_income
    }

    pub fn is_financially_independent(&self) -> bool {
        self.financially_independent
    }

    pub fn total_income(&self) -> f64 {
        total_income(&self.items)
    }

    pub fn total_expenses(&self) -> f64 {
        total_expenses(&self.items)
    }

    pub fn total_debt(&self) -> f64 {
        total_debt(&self.items)
    }

    pub fn total_investment_value(&self) -> f64 {
        total_investment_value(&self.items)
    }

    pub fn cash_balance(&self) -> f64 {
        cash_balance(&self.items)
    }

    pub fn total_value(&self) -> f64 {
        total_value(&self.items)
    }

    pub fn compute_net_worth(&self) -> f64 {
        net_worth(&self.items)
    }

    pub fn financial_independence(&self) -> bool {
        financial_independence(&self.items)
    }

    pub(super) fn refresh_aggregates(&mut self) {
        self.debt = total_debt(&self.items);
        self.cash = cash_balance(&self.items);
        self.net_investments = total_investment_value(&self.items);
        self.net_worth = net_worth(&self.items);
        self.passive_income = passive_income(&self.items);
        self.financially_independent = financial_independence(&self.items);
    }
}

fn ensure_single_cash_item(items: &[FinancialItem]) -> Result<(), SimError> {
    if items.iter().filter(|i| i.is_kind(ItemKind::Cash)).count() > 1 {
        return Err(SimError::DuplicateCashItem);
    }
    Ok(())
}

pub fn total_income(items: &[FinancialItem]) -> f64 {
    items.iter().filter_map(|i| i.monthly_income).sum()
}

pub fn total_expenses(items: &[FinancialItem]) -> f64 {
    items.iter().filter_map(|i| i.monthly_expenses).sum()
}

pub fn total_debt(items: &[FinancialItem]) -> f64 {
    items.iter().filter_map(FinancialItem::outstanding_debt).sum()
}

pub fn total_repayments(items: &[FinancialItem]) -> f64 {
    items.iter().filter_map(FinancialItem::scheduled_repayment).sum()
}

pub fn total_investment_value(items: &[FinancialItem]) -> f64 {
    items
        .iter()
        .filter(|i| i.is_kind(ItemKind::Stocks))
        .filter_map(|i| i.value)
        .sum()
}

pub fn cash_balance(items: &[FinancialItem]) -> f64 {
    items
        .iter()
        .find(|i| i.is_kind(ItemKind::Cash))
        .and_then(|i| i.value)
        .unwrap_or(0.0)
}

pub fn total_value(items: &[FinancialItem]) -> f64 {
    items.iter().filter_map(|i| i.value).sum()
}

pub fn net_worth(items: &[FinancialItem]) -> f64 {
    total_value(items) - total_debt(items)
}

/// Income from everything except jobs; untyped items count as passive.
pub fn passive_income(items: &[FinancialItem]) -> f64 {
    items
        .iter()
        .filter(|i| !i.is_kind(ItemKind::Job))
        .filter_map(|i| i.monthly_income)
        .sum()
}

pub fn financial_independence(items: &[FinancialItem]) -> bool {
    passive_income(items) > total_expenses(items) + total_repayments(items)
}
