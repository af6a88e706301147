use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::types::{FinancialItem, ItemKind, PropertyPurchase};

/// Roughly 4% a year, compounded monthly.
pub const STOCK_MONTHLY_GROWTH: f64 = 1.00333;

/// Anything a [`Simulation`](super::Simulation) can be built from.
///
/// Both construction styles (an explicit item list or the flat household
/// parameters) feed the same transition engine through this trait.
pub trait ScenarioSource {
    fn months(&self) -> u32;

    fn start_date(&self) -> Option<NaiveDate>;

    fn items(&self) -> Result<Vec<FinancialItem>, SimError>;

    fn monthly_growth(&self) -> f64 {
        STOCK_MONTHLY_GROWTH
    }

    fn property_purchase(&self) -> Result<Option<PropertyPurchase>, SimError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioScenario {
    pub items: Vec<FinancialItem>,
    pub months: u32,
    pub start_date: Option<NaiveDate>,
}

impl PortfolioScenario {
    pub fn new(items: Vec<FinancialItem>, months: u32) -> Self {
        Self {
            items,
            months,
            start_date: None,
        }
    }
}

impl ScenarioSource for PortfolioScenario {
    fn months(&self) -> u32 {
        self.months
    }

    fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
            .or_else(|| self.items.iter().filter_map(|item| item.start_date).min())
    }

    fn items(&self) -> Result<Vec<FinancialItem>, SimError> {
        Ok(self.items.clone())
    }
}

/// Single-household scenario described by flat scalar parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdConfig {
    pub pay: Vec<f64>,
    pub cash: f64,
    pub max_cash: f64,
    pub debt: f64,
    pub repay: f64,
    pub expenses: f64,
    pub stocks: f64,
    /// Annual rate, e.g. `0.04`.
    pub stock_growth: f64,
    pub home_value: Option<f64>,
    pub pay_debt_faster: bool,
    pub property_deposit: Option<f64>,
    pub second_flat_cost: Option<f64>,
    pub second_flat_monthly_payment: Option<f64>,
    pub rent_first_flat: Option<f64>,
    pub max_flats: u32,
    pub months: u32,
    pub start_date: NaiveDate,
}

impl ScenarioSource for HouseholdConfig {
    fn months(&self) -> u32 {
        self.months
    }

    fn start_date(&self) -> Option<NaiveDate> {
        Some(self.start_date)
    }

    fn items(&self) -> Result<Vec<FinancialItem>, SimError> {
        let mut items = Vec::with_capacity(self.pay.len() + 3);
        for (idx, pay) in self.pay.iter().enumerate() {
            let mut job = FinancialItem::new(ItemKind::Job)
                .with_income(*pay)
                .with_start_date(self.start_date);
            if idx == 0 {
                job = job.with_expenses(self.expenses);
            }
            items.push(job);
        }
        if self.pay.is_empty() && self.expenses > 0.0 {
            items.push(FinancialItem {
                monthly_expenses: Some(self.expenses),
                start_date: Some(self.start_date),
                ..FinancialItem::default()
            });
        }

        items.push(
            FinancialItem::new(ItemKind::Cash)
                .with_value(self.cash)
                .with_max_cash(self.max_cash)
                .with_start_date(self.start_date),
        );
        items.push(
            FinancialItem::new(ItemKind::Stocks)
                .with_value(self.stocks)
                .with_start_date(self.start_date),
        );

        if self.debt > 0.0 || self.home_value.is_some() {
            let mut home = FinancialItem::new(ItemKind::RealEstate).with_start_date(self.start_date);
            home.value = self.home_value;
            if self.debt > 0.0 {
                home = home.with_debt(self.debt, self.repay);
            }
            home.pay_debt_asap = self.pay_debt_faster;
            items.push(home);
        }

        Ok(items)
    }

    fn monthly_growth(&self) -> f64 {
        1.0 + self.stock_growth / 12.0
    }

    fn property_purchase(&self) -> Result<Option<PropertyPurchase>, SimError> {
        if self.max_flats == 0 {
            return Ok(None);
        }
        let deposit = self
            .property_deposit
            .ok_or(SimError::MissingParameter("property_deposit"))?;
        let cost = self
            .second_flat_cost
            .ok_or(SimError::MissingParameter("second_flat_cost"))?;
        let monthly_repayment = self
            .second_flat_monthly_payment
            .ok_or(SimError::MissingParameter("second_flat_monthly_payment"))?;
        let monthly_rent = self
            .rent_first_flat
            .ok_or(SimError::MissingParameter("rent_first_flat"))?;

        Ok(Some(PropertyPurchase {
            deposit,
            cost,
            monthly_repayment,
            monthly_rent,
            max_properties: self.max_flats,
            pay_debt_asap: self.pay_debt_faster,
        }))
    }
}

#[cfg(test)]
pub(crate) fn sample_household() -> HouseholdConfig {
    HouseholdConfig {
        pay: vec![1.5, 1.5],
        cash: 19.0,
        max_cash: 30.0,
        debt: 70.0,
        repay: 0.5,
        expenses: 0.7,
        stocks: 12.0,
        stock_growth: 0.04,
        home_value: None,
        pay_debt_faster: true,
        property_deposit: Some(100.0),
        second_flat_cost: Some(200.0),
        second_flat_monthly_payment: Some(0.8),
        rent_first_flat: Some(0.8),
        max_flats: 1,
        months: 50,
        start_date: NaiveDate::from_ymd_opt(2016, 6, 1).expect("valid date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_start_date_defaults_to_earliest_item() {
        let early = NaiveDate::from_ymd_opt(2015, 3, 1).expect("valid date");
        let late = NaiveDate::from_ymd_opt(2016, 6, 1).expect("valid date");
        let scenario = PortfolioScenario::new(
            vec![
                FinancialItem::new(ItemKind::Job).with_start_date(late),
                FinancialItem::new(ItemKind::Cash).with_start_date(early),
                FinancialItem::new(ItemKind::Stocks),
            ],
            12,
        );
        assert_eq!(scenario.start_date(), Some(early));
    }

    #[test]
    fn explicit_start_date_wins() {
        let explicit = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
        let mut scenario = PortfolioScenario::new(
            vec![FinancialItem::new(ItemKind::Job)
                .with_start_date(NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid date"))],
            12,
        );
        scenario.start_date = Some(explicit);
        assert_eq!(scenario.start_date(), Some(explicit));
    }

    #[test]
    fn household_maps_to_one_item_per_source() {
        let config = sample_household();
        let items = config.items().expect("items should build");

        let jobs: Vec<_> = items.iter().filter(|i| i.is_kind(ItemKind::Job)).collect();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].monthly_expenses, Some(0.7));
        assert_eq!(jobs[1].monthly_expenses, None);

        let cash: Vec<_> = items.iter().filter(|i| i.is_kind(ItemKind::Cash)).collect();
        assert_eq!(cash.len(), 1);
        assert_eq!(cash[0].value, Some(19.0));
        assert_eq!(cash[0].max_cash, Some(30.0));

        let home = items
            .iter()
            .find(|i| i.is_kind(ItemKind::RealEstate))
            .expect("home item");
        assert_eq!(home.debt, Some(70.0));
        assert_eq!(home.monthly_repayment, Some(0.5));
        assert!(home.pay_debt_asap);
    }

    #[test]
    fn household_growth_is_monthly_fraction_of_annual_rate() {
        let config = sample_household();
        assert!((config.monthly_growth() - (1.0 + 0.04 / 12.0)).abs() < 1e-12);
    }

    #[test]
    fn household_without_jobs_keeps_expenses_on_untyped_item() {
        let mut config = sample_household();
        config.pay.clear();
        let items = config.items().expect("items should build");
        let untyped = items
            .iter()
            .find(|i| i.kind.is_none())
            .expect("untyped expense item");
        assert_eq!(untyped.monthly_expenses, Some(0.7));
    }

    #[test]
    fn property_rule_requires_every_parameter() {
        let mut config = sample_household();
        config.rent_first_flat = None;
        assert_eq!(
            config.property_purchase(),
            Err(SimError::MissingParameter("rent_first_flat"))
        );

        let mut config = sample_household();
        config.second_flat_cost = None;
        assert_eq!(
            config.property_purchase(),
            Err(SimError::MissingParameter("second_flat_cost"))
        );
    }

    #[test]
    fn property_rule_is_skipped_when_no_flats_allowed() {
        let mut config = sample_household();
        config.max_flats = 0;
        config.property_deposit = None;
        assert_eq!(config.property_purchase(), Ok(None));
    }
}
