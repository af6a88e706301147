use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::SimError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ItemKind {
    Job,
    RealEstate,
    Stocks,
    Cash,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Job => "job",
            ItemKind::RealEstate => "real_estate",
            ItemKind::Stocks => "stocks",
            ItemKind::Cash => "cash",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "job" => Ok(ItemKind::Job),
            "real_estate" | "real estate" | "real-estate" => Ok(ItemKind::RealEstate),
            "stocks" => Ok(ItemKind::Stocks),
            "cash" => Ok(ItemKind::Cash),
            _ => Err(SimError::InvalidKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for ItemKind {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One income, expense, debt or asset source in a portfolio.
///
/// Only `kind` decides how the engine treats the item; every numeric field is
/// optional and `Some(0.0)` counts as unset wherever the engine asks whether a
/// debt or repayment exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialItem {
    pub kind: Option<ItemKind>,
    pub monthly_income: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub debt: Option<f64>,
    pub monthly_repayment: Option<f64>,
    pub pay_debt_asap: bool,
    pub value: Option<f64>,
    pub max_cash: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FinancialItem {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn parse(kind: &str) -> Result<Self, SimError> {
        Ok(Self::new(kind.parse()?))
    }

    pub fn with_income(mut self, amount: f64) -> Self {
        self.monthly_income = Some(amount);
        self
    }

    pub fn with_expenses(mut self, amount: f64) -> Self {
        self.monthly_expenses = Some(amount);
        self
    }

    pub fn with_debt(mut self, debt: f64, monthly_repayment: f64) -> Self {
        self.debt = Some(debt);
        self.monthly_repayment = Some(monthly_repayment);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_max_cash(mut self, max_cash: f64) -> Self {
        self.max_cash = Some(max_cash);
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn paying_debt_asap(mut self) -> Self {
        self.pay_debt_asap = true;
        self
    }

    pub fn is_kind(&self, kind: ItemKind) -> bool {
        self.kind == Some(kind)
    }

    /// Outstanding principal, if any is left.
    pub fn outstanding_debt(&self) -> Option<f64> {
        nonzero(self.debt)
    }

    pub fn scheduled_repayment(&self) -> Option<f64> {
        nonzero(self.monthly_repayment)
    }

    pub fn clear_debt(&mut self) {
        self.debt = None;
        self.monthly_repayment = None;
    }
}

fn nonzero(amount: Option<f64>) -> Option<f64> {
    amount.filter(|v| *v != 0.0)
}

/// Rule for buying an additional property once investments can cover the
/// deposit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyPurchase {
    pub deposit: f64,
    pub cost: f64,
    pub monthly_repayment: f64,
    pub monthly_rent: f64,
    pub max_properties: u32,
    pub pay_debt_asap: bool,
}

impl PropertyPurchase {
    pub fn mortgage(&self) -> f64 {
        (self.cost - self.deposit).max(0.0)
    }

    pub fn to_item(&self, date: NaiveDate) -> FinancialItem {
        let mut item = FinancialItem::new(ItemKind::RealEstate)
            .with_value(self.cost)
            .with_income(self.monthly_rent)
            .with_start_date(date);
        let mortgage = self.mortgage();
        if mortgage > 0.0 {
            item = item.with_debt(mortgage, self.monthly_repayment);
        }
        item.pay_debt_asap = self.pay_debt_asap;
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_accepts_known_spellings() {
        assert_eq!("job".parse::<ItemKind>(), Ok(ItemKind::Job));
        assert_eq!("Stocks".parse::<ItemKind>(), Ok(ItemKind::Stocks));
        assert_eq!("CASH".parse::<ItemKind>(), Ok(ItemKind::Cash));
        for spelling in ["real_estate", "real estate", "Real-Estate"] {
            assert_eq!(spelling.parse::<ItemKind>(), Ok(ItemKind::RealEstate));
        }
    }

    #[test]
    fn kind_parsing_rejects_unknown_kind() {
        let err = FinancialItem::parse("crypto").expect_err("must reject unknown kind");
        assert_eq!(err, SimError::InvalidKind("crypto".to_string()));
    }

    #[test]
    fn item_deserializes_from_camel_case_json() {
        let json = r#"{
          "kind": "real estate",
          "debt": 70,
          "monthlyRepayment": 0.5,
          "value": 150,
          "payDebtAsap": true,
          "startDate": "2016-06-01"
        }"#;
        let item: FinancialItem = serde_json::from_str(json).expect("item should parse");
        assert_eq!(item.kind, Some(ItemKind::RealEstate));
        assert_eq!(item.debt, Some(70.0));
        assert_eq!(item.monthly_repayment, Some(0.5));
        assert!(item.pay_debt_asap);
        assert_eq!(item.start_date, NaiveDate::from_ymd_opt(2016, 6, 1));
        assert_eq!(item.monthly_income, None);
    }

    #[test]
    fn item_deserialization_surfaces_invalid_kind() {
        let err = serde_json::from_str::<FinancialItem>(r#"{"kind": "bonds"}"#)
            .expect_err("must reject unknown kind");
        assert!(err.to_string().contains("unknown item kind"));
    }

    #[test]
    fn zero_debt_counts_as_unset() {
        let item = FinancialItem::new(ItemKind::RealEstate).with_debt(0.0, 0.5);
        assert_eq!(item.outstanding_debt(), None);
        assert_eq!(item.scheduled_repayment(), Some(0.5));
    }

    #[test]
    fn property_purchase_builds_mortgaged_item() {
        let rule = PropertyPurchase {
            deposit: 100.0,
            cost: 200.0,
            monthly_repayment: 0.8,
            monthly_rent: 0.8,
            max_properties: 1,
            pay_debt_asap: true,
        };
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
        let item = rule.to_item(date);
        assert!(item.is_kind(ItemKind::RealEstate));
        assert_eq!(item.value, Some(200.0));
        assert_eq!(item.debt, Some(100.0));
        assert_eq!(item.monthly_repayment, Some(0.8));
        assert_eq!(item.monthly_income, Some(0.8));
        assert!(item.pay_debt_asap);
        assert_eq!(item.start_date, Some(date));
    }
}
