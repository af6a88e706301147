use chrono::{Months, NaiveDate};
use tracing::{debug, info};

use super::error::SimError;
use super::state::{Simulation, total_expenses, total_income, total_investment_value};
use super::trajectory::{Trajectory, TrajectoryRecorder};
use super::types::{FinancialItem, ItemKind, PropertyPurchase};

impl Simulation {
    /// Runs every configured month and returns the recorded trajectory.
    ///
    /// The first failing month aborts the run; nothing recorded so far is
    /// returned.
    pub fn run(&mut self) -> Result<Trajectory, SimError> {
        let mut recorder = TrajectoryRecorder::with_capacity(self.months as usize);
        for _ in 0..self.months {
            self.advance_month()?;
            recorder.record(self)?;
        }
        Ok(recorder.finish())
    }

    /// Applies one month of transitions.
    ///
    /// Works on a copy of the items and commits only when every step
    /// succeeds, so a failed month leaves the state untouched.
    pub fn advance_month(&mut self) -> Result<(), SimError> {
        let mut items = self.items.clone();

        let date = self
            .current_date
            .checked_add_months(Months::new(1))
            .ok_or(SimError::DateOutOfRange)?;

        let bought = self.apply_property_purchase(&mut items, date)?;

        let mut balance = total_income(&items);
        let expenses = total_expenses(&items);
        if expenses >= balance {
            return Err(SimError::Overspend {
                expenses,
                available: balance,
            });
        }
        balance -= expenses;

        pay_minimum_repayments(&mut items, &mut balance)?;
        pay_debt_asap(&mut items, &mut balance);
        top_up_cash(&mut items, &mut balance);
        grow_and_invest(&mut items, &mut balance, self.monthly_growth);

        if balance != 0.0 {
            return Err(SimError::UnbalancedMonth { remaining: balance });
        }

        let was_independent = self.financially_independent;
        self.items = items;
        self.current_date = date;
        self.properties_bought += bought;
        self.monthly_income = balance;
        self.monthly_expenses = expenses;
        self.refresh_aggregates();

        debug!(
            %date,
            debt = self.debt,
            cash = self.cash,
            investments = self.net_investments,
            net_worth = self.net_worth,
            "month complete"
        );
        if self.financially_independent && !was_independent {
            info!(%date, passive_income = self.passive_income, "financial independence reached");
        }
        Ok(())
    }

    fn apply_property_purchase(
        &self,
        items: &mut Vec<FinancialItem>,
        date: NaiveDate,
    ) -> Result<u32, SimError> {
        let Some(rule) = self.property_purchase else {
            return Ok(0);
        };
        if self.properties_bought >= rule.max_properties
            || total_investment_value(items) <= rule.deposit
        {
            return Ok(0);
        }
        buy_property(items, &rule, date)?;
        info!(%date, cost = rule.cost, deposit = rule.deposit, "bought property");
        Ok(1)
    }
}

/// Sells the deposit out of stock holdings and adds the new property.
pub(crate) fn buy_property(
    items: &mut Vec<FinancialItem>,
    rule: &PropertyPurchase,
    date: NaiveDate,
) -> Result<(), SimError> {
    sell_shares(items, rule.deposit)?;
    items.push(rule.to_item(date));
    Ok(())
}

/// Withdraws `amount` from stock items in order, emptying earlier holdings
/// before touching later ones.
pub(crate) fn sell_shares(items: &mut [FinancialItem], amount: f64) -> Result<(), SimError> {
    let available = total_investment_value(items);
    if available < amount {
        return Err(SimError::InsufficientInvestments {
            needed: amount,
            available,
        });
    }

    let mut remaining = amount;
    for item in items.iter_mut().filter(|i| i.is_kind(ItemKind::Stocks)) {
        if remaining <= 0.0 {
            break;
        }
        let held = item.value.unwrap_or(0.0);
        let taken = held.min(remaining);
        item.value = Some(held - taken);
        remaining -= taken;
    }
    Ok(())
}

fn pay_minimum_repayments(items: &mut [FinancialItem], balance: &mut f64) -> Result<(), SimError> {
    for item in items.iter_mut() {
        let (Some(debt), Some(repayment)) = (item.outstanding_debt(), item.scheduled_repayment())
        else {
            continue;
        };
        if *balance <= repayment {
            return Err(SimError::UnmetRepayment {
                repayment,
                available: *balance,
            });
        }
        if debt - repayment <= 0.0 {
            *balance -= debt.max(0.0);
            item.clear_debt();
            info!(kind = ?item.kind, "debt paid off");
        } else {
            item.debt = Some(debt - repayment);
            *balance -= repayment;
        }
    }
    Ok(())
}

/// Throws whatever is left at flagged debts. Overpayment beyond the
/// outstanding principal stays in the balance for later steps.
fn pay_debt_asap(items: &mut [FinancialItem], balance: &mut f64) {
    for item in items.iter_mut().filter(|i| i.pay_debt_asap) {
        if *balance <= 0.0 {
            break;
        }
        let Some(debt) = item.outstanding_debt() else {
            continue;
        };
        if *balance >= debt {
            *balance -= debt.max(0.0);
            item.clear_debt();
            info!(kind = ?item.kind, "debt paid off early");
        } else {
            item.debt = Some(debt - *balance);
            *balance = 0.0;
        }
    }
}

fn top_up_cash(items: &mut [FinancialItem], balance: &mut f64) {
    let Some(cash) = items.iter_mut().find(|i| i.is_kind(ItemKind::Cash)) else {
        return;
    };
    let held = cash.value.unwrap_or(0.0);
    if held < cash.max_cash.unwrap_or(0.0) && *balance > 0.0 {
        cash.value = Some(held + *balance);
        *balance = 0.0;
    }
}

/// Grows every stock holding; only the first one absorbs leftover income.
fn grow_and_invest(items: &mut [FinancialItem], balance: &mut f64, growth: f64) {
    for item in items.iter_mut().filter(|i| i.is_kind(ItemKind::Stocks)) {
        let mut value = item.value.unwrap_or(0.0) * growth;
        if *balance > 0.0 {
            value += *balance;
            *balance = 0.0;
        }
        item.value = Some(value);
    }
}
