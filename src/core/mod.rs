mod engine;
mod error;
mod scenario;
mod state;
mod trajectory;
mod types;

pub use error::SimError;
pub use scenario::{HouseholdConfig, PortfolioScenario, STOCK_MONTHLY_GROWTH, ScenarioSource};
pub use state::{
    Simulation, cash_balance, financial_independence, net_worth, passive_income, total_debt,
    total_expenses, total_income, total_investment_value, total_repayments, total_value,
};
pub use trajectory::{Category, QuadTable, Snapshot, Trajectory, TrajectoryRecorder};
pub use types::{FinancialItem, ItemKind, PropertyPurchase};
