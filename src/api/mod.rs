use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    HouseholdConfig, PortfolioScenario, QuadTable, ScenarioSource, SimError, Simulation,
    Trajectory,
};

const MAX_MONTHS: u32 = 1200;

/// Pay entries either as a JSON array or a comma separated query value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PayList {
    List(Vec<f64>),
    Csv(String),
}

impl PayList {
    fn into_values(self) -> Result<Vec<f64>, String> {
        match self {
            PayList::List(values) => Ok(values),
            PayList::Csv(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<f64>()
                        .map_err(|_| format!("invalid pay entry: {s:?}"))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    pay: Option<PayList>,
    cash: Option<f64>,
    max_cash: Option<f64>,
    debt: Option<f64>,
    repay: Option<f64>,
    expenses: Option<f64>,
    stocks: Option<f64>,
    stock_growth: Option<f64>,
    home_value: Option<f64>,
    pay_debt_faster: Option<bool>,

    property_deposit: Option<f64>,
    second_flat_cost: Option<f64>,
    second_flat_monthly_payment: Option<f64>,
    rent_first_flat: Option<f64>,
    max_flats: Option<u32>,

    #[serde(alias = "prd")]
    months: Option<u32>,
    start_date: Option<NaiveDate>,
}

#[derive(Parser, Debug)]
#[command(
    name = "fispy",
    about = "Month-by-month financial independence explorer (jobs + cash + stocks + property)"
)]
struct Cli {
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [1.5, 1.5],
        help = "Monthly take-home pay per job, comma separated"
    )]
    pay: Vec<f64>,
    #[arg(long, default_value_t = 19.0, help = "Initial cash reserve")]
    cash: f64,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Cash reserve ceiling; surplus beyond it is invested"
    )]
    max_cash: f64,
    #[arg(long, default_value_t = 70.0, help = "Outstanding debt on the home")]
    debt: f64,
    #[arg(long, default_value_t = 0.5, help = "Minimum monthly debt repayment")]
    repay: f64,
    #[arg(long, default_value_t = 0.7, help = "Monthly household expenses")]
    expenses: f64,
    #[arg(long, default_value_t = 12.0, help = "Initial stock holdings")]
    stocks: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Expected annual stock growth in percent, compounded monthly"
    )]
    stock_growth: f64,
    #[arg(long, help = "Market value of the home, counted in net worth")]
    home_value: Option<f64>,
    #[arg(long, help = "Send every spare unit of income to the home debt before saving")]
    pay_debt_faster: bool,
    #[arg(
        long,
        help = "Investment level that triggers buying another flat; also its deposit"
    )]
    property_deposit: Option<f64>,
    #[arg(long, help = "Price of the additional flat")]
    second_flat_cost: Option<f64>,
    #[arg(long, help = "Monthly mortgage repayment on the additional flat")]
    second_flat_monthly_payment: Option<f64>,
    #[arg(long, help = "Monthly rent collected once a flat is let out")]
    rent_first_flat: Option<f64>,
    #[arg(long, default_value_t = 0, help = "How many additional flats may be bought")]
    max_flats: u32,
    #[arg(long, alias = "prd", default_value_t = 60, help = "Months to simulate")]
    months: u32,
    #[arg(long, help = "First simulated month, YYYY-MM-DD; defaults to 2016-06-01")]
    start_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    months: usize,
    start_date: NaiveDate,
    independence_date: Option<NaiveDate>,
    final_net_worth: f64,
    properties_bought: u32,
    snapshots: Trajectory,
    quads: QuadTable,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 6, 1).unwrap_or_default()
}

fn build_config(cli: Cli) -> Result<HouseholdConfig, String> {
    if cli.months == 0 || cli.months > MAX_MONTHS {
        return Err(format!("--months must be between 1 and {MAX_MONTHS}"));
    }

    if cli.pay.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err("--pay entries must be >= 0".to_string());
    }

    for (name, value) in [
        ("--cash", cli.cash),
        ("--max-cash", cli.max_cash),
        ("--debt", cli.debt),
        ("--repay", cli.repay),
        ("--expenses", cli.expenses),
        ("--stocks", cli.stocks),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if cli.debt > 0.0 && cli.repay <= 0.0 {
        return Err("--repay must be > 0 when --debt > 0".to_string());
    }

    if !cli.stock_growth.is_finite() || cli.stock_growth <= -100.0 {
        return Err("--stock-growth must be > -100".to_string());
    }

    if let Some(v) = cli.home_value {
        if !v.is_finite() || v < 0.0 {
            return Err("--home-value must be >= 0".to_string());
        }
    }

    for (name, value) in [
        ("--property-deposit", cli.property_deposit),
        ("--second-flat-cost", cli.second_flat_cost),
        ("--second-flat-monthly-payment", cli.second_flat_monthly_payment),
        ("--rent-first-flat", cli.rent_first_flat),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{name} must be >= 0"));
            }
        }
    }

    if let (Some(deposit), Some(cost)) = (cli.property_deposit, cli.second_flat_cost) {
        if deposit > cost {
            return Err("--property-deposit cannot exceed --second-flat-cost".to_string());
        }
    }

    Ok(HouseholdConfig {
        pay: cli.pay,
        cash: cli.cash,
        max_cash: cli.max_cash,
        debt: cli.debt,
        repay: cli.repay,
        expenses: cli.expenses,
        stocks: cli.stocks,
        stock_growth: cli.stock_growth / 100.0,
        home_value: cli.home_value,
        pay_debt_faster: cli.pay_debt_faster,
        property_deposit: cli.property_deposit,
        second_flat_cost: cli.second_flat_cost,
        second_flat_monthly_payment: cli.second_flat_monthly_payment,
        rent_first_flat: cli.rent_first_flat,
        max_flats: cli.max_flats,
        months: cli.months,
        start_date: cli.start_date.unwrap_or_else(default_start_date),
    })
}

fn validate_portfolio(scenario: &PortfolioScenario) -> Result<(), String> {
    if scenario.months == 0 || scenario.months > MAX_MONTHS {
        return Err(format!("months must be between 1 and {MAX_MONTHS}"));
    }
    if scenario.items.is_empty() {
        return Err("items must not be empty".to_string());
    }
    Ok(())
}

fn run_simulation<S: ScenarioSource>(source: &S) -> Result<SimulateResponse, SimError> {
    let mut sim = Simulation::from_source(source)?;
    let start_date = sim.current_date();
    let trajectory = sim.run()?;
    Ok(SimulateResponse {
        months: trajectory.len(),
        start_date,
        independence_date: trajectory.independence_date(),
        final_net_worth: sim.net_worth(),
        properties_bought: sim.properties_bought(),
        quads: trajectory.quads(),
        snapshots: trajectory,
    })
}

/// Parses command-line flags, runs the household scenario and returns the
/// response as pretty JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = build_config(cli)?;
    info!(months = config.months, start = %config.start_date, "running household scenario");
    let response = run_simulation(&config).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&response).map_err(|e| format!("failed to encode response: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/portfolio", post(portfolio_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("FI simulation API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let config = match config_from_payload(payload) {
        Ok(config) => config,
        Err(msg) => {
            warn!(error = %msg, "rejected simulate request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };
    simulation_response(&config)
}

async fn portfolio_post_handler(Json(scenario): Json<PortfolioScenario>) -> Response {
    if let Err(msg) = validate_portfolio(&scenario) {
        warn!(error = %msg, "rejected portfolio request");
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }
    simulation_response(&scenario)
}

fn simulation_response<S: ScenarioSource>(source: &S) -> Response {
    match run_simulation(source) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => {
            warn!(error = %e, "simulation aborted");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn config_from_json(json: &str) -> Result<HouseholdConfig, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    config_from_payload(payload)
}

fn config_from_payload(payload: SimulatePayload) -> Result<HouseholdConfig, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.pay {
        cli.pay = v.into_values()?;
    }
    if let Some(v) = payload.cash {
        cli.cash = v;
    }
    if let Some(v) = payload.max_cash {
        cli.max_cash = v;
    }
    if let Some(v) = payload.debt {
        cli.debt = v;
    }
    if let Some(v) = payload.repay {
        cli.repay = v;
    }
    if let Some(v) = payload.expenses {
        cli.expenses = v;
    }
    if let Some(v) = payload.stocks {
        cli.stocks = v;
    }
    if let Some(v) = payload.stock_growth {
        cli.stock_growth = v;
    }
    if let Some(v) = payload.home_value {
        cli.home_value = Some(v);
    }
    if let Some(v) = payload.pay_debt_faster {
        cli.pay_debt_faster = v;
    }

    if let Some(v) = payload.property_deposit {
        cli.property_deposit = Some(v);
    }
    if let Some(v) = payload.second_flat_cost {
        cli.second_flat_cost = Some(v);
    }
    if let Some(v) = payload.second_flat_monthly_payment {
        cli.second_flat_monthly_payment = Some(v);
    }
    if let Some(v) = payload.rent_first_flat {
        cli.rent_first_flat = Some(v);
    }
    if let Some(v) = payload.max_flats {
        cli.max_flats = v;
    }

    if let Some(v) = payload.months {
        cli.months = v;
    }
    if let Some(v) = payload.start_date {
        cli.start_date = Some(v);
    }

    build_config(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        pay: vec![1.5, 1.5],
        cash: 19.0,
        max_cash: 30.0,
        debt: 70.0,
        repay: 0.5,
        expenses: 0.7,
        stocks: 12.0,
        stock_growth: 4.0,
        home_value: None,
        pay_debt_faster: true,
        property_deposit: Some(100.0),
        second_flat_cost: Some(200.0),
        second_flat_monthly_payment: Some(0.8),
        rent_first_flat: Some(0.8),
        max_flats: 1,
        months: 50,
        start_date: None,
    }
}
