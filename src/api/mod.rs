use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    CardProfile, DebtAccount, EngineError, PayoffPlan, PayoffStrategy, PointsAccount, ProgramRates,
    RankedCard, SpendingProfile, ValuationResult, compute_plan, rank_cards, valuate,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPayoffStrategy {
    Avalanche,
    #[serde(alias = "snowBall", alias = "snow_ball")]
    Snowball,
}

impl From<ApiPayoffStrategy> for PayoffStrategy {
    fn from(value: ApiPayoffStrategy) -> Self {
        match value {
            ApiPayoffStrategy::Avalanche => PayoffStrategy::Avalanche,
            ApiPayoffStrategy::Snowball => PayoffStrategy::Snowball,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtAccountPayload {
    id: String,
    name: Option<String>,
    balance: f64,
    #[serde(alias = "rate", alias = "annualRate")]
    annual_rate_pct: f64,
    #[serde(alias = "min", alias = "minPayment")]
    minimum_payment: f64,
}

impl From<DebtAccountPayload> for DebtAccount {
    fn from(payload: DebtAccountPayload) -> Self {
        let name = payload.name.unwrap_or_else(|| payload.id.clone());
        DebtAccount {
            id: payload.id,
            name,
            balance: payload.balance,
            annual_rate_pct: payload.annual_rate_pct,
            minimum_payment: payload.minimum_payment,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayoffPayload {
    accounts: Vec<DebtAccountPayload>,
    #[serde(alias = "budget")]
    monthly_budget: f64,
    #[serde(default)]
    strategy: Option<ApiPayoffStrategy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayoffResponse {
    strategy: ApiPayoffStrategy,
    plan: PayoffPlan,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsAccountPayload {
    id: String,
    name: Option<String>,
    program: String,
    points: u64,
}

impl From<PointsAccountPayload> for PointsAccount {
    fn from(payload: PointsAccountPayload) -> Self {
        let name = payload.name.unwrap_or_else(|| payload.id.clone());
        PointsAccount {
            id: payload.id,
            name,
            program: payload.program,
            points: payload.points,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValuatePayload {
    accounts: Vec<PointsAccountPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankPayload {
    profile: SpendingProfile,
    #[serde(default, alias = "topN")]
    top: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RankResponse {
    cards: Vec<RankedCard>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

/// Rate table and card catalog, loaded once at startup and immutable for the
/// lifetime of the server.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub rates: ProgramRates,
    pub catalog: Vec<CardProfile>,
}

pub fn load_engine_config(rates_path: &Path, catalog_path: &Path) -> Result<EngineConfig, String> {
    let rates_raw = fs::read_to_string(rates_path)
        .map_err(|e| format!("cannot read rates file {}: {e}", rates_path.display()))?;
    let catalog_raw = fs::read_to_string(catalog_path)
        .map_err(|e| format!("cannot read catalog file {}: {e}", catalog_path.display()))?;
    engine_config_from_json(&rates_raw, &catalog_raw)
}

fn engine_config_from_json(rates_json: &str, catalog_json: &str) -> Result<EngineConfig, String> {
    let rates: ProgramRates =
        serde_json::from_str(rates_json).map_err(|e| format!("invalid rates JSON: {e}"))?;
    let catalog: Vec<CardProfile> =
        serde_json::from_str(catalog_json).map_err(|e| format!("invalid catalog JSON: {e}"))?;

    for (program, cents_per_point) in rates.iter() {
        if !cents_per_point.is_finite() || cents_per_point < 0.0 {
            return Err(format!(
                "rates: program `{program}` must have a finite cents-per-point rate >= 0"
            ));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for card in &catalog {
        if card.id.is_empty() {
            return Err("catalog: card ids must not be empty".to_string());
        }
        if !seen.insert(card.id.as_str()) {
            return Err(format!("catalog: duplicate card id `{}`", card.id));
        }
        if !card.annual_fee.is_finite() || card.annual_fee < 0.0 {
            return Err(format!(
                "catalog: card `{}` must have a finite annual fee >= 0",
                card.id
            ));
        }
        if !card.base_multiplier.is_finite() || card.base_multiplier < 0.0 {
            return Err(format!(
                "catalog: card `{}` must have a finite base multiplier >= 0",
                card.id
            ));
        }
        for (category, multiplier) in &card.multipliers {
            if !multiplier.is_finite() || *multiplier < 0.0 {
                return Err(format!(
                    "catalog: card `{}` has an invalid multiplier for {category:?}",
                    card.id
                ));
            }
        }
    }

    Ok(EngineConfig { rates, catalog })
}

pub async fn run_http_server(port: u16, config: EngineConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(Arc::new(config));

    let listener = TcpListener::bind(addr).await?;
    info!("cardcalc HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

fn router(config: Arc<EngineConfig>) -> Router {
    Router::new()
        .route("/api/payoff", post(payoff_handler))
        .route("/api/valuate", post(valuate_handler))
        .route("/api/rank", post(rank_handler))
        .fallback(not_found_handler)
        .with_state(config)
}

async fn not_found_handler() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        ErrorResponse {
            error: "Not found".to_string(),
            kind: "not-found",
        },
    )
}

async fn payoff_handler(Json(payload): Json<PayoffPayload>) -> Response {
    match payoff_response(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => engine_error_response(err),
    }
}

async fn valuate_handler(
    State(config): State<Arc<EngineConfig>>,
    Json(payload): Json<ValuatePayload>,
) -> Response {
    match valuation_response(&config, payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => engine_error_response(err),
    }
}

async fn rank_handler(
    State(config): State<Arc<EngineConfig>>,
    Json(payload): Json<RankPayload>,
) -> Response {
    match rank_response(&config, payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => engine_error_response(err),
    }
}

fn payoff_response(payload: PayoffPayload) -> Result<PayoffResponse, EngineError> {
    let strategy = payload.strategy.unwrap_or(ApiPayoffStrategy::Avalanche);
    let accounts: Vec<DebtAccount> = payload.accounts.into_iter().map(Into::into).collect();
    let plan = compute_plan(&accounts, payload.monthly_budget, strategy.into())?;
    Ok(PayoffResponse { strategy, plan })
}

fn valuation_response(
    config: &EngineConfig,
    payload: ValuatePayload,
) -> Result<ValuationResult, EngineError> {
    let accounts: Vec<PointsAccount> = payload.accounts.into_iter().map(Into::into).collect();
    valuate(&accounts, &config.rates)
}

fn rank_response(config: &EngineConfig, payload: RankPayload) -> Result<RankResponse, EngineError> {
    let ranked = rank_cards(&payload.profile, &config.catalog)?;
    let cards = match payload.top {
        Some(top) => ranked.take(top).collect(),
        None => ranked.collect(),
    };
    Ok(RankResponse { cards })
}

fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        EngineError::InsufficientPayment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        // A program missing from the rate table is a server configuration
        // problem, not a caller mistake.
        EngineError::UnknownProgram { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_for(err: &EngineError) -> &'static str {
    match err {
        EngineError::InvalidInput { .. } => "invalid-input",
        EngineError::InsufficientPayment { .. } => "insufficient-payment",
        EngineError::UnknownProgram { .. } => "unknown-program",
    }
}

fn engine_error_response(err: EngineError) -> Response {
    if let EngineError::UnknownProgram { program } = &err {
        warn!("request referenced a program missing from the rate table: {program}");
    }
    json_response(
        status_for(&err),
        ErrorResponse {
            error: err.to_string(),
            kind: kind_for(&err),
        },
    )
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}
