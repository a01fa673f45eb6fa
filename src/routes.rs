use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::balance::compute_balance_from_ledger;
use crate::config::LedgerConfig;
use crate::debts::resolve_debts;
use crate::error::AppError;
use crate::schemas::NewExpense;
use crate::store::Store;
use crate::summary::member_summary;

pub struct AppState {
    pub store: Store,
    pub ledger: LedgerConfig,
}

#[derive(Deserialize, Serialize)]
struct MemberNameJson {
    name: Option<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(json!({
            "message": self.to_string(),
            "code": self.error_code(),
        }))
    }
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[get("/members")]
async fn list_members(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ledger = state.store.snapshot().await?;
    Ok(HttpResponse::Ok().json(ledger.members))
}

#[post("/members")]
async fn add_member(
    state: web::Data<AppState>,
    body: web::Json<MemberNameJson>,
) -> Result<HttpResponse, AppError> {
    let name = body.into_inner().name.unwrap_or_default();
    let members = state.store.add_member(&name).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Member added successfully",
        "members": members,
    })))
}

#[get("/expenses")]
async fn list_expenses(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ledger = state.store.snapshot().await?;
    Ok(HttpResponse::Ok().json(ledger.expenses))
}

#[post("/expenses")]
async fn add_expense(
    state: web::Data<AppState>,
    expense: web::Json<NewExpense>,
) -> Result<HttpResponse, AppError> {
    let expense = state.store.add_expense(expense.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Expense added successfully",
        "expense": expense,
    })))
}

#[delete("/expenses/{id}")]
async fn delete_expense(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.store.delete_expense(&id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Expense deleted successfully" })))
}

#[get("/transactions")]
async fn list_transactions(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ledger = state.store.snapshot().await?;
    Ok(HttpResponse::Ok().json(ledger.transactions))
}

#[get("/balances")]
async fn get_balances(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ledger = state.store.snapshot().await?;
    let balances = compute_balance_from_ledger(&ledger, state.ledger.split_policy)?;
    Ok(HttpResponse::Ok().json(balances))
}

#[get("/debts")]
async fn get_debts(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ledger = state.store.snapshot().await?;
    let balances = compute_balance_from_ledger(&ledger, state.ledger.split_policy)?;
    Ok(HttpResponse::Ok().json(resolve_debts(&balances, state.ledger.match_order)))
}

#[get("/member/{name}")]
async fn get_member(
    state: web::Data<AppState>,
    name: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ledger = state.store.snapshot().await?;
    let summary = member_summary(&ledger, &name, state.ledger)?;
    Ok(HttpResponse::Ok().json(summary))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::InvalidBody(err.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(health)
        .service(list_members)
        .service(add_member)
        .service(list_expenses)
        .service(add_expense)
        .service(delete_expense)
        .service(list_transactions)
        .service(get_balances)
        .service(get_debts)
        .service(get_member);
}
