use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::OrganizerId;
use crate::modules::transactions::services::TransactionService;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// List transactions for the authenticated organizer, with settlement
/// figures derived from the stored snapshots
/// GET /transactions
pub async fn list_transactions(
    service: web::Data<Arc<TransactionService>>,
    organizer_id: OrganizerId,
    query: web::Query<ListTransactionsQuery>,
) -> Result<HttpResponse, AppError> {
    let transactions = service
        .list_for_organizer(&organizer_id.0, query.limit, query.offset)
        .await?;

    Ok(HttpResponse::Ok().json(transactions))
}

/// Configure transaction routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions").route("", web::get().to(list_transactions)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query: ListTransactionsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }
}
