use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{MatchError, Matcher};
use crate::models::{
    ByIdsQuery, CatalogProbeResponse, ErrorResponse, ExperienceListResponse, HealthResponse, Lead,
    LeadRequest, LeadResponse, RecommendRequest, RecommendResponse,
};
use crate::services::{AirtableError, CatalogError, CatalogService};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub matcher: Matcher,
    /// Upper bound for a request's `limit`
    pub max_limit: usize,
}

/// Configure all recommendation-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recommend", web::post().to(recommend))
        .route("/experiences", web::get().to(list_experiences))
        .route("/experiences/by-ids", web::get().to(experiences_by_ids))
        .route("/leads", web::post().to(create_lead))
        .route("/catalog/refresh", web::post().to(refresh_catalog))
        .route("/debug/catalog", web::get().to(catalog_probe));
}

fn error_response(status: StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn catalog_unavailable(e: CatalogError) -> HttpResponse {
    tracing::error!("Catalog retrieval failed: {}", e);
    error_response(StatusCode::SERVICE_UNAVAILABLE, "catalog_unavailable", e.to_string())
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommend experiences
///
/// POST /api/v1/recommend
///
/// Request body:
/// ```json
/// {
///   "mode": "Home",
///   "group": "Friends",
///   "partySize": 4,
///   "budgetPerPerson": 100,
///   "vibe": ["cosy"],
///   "tone": ["relaxed"],
///   "flavour": ["comforting"],
///   "adventureLevel": 1,
///   "involvement": "LearnHandsOn",
///   "hardNos": ["No alcohol"],
///   "limit": 6,
///   "explain": false,
///   "lead": { "name": "Sam", "quiz": {} }
/// }
/// ```
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommend request: field_errors={:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "validation_failed", errors.to_string());
    }

    let request_id = uuid::Uuid::new_v4();
    let query = req.to_query();
    let limit = req
        .limit
        .map(usize::from)
        .unwrap_or(state.matcher.options().top_n)
        .min(state.max_limit);

    tracing::info!(
        %request_id,
        "Recommending for mode={:?} party={} budget={} limit={}",
        query.mode,
        query.party_size,
        query.budget_per_person,
        limit
    );

    let catalog = match state.catalog.experiences().await {
        Ok(catalog) => catalog,
        Err(e) => return catalog_unavailable(e),
    };

    let result = match state.matcher.rank_top(&query, &catalog, limit, req.explain) {
        Ok(result) => result,
        Err(e @ MatchError::InvalidQuery(_)) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_query", e.to_string());
        }
        Err(e @ MatchError::InvalidCandidate { .. }) => {
            tracing::error!(%request_id, "Catalog snapshot rejected: {}", e);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid_catalog", e.to_string());
        }
    };

    // Lead persistence is best-effort and must not hold up the response
    if let Some(details) = req.lead.clone() {
        let lead = Lead {
            name: details.name.unwrap_or_default(),
            quiz: details.quiz.unwrap_or(serde_json::Value::Null),
            selected_ids: result.matches.iter().map(|m| m.experience.id.clone()).collect(),
            budget_pp: query.has_budget().then_some(query.budget_per_person),
            group: query.group.clone(),
            created_at: chrono::Utc::now(),
        };
        let catalog = state.catalog.clone();
        actix_web::rt::spawn(async move {
            if let Err(e) = catalog.airtable().create_lead(&lead).await {
                tracing::warn!(%request_id, "Failed to store lead: {}", e);
            }
        });
    }

    tracing::info!(
        %request_id,
        "Returning {} experiences ({} passed hard filters, fallback: {})",
        result.matches.len(),
        result.matched_count,
        result.fallback_applied
    );

    HttpResponse::Ok().json(RecommendResponse {
        query: result.query,
        matched_count: result.matched_count,
        fallback_applied: result.fallback_applied,
        results: result.matches,
    })
}

/// List the full normalized catalog
///
/// GET /api/v1/experiences
async fn list_experiences(state: web::Data<AppState>) -> impl Responder {
    match state.catalog.experiences().await {
        Ok(catalog) => HttpResponse::Ok().json(ExperienceListResponse {
            count: catalog.len(),
            results: catalog.as_ref().clone(),
        }),
        Err(e) => catalog_unavailable(e),
    }
}

/// Look up experiences by record id
///
/// GET /api/v1/experiences/by-ids?ids={id1,id2}
async fn experiences_by_ids(
    state: web::Data<AppState>,
    query: web::Query<ByIdsQuery>,
) -> impl Responder {
    let ids = query.parsed_ids();
    if ids.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_ids",
            "ids query parameter is required".to_string(),
        );
    }

    match state.catalog.by_ids(&ids).await {
        Ok(results) => HttpResponse::Ok().json(ExperienceListResponse {
            count: results.len(),
            results,
        }),
        Err(e) => catalog_unavailable(e),
    }
}

/// Store a lead
///
/// POST /api/v1/leads
///
/// Request body:
/// ```json
/// {
///   "name": "string",
///   "quiz": {},
///   "selectedIds": ["string"],
///   "payload": { "budget_pp": 100, "group": "Friends" }
/// }
/// ```
async fn create_lead(
    state: web::Data<AppState>,
    req: web::Json<LeadRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "validation_failed", errors.to_string());
    }

    let lead = req.into_inner().into_lead();

    match state.catalog.airtable().create_lead(&lead).await {
        Ok(lead_id) => {
            tracing::info!("Stored lead {} ({} selections)", lead_id, lead.selected_ids.len());
            HttpResponse::Ok().json(LeadResponse { ok: true, lead_id })
        }
        Err(e @ AirtableError::NotConfigured(_)) => {
            tracing::error!("Cannot store lead: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "not_configured", e.to_string())
        }
        Err(e) => {
            tracing::error!("Failed to store lead: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "lead_store_failed", e.to_string())
        }
    }
}

/// Drop the cached catalog and reload it
///
/// POST /api/v1/catalog/refresh
async fn refresh_catalog(state: web::Data<AppState>) -> impl Responder {
    state.catalog.invalidate().await;

    match state.catalog.experiences().await {
        Ok(catalog) => HttpResponse::Ok().json(serde_json::json!({
            "ok": true,
            "count": catalog.len(),
        })),
        Err(e) => catalog_unavailable(e),
    }
}

/// Report catalog configuration and a one-record upstream fetch
///
/// GET /api/v1/debug/catalog
async fn catalog_probe(state: web::Data<AppState>) -> impl Responder {
    let airtable = state.catalog.airtable();

    let (upstream_status, detail) = match airtable.probe().await {
        Ok((status, body)) => (Some(status), Some(body)),
        Err(e) => (None, Some(e.to_string())),
    };

    HttpResponse::Ok().json(CatalogProbeResponse {
        has_url: airtable.has_url(),
        has_base: airtable.has_base(),
        token_len: airtable.token_len(),
        upstream_status,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_error_response_status() {
        let response = error_response(StatusCode::SERVICE_UNAVAILABLE, "catalog_unavailable", "down".into());
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
