use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use vergeerp_core::{IndustryCode, ModuleId, OrganizationId};
use vergeerp_entitlements::AssignmentUpdate;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/:org_id/modules", get(list_modules).post(assign_module))
        .route(
            "/:org_id/modules/:module_id",
            axum::routing::delete(unassign_module).patch(update_config),
        )
        .route("/:org_id/modules/bulk", post(bulk_assign))
        .route("/:org_id/modules/apply-template", post(apply_template))
}

fn parse_org_id(raw: &str) -> Result<OrganizationId, axum::response::Response> {
    raw.parse::<OrganizationId>()
        .map_err(errors::domain_error_to_response)
}

fn parse_module_id(raw: &str) -> Result<ModuleId, axum::response::Response> {
    ModuleId::new(raw).map_err(errors::domain_error_to_response)
}

pub async fn list_modules(
    Extension(services): Extension<Arc<AppServices>>,
    Path(org_id): Path<String>,
) -> axum::response::Response {
    let org_id = match parse_org_id(&org_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.entitlements.list_organization_modules(&org_id) {
        Ok(assignments) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": assignments }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn assign_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(org_id): Path<String>,
    Json(body): Json<dto::AssignModuleRequest>,
) -> axum::response::Response {
    let org_id = match parse_org_id(&org_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let module_id = match parse_module_id(&body.module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .entitlements
        .assign_module(&org_id, &module_id, body.config, actor.user_id())
    {
        Ok(assignment) => (StatusCode::CREATED, Json(assignment)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn unassign_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path((org_id, module_id)): Path<(String, String)>,
) -> axum::response::Response {
    let org_id = match parse_org_id(&org_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let module_id = match parse_module_id(&module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .entitlements
        .unassign_module(&org_id, &module_id, actor.user_id())
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_config(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path((org_id, module_id)): Path<(String, String)>,
    Json(update): Json<AssignmentUpdate>,
) -> axum::response::Response {
    let org_id = match parse_org_id(&org_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let module_id = match parse_module_id(&module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if update.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "no fields to update",
        );
    }
    match services
        .entitlements
        .update_module_config(&org_id, &module_id, &update, actor.user_id())
    {
        Ok(assignment) => (StatusCode::OK, Json(assignment)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn bulk_assign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(org_id): Path<String>,
    Json(body): Json<dto::BulkAssignRequest>,
) -> axum::response::Response {
    let org_id = match parse_org_id(&org_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mut module_ids = Vec::with_capacity(body.module_ids.len());
    for raw in &body.module_ids {
        match parse_module_id(raw) {
            Ok(id) => module_ids.push(id),
            Err(resp) => return resp,
        }
    }
    let industry_code = match body.industry_code.as_deref() {
        Some(raw) => match IndustryCode::new(raw) {
            Ok(code) => Some(code),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };
    match services.entitlements.bulk_assign_modules(
        &org_id,
        &module_ids,
        industry_code.as_ref(),
        actor.user_id(),
    ) {
        Ok(assignments) => {
            (StatusCode::CREATED, Json(serde_json::json!({ "items": assignments })))
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn apply_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(org_id): Path<String>,
    Json(body): Json<dto::ApplyTemplateRequest>,
) -> axum::response::Response {
    let org_id = match parse_org_id(&org_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let code = match IndustryCode::new(&body.industry_code) {
        Ok(code) => code,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services
        .entitlements
        .apply_industry_template(&org_id, &code, actor.user_id())
    {
        Ok(assignments) => {
            (StatusCode::CREATED, Json(serde_json::json!({ "items": assignments })))
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
