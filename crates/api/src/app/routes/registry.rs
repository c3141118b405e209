use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use vergeerp_core::ModuleId;
use vergeerp_entitlements::NewModule;
use vergeerp_registry::ModuleUpdate;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_module).get(list_modules))
        .route("/:module_id", get(get_module).patch(update_module))
        .route("/:module_id/activate", post(activate_module))
        .route("/:module_id/deactivate", post(deactivate_module))
}

fn parse_module_id(raw: &str) -> Result<ModuleId, axum::response::Response> {
    ModuleId::new(raw).map_err(errors::domain_error_to_response)
}

pub async fn register_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::RegisterModuleRequest>,
) -> axum::response::Response {
    let module_id = match parse_module_id(&body.module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let input = NewModule {
        module_id,
        name: body.name,
        description: body.description,
        category: body.category,
        service_name: body.service_name,
        api_endpoint: body.api_endpoint,
        version: body.version,
        metadata: body.metadata,
    };

    match services.entitlements.register_module(input, actor.user_id()) {
        Ok(descriptor) => (StatusCode::CREATED, Json(descriptor)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_modules(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.entitlements.list_modules(query.active_only) {
        Ok(modules) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": modules }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_module(
    Extension(services): Extension<Arc<AppServices>>,
    Path(module_id): Path<String>,
) -> axum::response::Response {
    let module_id = match parse_module_id(&module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.entitlements.get_module(&module_id) {
        Ok(descriptor) => (StatusCode::OK, Json(descriptor)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(module_id): Path<String>,
    Json(update): Json<ModuleUpdate>,
) -> axum::response::Response {
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
        .update_module(&module_id, &update, actor.user_id())
    {
        Ok(descriptor) => (StatusCode::OK, Json(descriptor)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn activate_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(module_id): Path<String>,
) -> axum::response::Response {
    set_active(&services, &module_id, true, actor)
}

pub async fn deactivate_module(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(module_id): Path<String>,
) -> axum::response::Response {
    set_active(&services, &module_id, false, actor)
}

fn set_active(
    services: &AppServices,
    module_id: &str,
    active: bool,
    actor: ActorContext,
) -> axum::response::Response {
    let module_id = match parse_module_id(module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .entitlements
        .set_module_active(&module_id, active, actor.user_id())
    {
        Ok(descriptor) => (StatusCode::OK, Json(descriptor)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
