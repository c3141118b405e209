use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use vergeerp_core::{IndustryCode, ModuleId};
use vergeerp_entitlements::{NewLink, NewTemplate};
use vergeerp_industries::{LinkUpdate, TemplateUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_template).get(list_templates))
        .route(
            "/:code",
            get(get_template)
                .patch(update_template)
                .delete(deactivate_template),
        )
        .route("/:code/modules", post(add_module).get(list_template_modules))
        .route(
            "/:code/modules/:module_id",
            delete(remove_module).patch(update_link),
        )
}

fn parse_code(raw: &str) -> Result<IndustryCode, axum::response::Response> {
    IndustryCode::new(raw).map_err(errors::domain_error_to_response)
}

fn parse_module_id(raw: &str) -> Result<ModuleId, axum::response::Response> {
    ModuleId::new(raw).map_err(errors::domain_error_to_response)
}

pub async fn create_template(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateTemplateRequest>,
) -> axum::response::Response {
    let industry_code = match parse_code(&body.industry_code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    let input = NewTemplate {
        industry_code,
        industry_name: body.industry_name,
        description: body.description,
    };
    match services.entitlements.create_template(input) {
        Ok(template) => (StatusCode::CREATED, Json(template)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_templates(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.entitlements.list_templates(query.active_only) {
        Ok(templates) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": templates }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_template(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    let code = match parse_code(&code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    match services.entitlements.get_template(&code) {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_template(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
    Json(update): Json<TemplateUpdate>,
) -> axum::response::Response {
    let code = match parse_code(&code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    match services.entitlements.update_template(&code, &update) {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn deactivate_template(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    let code = match parse_code(&code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    match services.entitlements.deactivate_template(&code) {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn add_module(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
    Json(body): Json<dto::AddLinkRequest>,
) -> axum::response::Response {
    let code = match parse_code(&code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    let module_id = match parse_module_id(&body.module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let input = NewLink {
        module_id,
        is_required: body.is_required,
        default_config: body.default_config,
        display_order: body.display_order,
    };
    match services.entitlements.add_module_to_template(&code, input) {
        Ok(link) => (StatusCode::CREATED, Json(link)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_template_modules(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    let code = match parse_code(&code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    match services.entitlements.list_template_modules(&code) {
        Ok(links) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": links }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_link(
    Extension(services): Extension<Arc<AppServices>>,
    Path((code, module_id)): Path<(String, String)>,
    Json(update): Json<LinkUpdate>,
) -> axum::response::Response {
    let code = match parse_code(&code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    let module_id = match parse_module_id(&module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .entitlements
        .update_module_link(&code, &module_id, &update)
    {
        Ok(link) => (StatusCode::OK, Json(link)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_module(
    Extension(services): Extension<Arc<AppServices>>,
    Path((code, module_id)): Path<(String, String)>,
) -> axum::response::Response {
    let code = match parse_code(&code) {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    let module_id = match parse_module_id(&module_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .entitlements
        .remove_module_from_template(&code, &module_id)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
