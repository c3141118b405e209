use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use vergeerp_core::UserId;

use crate::app::errors;
use crate::context::ActorContext;

const USER_ID_HEADER: &str = "x-user-id";

/// Attach the [`ActorContext`] to every request.
///
/// A present but malformed `X-User-Id` is rejected rather than silently
/// treated as anonymous.
pub async fn actor_middleware(mut req: Request, next: Next) -> Response {
    let user_id = match req.headers().get(USER_ID_HEADER) {
        None => None,
        Some(raw) => {
            let parsed = raw
                .to_str()
                .ok()
                .and_then(|s| s.parse::<UserId>().ok());
            match parsed {
                Some(id) => Some(id),
                None => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "invalid_id",
                        "X-User-Id must be a UUID",
                    );
                }
            }
        }
    };

    req.extensions_mut().insert(ActorContext::new(user_id));
    next.run(req).await
}
