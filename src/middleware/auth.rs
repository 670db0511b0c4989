use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::jwt::{verify_token, Claims};
use crate::models::Actor;

#[derive(Clone)]
pub struct AuthContext {
    pub actor: Actor,
    pub username: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

pub async fn require_auth(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let auth_header = match req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
    {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return unauthorized("Invalid Authorization format"),
    };

    let secret = match std::env::var("JWT_SECRET") {
        Ok(s) => s,
        Err(_) => return unauthorized("Server auth misconfiguration"),
    };

    let claims = match verify_token(token, &secret) {
        Ok(c) => c,
        Err(_) => return unauthorized("Invalid or expired token"),
    };

    let actor = match actor_from_claims(&claims) {
        Some(a) => a,
        None => return unauthorized("Token role/association mismatch"),
    };

    req.extensions_mut().insert(AuthContext {
        actor,
        username: claims.username,
    });

    next.run(req).await
}

/// Branch and supplier tokens must carry their party id; a token claiming
/// a role without the matching association is rejected outright.
fn actor_from_claims(claims: &Claims) -> Option<Actor> {
    match claims.role.as_str() {
        "admin" => Some(Actor::admin(claims.sub)),
        "branch" => claims.branch_id.map(|b| Actor::branch(claims.sub, b)),
        "supplier" => claims.supplier_id.map(|s| Actor::supplier(claims.sub, s)),
        _ => None,
    }
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody {
        error: msg.to_string(),
        code: "unauthorized",
    });
    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str, branch_id: Option<i64>, supplier_id: Option<i64>) -> Claims {
        Claims {
            sub: 7,
            role: role.to_string(),
            branch_id,
            supplier_id,
            username: "t".to_string(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn admin_claims_need_no_association() {
        assert!(actor_from_claims(&claims("admin", None, None)).is_some());
    }

    #[test]
    fn branch_claims_without_branch_id_are_rejected() {
        assert!(actor_from_claims(&claims("branch", None, None)).is_none());
        assert!(actor_from_claims(&claims("branch", Some(3), None)).is_some());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert!(actor_from_claims(&claims("manager", Some(1), Some(1))).is_none());
    }
}
