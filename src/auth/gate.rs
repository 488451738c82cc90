use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use crate::{
    auth::{
        claims::Claims,
        extractors::{session_token, Session},
    },
    state::AppState,
};

/// Static route table for the authorization gate. A prefix matches the
/// exact path and every sub-path below it.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    pub protected: &'static [&'static str],
    pub admin_only: &'static [&'static str],
    pub login_path: &'static str,
    pub landing_path: &'static str,
}

pub const ROUTES: GateConfig = GateConfig {
    protected: &["/dashboard", "/job", "/stats"],
    admin_only: &["/stats"],
    login_path: "/login",
    landing_path: "/dashboard",
};

#[derive(Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Path is not gated.
    PassThrough,
    Allow,
    RedirectToLogin(String),
    RedirectToLanding(String),
}

fn under(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl GateConfig {
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|p| under(p, path))
    }

    pub fn is_admin_only(&self, path: &str) -> bool {
        self.admin_only.iter().any(|p| under(p, path))
    }

    fn login_redirect(&self, path: &str, query: Option<&str>) -> String {
        let target = match query {
            Some(q) if !q.is_empty() => format!("{path}?{q}"),
            _ => path.to_string(),
        };
        // '/' is legal inside a query component, keep callback paths readable
        let callback = urlencoding::encode(&target).replace("%2F", "/");
        format!("{}?callbackUrl={}", self.login_path, callback)
    }

    pub fn decide(&self, path: &str, query: Option<&str>, claims: Option<&Claims>) -> GateDecision {
        if !self.is_protected(path) {
            return GateDecision::PassThrough;
        }
        let Some(claims) = claims else {
            return GateDecision::RedirectToLogin(self.login_redirect(path, query));
        };
        if self.is_admin_only(path) && !claims.is_admin() {
            return GateDecision::RedirectToLanding(self.landing_path.to_string());
        }
        GateDecision::Allow
    }
}

/// Runs before every handler: redirects or passes the request through,
/// attaching verified claims for the handlers behind it.
pub async fn authorize(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if !ROUTES.is_protected(&path) {
        return next.run(req).await;
    }

    let claims = session_token(req.headers(), &state.jwt.cookie_name).and_then(|token| {
        state
            .jwt
            .verify_access(&token)
            .map_err(|e| debug!(error = %e, %path, "gate rejected token"))
            .ok()
    });

    match ROUTES.decide(&path, req.uri().query(), claims.as_ref()) {
        GateDecision::PassThrough => next.run(req).await,
        GateDecision::Allow => {
            if let Some(claims) = claims {
                req.extensions_mut().insert(Session(claims));
            }
            next.run(req).await
        }
        GateDecision::RedirectToLogin(location) => {
            debug!(%path, "unauthenticated request redirected to login");
            Redirect::temporary(&location).into_response()
        }
        GateDecision::RedirectToLanding(location) => {
            warn!(%path, "non-admin request to admin route");
            Redirect::temporary(&location).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{Role, TokenKind};
    use uuid::Uuid;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            role,
            iat: 0,
            exp: usize::MAX,
            iss: "iss".into(),
            aud: "aud".into(),
            kind: TokenKind::Access,
        }
    }

    #[test]
    fn unauthenticated_dashboard_redirects_to_login() {
        assert_eq!(
            ROUTES.decide("/dashboard", None, None),
            GateDecision::RedirectToLogin("/login?callbackUrl=/dashboard".into())
        );
    }

    #[test]
    fn callback_keeps_query_string() {
        assert_eq!(
            ROUTES.decide("/job/42", Some("tab=notes&x=1"), None),
            GateDecision::RedirectToLogin("/login?callbackUrl=/job/42%3Ftab%3Dnotes%26x%3D1".into())
        );
    }

    #[test]
    fn student_on_stats_goes_to_dashboard() {
        let c = claims(Role::Student);
        assert_eq!(
            ROUTES.decide("/stats", None, Some(&c)),
            GateDecision::RedirectToLanding("/dashboard".into())
        );
        assert_eq!(ROUTES.decide("/dashboard/anything", None, Some(&c)), GateDecision::Allow);
    }

    #[test]
    fn admin_is_allowed_everywhere() {
        let c = claims(Role::Admin);
        assert_eq!(ROUTES.decide("/stats", None, Some(&c)), GateDecision::Allow);
        assert_eq!(ROUTES.decide("/stats/detail", None, Some(&c)), GateDecision::Allow);
        assert_eq!(ROUTES.decide("/job/1", None, Some(&c)), GateDecision::Allow);
    }

    #[test]
    fn prefix_matching_respects_segments() {
        assert!(ROUTES.is_protected("/job"));
        assert!(ROUTES.is_protected("/job/abc"));
        assert!(!ROUTES.is_protected("/jobs"));
        assert!(!ROUTES.is_protected("/jobs/abc"));
        assert!(!ROUTES.is_protected("/statistics"));
        assert_eq!(ROUTES.decide("/search-jobs", None, None), GateDecision::PassThrough);
    }
}
