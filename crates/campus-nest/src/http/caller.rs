use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::domain::{Role, UserId};
use crate::error::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Identity asserted by the upstream authenticating proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn require(&self, allowed: &[Role]) -> Result<(), ServiceError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "Role '{}' cannot access this resource",
                self.role.label()
            )))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CallerRejection {
    #[error("missing {0} header")]
    Missing(&'static str),
    #[error("malformed {0} header")]
    Malformed(&'static str),
}

impl IntoResponse for CallerRejection {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
    }
}

fn header<'a>(parts: &'a Parts, name: &'static str) -> Result<&'a str, CallerRejection> {
    let value = parts
        .headers
        .get(name)
        .ok_or(CallerRejection::Missing(name))?;
    value
        .to_str()
        .map(str::trim)
        .map_err(|_| CallerRejection::Malformed(name))
}

#[axum::async_trait]
impl<St> FromRequestParts<St> for Caller
where
    St: Send + Sync,
{
    type Rejection = CallerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER)?
            .parse()
            .map_err(|_| CallerRejection::Malformed(USER_ID_HEADER))?;
        let role = Role::parse(header(parts, USER_ROLE_HEADER)?)
            .ok_or(CallerRejection::Malformed(USER_ROLE_HEADER))?;
        Ok(Self { id, role })
    }
}

/// Route-group guard: rejects callers whose role is not in `allowed`.
pub async fn require_roles(
    State(allowed): State<&'static [Role]>,
    caller: Caller,
    request: Request,
    next: Next,
) -> Response {
    match caller.require(allowed) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn extract(request: HttpRequest<()>) -> Result<Caller, CallerRejection> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_identity_headers() {
        let id = UserId::new();
        let request = HttpRequest::builder()
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "TPO")
            .body(())
            .expect("request");

        let caller = extract(request).await.expect("caller");
        assert_eq!(caller.id, id);
        assert_eq!(caller.role, Role::Tpo);
    }

    #[tokio::test]
    async fn rejects_missing_and_malformed_headers() {
        let missing = HttpRequest::builder()
            .header(USER_ROLE_HEADER, "student")
            .body(())
            .expect("request");
        assert!(matches!(
            extract(missing).await,
            Err(CallerRejection::Missing(USER_ID_HEADER))
        ));

        let malformed = HttpRequest::builder()
            .header(USER_ID_HEADER, UserId::new().to_string())
            .header(USER_ROLE_HEADER, "dean")
            .body(())
            .expect("request");
        assert!(matches!(
            extract(malformed).await,
            Err(CallerRejection::Malformed(USER_ROLE_HEADER))
        ));
    }

    #[test]
    fn require_lists_the_rejected_role() {
        let caller = Caller {
            id: UserId::new(),
            role: Role::Student,
        };
        assert!(caller.require(&[Role::Student]).is_ok());
        let err = caller.require(&[Role::Tpo, Role::Admin]).expect_err("forbidden");
        assert_eq!(err.to_string(), "Role 'student' cannot access this resource");
    }
}
