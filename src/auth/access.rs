//! Caller identity and ownership checks
//!
//! A verified token yields a [`Caller`]; delete and comment-removal paths then
//! gate on the stored owner reference. Absence is always reported before
//! ownership so callers cannot probe for other users' documents by status code.

use bson::oid::ObjectId;
use hyper::header::{HeaderMap, AUTHORIZATION};

use crate::auth::jwt::{extract_token_from_header, JwtValidator, AUTH_TOKEN_HEADER};
use crate::types::ConnectorError;

/// The authenticated user behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: ObjectId,
}

impl Caller {
    pub fn new(id: ObjectId) -> Self {
        Self { id }
    }

    /// Whether this caller is the given owner
    pub fn owns(&self, owner: &ObjectId) -> bool {
        self.id == *owner
    }
}

/// Resolve the caller from request headers.
///
/// Accepts `Authorization: Bearer <token>` or the `x-auth-token` header.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtValidator) -> Result<Caller, ConnectorError> {
    let token = extract_token_from_header(header_str(headers, AUTHORIZATION.as_str()))
        .or_else(|| extract_token_from_header(header_str(headers, AUTH_TOKEN_HEADER)))
        .ok_or_else(|| ConnectorError::Unauthorized("No token, authorization denied".into()))?;

    let claims = jwt.verify_token(token).into_result()?;
    let id = ObjectId::parse_str(&claims.user_id)
        .map_err(|_| ConnectorError::Unauthorized("Token is not valid".into()))?;

    Ok(Caller::new(id))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Require that `target` exists and belongs to `caller`.
///
/// `owner_of` picks the owner reference out of the document.
pub fn require_owned<T>(
    target: Option<T>,
    owner_of: impl Fn(&T) -> &ObjectId,
    caller: &Caller,
    what: &str,
) -> Result<T, ConnectorError> {
    let target = target.ok_or_else(|| ConnectorError::NotFound(format!("No such {}", what)))?;

    if !caller.owns(owner_of(&target)) {
        return Err(ConnectorError::Forbidden(format!(
            "User not authorized to modify this {}",
            what
        )));
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    struct Doc {
        owner: ObjectId,
    }

    fn validator() -> JwtValidator {
        JwtValidator::new("access-test-secret-with-enough-length!!".into(), 60).unwrap()
    }

    #[test]
    fn test_missing_target_reported_before_ownership() {
        let caller = Caller::new(ObjectId::new());
        let result = require_owned(None::<Doc>, |d| &d.owner, &caller, "post");
        assert!(matches!(result, Err(ConnectorError::NotFound(_))));
    }

    #[test]
    fn test_non_owner_forbidden() {
        let caller = Caller::new(ObjectId::new());
        let doc = Doc {
            owner: ObjectId::new(),
        };
        let result = require_owned(Some(doc), |d| &d.owner, &caller, "post");
        assert!(matches!(result, Err(ConnectorError::Forbidden(_))));
    }

    #[test]
    fn test_owner_allowed() {
        let id = ObjectId::new();
        let caller = Caller::new(id);
        let doc = Doc { owner: id };
        assert!(require_owned(Some(doc), |d| &d.owner, &caller, "post").is_ok());
    }

    #[test]
    fn test_authenticate_accepts_both_headers() {
        let jwt = validator();
        let id = ObjectId::new();
        let token = jwt.generate_token(&id.to_hex()).unwrap();

        let mut bearer = HeaderMap::new();
        bearer.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(authenticate(&bearer, &jwt).unwrap().id, id);

        let mut custom = HeaderMap::new();
        custom.insert(AUTH_TOKEN_HEADER, HeaderValue::from_str(&token).unwrap());
        assert_eq!(authenticate(&custom, &jwt).unwrap().id, id);
    }

    #[test]
    fn test_authenticate_rejects_missing_and_garbage() {
        let jwt = validator();
        assert!(matches!(
            authenticate(&HeaderMap::new(), &jwt),
            Err(ConnectorError::Unauthorized(_))
        ));

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("garbage"));
        assert!(matches!(
            authenticate(&headers, &jwt),
            Err(ConnectorError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_authenticate_rejects_non_object_id_subject() {
        let jwt = validator();
        let token = jwt.generate_token("not-an-object-id").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_str(&token).unwrap());
        assert!(authenticate(&headers, &jwt).is_err());
    }
}
