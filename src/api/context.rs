use crate::api::errors::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// The account a dashboard request acts on behalf of.
///
/// Identity arrives as the `x-account-id` header, set by the deployment's
/// auth proxy. Handlers receive it as an explicit argument so ownership
/// checks can never be skipped by accident.
#[derive(Debug, Clone)]
pub struct AccountContext {
    pub account_id: String,
}

impl<S> FromRequestParts<S> for AccountContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account_id = parts
            .headers
            .get("x-account-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("missing x-account-id header".to_string()))?;

        Ok(Self {
            account_id: account_id.to_string(),
        })
    }
}
