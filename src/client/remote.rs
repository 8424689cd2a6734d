use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{AdministrativeClient, ClientError};
use crate::config;
use crate::database::models::{AccessToken, ServiceSettings, ServiceSettingsPatch, User};
use crate::services::Page;

/// HTTP client for the `/api` routes. The server derives the caller from
/// the session token, so a client without one only reaches public routes.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl RemoteClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::Internal(format!("invalid server URL {:?}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Internal(format!("{:?} cannot be used as a server URL", base_url)));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config::config().api.request_timeout_secs))
            .build()?;

        Ok(Self { http, base, token })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Internal(format!("{} cannot be used as a server URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<T, B>(&self, method: Method, segments: &[&str], query: Option<&Page>, body: Option<&B>) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(page) = query {
            request = request.query(page);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(error_from_response(status, &body, &text));
        }

        let data = body.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data)
            .map_err(|e| ClientError::Internal(format!("unexpected response from server: {}", e)))
    }
}

fn error_from_response(status: StatusCode, body: &Value, raw: &str) -> ClientError {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| (!raw.trim().is_empty()).then(|| raw.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    let code = body.get("code").and_then(Value::as_str);

    match (status, code) {
        (_, Some("FEATURE_DISABLED")) | (StatusCode::NOT_IMPLEMENTED, _) => ClientError::FeatureDisabled(message),
        (StatusCode::NOT_FOUND, Some("NOT_FOUND")) => ClientError::NotFound(message),
        (StatusCode::FORBIDDEN, _) => ClientError::PermissionDenied(message),
        (StatusCode::UNAUTHORIZED, _) => ClientError::Unauthorized(message),
        _ => ClientError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl AdministrativeClient for RemoteClient {
    async fn find_user(&self, identifier: &str) -> Result<User, ClientError> {
        self.call::<_, ()>(Method::GET, &["api", "users", "lookup", identifier], None, None)
            .await
    }

    async fn is_token_feature_enabled(&self) -> Result<bool, ClientError> {
        let config: Value = self
            .call::<_, ()>(Method::GET, &["api", "config", "client"], None, None)
            .await?;
        Ok(config
            .get("enable_user_access_tokens")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn create_access_token(&self, user_id: Uuid, description: &str) -> Result<AccessToken, ClientError> {
        let user_id = user_id.to_string();
        self.call(
            Method::POST,
            &["api", "users", &user_id, "tokens"],
            None,
            Some(&json!({ "description": description })),
        )
        .await
    }

    async fn revoke_access_token(&self, token_id: &str) -> Result<(), ClientError> {
        let _: Value = self
            .call(
                Method::POST,
                &["api", "users", "tokens", "revoke"],
                None,
                Some(&json!({ "token_id": token_id })),
            )
            .await?;
        Ok(())
    }

    async fn get_access_token(&self, token_id: &str) -> Result<AccessToken, ClientError> {
        self.call::<_, ()>(Method::GET, &["api", "tokens", token_id], None, None)
            .await
    }

    async fn list_access_tokens(&self, user_id: Uuid, page: Page) -> Result<Vec<AccessToken>, ClientError> {
        let user_id = user_id.to_string();
        self.call::<_, ()>(Method::GET, &["api", "users", &user_id, "tokens"], Some(&page), None)
            .await
    }

    async fn update_service_settings(&self, patch: &ServiceSettingsPatch) -> Result<ServiceSettings, ClientError> {
        self.call(Method::PUT, &["api", "config", "service"], None, Some(patch))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_escape_identifiers() {
        let client = RemoteClient::new("http://localhost:8065/", None).unwrap();
        let url = client.endpoint(&["api", "users", "lookup", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8065/api/users/lookup/a%20b%2Fc");
    }

    #[test]
    fn error_bodies_map_to_client_errors() {
        let body = json!({"error": true, "message": "nope", "code": "FORBIDDEN"});
        assert!(matches!(
            error_from_response(StatusCode::FORBIDDEN, &body, ""),
            ClientError::PermissionDenied(m) if m == "nope"
        ));

        let gated = json!({"error": true, "message": "off", "code": "FEATURE_DISABLED"});
        assert!(matches!(
            error_from_response(StatusCode::NOT_IMPLEMENTED, &gated, ""),
            ClientError::FeatureDisabled(_)
        ));

        assert!(matches!(
            error_from_response(StatusCode::BAD_REQUEST, &Value::Null, "Invalid URL"),
            ClientError::Server { status: 400, message } if message == "Invalid URL"
        ));
    }

    #[test]
    fn only_coded_404s_are_missing_resources() {
        let missing = json!({"error": true, "message": "no such token", "code": "NOT_FOUND"});
        assert!(matches!(
            error_from_response(StatusCode::NOT_FOUND, &missing, ""),
            ClientError::NotFound(m) if m == "no such token"
        ));

        // A proxy or unrouted path answers 404 without the API envelope
        assert!(matches!(
            error_from_response(StatusCode::NOT_FOUND, &Value::Null, "<html>Not Found</html>"),
            ClientError::Server { status: 404, .. }
        ));
        assert!(matches!(
            error_from_response(StatusCode::NOT_FOUND, &Value::Null, ""),
            ClientError::Server { status: 404, message } if message == "Not Found"
        ));
    }

    #[test]
    fn token_reads_do_not_share_the_revoke_prefix() {
        let client = RemoteClient::new("http://localhost:8065", None).unwrap();
        let url = client.endpoint(&["api", "tokens", "revoke"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8065/api/tokens/revoke");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(RemoteClient::new("mailto:ops@example.com", None).is_err());
        assert!(RemoteClient::new("not a url", None).is_err());
    }
}
