//! Hosted auth boundary: password sign-in.
//!
//! The pipeline only consumes the resulting session as an opaque user id;
//! token refresh and the provider's internals stay server-side.

use crate::config::StoreConfig;
use serde::Deserialize;

/// A signed-in session: opaque user id plus the bearer token for the
/// table endpoints.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub access_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("auth api error: {0}")]
    Api(String),
}

/// Client for the hosted auth endpoints under `/auth/v1`.
#[derive(Clone)]
pub struct AuthClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(config: &StoreConfig, api_key: impl Into<String>) -> Self {
        let base_url = config
            .url
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// POST /auth/v1/token?grant_type=password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let res = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Api(format!("{} {}", status, body)));
        }
        let data: TokenResponse = res.json().await?;
        Ok(AuthSession {
            user_id: data.user.id,
            access_token: data.access_token,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_parses() {
        let data: TokenResponse = serde_json::from_str(
            r#"{"access_token":"jwt","token_type":"bearer","user":{"id":"user-1","email":"a@b.c"}}"#,
        )
        .expect("parse token response");
        assert_eq!(data.access_token, "jwt");
        assert_eq!(data.user.id, "user-1");
    }
}
