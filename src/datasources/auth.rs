use crate::config::ApiConfig;
use crate::datasources::endpoint;
use crate::error::{CropSyncError, Result};
use crate::models::RegistrationRequest;
use std::time::Duration;

const REGISTER_PATH: &str = "/auth/register";

pub struct AuthClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl AuthClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Create an account. The server's reply is returned verbatim.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<String> {
        let url = endpoint(&self.config.base_url, REGISTER_PATH);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CropSyncError::RegistrationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, username = %request.username, "Registration rejected");
            return Err(CropSyncError::RegistrationFailed(format!("{}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CropSyncError::RegistrationFailed(e.to_string()))?;

        tracing::info!(username = %request.username, "Registered account");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::test_server::{serve_once, serve_raw};

    fn request() -> RegistrationRequest {
        RegistrationRequest {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            username: "asha".into(),
            password: "hunter2".into(),
        }
    }

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn register_posts_json_and_returns_body() {
        let (base_url, server) = serve_once("200 OK", "User registered successfully").await;

        let client = AuthClient::new(config(&base_url)).unwrap();
        let reply = client.register(&request()).await.unwrap();
        assert_eq!(reply, "User registered successfully");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /auth/register "));
        assert!(raw.contains(r#""username":"asha""#));
        assert!(raw.contains(r#""password":"hunter2""#));
    }

    #[tokio::test]
    async fn rejected_registration_is_an_error() {
        let (base_url, server) = serve_once("409 Conflict", "Username taken").await;

        let client = AuthClient::new(config(&base_url)).unwrap();
        let err = client.register(&request()).await.unwrap_err();

        assert!(matches!(err, CropSyncError::RegistrationFailed(_)));
        assert!(err.to_string().contains("Username taken"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn truncated_success_body_is_an_error() {
        let response = "HTTP/1.1 201 Created\r\nContent-Length: 64\r\nConnection: close\r\n\r\nRegistere"
            .to_string();
        let (base_url, server) = serve_raw(response).await;

        let client = AuthClient::new(config(&base_url)).unwrap();
        let err = client.register(&request()).await.unwrap_err();

        assert!(matches!(err, CropSyncError::RegistrationFailed(_)));
        server.await.unwrap();
    }
}
