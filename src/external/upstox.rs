use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::errors::BrokerError;
use crate::models::BrokerSession;

const AUTH_DIALOG_PATH: &str = "/v2/login/authorization/dialog";
const TOKEN_PATH: &str = "/v2/login/authorization/token";
const HOLDINGS_PATH: &str = "/v2/portfolio/long-term-holdings";

#[derive(Debug, Clone, Deserialize)]
pub struct UpstoxToken {
    pub access_token: String,
    #[serde(default)]
    pub extended_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HoldingsResponse {
    #[serde(default)]
    data: Vec<Value>,
}

/// Upstox v2 OAuth and portfolio client
pub struct UpstoxClient {
    client: reqwest::Client,
    base_url: String,
    redirect_uri: String,
}

impl UpstoxClient {
    pub fn new(base_url: String, redirect_uri: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            redirect_uri,
        }
    }

    /// Login dialog URL the user opens to authorize this app
    pub fn authorization_url(&self, client_id: &str, state: &str) -> Result<String, BrokerError> {
        let url = Url::parse_with_params(
            &format!("{}{}", self.base_url, AUTH_DIALOG_PATH),
            &[
                ("client_id", client_id),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("state", state),
            ],
        )
        .map_err(|e| BrokerError::Parse(e.to_string()))?;
        Ok(url.to_string())
    }

    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<UpstoxToken, BrokerError> {
        info!("Exchanging Upstox authorization code for client {}", client_id);
        let form = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let resp = self
            .client
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| BrokerError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BrokerError::Rejected(format!("Failed to obtain access token: {}", message)));
        }

        resp.json::<UpstoxToken>()
            .await
            .map_err(|e| BrokerError::Parse(e.to_string()))
    }

    pub async fn holdings(&self, session: &BrokerSession) -> Result<Vec<Value>, BrokerError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, HOLDINGS_PATH))
            .header("Accept", "application/json")
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| BrokerError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BrokerError::Api {
                status: status.as_u16(),
                message: format!("Failed to fetch holdings: {}", message),
            });
        }

        let body: HoldingsResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Parse(e.to_string()))?;
        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_encodes_parameters() {
        let client = UpstoxClient::new(
            "https://api.upstox.com/".into(),
            "http://localhost:3000/auth/callback".into(),
            Duration::from_secs(5),
        );
        let url = client.authorization_url("my client", "abc123").unwrap();
        let parsed = Url::parse(&url).unwrap();

        assert_eq!(parsed.path(), "/v2/login/authorization/dialog");
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "my client".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:3000/auth/callback".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("state".into(), "abc123".into())));
    }

    #[test]
    fn test_token_response_parses() {
        let token: UpstoxToken = serde_json::from_str(
            r#"{"email":"x@y.z","access_token":"eyJ0","extended_token":null,"user_id":"AB1234"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "eyJ0");
        assert!(token.extended_token.is_none());
    }
}
