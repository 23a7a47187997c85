use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::BrokerError;
use crate::models::{AngelHolding, BrokerSession, CancelOrderRequest, ModifyOrderRequest, PlaceOrderRequest};

const LOGIN_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";
const HOLDINGS_PATH: &str = "/rest/secure/angelbroking/portfolio/v1/getHolding";
const PLACE_ORDER_PATH: &str = "/rest/secure/angelbroking/order/v1/placeOrder";
const MODIFY_ORDER_PATH: &str = "/rest/secure/angelbroking/order/v1/modifyOrder";
const CANCEL_ORDER_PATH: &str = "/rest/secure/angelbroking/order/v1/cancelOrder";

/// SmartAPI wraps every payload as `{status, message, errorcode, data}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    errorcode: String,
    data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngelTokens {
    pub jwt_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub feed_token: Option<String>,
}

impl AngelTokens {
    /// The login JWT without the `Bearer ` prefix SmartAPI sometimes adds
    pub fn access_token(&self) -> &str {
        self.jwt_token.strip_prefix("Bearer ").unwrap_or(&self.jwt_token)
    }
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    clientcode: &'a str,
    password: &'a str,
    totp: &'a str,
}

/// Angel One SmartAPI REST client
pub struct AngelOneClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AngelOneClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, BrokerError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| BrokerError::NotConfigured("ANGEL_API_KEY".to_string()))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        jwt: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, BrokerError> {
        let api_key = self.api_key()?;
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .header("X-UserType", "USER")
            .header("X-SourceID", "WEB")
            .header("X-ClientLocalIP", "127.0.0.1")
            .header("X-ClientPublicIP", "127.0.0.1")
            .header("X-MACAddress", "00:00:00:00:00:00")
            .header("X-PrivateKey", api_key);

        if let Some(token) = jwt {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| BrokerError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BrokerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| BrokerError::Parse(e.to_string()))?;
        unwrap_envelope(envelope)
    }

    pub async fn login(&self, client_code: &str, password: &str, totp: &str) -> Result<AngelTokens, BrokerError> {
        info!("Angel One login for client {}", client_code);
        let body = serde_json::to_value(LoginBody {
            clientcode: client_code,
            password,
            totp,
        })
        .map_err(|e| BrokerError::Parse(e.to_string()))?;

        self.call(reqwest::Method::POST, LOGIN_PATH, None, Some(body)).await
    }

    /// Holdings exactly as the broker reports them
    pub async fn holdings_raw(&self, session: &BrokerSession) -> Result<Vec<Value>, BrokerError> {
        let data: Option<Vec<Value>> = self
            .call(reqwest::Method::GET, HOLDINGS_PATH, Some(&session.access_token), None)
            .await?;
        Ok(data.unwrap_or_default())
    }

    pub async fn holdings(&self, session: &BrokerSession) -> Result<Vec<AngelHolding>, BrokerError> {
        self.holdings_raw(session)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| BrokerError::Parse(e.to_string())))
            .collect()
    }

    /// Places an order and returns the broker's order id
    pub async fn place_order(&self, session: &BrokerSession, order: &PlaceOrderRequest) -> Result<String, BrokerError> {
        info!(
            "Placing {} order for {} x {}",
            order.transactiontype, order.quantity, order.tradingsymbol
        );
        let body = serde_json::to_value(order).map_err(|e| BrokerError::Parse(e.to_string()))?;
        let data: Value = self
            .call(reqwest::Method::POST, PLACE_ORDER_PATH, Some(&session.access_token), Some(body))
            .await?;
        order_id(&data)
    }

    pub async fn modify_order(&self, session: &BrokerSession, order: &ModifyOrderRequest) -> Result<Value, BrokerError> {
        info!("Modifying order {}", order.orderid);
        let body = serde_json::to_value(order).map_err(|e| BrokerError::Parse(e.to_string()))?;
        self.call(reqwest::Method::POST, MODIFY_ORDER_PATH, Some(&session.access_token), Some(body))
            .await
    }

    pub async fn cancel_order(&self, session: &BrokerSession, order: &CancelOrderRequest) -> Result<Value, BrokerError> {
        info!("Cancelling order {}", order.orderid);
        let body = json!({ "variety": order.variety, "orderid": order.orderid });
        self.call(reqwest::Method::POST, CANCEL_ORDER_PATH, Some(&session.access_token), Some(body))
            .await
    }
}

fn unwrap_envelope<T: DeserializeOwned>(envelope: Envelope<T>) -> Result<T, BrokerError> {
    if !envelope.status {
        warn!("Angel One rejected request: {} ({})", envelope.message, envelope.errorcode);
        let message = if envelope.errorcode.is_empty() {
            envelope.message
        } else {
            format!("{} ({})", envelope.message, envelope.errorcode)
        };
        return Err(BrokerError::Rejected(message));
    }

    // An empty holdings list comes back as `data: null`, so a missing
    // payload is handed to the caller as JSON null when T allows it.
    match envelope.data {
        Some(data) => Ok(data),
        None => serde_json::from_value(Value::Null)
            .map_err(|_| BrokerError::Parse("response carried no data".to_string())),
    }
}

fn order_id(data: &Value) -> Result<String, BrokerError> {
    data.get("orderid")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BrokerError::Parse("order response has no orderid".to_string()))
}
