use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::Value;
use vendra_core::{ProviderError, ProviderResult};

use crate::signing::RequestSigner;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client that stamps every request with `app_key`, `timestamp` and a
/// signature before sending, and maps transport/status failures onto typed
/// provider error kinds.
pub struct SignedClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    signer: Arc<dyn RequestSigner>,
}

impl SignedClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        signer: Arc<dyn RequestSigner>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("static client options");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            signer,
        }
    }

    fn signed_params(
        &self,
        path: &str,
        mut params: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        params.insert("app_key".to_string(), self.api_key.clone());
        params.insert(
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        );
        let signature = self.signer.sign(path, &params);
        params.insert("sign".to_string(), signature);
        params
    }

    pub async fn get_json(
        &self,
        path: &str,
        params: BTreeMap<String, String>,
    ) -> ProviderResult<Value> {
        let params = self.signed_params(path, params);
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(map_transport)?;
        decode(response).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        params: BTreeMap<String, String>,
        body: &Value,
    ) -> ProviderResult<Value> {
        let params = self.signed_params(path, params);
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .query(&params)
            .json(body)
            .send()
            .await
            .map_err(map_transport)?;
        decode(response).await
    }
}

fn map_transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Unreachable(err.to_string())
}

async fn decode(response: reqwest::Response) -> ProviderResult<Value> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Data(format!("invalid json body: {}", e)));
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ProviderError::Auth(format!("status {}", status)))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(ProviderError::RateLimited { retry_after })
        }
        s if s.is_server_error() => Err(ProviderError::Unreachable(format!("status {}", status))),
        s => Err(ProviderError::Data(format!("unexpected status {}", s))),
    }
}
