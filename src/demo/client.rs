//! Load-balanced API access for the wizard.
//!
//! # Responsibilities
//! - Call health, stress and clear through the balancer address
//! - Decode the JSON bodies the wizard needs
//!
//! # Design Decisions
//! - Health bodies are decoded whatever the status code: a 503 still names
//!   the instance that answered
//! - A non-success stress or clear response is an error for that attempt

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::demo::types::{ClearReceipt, DemoError, InstanceHealth, StressReceipt};

/// Operations the wizard performs against the balanced endpoint.
#[async_trait]
pub trait DemoApi: Send + Sync {
    async fn health(&self) -> Result<InstanceHealth, DemoError>;
    async fn stress(&self) -> Result<StressReceipt, DemoError>;
    async fn clear_stress(&self) -> Result<ClearReceipt, DemoError>;
}

/// `DemoApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDemoClient {
    client: Client,
    base: String,
}

impl HttpDemoClient {
    /// `base_url` is the API root behind the balancer, e.g. `http://lb/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DemoError> {
        let parsed = Url::parse(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DemoError> {
        let response = self.client.post(self.endpoint(path)).send().await?;
        success_json(response).await
    }
}

async fn success_json<T: DeserializeOwned>(response: Response) -> Result<T, DemoError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(DemoError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl DemoApi for HttpDemoClient {
    async fn health(&self) -> Result<InstanceHealth, DemoError> {
        let response = self.client.get(self.endpoint("health")).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<InstanceHealth>(&body) {
            Ok(health) => Ok(health),
            Err(_) if !status.is_success() => Err(DemoError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn stress(&self) -> Result<StressReceipt, DemoError> {
        self.post_json("stress").await
    }

    async fn clear_stress(&self) -> Result<ClearReceipt, DemoError> {
        self.post_json("stress/clear").await
    }
}
