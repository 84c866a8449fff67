//! Remote HTTP tier: stateless `POST /chat` against an inference service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shipchat_core::config::RemoteConfig;

use crate::error::TransportError;
use crate::transport::{Analysis, AnalysisRequest, Analyzer, Tier, WireAnalysis};

pub struct RemoteHttpAnalyzer {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteHttpAnalyzer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, TransportError> {
        Self::new(&config.base_url, config.timeout())
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout.as_millis() as u64)
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl Analyzer for RemoteHttpAnalyzer {
    fn tier(&self) -> Tier {
        Tier::RemoteHttp
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis, TransportError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            return Err(TransportError::Remote(format!("status {}", status.as_u16())));
        }

        let wire: WireAnalysis = serde_json::from_str(&body)?;
        wire.into_analysis()
    }

    async fn probe(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Remote(format!(
                "health check returned {}",
                response.status().as_u16()
            )))
        }
    }
}
