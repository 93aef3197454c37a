use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::errors::NetError;
use crate::types::{Body, NetRequest, NetResponse};

/// One HTTP exchange. Non-2xx statuses are failures.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: NetRequest) -> Result<NetResponse, NetError>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, NetError> {
        Ok(Self::new(build_reqwest_client(config)?))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: NetRequest) -> Result<NetResponse, NetError> {
        let start = Instant::now();
        let mut req_builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        match &request.body {
            Body::Empty => {}
            Body::Json(value) => {
                req_builder = req_builder.json(value);
            }
        }

        if let Some(timeout) = request.timeout.overall {
            req_builder = req_builder.timeout(timeout);
        }

        let resp = req_builder.send().await.map_err(NetError::from)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|err| NetError::decode(&format!("response body error: {err}")))?;

        if !status.is_success() {
            return Err(NetError::upstream_status(status.as_u16()));
        }

        Ok(NetResponse::new(status, headers, body, start.elapsed()))
    }
}

fn build_reqwest_client(config: &ApiConfig) -> Result<reqwest::Client, NetError> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .connect_timeout(Duration::from_secs(10))
        .timeout(config.timeout())
        .build()
        .map_err(|err| NetError::config(&format!("failed to build reqwest client: {err}")))
}
