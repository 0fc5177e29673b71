//! HTTP client for the inference service.
//!
//! # Responsibilities
//! - Issue info probes (`GET {base}{info_path}`) and predictions
//!   (`POST {base}{predict_path}`, multipart)
//! - Translate transport errors and status codes into [`GatewayError`]
//!
//! Deadlines are applied by the caller (retry executor or diagnostics);
//! only the connect timeout is configured here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use crate::config::UpstreamConfig;
use crate::endpoints::Endpoint;
use crate::error::{GatewayError, GatewayResult};
use crate::health::status::{InfoResponse, ProbeRules};
use crate::prediction::types::ImagePayload;

/// Status code and body of an info probe, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// Client shared by the health cache, the invoker and diagnostics.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: Arc<UpstreamConfig>,
    rules: Arc<ProbeRules>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(concat!("retina-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            rules: Arc::new(ProbeRules::from_config(config)),
            config: Arc::new(config.clone()),
        })
    }

    pub fn rules(&self) -> &ProbeRules {
        &self.rules
    }

    /// GET the info path and return whatever came back.
    pub async fn fetch_info_raw(&self, endpoint: &Endpoint) -> GatewayResult<RawReply> {
        let url = endpoint.url_for(&self.config.info_path);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        Ok(RawReply { status, body })
    }

    /// GET the info path and accept it only if the body has a recognized shape.
    pub async fn fetch_info(&self, endpoint: &Endpoint) -> GatewayResult<InfoResponse> {
        let reply = self.fetch_info_raw(endpoint).await?;
        check_status(reply.status)?;
        InfoResponse::parse(&reply.body, &self.rules)
    }

    /// POST the image and return the parsed JSON body.
    pub async fn predict(
        &self,
        endpoint: &Endpoint,
        image: &ImagePayload,
    ) -> GatewayResult<serde_json::Value> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| GatewayError::InvalidImage(e.to_string()))?;
        let form = Form::new().part(self.config.file_field.clone(), part);

        let url = endpoint.url_for(&self.config.predict_path);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        check_status(status)?;

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::MalformedResponse(format!("prediction body is not JSON: {}", e))
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::RequestTimeout(self.config.connect_timeout_ms)
        } else if e.is_decode() {
            GatewayError::MalformedResponse(e.to_string())
        } else {
            GatewayError::NetworkUnreachable(error_chain(&e))
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("info_path", &self.config.info_path)
            .field("predict_path", &self.config.predict_path)
            .finish()
    }
}

/// Map an upstream status code to success or a classified error.
pub fn check_status(status: u16) -> GatewayResult<()> {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match code {
        c if c.is_success() => Ok(()),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            Err(GatewayError::ColdStart { status })
        }
        _ => Err(GatewayError::UnexpectedStatus { status }),
    }
}

/// reqwest hides the interesting part (DNS, refused) in the source chain.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status(200).is_ok());
        assert!(check_status(204).is_ok());
        assert_eq!(check_status(502), Err(GatewayError::ColdStart { status: 502 }));
        assert_eq!(check_status(503), Err(GatewayError::ColdStart { status: 503 }));
        assert_eq!(check_status(504), Err(GatewayError::ColdStart { status: 504 }));
        assert_eq!(check_status(500), Err(GatewayError::UnexpectedStatus { status: 500 }));
        assert_eq!(check_status(404), Err(GatewayError::UnexpectedStatus { status: 404 }));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        let pool = crate::endpoints::EndpointPool::new(&[format!("http://{}", addr)]).unwrap();
        let err = client.fetch_info(&pool.current()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NetworkUnreachable(_)), "got {:?}", err);
    }
}
