//! Task metadata endpoint client.
//!
//! The agent injects the endpoint base URL (for example
//! `http://169.254.170.2/v4/abc-123`) into every container. The task
//! document lives at `{endpoint}/task`. The endpoint is link-local plain
//! HTTP, so a bare hyper HTTP/1.1 connection is all that is needed.

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, Request, Uri};
use http_body_util::{BodyExt, Empty};
use tracing::debug;

use drainguard_core::{GuardError, GuardResult, TaskMetadata, TaskMetadataSource};

/// Fetches the task document from the local metadata endpoint.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    /// Full URI of the task document.
    uri: Uri,
    /// `host:port` to connect to.
    address: String,
}

impl MetadataClient {
    /// Create a client for the endpoint base URL.
    ///
    /// Only `http` endpoints with an explicit host are accepted.
    pub fn new(endpoint: &str) -> GuardResult<Self> {
        let base = endpoint.trim().trim_end_matches('/');
        let uri: Uri = format!("{base}/task").parse().map_err(|e| {
            GuardError::Config(format!("invalid metadata endpoint {endpoint:?}: {e}"))
        })?;

        if uri.scheme_str() != Some("http") {
            return Err(GuardError::Config(format!(
                "metadata endpoint {endpoint:?} must use http"
            )));
        }

        let host = uri.host().ok_or_else(|| {
            GuardError::Config(format!("metadata endpoint {endpoint:?} has no host"))
        })?;
        let address = format!("{host}:{}", uri.port_u16().unwrap_or(80));

        Ok(Self { uri, address })
    }

    /// The URI the task document is fetched from.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    async fn get(&self) -> GuardResult<Bytes> {
        let stream = tokio::net::TcpStream::connect(&self.address)
            .await
            .map_err(|e| GuardError::Metadata(format!("connect to {}: {e}", self.address)))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| GuardError::Metadata(format!("handshake with {}: {e}", self.address)))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "metadata connection closed with error");
            }
        });

        let path = self
            .uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/task");
        let req = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::HOST, self.address.as_str())
            .header(header::USER_AGENT, "drainguard/0.1")
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| GuardError::Metadata(format!("build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| GuardError::Metadata(format!("GET {}: {e}", self.uri)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GuardError::Metadata(format!("GET {} returned {status}", self.uri)));
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| GuardError::Metadata(format!("read body of {}: {e}", self.uri)))?;
        Ok(body.to_bytes())
    }
}

#[async_trait]
impl TaskMetadataSource for MetadataClient {
    async fn task_metadata(&self) -> GuardResult<TaskMetadata> {
        let body = self.get().await?;
        let metadata: TaskMetadata = serde_json::from_slice(&body)
            .map_err(|e| GuardError::Metadata(format!("decode task document: {e}")))?;

        debug!(
            cluster = %metadata.cluster,
            task = %metadata.task_arn,
            family = %metadata.family,
            revision = %metadata.revision,
            known_status = %metadata.known_status,
            "fetched task metadata"
        );
        Ok(metadata)
    }
}
