//! HTTP transport seam
//!
//! Every exchange with the service is a single POST. The [`Transport`] trait
//! carries exactly that, so tests can swap the network for a scripted fake.

use crate::{ClientError, Config, Result, CHUNK_SIZE};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::{
    header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE},
    Body, Client, StatusCode,
};
use std::fmt;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Response body delivered chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Executes one POST exchange
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the status with an unread body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// A POST request
#[derive(Debug)]
pub struct HttpRequest {
    /// Absolute target URL
    pub url: String,
    /// Request headers
    pub headers: Vec<(HeaderName, String)>,
    /// Request body
    pub body: RequestBody,
}

impl HttpRequest {
    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Request body variants
pub enum RequestBody {
    /// Encoded JSON document
    Json(Bytes),
    /// File content, read in `CHUNK_SIZE` pieces while sending
    File { file: tokio::fs::File, length: u64 },
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Json(bytes) => write!(f, "Json({} bytes)", bytes.len()),
            RequestBody::File { length, .. } => write!(f, "File({} bytes)", length),
        }
    }
}

/// Status and streamed body of a response
pub struct HttpResponse {
    /// Response status code
    pub status: StatusCode,
    /// Response body
    pub body: ByteStream,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: StatusCode, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// Read the whole body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        let mut body = self.body;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// `reqwest` implementation of [`Transport`]
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a transport honouring the configured timeout and user agent
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut req = self.http.post(&request.url);

        for (name, value) in request.headers {
            req = req.header(name, value);
        }

        req = match request.body {
            RequestBody::Json(bytes) => req.header(CONTENT_TYPE, "application/json").body(bytes),
            RequestBody::File { file, length } => {
                let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);
                req.header(CONTENT_LENGTH, length)
                    .body(Body::wrap_stream(stream))
            }
        };

        debug!("Sending POST request to {}", request.url);
        let response = req.send().await?;
        let status = response.status();
        let body = response.bytes_stream().map_err(ClientError::Http).boxed();

        Ok(HttpResponse::new(status, body))
    }
}
