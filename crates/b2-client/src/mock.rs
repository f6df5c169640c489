//! Scripted transport for unit tests

use crate::{
    transport::{HttpRequest, HttpResponse, RequestBody, Transport},
    B2Client, BucketType, Bucket, ClientError, Config, Result, Session,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::{header::HeaderName, StatusCode};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;

/// What the fake service answers
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    /// Status and body, delivered in small chunks
    Body(u16, Vec<u8>),
    /// Status and the first bytes of a body whose stream then fails
    Broken(u16, Vec<u8>),
    /// Status and the first bytes of a body that never finishes
    Stalled(u16, Vec<u8>),
    /// The connection cannot be established
    Unreachable,
}

impl Reply {
    pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
        Reply::Body(status, body.to_string().into_bytes())
    }

    pub(crate) fn raw(status: u16, body: Vec<u8>) -> Self {
        Reply::Body(status, body)
    }
}

/// A request as the fake service saw it
#[derive(Clone, Debug)]
pub(crate) struct Recorded {
    pub url: String,
    pub headers: Vec<(HeaderName, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

type Handler = dyn Fn(&Recorded, usize) -> Reply + Send + Sync;

/// Transport that records requests and answers from a script
pub(crate) struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    /// Answer each request with `handler(request, index)`
    pub(crate) fn new(
        handler: impl Fn(&Recorded, usize) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request the same way
    pub(crate) fn always(reply: Reply) -> Arc<Self> {
        Self::new(move |_, _| reply.clone())
    }

    /// Answer the n-th request with the n-th reply
    pub(crate) fn sequence(replies: Vec<Reply>) -> Arc<Self> {
        Self::new(move |_, index| {
            replies
                .get(index)
                .cloned()
                .unwrap_or_else(|| panic!("unexpected request #{}", index + 1))
        })
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let body = match request.body {
            RequestBody::Json(bytes) => bytes.to_vec(),
            RequestBody::File { mut file, .. } => {
                let mut buf = Vec::new();
                file.read_to_end(&mut buf).await?;
                buf
            }
        };
        let recorded = Recorded {
            url: request.url,
            headers: request.headers,
            body,
        };

        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(recorded.clone());
            requests.len() - 1
        };

        let (status, body, broken, stalled) = match (self.handler)(&recorded, index) {
            Reply::Body(status, body) => (status, body, false, false),
            Reply::Broken(status, body) => (status, body, true, false),
            Reply::Stalled(status, body) => (status, body, false, true),
            Reply::Unreachable => {
                return Err(ClientError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            }
        };

        let mut chunks: Vec<Result<Bytes>> = body
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        if broken {
            chunks.push(Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))));
        }

        let body = stream::iter(chunks);
        let body = if stalled {
            body.chain(stream::pending()).boxed()
        } else {
            body.boxed()
        };

        Ok(HttpResponse::new(StatusCode::from_u16(status).unwrap(), body))
    }
}

pub(crate) fn test_client(transport: Arc<MockTransport>) -> B2Client {
    B2Client::with_transport(Config::default(), transport)
}

pub(crate) fn test_session() -> Session {
    Session {
        auth_token: "session-token".to_string(),
        account_id: "acct123".to_string(),
        api_url: "https://api.example.com".to_string(),
        download_url: "https://download.example.com".to_string(),
    }
}

pub(crate) fn test_bucket() -> Bucket {
    Bucket::new("my-photos", "4a48fe8875c6214145260818", BucketType::Private)
}
