use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;

use crate::api::client::ClientError;

/// Limit for establishing the connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Limit for any single wait on the server: the response head of a bodyless
/// request, or the next chunk of a response body. A transfer can take as long
/// as it needs while data keeps flowing.
pub const READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Response body, consumed chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

pub struct TransportResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl TransportResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let chunks = if body.is_empty() { vec![] } else { vec![Ok(body)] };
        Self::new(status, stream::iter(chunks).boxed())
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Drains the whole body into memory.
    pub async fn bytes(mut self) -> Result<Vec<u8>, ClientError> {
        let mut data = Vec::new();
        while let Some(chunk) = self.body.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }
}

/// Performs one HTTP exchange. Implementations must not retry and must not
/// interpret the status code: that is the client's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ClientError>;
}

pub struct ReqwestTransport {
    http_client: reqwest::Client,
    read_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_timeouts(CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    pub fn with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            read_timeout,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ClientError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let builder = self.http_client.request(method, &url).headers(headers);

        // the head of an upload response only comes after the whole body is sent
        // so no deadline applies there
        let response = match body {
            Some(body) => builder.body(body).send().await,
            None => tokio::time::timeout(self.read_timeout, builder.send())
                .await
                .map_err(|_| {
                    ClientError::transport(
                        &url,
                        format!("no response within {:?}", self.read_timeout),
                    )
                })?,
        }
        .map_err(|e| ClientError::transport(&url, e))?;

        let status = response.status().as_u16();
        let stream_url = url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| ClientError::transport(&stream_url, e)));

        Ok(TransportResponse::new(
            status,
            with_idle_timeout(body, url, self.read_timeout),
        ))
    }
}

/// Fails the body with a `Transport` error when no chunk arrives within
/// `idle`. The stream ends after the first error.
pub fn with_idle_timeout<S>(body: S, url: String, idle: Duration) -> ByteStream
where
    S: Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
{
    stream::unfold(Some(body.boxed()), move |state| {
        let url = url.clone();
        async move {
            let mut body = state?;
            match tokio::time::timeout(idle, body.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(body))),
                Ok(Some(Err(e))) => Some((Err(e), None)),
                Ok(None) => None,
                Err(_) => Some((
                    Err(ClientError::transport(
                        &url,
                        format!("no data received for {:?}", idle),
                    )),
                    None,
                )),
            }
        }
    })
    .boxed()
}
