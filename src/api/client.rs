use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;

use crate::api::models::*;
use crate::api::transport::{
    ByteStream, HttpTransport, ReqwestTransport, TransportRequest, TransportResponse,
};
use crate::config::settings::ClientConfig;
use crate::util::auth::get_auth_headers;
use crate::util::path::{encode_path, strip_leading_slash, strip_trailing_slash};

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json";
pub(crate) const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Query key selecting download statistics on the storage endpoint.
pub const STATS_KEY: &str = "stats";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Return code={status}\n{body}")]
    HttpStatus { status: u16, body: String },

    #[error("Error while decoding content: {0}")]
    Decode(String),

    #[error("Invalid metadata for `{path}`: {reason}")]
    Metadata { path: String, reason: String },

    #[error("Local I/O error on `{}`: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Path not found: {path}")]
    NotFound { path: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    pub fn transport(url: &str, source: impl Into<BoxError>) -> Self {
        ClientError::Transport {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClientError::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client of an Artifactory-style repository server.
///
/// The client is immutable after construction: credential headers are computed
/// once and the content type is chosen per request, so a single instance can be
/// shared between tasks. Operations issue their requests one after the other.
pub struct RepositoryClient<T = ReqwestTransport> {
    base_url: String,
    auth_headers: HeaderMap,
    transport: T,
}

impl RepositoryClient<ReqwestTransport> {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, ReqwestTransport::new()?)
    }
}

impl<T: HttpTransport> RepositoryClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self, ClientError> {
        let base_url = build_base_url(config)?;
        let auth_headers = get_auth_headers(&config.credentials)
            .map_err(|e| ClientError::Config(format!("Invalid credentials: {}", e)))?;

        Ok(Self {
            base_url,
            auth_headers,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // `<base>/<path>` for file-style targets
    pub(crate) fn file_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url,
            encode_path(strip_leading_slash(path))
        )
    }

    // `<base>/<path>/` for directory-style targets
    pub(crate) fn dir_url(&self, path: &str) -> String {
        let path = strip_trailing_slash(strip_leading_slash(path));
        format!("{}/{}/", self.base_url, encode_path(path))
    }

    pub(crate) fn api_url(&self, route: &str) -> String {
        format!("{}/api/{}", self.base_url, route)
    }

    pub(crate) fn headers(&self, content_type: &'static str) -> HeaderMap {
        let mut headers = self.auth_headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    /// Sends one request and turns any non-2xx answer into `HttpStatus`,
    /// keeping the response text for diagnosis. No retries.
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: &str,
        content_type: &'static str,
        body: Option<Vec<u8>>,
    ) -> Result<TransportResponse, ClientError> {
        log::debug!("[REQUEST] {} {}", method, url);

        let response = self
            .transport
            .send(TransportRequest {
                method,
                url: url.to_string(),
                headers: self.headers(content_type),
                body,
            })
            .await?;

        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let body = match response.bytes().await {
            Ok(data) => String::from_utf8_lossy(&data).into_owned(),
            Err(_) => "Unknown error".to_string(),
        };
        log::debug!("[REQUEST] {} answered {}: {}", url, status, body);

        Err(ClientError::HttpStatus { status, body })
    }

    /// GET decoded as JSON. An empty body is an empty object.
    pub(crate) async fn fetch_json(&self, url: &str) -> Result<Value, ClientError> {
        let data = self
            .execute(Method::GET, url, CONTENT_TYPE_JSON, None)
            .await?
            .bytes()
            .await?;

        decode_json(&data)
    }

    /// GET returning the raw body bytes.
    pub(crate) async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        self.execute(Method::GET, url, CONTENT_TYPE_JSON, None)
            .await?
            .bytes()
            .await
    }

    /// GET returning the open body stream; the caller drains it.
    pub(crate) async fn fetch_stream(&self, url: &str) -> Result<ByteStream, ClientError> {
        Ok(self
            .execute(Method::GET, url, CONTENT_TYPE_JSON, None)
            .await?
            .body)
    }

    pub async fn get_version(&self) -> Result<VersionInfo, ClientError> {
        let raw = self.fetch_json(&self.api_url("system/version")).await?;
        serde_json::from_value(raw).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>, ClientError> {
        let raw = self.fetch_json(&self.api_url("repositories")).await?;
        serde_json::from_value(raw).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Raw storage metadata of `path`. With `stat_key` the same endpoint answers
    /// a different document, e.g. download statistics for [`STATS_KEY`].
    pub async fn get_storage_info(
        &self,
        path: &str,
        stat_key: Option<&str>,
    ) -> Result<Value, ClientError> {
        let path = strip_leading_slash(path);
        let mut url = self.api_url(&format!("storage/{}", encode_path(path)));
        if let Some(key) = stat_key {
            url.push('?');
            url.push_str(&urlencoding::encode(key));
        }

        self.fetch_json(&url).await
    }

    pub async fn get_file_stat(&self, path: &str) -> Result<FileStat, ClientError> {
        let raw = self.get_storage_info(path, None).await?;
        FileStat::from_storage_json(path, &raw)
    }

    pub async fn get_download_stat(&self, path: &str) -> Result<DownloadStat, ClientError> {
        let raw = self.get_storage_info(path, Some(STATS_KEY)).await?;
        DownloadStat::from_stats_json(path, &raw)
    }
}

fn build_base_url(config: &ClientConfig) -> Result<String, ClientError> {
    let url = config.base_url.trim();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ClientError::Config(format!("Invalid url: {}", url)));
    }

    let mut base_url = strip_trailing_slash(url).to_string();

    if let Some(base_path) = &config.base_path {
        let base_path = strip_trailing_slash(strip_leading_slash(base_path));
        if !base_path.is_empty() {
            base_url.push('/');
            base_url.push_str(base_path);
        }
    }

    Ok(base_url)
}

pub(crate) fn decode_json(data: &[u8]) -> Result<Value, ClientError> {
    let text = std::str::from_utf8(data).map_err(|e| ClientError::Decode(e.to_string()))?;

    if text.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_str(text).map_err(|e| ClientError::Decode(e.to_string()))
}
