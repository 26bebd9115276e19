use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::api::client::{ClientError, RepositoryClient};
use crate::api::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::config::settings::ClientConfig;
use crate::util::hash::sha256_bytes;

pub const BASE_URL: &str = "http://repo.test/artifactory";

const CREATED: &str = "2024-03-01T10:15:30.123Z";
const MODIFIED: &str = "2024-03-02T08:00:00.000Z";
const UPDATED: &str = "2024-03-02T08:00:01.000Z";

#[derive(Debug, Clone)]
pub enum Node {
    Folder,
    File { data: Vec<u8>, sha256: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
    pub content_type: Option<String>,
}

/// In-memory repository server speaking the subset of the storage API the
/// client uses. Paths are stored without leading or trailing slashes.
#[derive(Default)]
pub struct FakeRepository {
    nodes: Mutex<BTreeMap<String, Node>>,
    requests: Mutex<Vec<Recorded>>,
    failures: Mutex<HashMap<(Method, String), (u16, String)>>,
    unreachable: Mutex<bool>,
}

fn json_response(status: u16, value: serde_json::Value) -> TransportResponse {
    TransportResponse::from_bytes(status, value.to_string())
}

fn not_found() -> TransportResponse {
    json_response(
        404,
        json!({"errors": [{"status": 404, "message": "Unable to find item"}]}),
    )
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(self, path: &str) -> Self {
        self.insert_parents(path);
        self.nodes.lock().unwrap().insert(path.to_string(), Node::Folder);
        self
    }

    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        let sha256 = Some(sha256_bytes(data));
        self.with_node(path, Node::File { data: data.to_vec(), sha256 })
    }

    pub fn with_file_without_checksum(self, path: &str, data: &[u8]) -> Self {
        self.with_node(path, Node::File { data: data.to_vec(), sha256: None })
    }

    fn with_node(self, path: &str, node: Node) -> Self {
        self.insert_parents(path);
        self.nodes.lock().unwrap().insert(path.to_string(), node);
        self
    }

    /// Answers `status` with `body` for this exact method and URL.
    pub fn failing(self, method: Method, url: &str, status: u16, body: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert((method, url.to_string()), (status, body.to_string()));
        self
    }

    /// Every request fails before reaching the server.
    pub fn unreachable(self) -> Self {
        *self.unreachable.lock().unwrap() = true;
        self
    }

    pub fn into_client(self) -> RepositoryClient<FakeRepository> {
        let config = ClientConfig::new("http://repo.test").with_base_path("/artifactory/");
        RepositoryClient::with_transport(&config, self).unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub fn node(&self, path: &str) -> Option<Node> {
        self.nodes.lock().unwrap().get(path).cloned()
    }

    fn insert_parents(&self, path: &str) {
        let mut nodes = self.nodes.lock().unwrap();
        let mut parent = String::new();
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            if !parent.is_empty() {
                parent.push('/');
            }
            parent.push_str(segment);
            nodes.entry(parent.clone()).or_insert(Node::Folder);
        }
    }

    fn children_of(&self, path: &str) -> Vec<serde_json::Value> {
        let nodes = self.nodes.lock().unwrap();
        let prefix = format!("{}/", path);

        nodes
            .iter()
            .filter_map(|(key, node)| {
                let name = key.strip_prefix(&prefix)?;
                if name.contains('/') {
                    return None;
                }
                Some(json!({"uri": format!("/{}", name), "folder": matches!(node, Node::Folder)}))
            })
            .collect()
    }

    fn storage(&self, path: &str, query: Option<&str>) -> TransportResponse {
        let Some(node) = self.node(path) else {
            return not_found();
        };
        let repo = path.split('/').next().unwrap_or_default();

        if query == Some("stats") {
            return json_response(
                200,
                json!({
                    "uri": format!("{}/api/storage/{}", BASE_URL, path),
                    "downloadCount": 3,
                    "lastDownloaded": 1_709_288_130_123_i64,
                    "lastDownloadedBy": "admin",
                    "remoteDownloadCount": 0,
                }),
            );
        }

        match node {
            Node::Folder => json_response(
                200,
                json!({
                    "repo": repo,
                    "path": format!("/{}", path),
                    "created": CREATED,
                    "lastModified": MODIFIED,
                    "lastUpdated": UPDATED,
                    "children": self.children_of(path),
                }),
            ),
            Node::File { data, sha256 } => {
                let mut checksums = json!({"sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709"});
                if let Some(sha256) = sha256 {
                    checksums["sha256"] = json!(sha256);
                }
                json_response(
                    200,
                    json!({
                        "repo": repo,
                        "path": format!("/{}", path),
                        "created": CREATED,
                        "createdBy": "admin",
                        "lastModified": MODIFIED,
                        "modifiedBy": "deployer",
                        "lastUpdated": UPDATED,
                        "size": data.len().to_string(),
                        "mimeType": "application/octet-stream",
                        "checksums": checksums,
                    }),
                )
            }
        }
    }

    fn search(&self, query: &str) -> TransportResponse {
        let pattern = urlencoding::decode(query.trim_start_matches("pattern="))
            .map(|p| p.into_owned())
            .unwrap_or_default();
        let Some((repo, glob)) = pattern.split_once(':') else {
            return json_response(400, json!({"errors": [{"status": 400}]}));
        };
        let prefix = glob.split('*').next().unwrap_or_default();
        let nodes = self.nodes.lock().unwrap();

        let files: Vec<String> = nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::File { .. }))
            .filter_map(|(key, _)| key.strip_prefix(&format!("{}/", repo)).map(str::to_string))
            .filter(|file| file.starts_with(prefix))
            .collect();

        json_response(200, json!({"repoUri": format!("{}/{}", BASE_URL, repo), "files": files}))
    }

    fn handle(&self, request: &TransportRequest) -> TransportResponse {
        let Some(rest) = request.url.strip_prefix(BASE_URL) else {
            return not_found();
        };
        let rest = rest.trim_start_matches('/');
        let (target, query) = match rest.split_once('?') {
            Some((target, query)) => (target, Some(query)),
            None => (rest, None),
        };
        let target = urlencoding::decode(target)
            .map(|t| t.into_owned())
            .unwrap_or_default();
        let is_dir_target = target.ends_with('/');
        let path = target.trim_end_matches('/').to_string();

        if let Some(storage_path) = path.strip_prefix("api/storage/") {
            return self.storage(storage_path, query);
        }
        if path == "api/search/pattern" {
            return self.search(query.unwrap_or_default());
        }
        if path == "api/system/version" {
            return json_response(200, json!({"version": "7.77.3", "revision": "77703900", "addons": ["build"], "license": "oss"}));
        }
        if path == "api/repositories" {
            return json_response(
                200,
                json!([
                    {"key": "libs-release-local", "type": "LOCAL", "packageType": "Maven", "url": format!("{}/libs-release-local", BASE_URL)},
                    {"key": "remote-repo", "type": "REMOTE", "description": "proxy", "packageType": "Generic"},
                ]),
            );
        }

        match request.method {
            Method::GET => match self.node(&path) {
                Some(Node::File { data, .. }) => TransportResponse::from_bytes(200, data),
                Some(Node::Folder) => self.storage(&path, None),
                None => not_found(),
            },
            Method::HEAD => match self.node(&path) {
                Some(_) => TransportResponse::from_bytes(200, Vec::new()),
                None => TransportResponse::from_bytes(404, Vec::new()),
            },
            Method::PUT if is_dir_target => {
                self.insert_parents(&format!("{}/", path));
                self.nodes.lock().unwrap().insert(path.clone(), Node::Folder);
                json_response(201, json!({"repo": path.split('/').next(), "path": format!("/{}/", path)}))
            }
            Method::PUT => {
                let data = request.body.clone().unwrap_or_default();
                let sha256 = sha256_bytes(&data);
                self.insert_parents(&path);
                self.nodes.lock().unwrap().insert(
                    path.clone(),
                    Node::File { data, sha256: Some(sha256.clone()) },
                );
                json_response(201, json!({"path": format!("/{}", path), "checksums": {"sha256": sha256}}))
            }
            Method::DELETE => {
                let mut nodes = self.nodes.lock().unwrap();
                if nodes.remove(&path).is_none() {
                    return not_found();
                }
                let prefix = format!("{}/", path);
                nodes.retain(|key, _| !key.starts_with(&prefix));
                TransportResponse::from_bytes(204, Vec::new())
            }
            _ => TransportResponse::from_bytes(405, "Method Not Allowed"),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeRepository {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ClientError> {
        self.requests.lock().unwrap().push(Recorded {
            method: request.method.clone(),
            url: request.url.clone(),
            body: request.body.clone(),
            content_type: request
                .headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });

        if *self.unreachable.lock().unwrap() {
            return Err(ClientError::transport(&request.url, "connection refused"));
        }

        let injected = self
            .failures
            .lock()
            .unwrap()
            .get(&(request.method.clone(), request.url.clone()))
            .cloned();
        if let Some((status, body)) = injected {
            return Ok(TransportResponse::from_bytes(status, body));
        }

        Ok(self.handle(&request))
    }
}
