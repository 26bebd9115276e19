use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::client::ClientError;
use crate::util::date::{from_epoch_millis, parse_server_datetime};
use crate::util::path::{join_remote, strip_leading_slash};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub addons: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub key: String,
    #[serde(rename = "type")]
    pub repo_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub package_type: Option<String>,
}

/// One node of a directory listing. `uri` is repo-relative and already joined
/// with the listed path, so it can be passed straight back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub uri: String,
    pub is_folder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<FileStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<DownloadStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStat {
    pub repo: Option<String>,
    pub size: u64,
    pub is_folder: bool,
    pub mime_type: Option<String>,
    /// Child names, only present for folders.
    pub children: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub md5: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadStat {
    pub download_count: Option<u64>,
    /// Never downloaded is reported as the Unix epoch, the server omits the field.
    pub last_downloaded_at: DateTime<Utc>,
    pub last_downloaded_by: Option<String>,
    pub remote_download_count: Option<u64>,
    pub remote_last_downloaded_at: Option<DateTime<Utc>>,
}

// Raw server shapes

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSize {
    Number(u64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawChecksums {
    sha1: Option<String>,
    sha256: Option<String>,
    md5: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChild {
    uri: Option<String>,
    #[serde(default)]
    folder: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStorageInfo {
    repo: Option<String>,
    size: Option<RawSize>,
    mime_type: Option<String>,
    children: Option<Vec<RawChild>>,
    created: Option<String>,
    last_modified: Option<String>,
    last_updated: Option<String>,
    created_by: Option<String>,
    modified_by: Option<String>,
    #[serde(default)]
    checksums: RawChecksums,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDownloadStats {
    download_count: Option<u64>,
    last_downloaded: Option<i64>,
    last_downloaded_by: Option<String>,
    remote_download_count: Option<u64>,
    remote_last_downloaded: Option<i64>,
}

fn metadata_error(path: &str, reason: impl Into<String>) -> ClientError {
    ClientError::Metadata {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn parse_raw<T: serde::de::DeserializeOwned>(path: &str, raw: &Value) -> Result<T, ClientError> {
    T::deserialize(raw).map_err(|e| metadata_error(path, e.to_string()))
}

fn required_datetime(
    path: &str,
    field: &str,
    value: Option<&str>,
) -> Result<DateTime<Utc>, ClientError> {
    let value = value.ok_or_else(|| metadata_error(path, format!("missing `{}`", field)))?;

    parse_server_datetime(value)
        .map_err(|e| metadata_error(path, format!("invalid `{}` ({}): {}", field, value, e)))
}

fn millis_to_datetime(path: &str, field: &str, millis: i64) -> Result<DateTime<Utc>, ClientError> {
    from_epoch_millis(millis)
        .ok_or_else(|| metadata_error(path, format!("`{}` out of range: {}", field, millis)))
}

impl FileStat {
    /// Maps a storage metadata document. `created`, `lastModified` and
    /// `lastUpdated` are mandatory, everything else defaults.
    pub fn from_storage_json(path: &str, raw: &Value) -> Result<Self, ClientError> {
        let info: RawStorageInfo = parse_raw(path, raw)?;

        let size = match &info.size {
            None => None,
            Some(RawSize::Number(n)) => Some(*n),
            Some(RawSize::Text(text)) => Some(
                text.parse::<u64>()
                    .map_err(|_| metadata_error(path, format!("invalid `size`: {}", text)))?,
            ),
        };

        let children = info.children.map(|children| {
            children
                .into_iter()
                .filter_map(|child| child.uri)
                .map(|uri| strip_leading_slash(&uri).to_string())
                .collect()
        });

        Ok(FileStat {
            repo: info.repo,
            size: size.unwrap_or(0),
            is_folder: size.is_none(),
            mime_type: info.mime_type,
            children,
            created_at: required_datetime(path, "created", info.created.as_deref())?,
            modified_at: required_datetime(path, "lastModified", info.last_modified.as_deref())?,
            last_updated_at: required_datetime(path, "lastUpdated", info.last_updated.as_deref())?,
            created_by: info.created_by,
            modified_by: info.modified_by,
            sha1: info.checksums.sha1,
            sha256: info.checksums.sha256,
            md5: info.checksums.md5,
        })
    }
}

impl DownloadStat {
    pub fn from_stats_json(path: &str, raw: &Value) -> Result<Self, ClientError> {
        let stats: RawDownloadStats = parse_raw(path, raw)?;

        let remote_last_downloaded_at = match stats.remote_last_downloaded {
            Some(millis) => Some(millis_to_datetime(path, "remoteLastDownloaded", millis)?),
            None => None,
        };

        Ok(DownloadStat {
            download_count: stats.download_count,
            last_downloaded_at: millis_to_datetime(
                path,
                "lastDownloaded",
                stats.last_downloaded.unwrap_or(0),
            )?,
            last_downloaded_by: stats.last_downloaded_by,
            remote_download_count: stats.remote_download_count,
            remote_last_downloaded_at,
        })
    }
}

impl DirEntry {
    /// Builds the entries of one directory from its storage metadata document.
    /// A file (no `children`) yields an empty listing.
    pub fn from_storage_children(path: &str, raw: &Value) -> Result<Vec<DirEntry>, ClientError> {
        #[derive(Deserialize)]
        struct Listing {
            #[serde(default)]
            children: Vec<RawChild>,
        }

        let listing: Listing = parse_raw(path, raw)?;

        listing
            .children
            .into_iter()
            .map(|child| {
                let uri = child
                    .uri
                    .ok_or_else(|| metadata_error(path, "child entry without `uri`"))?;
                let name = strip_leading_slash(&uri).to_string();

                Ok(DirEntry {
                    uri: join_remote(path, &name),
                    name,
                    is_folder: child.folder,
                    stat: None,
                    downloads: None,
                })
            })
            .collect()
    }
}
