use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::api::client::{ClientError, RepositoryClient};
use crate::api::models::DirEntry;
use crate::api::transport::{ByteStream, HttpTransport};
use crate::util::path::{
    get_file_name, is_contained, join_remote, split_repo_name, strip_leading_slash,
};

/// Downloaded bodies are written through a buffer of this size.
pub const DOWNLOAD_BUFFER_SIZE: usize = 10 * 1024 * 1024;

impl<T: HttpTransport> RepositoryClient<T> {
    async fn list_children(&self, path: &str) -> Result<Vec<DirEntry>, ClientError> {
        let raw = self.get_storage_info(path, None).await?;
        DirEntry::from_storage_children(strip_leading_slash(path), &raw)
    }

    async fn attach_stats(&self, entry: &mut DirEntry) -> Result<(), ClientError> {
        entry.stat = Some(self.get_file_stat(&entry.uri).await?);
        entry.downloads = Some(self.get_download_stat(&entry.uri).await?);
        Ok(())
    }

    /// Lists the children of `path`.
    ///
    /// With `recursive`, every folder is followed by its own subtree
    /// (depth-first, parent before children). With `include_stat`, each entry
    /// costs two extra round trips for its file and download statistics.
    ///
    /// The first failure at any depth aborts the listing: there is no partial
    /// result.
    pub async fn list_directory(
        &self,
        path: &str,
        recursive: bool,
        include_stat: bool,
    ) -> Result<Vec<DirEntry>, ClientError> {
        let mut listing = Vec::new();
        let mut pending = vec![self.list_children(path).await?.into_iter()];

        while let Some(siblings) = pending.last_mut() {
            let Some(mut entry) = siblings.next() else {
                pending.pop();
                continue;
            };

            if include_stat {
                self.attach_stats(&mut entry).await?;
            }

            let subtree = (recursive && entry.is_folder).then(|| entry.uri.clone());
            listing.push(entry);

            if let Some(folder) = subtree {
                log::debug!("[LIST_DIR] descending into {}", folder);
                pending.push(self.list_children(&folder).await?.into_iter());
            }
        }

        Ok(listing)
    }

    /// Downloads the file at `path` into `local_dir`, keeping its name.
    ///
    /// If the local file already exists and `force_download` is false, its
    /// path is returned without touching the network.
    pub async fn download_file(
        &self,
        path: &str,
        local_dir: &Path,
        force_download: bool,
    ) -> Result<PathBuf, ClientError> {
        let file_name = get_file_name(path);
        if file_name.is_empty() {
            return Err(ClientError::InvalidArgument(format!(
                "cannot download `{}`: no file name",
                path
            )));
        }

        let local_path = local_dir.join(&file_name);

        if local_path.exists() && !force_download {
            log::debug!("[DOWNLOAD] {} already present, skipped", local_path.display());
            return Ok(local_path);
        }

        tokio::fs::create_dir_all(local_dir)
            .await
            .map_err(|e| ClientError::local_io(local_dir, e))?;

        let body = self.fetch_stream(&self.file_url(path)).await?;

        // a partial file would later pass for a complete download
        if let Err(e) = write_body(body, &local_path).await {
            if let Err(remove_err) = tokio::fs::remove_file(&local_path).await {
                log::warn!(
                    "[DOWNLOAD] could not remove partial {}: {}",
                    local_path.display(),
                    remove_err
                );
            }
            return Err(e);
        }

        log::debug!("[DOWNLOAD] {} -> {}", path, local_path.display());
        Ok(local_path)
    }

    /// Mirrors the tree below `path` into `local_root`, each entry landing at
    /// `local_root/<entry uri>`. Stops at the first failure; files written so
    /// far are left in place.
    pub async fn download_folder(&self, path: &str, local_root: &Path) -> Result<(), ClientError> {
        let listing = self.list_directory(path, true, false).await?;

        for entry in listing {
            if entry.uri.is_empty() {
                return Err(ClientError::Metadata {
                    path: path.to_string(),
                    reason: "uri is missing".to_string(),
                });
            }

            if !is_contained(&entry.uri) {
                return Err(ClientError::InvalidArgument(format!(
                    "refusing to write `{}` outside of `{}`",
                    entry.uri,
                    local_root.display()
                )));
            }

            let local_path = local_root.join(&entry.uri);

            if entry.is_folder {
                tokio::fs::create_dir_all(&local_path)
                    .await
                    .map_err(|e| ClientError::local_io(&local_path, e))?;
            } else {
                let parent = local_path.parent().unwrap_or(local_root).to_path_buf();
                tokio::fs::create_dir_all(&parent)
                    .await
                    .map_err(|e| ClientError::local_io(&parent, e))?;

                self.download_file(&entry.uri, &parent, true).await?;
            }
        }

        Ok(())
    }

    /// Pattern search scoped to one repository: `"<repo>/<pattern>"`.
    /// Returned paths are prefixed with the repository name.
    pub async fn search_directory(&self, glob_pattern: &str) -> Result<Vec<String>, ClientError> {
        let (repo_name, search_path) = split_repo_name(glob_pattern).ok_or_else(|| {
            ClientError::InvalidArgument(format!(
                "search pattern must look like <repo>/<path>: {}",
                glob_pattern
            ))
        })?;

        let pattern = format!("{}:{}", repo_name, search_path);
        let url = self.api_url(&format!(
            "search/pattern?pattern={}",
            urlencoding::encode(&pattern)
        ));

        let raw = self.fetch_json(&url).await?;
        let files = match raw.get("files") {
            None => Vec::new(),
            Some(files) => serde_json::from_value::<Vec<String>>(files.clone())
                .map_err(|e| ClientError::Decode(e.to_string()))?,
        };

        Ok(files
            .iter()
            .map(|file| join_remote(repo_name, file))
            .collect())
    }

    /// Reads a remote file as UTF-8 text.
    pub async fn read_text(&self, path: &str) -> Result<String, ClientError> {
        let data = self.fetch_bytes(&self.file_url(path)).await?;
        String::from_utf8(data).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

async fn write_body(mut body: ByteStream, local_path: &Path) -> Result<(), ClientError> {
    let file = tokio::fs::File::create(local_path)
        .await
        .map_err(|e| ClientError::local_io(local_path, e))?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_BUFFER_SIZE, file);

    while let Some(chunk) = body.next().await {
        writer
            .write_all(&chunk?)
            .await
            .map_err(|e| ClientError::local_io(local_path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| ClientError::local_io(local_path, e))
}
