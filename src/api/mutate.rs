use reqwest::Method;
use std::path::Path;

use crate::api::client::{ClientError, RepositoryClient, CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM};
use crate::api::transport::HttpTransport;
use crate::util::hash::sha256_file;
use crate::util::path::{join_remote, strip_leading_slash, strip_trailing_slash};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The file was sent.
    Uploaded { remote_path: String },
    /// The remote file already had the same SHA-256, nothing was sent.
    Skipped { remote_path: String },
}

impl UploadOutcome {
    pub fn remote_path(&self) -> &str {
        match self {
            UploadOutcome::Uploaded { remote_path } | UploadOutcome::Skipped { remote_path } => {
                remote_path
            }
        }
    }
}

impl<T: HttpTransport> RepositoryClient<T> {
    /// Uploads `local_file` into the remote directory `remote_dir`, creating
    /// the directory if needed. An existing remote file is replaced.
    ///
    /// With `upload_with_hash`, an existing remote file whose SHA-256 equals the
    /// local one is left alone. A remote file without a SHA-256 is always
    /// replaced.
    pub async fn upload_file(
        &self,
        remote_dir: &str,
        local_file: &Path,
        upload_with_hash: bool,
    ) -> Result<UploadOutcome, ClientError> {
        if !local_file.is_file() {
            return Err(ClientError::NotFound {
                path: local_file.display().to_string(),
            });
        }

        let file_name = local_file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::InvalidArgument(format!(
                    "local file name is not valid UTF-8: {}",
                    local_file.display()
                ))
            })?;

        let file_data = tokio::fs::read(local_file)
            .await
            .map_err(|e| ClientError::local_io(local_file, e))?;

        self.make_directory(remote_dir, true).await?;

        let remote_path = join_remote(strip_leading_slash(remote_dir), file_name);

        if upload_with_hash && self.path_exists(&remote_path).await {
            let hash_local = sha256_file(local_file)
                .await
                .map_err(|e| ClientError::local_io(local_file, e))?;

            let remote_stat = self.get_file_stat(&remote_path).await?;

            if let Some(hash_remote) = remote_stat.sha256.as_deref() {
                if hash_remote.eq_ignore_ascii_case(&hash_local) {
                    log::debug!("[UPLOAD] {} unchanged, skipped", remote_path);
                    return Ok(UploadOutcome::Skipped { remote_path });
                }
            }
        }

        let url = self.file_url(&remote_path);
        self.execute(Method::PUT, &url, CONTENT_TYPE_OCTET_STREAM, Some(file_data))
            .await?;

        log::debug!("[UPLOAD] {} -> {}", local_file.display(), remote_path);
        Ok(UploadOutcome::Uploaded { remote_path })
    }

    /// HEAD on `path`. Any failure means "does not exist"; the reason is only
    /// logged, so an auth problem shows up in the logs rather than as an error.
    pub async fn path_exists(&self, path: &str) -> bool {
        let url = self.file_url(path);

        match self.execute(Method::HEAD, &url, CONTENT_TYPE_JSON, None).await {
            Ok(_) => true,
            Err(ClientError::HttpStatus { status: 404, .. }) => {
                log::debug!("[EXISTS] {} not found", path);
                false
            }
            Err(e) => {
                log::warn!("[EXISTS] {} treated as missing: {}", path, e);
                false
            }
        }
    }

    /// Creates `path` and any missing parents on the server.
    pub async fn make_directory(&self, path: &str, exist_ok: bool) -> Result<(), ClientError> {
        if self.path_exists(path).await {
            if exist_ok {
                return Ok(());
            }
            return Err(ClientError::AlreadyExists {
                path: path.to_string(),
            });
        }

        let url = self.dir_url(path);
        self.execute(Method::PUT, &url, CONTENT_TYPE_JSON, None).await?;

        log::debug!("[MKDIR] {}", path);
        Ok(())
    }

    pub async fn remove_directory(&self, path: &str) -> Result<(), ClientError> {
        let url = self.dir_url(path);
        self.execute(Method::DELETE, &url, CONTENT_TYPE_JSON, None).await?;
        Ok(())
    }

    /// DELETE on `path` as given. The server decides what a folder path means,
    /// no type check happens here.
    pub async fn remove_file(&self, path: &str) -> Result<(), ClientError> {
        let url = self.file_url(strip_trailing_slash(path));
        self.execute(Method::DELETE, &url, CONTENT_TYPE_JSON, None).await?;
        Ok(())
    }
}
