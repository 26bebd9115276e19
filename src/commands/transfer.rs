use super::connect;
use anyhow::Context;
use artifactory_client::api::mutate::UploadOutcome;
use artifactory_client::util::path::join_remote;
use std::path::{Path, PathBuf};

pub async fn get(config_path: &Path, path: &str, output: &Path, force: bool) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    let local = client.download_file(path, output, force).await?;

    log::info!("[DOWNLOAD] {} -> {}", path, local.display());
    Ok(())
}

pub async fn get_folder(config_path: &Path, path: &str, output: &Path) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    client.download_folder(path, output).await?;

    log::info!("[DOWNLOAD] {} -> {}", path, output.display());
    Ok(())
}

pub async fn put(
    config_path: &Path,
    remote_dir: &str,
    files: &[PathBuf],
    upload_with_hash: bool,
) -> anyhow::Result<()> {
    let client = connect(config_path)?;

    let mut uploads = Vec::new();
    for file in files {
        if file.is_dir() {
            uploads.extend(collect_local_tree(file, remote_dir).await?);
        } else {
            uploads.push((remote_dir.to_string(), file.clone()));
        }
    }

    for (target_dir, file) in uploads {
        match client.upload_file(&target_dir, &file, upload_with_hash).await? {
            UploadOutcome::Uploaded { remote_path } => {
                log::info!("[UPLOAD] {} -> {}", file.display(), remote_path)
            }
            UploadOutcome::Skipped { remote_path } => {
                log::info!("[UPLOAD] {} unchanged, skipped", remote_path)
            }
        }
    }
    Ok(())
}

/// Pairs every file below `local_root` with the remote directory mirroring its
/// parent, rooted at `remote_dir/<local_root name>`. Sorted for a stable order.
async fn collect_local_tree(
    local_root: &Path,
    remote_dir: &str,
) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let root_name = local_root
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid directory name: {}", local_root.display()))?;

    let mut files = Vec::new();
    let mut pending = vec![(join_remote(remote_dir, root_name), local_root.to_path_buf())];

    while let Some((remote, dir)) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                pending.push((join_remote(&remote, &name), path));
            } else {
                files.push((remote.clone(), path));
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}
