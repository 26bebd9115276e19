use super::{connect, print_json};
use artifactory_client::api::models::{DirEntry, DownloadStat, FileStat};
use chrono::{DateTime, Utc};
use std::path::Path;

pub async fn version(config_path: &Path) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    let info = client.get_version().await?;

    match info.revision {
        Some(revision) => println!("{} (revision {})", info.version, revision),
        None => println!("{}", info.version),
    }
    Ok(())
}

pub async fn repos(config_path: &Path) -> anyhow::Result<()> {
    let client = connect(config_path)?;

    for repo in client.list_repositories().await? {
        println!(
            "{:<40} {:<8} {}",
            repo.key,
            repo.repo_type,
            repo.package_type.unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn ls(
    config_path: &Path,
    path: &str,
    recursive: bool,
    with_stat: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    let listing = client.list_directory(path, recursive, with_stat).await?;

    if json {
        return print_json(&listing);
    }

    for entry in &listing {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

pub async fn stat(config_path: &Path, path: &str, json: bool) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    let stat = client.get_file_stat(path).await?;

    if json {
        return print_json(&stat);
    }

    print_stat(&stat);
    Ok(())
}

pub async fn downloads(config_path: &Path, path: &str, json: bool) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    let stat = client.get_download_stat(path).await?;

    if json {
        return print_json(&stat);
    }

    print_downloads(&stat);
    Ok(())
}

pub async fn search(config_path: &Path, pattern: &str) -> anyhow::Result<()> {
    let client = connect(config_path)?;

    for path in client.search_directory(pattern).await? {
        println!("{}", path);
    }
    Ok(())
}

pub async fn cat(config_path: &Path, path: &str) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    print!("{}", client.read_text(path).await?);
    Ok(())
}

fn format_entry(entry: &DirEntry) -> String {
    let kind = if entry.is_folder { "d" } else { "-" };

    match (&entry.stat, &entry.downloads) {
        (Some(stat), downloads) => format!(
            "{} {:>12} {} {:>6} {}",
            kind,
            stat.size,
            format_time(&stat.modified_at),
            downloads
                .as_ref()
                .and_then(|d| d.download_count)
                .map(|count| count.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.uri
        ),
        (None, _) => format!("{} {}", kind, entry.uri),
    }
}

fn print_stat(stat: &FileStat) {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    println!("repo:         {}", field(&stat.repo));
    println!("folder:       {}", stat.is_folder);
    println!("size:         {}", stat.size);
    println!("mime type:    {}", field(&stat.mime_type));
    println!("created:      {} by {}", format_time(&stat.created_at), field(&stat.created_by));
    println!("modified:     {} by {}", format_time(&stat.modified_at), field(&stat.modified_by));
    println!("updated:      {}", format_time(&stat.last_updated_at));
    println!("sha1:         {}", field(&stat.sha1));
    println!("sha256:       {}", field(&stat.sha256));
    println!("md5:          {}", field(&stat.md5));
    if let Some(children) = &stat.children {
        println!("children:     {}", children.join(", "));
    }
}

fn print_downloads(stat: &DownloadStat) {
    println!(
        "downloads:       {}",
        stat.download_count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("last download:   {}", format_time(&stat.last_downloaded_at));
    if let Some(user) = &stat.last_downloaded_by {
        println!("last downloader: {}", user);
    }
    if let Some(count) = stat.remote_download_count {
        println!("remote downloads: {}", count);
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}
