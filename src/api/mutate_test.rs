use super::client::ClientError;
use super::mutate::UploadOutcome;
use super::test_support::{FakeRepository, Node, BASE_URL};
use reqwest::Method;
use std::path::Path;

fn local_file(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[tokio::test]
async fn test_upload_new_file() {
    let client = FakeRepository::new().with_folder("repo").into_client();
    let dir = tempfile::tempdir().unwrap();
    let file = local_file(dir.path(), "app.jar", b"binary");

    let outcome = client.upload_file("repo/libs/", &file, true).await.unwrap();

    assert_eq!(
        outcome,
        UploadOutcome::Uploaded {
            remote_path: "repo/libs/app.jar".to_string()
        }
    );
    assert!(matches!(client.transport().node("repo/libs"), Some(Node::Folder)));
    match client.transport().node("repo/libs/app.jar") {
        Some(Node::File { data, .. }) => assert_eq!(data, b"binary"),
        other => panic!("unexpected node: {:?}", other),
    }

    let puts: Vec<_> = client
        .transport()
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::PUT)
        .collect();
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].url, format!("{}/repo/libs/", BASE_URL));
    assert_eq!(puts[1].url, format!("{}/repo/libs/app.jar", BASE_URL));
    assert_eq!(puts[1].content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(puts[1].body.as_deref(), Some(&b"binary"[..]));
}

#[tokio::test]
async fn test_upload_identical_file_is_skipped() {
    let client = FakeRepository::new()
        .with_file("repo/libs/app.jar", b"binary")
        .into_client();
    let dir = tempfile::tempdir().unwrap();
    let file = local_file(dir.path(), "app.jar", b"binary");

    let outcome = client.upload_file("repo/libs", &file, true).await.unwrap();

    assert_eq!(
        outcome,
        UploadOutcome::Skipped {
            remote_path: "repo/libs/app.jar".to_string()
        }
    );
    assert_eq!(client.transport().count(Method::PUT), 0);
}

#[tokio::test]
async fn test_upload_changed_file_is_sent_once() {
    let client = FakeRepository::new()
        .with_file("repo/libs/app.jar", b"old build")
        .into_client();
    let dir = tempfile::tempdir().unwrap();
    let file = local_file(dir.path(), "app.jar", b"new build");

    let outcome = client.upload_file("repo/libs", &file, true).await.unwrap();

    assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
    assert_eq!(client.transport().count(Method::PUT), 1);
}

#[tokio::test]
async fn test_upload_without_remote_checksum_is_sent_once() {
    let client = FakeRepository::new()
        .with_file_without_checksum("repo/libs/app.jar", b"binary")
        .into_client();
    let dir = tempfile::tempdir().unwrap();
    let file = local_file(dir.path(), "app.jar", b"binary");

    let outcome = client.upload_file("repo/libs", &file, true).await.unwrap();

    assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
    assert_eq!(client.transport().count(Method::PUT), 1);
}

#[tokio::test]
async fn test_upload_without_hash_check_always_sends() {
    let client = FakeRepository::new()
        .with_file("repo/libs/app.jar", b"binary")
        .into_client();
    let dir = tempfile::tempdir().unwrap();
    let file = local_file(dir.path(), "app.jar", b"binary");

    let outcome = client.upload_file("repo/libs", &file, false).await.unwrap();

    assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
    assert_eq!(client.transport().count(Method::PUT), 1);
    // no checksum lookup happened
    let stat_url = format!("{}/api/storage/repo/libs/app.jar", BASE_URL);
    assert!(!client.transport().requests().iter().any(|r| r.url == stat_url));
}

#[tokio::test]
async fn test_upload_missing_local_file() {
    let client = FakeRepository::new().into_client();
    let dir = tempfile::tempdir().unwrap();

    let err = client
        .upload_file("repo", &dir.path().join("ghost.bin"), true)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotFound { .. }));
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn test_upload_reports_rejected_put() {
    let client = FakeRepository::new()
        .with_folder("repo/libs")
        .failing(Method::PUT, &format!("{}/repo/libs/app.jar", BASE_URL), 409, "Checksum policy")
        .into_client();
    let dir = tempfile::tempdir().unwrap();
    let file = local_file(dir.path(), "app.jar", b"binary");

    let err = client.upload_file("repo/libs", &file, true).await.unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("Checksum policy"));
}

#[tokio::test]
async fn test_path_exists() {
    let client = FakeRepository::new()
        .with_file("repo/a.txt", b"a")
        .into_client();

    assert!(client.path_exists("repo/a.txt").await);
    assert!(client.path_exists("/repo").await);
    assert!(!client.path_exists("repo/b.txt").await);
    assert_eq!(client.transport().count(Method::HEAD), 3);
}

#[tokio::test]
async fn test_path_exists_swallows_failures() {
    let denied = FakeRepository::new()
        .with_file("repo/a.txt", b"a")
        .failing(Method::HEAD, &format!("{}/repo/a.txt", BASE_URL), 401, "Unauthorized")
        .into_client();
    assert!(!denied.path_exists("repo/a.txt").await);

    let offline = FakeRepository::new().unreachable().into_client();
    assert!(!offline.path_exists("repo/a.txt").await);
}

#[tokio::test]
async fn test_make_directory() {
    let client = FakeRepository::new().into_client();

    client.make_directory("repo/x/y/", false).await.unwrap();

    assert!(matches!(client.transport().node("repo/x/y"), Some(Node::Folder)));
    let requests = client.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::HEAD);
    assert_eq!(requests[1].method, Method::PUT);
    assert_eq!(requests[1].url, format!("{}/repo/x/y/", BASE_URL));
}

#[tokio::test]
async fn test_make_existing_directory() {
    let client = FakeRepository::new().with_folder("repo/x").into_client();

    client.make_directory("repo/x", true).await.unwrap();
    let err = client.make_directory("repo/x", false).await.unwrap_err();

    assert!(matches!(err, ClientError::AlreadyExists { ref path } if path == "repo/x"));
    assert_eq!(client.transport().count(Method::PUT), 0);
}

#[tokio::test]
async fn test_remove_directory() {
    let client = FakeRepository::new()
        .with_file("repo/x/a.txt", b"a")
        .into_client();

    client.remove_directory("repo/x").await.unwrap();

    assert!(client.transport().node("repo/x").is_none());
    assert!(client.transport().node("repo/x/a.txt").is_none());
    assert_eq!(
        client.transport().requests()[0].url,
        format!("{}/repo/x/", BASE_URL)
    );
}

#[tokio::test]
async fn test_remove_file() {
    let client = FakeRepository::new()
        .with_file("repo/x/a.txt", b"a")
        .into_client();

    client.remove_file("repo/x/a.txt/").await.unwrap();

    assert!(client.transport().node("repo/x/a.txt").is_none());
    assert!(client.transport().node("repo/x").is_some());
    assert_eq!(
        client.transport().requests()[0].url,
        format!("{}/repo/x/a.txt", BASE_URL)
    );
}

#[tokio::test]
async fn test_remove_missing_propagates() {
    let client = FakeRepository::new().into_client();

    assert_eq!(client.remove_file("repo/none").await.unwrap_err().status(), Some(404));
    assert_eq!(client.remove_directory("repo/none").await.unwrap_err().status(), Some(404));
    assert_eq!(client.transport().count(Method::HEAD), 0);
}
