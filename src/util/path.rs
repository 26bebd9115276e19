use std::path::{Component, Path};

// File-style targets are appended to the base URL, so they must not start with '/'
pub fn strip_leading_slash(path: &str) -> &str {
    path.trim_start_matches('/')
}

// Directory-style targets get exactly one '/' appended by the caller
pub fn strip_trailing_slash(path: &str) -> &str {
    path.trim_end_matches('/')
}

pub fn join_remote(parent: &str, name: &str) -> String {
    let parent = strip_trailing_slash(parent);
    let name = strip_leading_slash(name);

    if parent.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

pub fn get_file_name(path: &str) -> String {
    let clean_path = strip_trailing_slash(path);

    match clean_path.rfind('/') {
        Some(last_slash) => clean_path[last_slash + 1..].to_string(),
        None => clean_path.to_string(),
    }
}

/// Splits `"<repo>/<search path>"` on the first slash.
pub fn split_repo_name(pattern: &str) -> Option<(&str, &str)> {
    pattern.split_once('/')
}

/// Percent-encodes every segment of a repo-relative path, keeping the separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// True when a server-provided path stays below the directory it is joined to.
pub fn is_contained(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
