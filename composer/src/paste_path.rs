//! Turning typed or pasted text into filesystem paths for attachment selection.

use std::path::PathBuf;

/// Normalize text that names a single file.
///
/// Supports:
/// - `file://` URLs (converted to local paths)
/// - Windows drive and UNC paths, taken verbatim
/// - shell-quoted or shell-escaped single paths (via `shlex`)
pub fn normalize_pasted_path(pasted: &str) -> Option<PathBuf> {
    let pasted = pasted.trim();
    if pasted.is_empty() {
        return None;
    }

    if let Some(path) = file_url_to_path(pasted) {
        return Some(path);
    }

    // POSIX shlex treats backslashes as escapes, which would mangle `C:\Users\...`.
    if looks_like_windows_path(pasted) {
        return Some(PathBuf::from(pasted));
    }

    let parts = shlex::split(pasted)?;
    match parts.as_slice() {
        [single] => Some(normalize_token(single)),
        _ => None,
    }
}

/// Split a selection of one or more paths, honouring shell quoting.
///
/// Returns `None` when the quoting is unbalanced.
pub fn split_selected_paths(input: &str) -> Option<Vec<PathBuf>> {
    let input = input.trim();
    if looks_like_windows_path(input) {
        return Some(vec![PathBuf::from(input)]);
    }
    let tokens = shlex::split(input)?;
    Some(tokens.iter().map(|token| normalize_token(token)).collect())
}

fn normalize_token(token: &str) -> PathBuf {
    file_url_to_path(token).unwrap_or_else(|| PathBuf::from(token))
}

fn file_url_to_path(text: &str) -> Option<PathBuf> {
    let url = url::Url::parse(text).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

fn looks_like_windows_path(text: &str) -> bool {
    let mut chars = text.chars();
    let drive = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.next() == Some(':')
        && matches!(chars.next(), Some('\\') | Some('/'));
    drive || text.starts_with("\\\\")
}
