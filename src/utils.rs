//! Utility functions for file operations and path manipulation

use std::path::{Path, PathBuf};

/// Replace a path's extension, returning the derived path
///
/// `new_extension` is given without a leading dot. A path without an
/// extension simply gains one.
pub fn replace_extension(path: &Path, new_extension: &str) -> PathBuf {
    path.with_extension(new_extension.trim_start_matches('.'))
}

/// Size of a file in bytes, or `None` if it does not exist or cannot be
/// inspected
pub async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|meta| meta.len())
}

/// Expand a leading `~` component to the user's home directory
///
/// Paths arriving from flags or environment variables may carry a literal
/// tilde that the shell never expanded. Without a home directory the path
/// is returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => expand_tilde_with(path, Path::new(&home)),
        None => path.to_path_buf(),
    }
}

fn expand_tilde_with(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Strip path separators from a catalog-supplied file name so it cannot
/// escape the download directory
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}
