//! Path utilities for detecting provider definition files by extension.

use std::path::Path;

/// Extensions recognised as provider definitions when none are configured.
pub const DEFAULT_PROVIDER_EXTENSIONS: &[&str] = &["json", "jsonc"];

/// Check if a path has one of the allowed provider definition extensions.
///
/// Extensions are compared case-insensitively and without the leading dot;
/// entries in `extensions` may be given either way (`"json"` or `".json"`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use yuzu_common::paths::is_provider_file;
///
/// let exts = vec!["json".to_string(), "jsonc".to_string()];
/// assert!(is_provider_file(Path::new("providers/kitsu.json"), &exts));
/// assert!(is_provider_file(Path::new("mal.JSONC"), &exts));
/// assert!(!is_provider_file(Path::new("notes.txt"), &exts));
/// assert!(!is_provider_file(Path::new("providers"), &exts));
/// ```
pub fn is_provider_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions
                .iter()
                .any(|e| e.trim_start_matches('.').to_lowercase() == ext)
        })
        .unwrap_or(false)
}

/// Whether a path uses the commented-JSON extension.
pub fn is_jsonc(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jsonc"))
        .unwrap_or(false)
}

/// The default extension list as owned strings.
pub fn default_provider_extensions() -> Vec<String> {
    DEFAULT_PROVIDER_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}
