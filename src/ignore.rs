// src/ignore.rs
// =============================================================================
// Loads the ignore list: URLs the crawl should treat as already checked.
//
// File format (default `.linkignore`):
//   # comments and blank lines are skipped
//   https://partner.example.org/flaky-page
//   /internal/admin
//
// Lines without an http(s) scheme are taken relative to the root URL, so
// "/internal/admin" on host example.com becomes "http://example.com/internal/admin".
// =============================================================================

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;

// Reads the ignore file at `path`
//
// Returns: resolved absolute URLs, or an empty list if the file does not
// exist. Any other read error is fatal, because silently checking links the
// user meant to skip would fail the run for the wrong reason.
pub fn load_ignore_list(path: &Path, root_url: &str) -> Result<Vec<String>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No ignore file at {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read ignore file {}", path.display()));
        }
    };

    let urls = parse_ignore_list(&contents, root_url);
    log::info!("Ignoring {} link(s) listed in {}", urls.len(), path.display());
    Ok(urls)
}

// Turns ignore file contents into absolute URLs
pub fn parse_ignore_list(contents: &str, root_url: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            if line.starts_with("http://") || line.starts_with("https://") {
                line.to_string()
            } else {
                format!("{}{}", root_url, line)
            }
        })
        .collect()
}
