// src/checker/classify.rs
// =============================================================================
// Decides from a URL's shape alone whether it names an asset (images, scripts)
// or an HTML-like page.
//
// The answer drives two things:
// - The request shape: assets get a HEAD request, pages get a full GET
// - Recursion: only pages are ever opened up to look for more links
//
// Nothing here looks at the server's Content-Type header. A page served from
// "/logo.png" is treated as an asset.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;

// Extension at the end of the path, then an optional query string and
// fragment. The leading dot keeps paths like "/docs/nodejs" classified as pages.
static ASSET_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[^?#]*\.(?:jpe?g|png|gif|svg|webp|ico|js)(?:\?[^#]*)?(?:#.*)?$")
        .expect("asset suffix pattern is valid")
});

/// Returns false for URLs ending in a known asset extension, true otherwise.
pub fn is_page_like(url: &str) -> bool {
    !ASSET_SUFFIX.is_match(url)
}
