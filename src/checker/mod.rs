// src/checker/mod.rs
// =============================================================================
// Everything needed to check a single link.
//
// Submodules:
// - classify: decides whether a URL is a page or an asset
// - html: extracts link targets from page markup
// - http: fetches a URL and records what happened
//
// The crawl module builds on these; nothing here knows about recursion or
// the visited registry.
// =============================================================================

mod classify;
mod html;
mod http;

pub use classify::is_page_like;
pub use html::extract_links;
pub use http::{CheckOutcome, FetchError, Fetcher, LinkFetcher, Referrer, PAGE_ATTEMPTS};
