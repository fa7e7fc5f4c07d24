// src/crawl/mod.rs
// =============================================================================
// This module handles crawling one host.
//
// Features:
// - Depth-first recursion over pages on the configured host
// - Concurrent checking of every new link found on a page
// - A shared registry guaranteeing each URL is fetched at most once
// - Off-host links and assets are checked but never followed
// =============================================================================

mod engine;
mod registry;
mod scope;

pub use engine::Crawler;
pub use scope::HostScope;
