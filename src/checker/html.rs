// src/checker/html.rs
// =============================================================================
// This module pulls link targets out of raw page markup.
//
// We deliberately do not build a DOM. Two patterns are matched against the
// markup instead, both anchored on `src=` / `href=` attributes (quoted or not):
// - Absolute: `http://...` or `https://...`, returned exactly as written
// - Host-relative: a leading `/`, resolved against the page's scheme and host
//
// A relative match starting with `//` is scheme-relative: it already carries a
// host, so only the page's scheme is prepended.
//
// No normalization happens. "/a" and "/a/" are two different links here.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static ABSOLUTE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:src|href)=['"]?(https?://[^"'> ]*)"#).expect("absolute link pattern is valid")
});

static RELATIVE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:src|href)=['"]?(/[^"'> ]*)"#).expect("relative link pattern is valid")
});

// Extracts every link referenced from `markup`
//
// Parameters:
//   base_url: the URL the markup was fetched from
//   markup: the page source
//
// Returns: absolute URL strings, absolute matches first, in document order.
// Duplicates are kept; the registry is what deduplicates.
//
// Example:
//   base_url = "https://example.com/"
//   markup = `<a href="/careers">` -> ["https://example.com/careers"]
pub fn extract_links(base_url: &str, markup: &str) -> Vec<String> {
    let mut links: Vec<String> = ABSOLUTE_LINK
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    let relative: Vec<&str> = RELATIVE_LINK
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if relative.is_empty() {
        return links;
    }

    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            // Without a base there is nothing to resolve against
            log::warn!(
                "Invalid base URL {}: {} ({} relative link(s) skipped)",
                base_url,
                e,
                relative.len()
            );
            return links;
        }
    };

    let scheme = base.scheme();
    let origin = format!("{}://{}", scheme, authority_of(base_url));

    for path in relative {
        if path.starts_with("//") {
            links.push(format!("{}:{}", scheme, path));
        } else {
            links.push(format!("{}{}", origin, path));
        }
    }

    links
}

// "host[:port]" exactly as written in the base URL. Re-serializing through
// Url would drop a default port ("localhost:80" -> "localhost") and split one
// page into two registry keys.
fn authority_of(base_url: &str) -> &str {
    let rest = base_url
        .split_once("://")
        .map_or(base_url, |(_, rest)| rest);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    // Drop any "user:pass@"
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}
