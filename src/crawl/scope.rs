// src/crawl/scope.rs
// =============================================================================
// Decides which discovered pages belong to the site being checked.
//
// A link is in scope when it is `http(s)://`, optionally `www.`, then the
// configured host, then either nothing or a path / query / fragment. Links
// out of scope are still checked, but their markup is never looked at.
// =============================================================================

use regex::Regex;

#[derive(Debug, Clone)]
pub struct HostScope {
    pattern: Regex,
}

impl HostScope {
    pub fn new(host: &str) -> Result<Self, regex::Error> {
        // The host must end at a boundary, so "example.com" does not also
        // claim "example.com.evil.net" or port 80 claim port 8080.
        let pattern = format!(
            r"(?i)^https?://(?:www\.)?{}(?:[/?#].*)?$",
            host_pattern(host)
        );
        Ok(HostScope {
            pattern: Regex::new(&pattern)?,
        })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

// A default port may be written or left out: URL serializers (and people)
// drop ":80" and ":443", so "localhost:80" also matches "localhost".
fn host_pattern(host: &str) -> String {
    match host.rsplit_once(':') {
        Some((name, port)) if port == "80" || port == "443" => {
            format!("{}(?::{})?", regex::escape(name), port)
        }
        _ => regex::escape(host),
    }
}
