// src/crawl/engine.rs
// =============================================================================
// This module walks a site and checks every link it finds.
//
// How it works:
// 1. Fetch the root page. If that fails, there is nothing to crawl.
// 2. crawl(page, markup):
//    a. Extract links from the markup
//    b. Claim each link in the registry; links someone already claimed are
//       skipped
//    c. Fetch every claimed link concurrently, storing each outcome as it
//       lands
//    d. Wait for the whole batch
//    e. Mark the page as expanded
//    f. For each extracted link that is a page on our host and has a body
//       nobody expanded yet, crawl(link, body), one at a time
//
// So each batch is fetched in parallel, but recursion goes depth first and
// sequentially. Off-host links and assets are checked once and never opened.
//
// The crawl ends because a URL can be claimed only once and the host's link
// graph is finite. A cycle (A -> B -> A) just hits an existing claim.
// =============================================================================

use crate::checker::{extract_links, is_page_like, CheckOutcome, FetchError, LinkFetcher, Referrer};
use crate::crawl::registry::Registry;
use crate::crawl::scope::HostScope;
use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::stream::{self, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// Without the root page's body there is nothing to check
    #[error("could not fetch root page {url}: {source}")]
    RootFetch { url: String, source: FetchError },
}

pub struct Crawler<F> {
    fetcher: F,
    registry: Registry,
    scope: HostScope,
    concurrency: usize,
}

impl<F: LinkFetcher> Crawler<F> {
    pub fn new(fetcher: F, scope: HostScope, concurrency: usize) -> Self {
        Crawler {
            fetcher,
            registry: Registry::new(),
            scope,
            concurrency: concurrency.max(1),
        }
    }

    /// Marks URLs as already checked before the crawl starts.
    pub fn with_ignored<I>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.registry.seed_ignored(urls);
        self
    }

    /// Crawls from `root_url` until every reachable link has been checked.
    ///
    /// Returns the full registry. Only a failed root fetch is an error; every
    /// other failure is recorded in that link's outcome.
    pub async fn run(self, root_url: &str) -> Result<Registry, CrawlError> {
        let mut root = self.fetcher.fetch(Referrer::Root, root_url).await;

        if let Some(error) = root.error.take() {
            return Err(CrawlError::RootFetch {
                url: root_url.to_string(),
                source: error,
            });
        }

        log::info!("Root: {} HTTPCode: {}", root_url, root.status_code);
        let markup = root.body.take().unwrap_or_default();
        self.registry.store(root_url, root);

        self.crawl(root_url.to_string(), markup).await;

        log::debug!("Crawl finished with {} registry entries", self.registry.len());
        Ok(self.registry)
    }

    // Boxed so the future can contain itself.
    fn crawl<'a>(&'a self, page_url: String, markup: String) -> LocalBoxFuture<'a, ()> {
        async move {
            let links = extract_links(&page_url, &markup);
            drop(markup);

            let referrer = Referrer::Page(page_url.clone());
            let claimed: Vec<&str> = links
                .iter()
                .map(String::as_str)
                .filter(|link| {
                    let won = self.registry.claim_if_absent(link, &referrer);
                    if !won {
                        log::debug!("Already seen: {}", link);
                    }
                    won
                })
                .collect();

            log::debug!(
                "{}: {} link(s), {} new",
                page_url,
                links.len(),
                claimed.len()
            );

            // The batch: all claimed links in flight, drained before recursing
            stream::iter(claimed)
                .map(|link| {
                    let referrer = referrer.clone();
                    async move {
                        let mut outcome = self.fetcher.fetch(referrer, link).await;
                        log_progress(link, &outcome);
                        // Off-host bodies are never expanded, so never kept
                        if !self.scope.contains(link) {
                            outcome.body = None;
                        }
                        self.registry.store(link, outcome);
                    }
                })
                .buffer_unordered(self.concurrency)
                .for_each(|()| future::ready(()))
                .await;

            self.registry.mark_recursed(&page_url);

            for link in &links {
                if !is_page_like(link) || !self.scope.contains(link) {
                    continue;
                }
                if let Some(body) = self.registry.take_body_for_recursion(link) {
                    self.crawl(link.clone(), body).await;
                }
            }
        }
        .boxed_local()
    }
}

fn log_progress(link: &str, outcome: &CheckOutcome) {
    match &outcome.error {
        Some(error) => log::info!(
            "Referrer: {} Link: {} HTTPCode: {} {}",
            outcome.referrer,
            link,
            outcome.status_code,
            error
        ),
        None => log::info!(
            "Referrer: {} Link: {} HTTPCode: {}",
            outcome.referrer,
            link,
            outcome.status_code
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // In-memory site: URL -> (status, markup). Unknown URLs answer 404.
    // Every call is counted so tests can assert exactly-once fetching.
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, (u16, String)>,
        unreachable: Vec<String>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, markup: &str) -> Self {
            self.pages.insert(url.to_string(), (200, markup.to_string()));
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), (status, String::new()));
            self
        }

        fn down(mut self, url: &str) -> Self {
            self.unreachable.push(url.to_string());
            self
        }

        fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    impl LinkFetcher for FakeSite {
        async fn fetch(&self, referrer: Referrer, url: &str) -> CheckOutcome {
            *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
            // Let sibling fetches interleave
            tokio::task::yield_now().await;

            let mut outcome = CheckOutcome::new(referrer);
            if self.unreachable.iter().any(|u| u == url) {
                outcome.error = Some(FetchError::Connect("connection refused".into()));
                return outcome;
            }
            let (status, markup) = self
                .pages
                .get(url)
                .cloned()
                .unwrap_or((404, String::new()));
            outcome.status_code = status;
            if is_page_like(url) {
                outcome.body = Some(markup);
            }
            outcome
        }
    }

    fn crawler(site: &FakeSite) -> Crawler<&FakeSite> {
        Crawler::new(site, HostScope::new("site.test").unwrap(), 4)
    }

    impl<T: LinkFetcher> LinkFetcher for &T {
        async fn fetch(&self, referrer: Referrer, url: &str) -> CheckOutcome {
            (**self).fetch(referrer, url).await
        }
    }

    #[tokio::test]
    async fn test_cycle_terminates_and_visits_each_page_once() {
        let site = FakeSite::default()
            .page("http://site.test", r#"<a href="/a">A</a>"#)
            .page("http://site.test/a", r#"<a href="/b">B</a><a href="/">home</a>"#)
            .page("http://site.test/b", r#"<a href="/a">back to A</a>"#)
            .page("http://site.test/", r#"<a href="/a">A</a>"#);

        let registry = crawler(&site).run("http://site.test").await.unwrap();

        assert_eq!(site.calls("http://site.test"), 1);
        assert_eq!(site.calls("http://site.test/a"), 1);
        assert_eq!(site.calls("http://site.test/b"), 1);
        assert_eq!(site.calls("http://site.test/"), 1);
        for url in ["http://site.test/a", "http://site.test/b", "http://site.test/"] {
            assert!(registry.get(url).unwrap().recursed, "{} not expanded", url);
        }
    }

    #[tokio::test]
    async fn test_links_found_many_times_are_fetched_once() {
        let site = FakeSite::default()
            .page(
                "http://site.test",
                r#"<a href="/shared">1</a><a href="/shared">2</a><a href="/p1">p1</a><a href="/p2">p2</a>"#,
            )
            .page("http://site.test/p1", r#"<a href="/shared">3</a><a href="/deep">d</a>"#)
            .page("http://site.test/p2", r#"<a href="/shared">4</a><a href="/deep">d</a>"#)
            .page("http://site.test/shared", "")
            .page("http://site.test/deep", "");

        let registry = crawler(&site).run("http://site.test").await.unwrap();

        assert_eq!(site.calls("http://site.test/shared"), 1);
        assert_eq!(site.calls("http://site.test/deep"), 1);
        let entries = registry.into_entries();
        let shared: Vec<_> = entries.iter().filter(|(u, _)| u == "http://site.test/shared").collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].1.referrer, Referrer::Page("http://site.test".into()));
    }

    #[tokio::test]
    async fn test_off_host_pages_are_checked_but_not_expanded() {
        let site = FakeSite::default()
            .page("http://site.test", r#"<a href="https://other.test/page">x</a>"#)
            .page("https://other.test/page", r#"<a href="https://other.test/deeper">y</a>"#);

        let registry = crawler(&site).run("http://site.test").await.unwrap();

        assert_eq!(site.calls("https://other.test/page"), 1);
        assert_eq!(site.calls("https://other.test/deeper"), 0);
        let outcome = registry.get("https://other.test/page").unwrap();
        assert_eq!(outcome.status_code, 200);
        assert!(!outcome.recursed);
        assert_eq!(outcome.body, None);
    }

    #[tokio::test]
    async fn test_www_prefix_is_in_scope() {
        let site = FakeSite::default()
            .page("http://site.test", r#"<a href="http://www.site.test/about">x</a>"#)
            .page("http://www.site.test/about", r#"<a href="/team">team</a>"#);

        crawler(&site).run("http://site.test").await.unwrap();

        assert_eq!(site.calls("http://www.site.test/team"), 1);
    }

    #[tokio::test]
    async fn test_host_with_default_port_is_expanded() {
        let site = FakeSite::default()
            .page("http://site.test:80", r#"<a href="/a">a</a>"#)
            .page("http://site.test:80/a", r#"<a href="/b">b</a>"#);

        let registry = Crawler::new(&site, HostScope::new("site.test:80").unwrap(), 4)
            .run("http://site.test:80")
            .await
            .unwrap();

        assert_eq!(site.calls("http://site.test:80/b"), 1);
        assert!(registry.get("http://site.test:80/a").unwrap().recursed);
        assert_eq!(site.calls("http://site.test/a"), 0);
    }

    #[tokio::test]
    async fn test_assets_are_checked_and_never_expanded() {
        let site = FakeSite::default()
            .page("http://site.test", r#"<img src="/logo.png"><script src="/app.js"></script>"#)
            .status("http://site.test/logo.png", 200);

        let registry = crawler(&site).run("http://site.test").await.unwrap();

        assert_eq!(site.calls("http://site.test/logo.png"), 1);
        assert_eq!(registry.get("http://site.test/logo.png").unwrap().body, None);
        assert_eq!(registry.get("http://site.test/app.js").unwrap().status_code, 404);
    }

    #[tokio::test]
    async fn test_ignored_links_are_never_fetched() {
        let site = FakeSite::default()
            .page("http://site.test", r#"<a href="/skip">skip</a><a href="/keep">keep</a>"#)
            .page("http://site.test/keep", "");

        let registry = crawler(&site)
            .with_ignored(vec!["http://site.test/skip".to_string()])
            .run("http://site.test")
            .await
            .unwrap();

        assert_eq!(site.calls("http://site.test/skip"), 0);
        assert!(registry.get("http://site.test/skip").unwrap().is_ignored());
        assert_eq!(site.calls("http://site.test/keep"), 1);
    }

    #[tokio::test]
    async fn test_broken_links_do_not_stop_the_crawl() {
        let site = FakeSite::default()
            .page(
                "http://site.test",
                r#"<a href="/down">down</a><a href="/gone">gone</a><a href="/ok">ok</a>"#,
            )
            .down("http://site.test/down")
            .status("http://site.test/gone", 410)
            .page("http://site.test/ok", r#"<a href="/ok/child">child</a>"#)
            .page("http://site.test/ok/child", "");

        let registry = crawler(&site).run("http://site.test").await.unwrap();

        let down = registry.get("http://site.test/down").unwrap();
        assert_eq!(down.status_code, 0);
        assert!(down.error.is_some());
        assert_eq!(registry.get("http://site.test/gone").unwrap().status_code, 410);
        assert_eq!(site.calls("http://site.test/ok/child"), 1);
    }

    #[tokio::test]
    async fn test_root_failure_is_fatal() {
        let site = FakeSite::default().down("http://site.test");

        let result = crawler(&site).run("http://site.test").await;

        assert!(matches!(result, Err(CrawlError::RootFetch { .. })));
    }

    #[tokio::test]
    async fn test_root_is_recorded_and_expanded() {
        let site = FakeSite::default().page("http://site.test", "no links here");

        let registry = crawler(&site).run("http://site.test").await.unwrap();

        let root = registry.get("http://site.test").unwrap();
        assert_eq!(root.referrer, Referrer::Root);
        assert_eq!(root.status_code, 200);
        assert!(root.recursed);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_over_http() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let host = base.trim_start_matches("http://").to_string();

        let root = server
            .mock("GET", "/")
            .with_body(r#"<a href="/a">a</a><img src="/logo.png"><a href="/missing">m</a>"#)
            .expect(1)
            .create_async()
            .await;
        let a = server
            .mock("GET", "/a")
            .with_body(format!(r#"<a href="{}">home</a><img src="/logo.png">"#, base))
            .expect(1)
            .create_async()
            .await;
        let logo = server
            .mock("HEAD", "/logo.png")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let config = crate::config::CrawlConfig::new(&host);
        let fetcher = crate::checker::Fetcher::new(&config).unwrap();
        let registry = Crawler::new(fetcher, HostScope::new(&host).unwrap(), 8)
            .run(&config.root_url())
            .await
            .unwrap();

        root.assert_async().await;
        a.assert_async().await;
        logo.assert_async().await;
        missing.assert_async().await;
        assert_eq!(registry.get(&format!("{}/missing", base)).unwrap().status_code, 404);
    }
}
