// src/report.rs
// =============================================================================
// Turns the finished registry into something a human (or a pipeline) reads.
//
// Every checked URL lands in exactly one bucket:
//   success (1xx/2xx), redirect (3xx), client error (4xx), server error (5xx),
//   transport error (no response, status 0), ignored (from the ignore file)
//
// A run is clean when only success and ignored buckets are non-empty.
// =============================================================================

use crate::checker::CheckOutcome;
use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Success,
    Redirect,
    ClientError,
    ServerError,
    TransportError,
    Ignored,
}

impl Bucket {
    pub fn of(outcome: &CheckOutcome) -> Self {
        if outcome.is_ignored() {
            return Bucket::Ignored;
        }
        match outcome.status_code {
            0 => Bucket::TransportError,
            1..=299 => Bucket::Success,
            300..=399 => Bucket::Redirect,
            400..=499 => Bucket::ClientError,
            _ => Bucket::ServerError,
        }
    }

    /// Anything but success and ignored fails the run
    pub fn is_problem(self) -> bool {
        !matches!(self, Bucket::Success | Bucket::Ignored)
    }
}

/// Per-bucket counts
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub success: usize,
    pub redirect: usize,
    pub client_error: usize,
    pub server_error: usize,
    pub transport_error: usize,
    pub ignored: usize,
}

impl Summary {
    fn record(&mut self, bucket: Bucket) {
        let slot = match bucket {
            Bucket::Success => &mut self.success,
            Bucket::Redirect => &mut self.redirect,
            Bucket::ClientError => &mut self.client_error,
            Bucket::ServerError => &mut self.server_error,
            Bucket::TransportError => &mut self.transport_error,
            Bucket::Ignored => &mut self.ignored,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.success + self.redirect + self.client_error + self.server_error + self.transport_error + self.ignored
    }

    pub fn is_clean(&self) -> bool {
        self.redirect + self.client_error + self.server_error + self.transport_error == 0
    }
}

/// One line of the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub url: String,
    pub referrer: String,
    pub status_code: u16,
    pub bucket: Bucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub duration_secs: f64,
    pub summary: Summary,
    /// Redirects, HTTP errors and unreachable links
    pub problems: Vec<ReportEntry>,
    pub ignored: Vec<ReportEntry>,
}

impl Report {
    pub fn build(entries: Vec<(String, CheckOutcome)>, duration: Duration) -> Self {
        let mut summary = Summary::default();
        let mut problems = Vec::new();
        let mut ignored = Vec::new();

        for (url, outcome) in entries {
            let bucket = Bucket::of(&outcome);
            summary.record(bucket);

            let entry = ReportEntry {
                url,
                referrer: outcome.referrer.to_string(),
                status_code: outcome.status_code,
                bucket,
                error: outcome.error.map(|e| e.to_string()),
            };
            if bucket == Bucket::Ignored {
                ignored.push(entry);
            } else if bucket.is_problem() {
                problems.push(entry);
            }
        }

        Report {
            duration_secs: duration.as_secs_f64(),
            summary,
            problems,
            ignored,
        }
    }
}

// Prints the report either as a table or JSON
pub fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &Report) {
    let rule = "-".repeat(62);

    println!("{}", rule);
    println!("These links were ignored.");
    for entry in &report.ignored {
        println!("   {}", entry.url);
    }

    println!("{}", rule);
    println!("These links didn't check out.");
    for entry in &report.problems {
        let error = entry.error.as_deref().unwrap_or("");
        println!(
            "Referrer: {} Link: {} HTTPCode: {} {}",
            entry.referrer, entry.url, entry.status_code, error
        );
    }

    let s = &report.summary;
    println!("{}", rule);
    println!("Duration: {:.0}s", report.duration_secs);
    println!(
        "Results 500s: {} 400s: {} 300s: {} 200s: {} Errors: {} Ignored: {}",
        s.server_error, s.client_error, s.redirect, s.success, s.transport_error, s.ignored
    );
    if s.is_clean() {
        println!("✅ All {} link(s) OK", s.total());
    } else {
        println!("❌ {} of {} link(s) broken", report.problems.len(), s.total());
    }
}
