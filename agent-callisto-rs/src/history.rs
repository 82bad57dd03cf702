//! Announcement history and reporting.
//!
//! Stores one JSON line per announcement in
//! `~/.agent-callisto-history/{date}.jsonl`.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::HistoryConfig;
use crate::error::AnnounceError;
use crate::pipeline::{Announcement, Category};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub timestamp: String,
    pub category: Category,
    pub summary: String,
    pub provider: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl NotificationRecord {
    pub fn new(
        announcement: &Announcement,
        provider: &str,
        error: Option<&AnnounceError>,
        latency_ms: u64,
    ) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            category: announcement.category,
            summary: announcement.summary.clone(),
            provider: provider.to_string(),
            success: error.is_none(),
            error: error.map(ToString::to_string),
            latency_ms,
        }
    }
}

pub struct History {
    dir: PathBuf,
}

impl History {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `~/.agent-callisto-history`, or `override_dir` when set.
    pub fn at(override_dir: Option<PathBuf>) -> Self {
        let dir = override_dir.unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".agent-callisto-history")
        });
        Self::new(dir)
    }

    pub fn from_config(config: &HistoryConfig) -> Option<Self> {
        config.enabled.then(|| Self::at(config.dir.clone()))
    }

    fn file(&self, date: &str) -> PathBuf {
        self.dir.join(format!("{date}.jsonl"))
    }

    pub fn append(&self, record: &NotificationRecord) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("Failed to create history dir: {e}");
            return;
        }

        // Date from timestamp (first 10 chars: YYYY-MM-DD)
        let date = record.timestamp.get(..10).unwrap_or("unknown");
        let path = self.file(date);

        let mut file = match fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open history file: {e}");
                return;
            }
        };

        match serde_json::to_string(record) {
            Ok(line) => {
                if let Err(e) = writeln!(file, "{line}") {
                    warn!("Failed to write history record: {e}");
                }
            }
            Err(e) => warn!("Failed to serialize history record: {e}"),
        }
    }

    pub fn load(&self, date: &str) -> Vec<NotificationRecord> {
        let contents = match fs::read_to_string(self.file(date)) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        contents
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn dates(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };

        let mut dates: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_suffix(".jsonl").map(str::to_string)
            })
            .collect();
        dates.sort();
        dates
    }

    pub fn report(&self, date: &str) -> String {
        let records = self.load(date);
        if records.is_empty() {
            return format!("No announcements recorded for {date}.");
        }

        let total = records.len();
        let failed = records.iter().filter(|r| !r.success).count();
        let avg_latency: f64 =
            records.iter().map(|r| r.latency_ms as f64).sum::<f64>() / total as f64;

        let mut by_category: BTreeMap<Category, usize> = BTreeMap::new();
        let mut by_provider: BTreeMap<&str, usize> = BTreeMap::new();
        for r in &records {
            *by_category.entry(r.category).or_insert(0) += 1;
            *by_provider.entry(r.provider.as_str()).or_insert(0) += 1;
        }

        let mut report = format!(
            "# Announcements for {date}\n\n\
            - Total: {total}\n\
            - Failed: {failed}\n\
            - Avg latency: {avg_latency:.0}ms\n\n\
            ## Categories\n"
        );
        for (category, count) in &by_category {
            report.push_str(&format!("- {category}: {count}\n"));
        }
        report.push_str("\n## Providers\n");
        for (provider, count) in &by_provider {
            report.push_str(&format!("- {provider}: {count}\n"));
        }

        report
    }
}
