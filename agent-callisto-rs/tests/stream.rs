//! End-to-end stream tests with a recording announcer.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use agent_callisto::announce::Announcer;
use agent_callisto::config::Config;
use agent_callisto::error::Result;
use agent_callisto::feedback::Feedback;
use agent_callisto::history::History;
use agent_callisto::pipeline::{Category, CategoryMatcher, Pipeline};
use agent_callisto::service::StreamMonitor;
use async_trait::async_trait;

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(String, Category)>>,
}

impl Recorder {
    fn calls(&self) -> Vec<(String, Category)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Announcer for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn notify(&self, summary: &str, category: Category) -> Result<()> {
        self.calls.lock().unwrap().push((summary.to_string(), category));
        Ok(())
    }
}

fn monitor(pipeline: Pipeline) -> (StreamMonitor, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let monitor = StreamMonitor::with_parts(pipeline, recorder.clone(), Feedback::disabled(), None);
    (monitor, recorder)
}

fn default_pipeline() -> Pipeline {
    Pipeline::from_parts(true, 500, CategoryMatcher::new(), Duration::from_millis(3000))
}

#[tokio::test]
async fn two_completions_within_cooldown_notify_once() {
    let (mut m, recorder) = monitor(default_pipeline());
    let t0 = Instant::now();

    m.on_chunk_at("Task completed\n", false, t0);
    m.on_chunk_at("Merge completed\n", false, t0 + Duration::from_millis(1200));
    m.drain().await;

    assert_eq!(
        recorder.calls(),
        vec![("Task completed".to_string(), Category::Completion)]
    );
}

#[tokio::test]
async fn unmatched_output_is_silent() {
    let (mut m, recorder) = monitor(default_pipeline());
    m.on_chunk("   Compiling serde v1.0.200\n", false);
    m.on_chunk("   Checking tokio v1.40.0\n", true);
    m.drain().await;

    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn build_scenario() {
    let (mut m, recorder) = monitor(default_pipeline());
    m.on_chunk("Build succeeded with 247 tests passed", true);
    m.drain().await;

    assert_eq!(
        recorder.calls(),
        vec![("Build succeeded".to_string(), Category::Completion)]
    );
}

#[tokio::test]
async fn error_scenario() {
    let (mut m, recorder) = monitor(default_pipeline());
    m.on_chunk("Error: Cannot find module \"missing-package\"", true);
    m.drain().await;

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    let (summary, category) = &calls[0];
    assert_eq!(*category, Category::Critical);
    assert!(summary.starts_with("Error:"));
    assert!(summary.contains("Cannot find module"));
    assert!(summary["Error: ".len()..].chars().count() <= 50);
}

#[tokio::test]
async fn approval_scenario() {
    let (mut m, recorder) = monitor(default_pipeline());
    m.on_chunk("Ready for review - please approve", true);
    m.drain().await;

    assert_eq!(
        recorder.calls(),
        vec![("Ready for review".to_string(), Category::Approval)]
    );
}

#[tokio::test]
async fn critical_outranks_completion() {
    let (mut m, recorder) = monitor(default_pipeline());
    m.on_chunk("Task completed with 1 error", true);
    m.drain().await;

    assert_eq!(recorder.calls()[0].1, Category::Critical);
}

#[tokio::test]
async fn watch_splits_across_reads() {
    let (mut m, recorder) = monitor(default_pipeline());
    let (mut tx, rx) = tokio::io::duplex(64);
    let mut echoed = Vec::new();

    let writer = tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;
        tx.write_all(b"deploying...\nDeployment ").await.unwrap();
        tx.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.write_all(b"complete\n").await.unwrap();
    });

    m.watch(rx, &mut echoed).await.unwrap();
    writer.await.unwrap();

    assert_eq!(echoed, b"deploying...\nDeployment complete\n");
    assert_eq!(
        recorder.calls(),
        vec![("Deployment complete".to_string(), Category::Completion)]
    );
}

#[tokio::test]
async fn disabled_config_never_notifies() {
    let mut config = Config::default();
    config.notifications_enabled = false;
    let (mut m, recorder) = monitor(Pipeline::new(&config));

    m.on_chunk("fatal: not a git repository", true);
    m.drain().await;

    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn next_session_starts_with_empty_buffer() {
    let (mut m, recorder) = monitor(Pipeline::from_parts(
        true,
        500,
        CategoryMatcher::new(),
        Duration::ZERO,
    ));

    m.on_chunk("Review completed", true);
    m.on_chunk("next prompt", true);
    m.drain().await;

    assert_eq!(recorder.calls().len(), 1);
}

#[tokio::test]
async fn fired_announcements_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let history = Arc::new(History::new(dir.path().to_path_buf()));
    let recorder = Arc::new(Recorder::default());
    let mut m = StreamMonitor::with_parts(
        default_pipeline(),
        recorder.clone(),
        Feedback::disabled(),
        Some(history.clone()),
    );

    m.on_chunk("All tests passed", true);
    m.drain().await;

    let dates = history.dates();
    assert_eq!(dates.len(), 1);
    let records = history.load(&dates[0]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].summary, "Tests passed");
    assert_eq!(records[0].provider, "recorder");
    assert!(records[0].success);
}
