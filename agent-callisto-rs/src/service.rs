//! Stream monitoring with a session state machine.
//!
//! IDLE → STREAMING → IDLE
//!
//! One `StreamMonitor` owns the pipeline. Output from several sources (a
//! child's stdout and stderr) is merged through a channel so chunks reach
//! the pipeline one at a time, in arrival order.

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::announce::{build_announcer, dispatch, Announcer};
use crate::config::Config;
use crate::feedback::Feedback;
use crate::history::History;
use crate::pipeline::{Announcement, Pipeline};
use crate::sounds::SoundBank;

const READ_BUF_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Streaming => write!(f, "STREAMING"),
        }
    }
}

/// Decodes byte chunks as UTF-8, holding back a trailing partial character
/// until the rest of it arrives.
#[derive(Debug, Default)]
pub struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let complete = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // Incomplete sequence at the end: keep it for the next push
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.pending.len(),
        };

        let tail = self.pending.split_off(complete);
        let head = std::mem::replace(&mut self.pending, tail);
        String::from_utf8_lossy(&head).into_owned()
    }

    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Stdout,
    Stderr,
}

pub struct StreamMonitor {
    state: SessionState,
    pipeline: Pipeline,
    announcer: Arc<dyn Announcer>,
    feedback: Feedback,
    history: Option<Arc<History>>,
    pending: Vec<JoinHandle<()>>,
}

impl StreamMonitor {
    pub fn new(config: &Config) -> Self {
        let bank = Arc::new(SoundBank::load(&config.sounds.resolved_dir()));
        Self::with_parts(
            Pipeline::new(config),
            build_announcer(config, bank.clone()),
            Feedback::new(config, bank),
            History::from_config(&config.history).map(Arc::new),
        )
    }

    pub fn with_parts(
        pipeline: Pipeline,
        announcer: Arc<dyn Announcer>,
        feedback: Feedback,
        history: Option<Arc<History>>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            pipeline,
            announcer,
            feedback,
            history,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Feed one chunk of output. Returns the announcement fired for it, if
    /// any; the announcement itself runs in the background.
    pub fn on_chunk(&mut self, text: &str, is_final: bool) -> Option<Announcement> {
        self.on_chunk_at(text, is_final, Instant::now())
    }

    pub fn on_chunk_at(&mut self, text: &str, is_final: bool, now: Instant) -> Option<Announcement> {
        self.pending.retain(|handle| !handle.is_finished());

        if self.state == SessionState::Idle && !text.is_empty() {
            self.state = SessionState::Streaming;
            info!("State: IDLE → STREAMING");
            self.track(self.feedback.session_open());
        }

        if let Some(click) = self.feedback.on_chunk(text, now) {
            self.track(Some(click));
        }

        let fired = if text.is_empty() {
            None
        } else {
            self.pipeline.process(text, now)
        };
        if let Some(announcement) = &fired {
            self.announce(announcement.clone());
        }

        if is_final {
            self.end_session();
        }

        fired
    }

    /// Start an announcement without consulting the pipeline.
    pub fn announce(&mut self, announcement: Announcement) {
        let handle = dispatch(self.announcer.clone(), announcement, self.history.clone());
        self.pending.push(handle);
    }

    fn end_session(&mut self) {
        self.pipeline.end_session();
        if self.state == SessionState::Streaming {
            self.state = SessionState::Idle;
            info!("State: STREAMING → IDLE");
            self.track(self.feedback.session_close());
        }
    }

    fn track(&mut self, handle: Option<JoinHandle<()>>) {
        if let Some(handle) = handle {
            self.pending.push(handle);
        }
    }

    /// Wait for in-flight announcements and sounds.
    pub async fn drain(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        debug!("Waiting for {} background tasks", self.pending.len());
        for result in join_all(self.pending.drain(..)).await {
            if let Err(e) = result {
                warn!("Background task failed: {e}");
            }
        }
    }

    /// Echo `reader` to `writer`, classifying as it goes. EOF ends the
    /// session; so does Ctrl-C.
    pub async fn watch<R, W>(&mut self, mut reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut chunker = Utf8Chunker::default();

        loop {
            tokio::select! {
                read = reader.read(&mut buf) => {
                    let n = read?;
                    if n == 0 {
                        break;
                    }
                    writer.write_all(&buf[..n]).await?;
                    writer.flush().await?;
                    let text = chunker.push(&buf[..n]);
                    self.on_chunk(&text, false);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        let rest = chunker.finish();
        self.on_chunk(&rest, true);
        self.drain().await;
        Ok(())
    }

    /// Run a command, tee its output and classify both streams. Returns the
    /// child's exit code.
    pub async fn run(&mut self, program: &str, args: &[String]) -> io::Result<i32> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        info!("Spawned {program} (pid {:?})", child.id());

        let (tx, mut rx) = mpsc::channel::<(Source, Vec<u8>)>(64);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward(stdout, Source::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward(stderr, Source::Stderr, tx.clone()));
        }
        drop(tx);

        let mut out = tokio::io::stdout();
        let mut err = tokio::io::stderr();
        let mut out_chunker = Utf8Chunker::default();
        let mut err_chunker = Utf8Chunker::default();

        while let Some((source, bytes)) = rx.recv().await {
            let text = match source {
                Source::Stdout => {
                    out.write_all(&bytes).await?;
                    out.flush().await?;
                    out_chunker.push(&bytes)
                }
                Source::Stderr => {
                    err.write_all(&bytes).await?;
                    err.flush().await?;
                    err_chunker.push(&bytes)
                }
            };
            self.on_chunk(&text, false);
        }

        let status = child.wait().await?;
        info!("{program} exited with {status}");

        let rest = out_chunker.finish() + &err_chunker.finish();
        self.on_chunk(&rest, true);
        self.drain().await;

        Ok(status.code().unwrap_or(1))
    }
}

async fn forward<R>(mut reader: R, source: Source, tx: mpsc::Sender<(Source, Vec<u8>)>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send((source, buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Read from child {source:?} failed: {e}");
                break;
            }
        }
    }
}
