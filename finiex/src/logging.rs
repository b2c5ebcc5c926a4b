use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initialise process-wide logging (§4.12): plain text to stderr, level
/// controlled by `RUST_LOG` (falls back to `info`).
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// Initialise process-wide JSON logging (§4.12), for collector tooling
/// that ingests structured log lines.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}

#[derive(Default)]
struct FieldVisitor(String);

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        } else {
            let _ = write!(self.0, " {}={value:?}", field.name());
        }
    }
}

/// A buffering [`Layer`] scoping one scenario's log output into memory, so
/// concurrent scenarios never interleave their log lines on stderr
/// (§4.12). Grounded in the same `Layer`-filtering technique the upstream
/// audit-span filter used, just buffering instead of dropping.
struct BufferLayer {
    buffer: Arc<Mutex<Vec<String>>>,
    start: Instant,
}

impl<S: Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1_000.0;
        let line = format!("[{elapsed_ms:>10.3}ms] {:>5} {}", event.metadata().level(), visitor.0);

        self.buffer.lock().expect("scenario log buffer mutex poisoned").push(line);
    }
}

/// Captures one scenario's `tracing` output in memory for the duration of
/// its tick loop, then flushes it as a single aggregated event to the
/// process-global subscriber plus, optionally, a per-scenario log file
/// (§4.12). One instance per scenario process; never shared.
pub struct ScenarioLogger {
    buffer: Arc<Mutex<Vec<String>>>,
    start: Instant,
}

impl ScenarioLogger {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
            start: Instant::now(),
        }
    }

    /// Run `f` with this logger's buffering layer installed as the
    /// ambient subscriber, so every `tracing` call made inside `f` lands
    /// in this scenario's buffer rather than the process-global
    /// subscriber (and, when multiple scenarios run on different
    /// threads, never interleaves with another scenario's lines).
    pub fn scoped<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let layer = BufferLayer {
            buffer: Arc::clone(&self.buffer),
            start: self.start,
        };
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Join the buffered lines into one string and forward them as a
    /// single `tracing::info!` event to the process-global subscriber on
    /// completion or error, returning the joined text for
    /// `ProcessResult::scenario_logger_buffer`.
    pub fn flush(&self) -> String {
        let lines = self.buffer.lock().expect("scenario log buffer mutex poisoned");
        let joined = lines.join("\n");
        if !joined.is_empty() {
            tracing::info!(scenario_log = %joined, "scenario completed");
        }
        joined
    }

    /// Best-effort write of the flushed buffer to a per-scenario file
    /// under `dir` (§4.12); failures here are themselves logged, never
    /// propagated, since losing a log file must not fail a scenario that
    /// otherwise completed cleanly.
    pub fn write_to_file(&self, dir: &std::path::Path, scenario_name: &str, contents: &str) {
        if let Err(error) = std::fs::create_dir_all(dir) {
            tracing::warn!(%error, "failed to create scenario log directory");
            return;
        }
        let path = dir.join(format!("{scenario_name}.log"));
        if let Err(error) = std::fs::write(&path, contents) {
            tracing::warn!(%error, path = %path.display(), "failed to write scenario log file");
        }
    }
}

impl Default for ScenarioLogger {
    fn default() -> Self {
        Self::new()
    }
}
