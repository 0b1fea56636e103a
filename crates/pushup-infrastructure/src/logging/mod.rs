//! Logging setup
//!
//! - one-line JSON to a daily-rotated file
//! - colored human-readable stdout (debug builds)
//! - `log` records bridged into `tracing`
//!
//! Every record carries timestamp, level, target, pid, tid, file/line and the
//! fields of the enclosing component span. Components get their span from
//! [`component`], passing their own name explicitly.

use log::LevelFilter;
use std::fmt as stdfmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{Level, Span};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();
static APP_VERSION: OnceLock<String> = OnceLock::new();
static LOGGER_READY: OnceLock<()> = OnceLock::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Crates whose records pass the `Named` filter
const WORKSPACE_TARGETS: [&str; 3] = ["pushup_domain", "pushup_infrastructure", "pushup_app"];

/// Which records reach the outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Every crate at the configured level
    All,
    /// Only this workspace's crates
    #[default]
    Named,
    /// No output at all
    Silent,
}

impl LogMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogMode::All => "all",
            LogMode::Named => "named",
            LogMode::Silent => "silent",
        }
    }
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(LogMode::All),
            "named" => Ok(LogMode::Named),
            "silent" => Ok(LogMode::Silent),
            other => Err(format!("unknown log mode '{other}' (all, named, silent)")),
        }
    }
}

impl stdfmt::Display for LogMode {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Span for a named component. Enter it (or `.instrument` futures with it) to tag records.
pub fn component(name: &str) -> Span {
    tracing::info_span!("component", component = %name)
}

/// Initialize the logging system
///
/// Debug builds:
/// - stdout (colored, human readable)
/// - file (one-line JSON)
///
/// Release builds:
/// - file only
///
/// `RUST_LOG` overrides the directives derived from `mode` and `level`.
pub fn init_logger(log_dir: PathBuf, mode: LogMode, level: LogLevel) -> anyhow::Result<()> {
    if LOGGER_READY.get().is_some() {
        return Ok(());
    }

    let Some(directives) = filter_directives(mode, level) else {
        let _ = LOGGER_READY.set(());
        return Ok(());
    };

    std::fs::create_dir_all(&log_dir)?;

    let _ = LOG_DIR.set(log_dir.clone());
    let _ = APP_VERSION.set(env!("CARGO_PKG_VERSION").to_string());

    // forward `log` records (reqwest and friends) into tracing
    let _ = LogTracer::builder()
        .with_max_level(level.level_filter())
        .init();

    let file_appender = rolling::daily(&log_dir, "pushup-bot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    let json_layer = fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_timer(fmt::time::ChronoLocal::new(
            "%Y-%m-%dT%H:%M:%S%.3f%:z".to_string(),
        ))
        .event_format(JsonFormatter::new())
        .with_filter(build_filter(&directives));

    let stdout_layer = if cfg!(debug_assertions) {
        Some(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_ansi(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                ))
                .event_format(HumanReadableFormatter::new())
                .with_filter(build_filter(&directives)),
        )
    } else {
        None
    };

    let subscriber = Registry::default().with(json_layer).with(stdout_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    let _ = LOGGER_READY.set(());

    tracing::info!(
        target: "pushup_infrastructure::logging",
        log_dir = %log_dir.display(),
        mode = %mode,
        level = level.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        profile = if cfg!(debug_assertions) { "Debug" } else { "Release" },
        "Logger initialized successfully"
    );

    Ok(())
}

/// Filter directives for a mode; `None` means nothing is logged
pub fn filter_directives(mode: LogMode, level: LogLevel) -> Option<String> {
    let level = level.as_str();
    match mode {
        LogMode::All => Some(level.to_string()),
        LogMode::Named => {
            let mut directives = vec!["off".to_string()];
            directives.extend(WORKSPACE_TARGETS.iter().map(|t| format!("{t}={level}")));
            Some(directives.join(","))
        }
        LogMode::Silent => None,
    }
}

fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn get_log_dir() -> Option<PathBuf> {
    LOG_DIR.get().cloned()
}

// ============================================================
// Formatters
// ============================================================

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Formatted fields of every span enclosing the event, root first
fn span_fields<S, N>(ctx: &FmtContext<'_, S, N>) -> Vec<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let mut parts = Vec::new();
    if let Some(scope) = ctx.event_scope() {
        for span in scope.from_root() {
            let extensions = span.extensions();
            if let Some(fields) = extensions.get::<FormattedFields<N>>() {
                if !fields.is_empty() {
                    parts.push(fields.to_string());
                }
            }
        }
    }
    parts
}

/// One-line JSON formatter
struct JsonFormatter {
    pid: u32,
    version: String,
}

impl JsonFormatter {
    fn new() -> Self {
        Self {
            pid: std::process::id(),
            version: APP_VERSION
                .get()
                .cloned()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        let metadata = event.metadata();

        let now = chrono::Local::now();
        let timestamp = now.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string();

        let thread = std::thread::current();
        let tid = format!("{:?}", thread.id());
        let thread_name = thread.name().unwrap_or("unnamed");

        let mut json = serde_json::json!({
            "timestamp": timestamp,
            "level": metadata.level().to_string(),
            "pid": self.pid,
            "tid": tid,
            "thread_name": thread_name,
            "target": metadata.target(),
            "version": self.version,
        });

        if let Some(file) = metadata.file() {
            json["file"] = serde_json::json!(file);
        }
        if let Some(line) = metadata.line() {
            json["line"] = serde_json::json!(line);
        }

        // span fields are rendered by the JSON field formatter, so they parse back
        let mut span = serde_json::Map::new();
        for fields in span_fields(ctx) {
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&fields) {
                Ok(map) => span.extend(map),
                Err(_) => {
                    span.insert("raw".to_string(), serde_json::json!(fields));
                }
            }
        }
        if !span.is_empty() {
            json["span"] = serde_json::Value::Object(span);
        }

        let mut fields_visitor = JsonVisitor::new();
        event.record(&mut fields_visitor);

        if let Some(message) = fields_visitor.fields.remove("message") {
            json["message"] = message;
        }

        if !fields_visitor.fields.is_empty() {
            json["fields"] = serde_json::Value::Object(fields_visitor.fields);
        }

        writeln!(
            writer,
            "{}",
            serde_json::to_string(&json).unwrap_or_default()
        )
    }
}

/// Human readable formatter
/// `2025-04-02 10:32:15.123 [INFO] (pushup_app::bot) pid=12345 tid=ThreadId(7) {component=bot} user_id=42 - message (src/bot.rs:128)`
struct HumanReadableFormatter {
    pid: u32,
}

impl HumanReadableFormatter {
    fn new() -> Self {
        Self {
            pid: std::process::id(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for HumanReadableFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        let metadata = event.metadata();

        let now = chrono::Local::now();
        let timestamp = now.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let thread = std::thread::current();
        let tid = format!("{:?}", thread.id());

        let level_str = match *metadata.level() {
            Level::ERROR => "\x1b[31mERROR\x1b[0m",
            Level::WARN => "\x1b[33mWARN\x1b[0m",
            Level::INFO => "\x1b[32mINFO\x1b[0m",
            Level::DEBUG => "\x1b[36mDEBUG\x1b[0m",
            Level::TRACE => "\x1b[35mTRACE\x1b[0m",
        };

        let spans = span_fields(ctx);
        let span_str = if spans.is_empty() {
            String::new()
        } else {
            format!(" {{{}}}", spans.join(" "))
        };

        let mut fields_visitor = JsonVisitor::new();
        event.record(&mut fields_visitor);

        let message = fields_visitor
            .fields
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let field_parts: Vec<String> = fields_visitor
            .fields
            .iter()
            .filter(|(key, _)| key.as_str() != "message")
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        let fields_str = if field_parts.is_empty() {
            String::new()
        } else {
            format!(" {}", field_parts.join(" "))
        };

        let location = if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            format!(" ({}:{})", file, line)
        } else {
            String::new()
        };

        writeln!(
            writer,
            "{} [{}] ({}) pid={} tid={}{}{} - {}{}",
            timestamp,
            level_str,
            metadata.target(),
            self.pid,
            tid,
            span_str,
            fields_str,
            message,
            location
        )
    }
}

/// Collects event fields into a JSON map
struct JsonVisitor {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl JsonVisitor {
    fn new() -> Self {
        Self {
            fields: serde_json::Map::new(),
        }
    }
}

impl tracing::field::Visit for JsonVisitor {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn stdfmt::Debug) {
        self.fields.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}
