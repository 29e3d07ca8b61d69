use crate::config::{LoggingConfig, Section};
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;

fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// `target == prefix` or `target` is inside the `prefix::` module tree.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

// -------- rotating file writers --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

fn open_rotating_writer(path: &Path, section: &Section) -> std::io::Result<RotWriter> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let limit = match (section.max_backups, section.max_age_days) {
        (Some(n), _) => FileLimit::MaxFiles(n.max(1)),
        (None, Some(days)) => FileLimit::Age(chrono::Duration::days(i64::from(days))),
        (None, None) => FileLimit::Unlimited,
    };
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;

    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

/// Discards everything; used when a record matches no configured file.
struct Sink;

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

enum RoutedWriter {
    File(RotWriter),
    Sink(Sink),
}

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            RoutedWriter::File(w) => w.write(buf),
            RoutedWriter::Sink(s) => s.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            RoutedWriter::File(w) => w.flush(),
            RoutedWriter::Sink(s) => s.flush(),
        }
    }
}

/// Routes each record to the file of the most specific subsystem section,
/// falling back to the `default` section's file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: Vec<(String, RotWriter)>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<&RotWriter> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, w)| w)
            .or(self.default.as_ref())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match &self.default {
            Some(w) => RoutedWriter::File(w.clone()),
            None => RoutedWriter::Sink(Sink),
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        match self.resolve(meta.target()) {
            Some(w) => RoutedWriter::File(w.clone()),
            None => RoutedWriter::Sink(Sink),
        }
    }
}

// -------- plan --------

/// Filters and writers derived from a [`LoggingConfig`], before installation.
struct LogPlan {
    console: Targets,
    file: Targets,
    router: FileRouter,
}

fn build_plan(cfg: &LoggingConfig, base_dir: &Path) -> LogPlan {
    let default = cfg.get(DEFAULT_SECTION);

    let mut console = Targets::new().with_default(
        default
            .map(|s| parse_level(&s.console_level))
            .unwrap_or(LevelFilter::INFO),
    );
    let has_default_file = default.is_some_and(|s| !s.file.trim().is_empty());
    let mut file = Targets::new().with_default(if has_default_file {
        default
            .map(|s| parse_level(&s.file_level))
            .unwrap_or(LevelFilter::OFF)
    } else {
        LevelFilter::OFF
    });

    let mut router = FileRouter::default();
    let mut writers: HashMap<PathBuf, RotWriter> = HashMap::new();
    let mut writer_for = |section: &Section| -> Option<RotWriter> {
        if section.file.trim().is_empty() {
            return None;
        }
        let path = resolve_log_path(&section.file, base_dir);
        if let Some(w) = writers.get(&path) {
            return Some(w.clone());
        }
        match open_rotating_writer(&path, section) {
            Ok(w) => {
                writers.insert(path, w.clone());
                Some(w)
            }
            Err(e) => {
                eprintln!("cannot open log file {}: {e}", path.display());
                None
            }
        }
    };

    if let Some(section) = default {
        router.default = writer_for(section);
    }

    for (name, section) in cfg.iter().filter(|(k, _)| k.as_str() != DEFAULT_SECTION) {
        console = console.with_target(name.clone(), parse_level(&section.console_level));
        match writer_for(section) {
            Some(w) => {
                file = file.with_target(name.clone(), parse_level(&section.file_level));
                router.by_prefix.push((name.clone(), w));
            }
            None => {
                file = file.with_target(name.clone(), LevelFilter::OFF);
            }
        }
    }

    LogPlan {
        console,
        file,
        router,
    }
}

// -------- public init --------

/// Install the global subscriber described by `cfg`.
///
/// Relative log file paths resolve against `base_dir` (normally `server.home_dir`).
/// Calling it twice is harmless: the second installation is ignored.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

    // Bridge `log` records before the subscriber exists.
    let _ = tracing_log::LogTracer::init();

    let plan = build_plan(cfg, base_dir);

    let console_layer = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(plan.console);

    let file_layer = (!plan.router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(plan.router)
            .with_filter(plan.file)
    });

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
