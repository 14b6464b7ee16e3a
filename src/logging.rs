use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILE: &str = "sprints.log";

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("sprints={}", level)
}

/// Initialize the logging system
///
/// Logs go to stderr in compact form. With `log_file`, a daily-rolling JSON
/// log is written as well; keep the returned guard alive until exit so
/// buffered lines are flushed. Calling this twice is a no-op.
pub fn init(verbose: bool, log_file: Option<PathBuf>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    match log_file {
        Some(log_path) => {
            let (dir, file_name) = split_log_path(&log_path);
            let _ = std::fs::create_dir_all(&dir);

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
            let file_layer = fmt::layer().with_writer(writer).with_ansi(false).json();

            let _ = subscriber.with(file_layer).try_init();
            Some(guard)
        }
        None => {
            let _ = subscriber.try_init();
            None
        }
    }
}

fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
    (dir, file_name)
}
