use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::get_log_dir;

/// Initialize structured logging.
///
/// - Console output goes to stderr; stdout is reserved for IPC.
/// - With `to_file`, a daily-rolling `nihongo.log` is also written under
///   `{data_dir}/logs`, keeping the latest 5 files.
/// - `RUST_LOG` overrides the default `info` filter.
///
/// The returned guard flushes the file writer and must be held until exit.
pub fn init(to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,mio=warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let log_dir = get_log_dir();
    let (file_layer, guard, file_error) = if to_file {
        let _ = fs::create_dir_all(&log_dir);
        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("nihongo")
            .filename_suffix("log")
            .max_log_files(5)
            .build(&log_dir)
        {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true);
                (Some(layer), Some(guard), None)
            }
            Err(e) => (None, None, Some(e)),
        }
    } else {
        (None, None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    match (guard.is_some(), file_error) {
        (true, _) => tracing::info!(log_dir = %log_dir.display(), "Logger initialized"),
        (false, Some(e)) => tracing::warn!(
            log_dir = %log_dir.display(),
            "File logging disabled: {}",
            e
        ),
        (false, None) => {}
    }

    guard
}
