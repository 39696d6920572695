use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};
use tracing::Level;
use tracing_subscriber::fmt::format::{FmtSpan, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::FmtSubscriber;

const LOG_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const LOG_NAME_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

struct Timer;
impl FormatTime for Timer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = local_now()
            .format(LOG_TIME_FORMAT)
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{}", now)
    }
}

/// Logs into `./logs/<file_name>.log`. Keep the guard alive until the process exits,
/// dropping it flushes the non-blocking writer.
pub fn init_log(file_name: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let file_name = file_name.to_owned() + ".log";
    let file_appender = tracing_appender::rolling::never("./logs", file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(non_blocking)
        .with_span_events(FmtSpan::CLOSE)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_timer(Timer)
        .with_ansi(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("global subscriber already set, file log not installed");
    }
    guard
}

/// Local wall clock, falling back to UTC when the local offset cannot be determined.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn log_file_name(name: &str) -> String {
    let name = if name.is_empty() {
        "".to_string()
    } else {
        name.to_string() + "_"
    };
    let stamp = local_now()
        .format(LOG_NAME_TIME_FORMAT)
        .unwrap_or_else(|_| local_now().unix_timestamp().to_string());
    format!("benchplot_{name}{stamp}")
}

pub fn file_logger(name: &str) -> tracing_appender::non_blocking::WorkerGuard {
    init_log(&log_file_name(name))
}

pub fn stdout_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_span_events(FmtSpan::CLOSE)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_timer(Timer)
        .finish();
    // tests install it more than once
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// `floor(value / step)`, the integer part shown by the suffix formatters.
pub fn floor_step(value: f64, step: f64) -> f64 {
    (value / step).floor()
}

/// Trims float noise such as `0.30000000000000004` down to twelve significant digits.
pub fn round_significant(value: f64) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    format!("{value:.11e}").parse().unwrap_or(value)
}

#[test]
fn log_file_name_test() {
    assert!(log_file_name("").starts_with("benchplot_"));
    assert!(log_file_name("knn").starts_with("benchplot_knn_"));
}

#[test]
fn round_significant_test() {
    assert_eq!(round_significant(0.1 + 0.2), 0.3);
    assert_eq!(round_significant(2500.0), 2500.0);
    assert_eq!(round_significant(-0.0), -0.0);
    assert!(round_significant(f64::NAN).is_nan());
}
