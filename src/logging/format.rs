//! Human-readable line format for every log handler.
//!
//! `2024-05-01 09:30:12,042 WARNING  disk almost full (storage.rs:88)`

use chrono::Local;
use std::fmt;
use std::path::Path;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Timestamp layout, millisecond precision with a comma separator.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formats events as `<timestamp> <LEVEL>  <message> (<file>:<line>)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        write!(
            writer,
            "{} {:<8} ",
            Local::now().format(TIMESTAMP_FORMAT),
            level_name(meta.level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(
            writer,
            " ({}:{})",
            file_name(meta.file()),
            meta.line().unwrap_or(0)
        )
    }
}

/// Severity label as printed in log lines.
pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

fn file_name(file: Option<&str>) -> &str {
    file.and_then(|f| Path::new(f).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
}
