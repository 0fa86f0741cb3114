//! Event formatter for file logs: local timestamp, span ids when inside a span, level, target.
//!
//! Used by `logging::init()` when `LOG_FILE` is set so lines of one workflow run can be
//! correlated by `trace_id` (the outermost span) and `span_id` (the innermost).

use std::fmt;

use chrono::Local;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// `TIMESTAMP [trace_id=X span_id=Y] LEVEL target: fields`.
#[derive(Debug, Default)]
pub struct FileLineFormat;

impl FileLineFormat {
    /// Ids of the outermost and innermost spans around the event, if any.
    fn span_ids<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<(u64, u64)>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
        N: for<'a> FormatFields<'a> + 'static,
    {
        let mut scope = ctx.event_scope()?.from_root();
        let root = scope.next()?.id().into_u64();
        let leaf = scope.last().map(|s| s.id().into_u64()).unwrap_or(root);
        Some((root, leaf))
    }
}

impl<S, N> FormatEvent<S, N> for FileLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        write!(writer, "{}", Local::now().format(TIMESTAMP_FORMAT))?;
        if let Some((trace_id, span_id)) = Self::span_ids(ctx) {
            write!(writer, " trace_id={trace_id} span_id={span_id}")?;
        }
        let meta = event.metadata();
        write!(writer, " {} {}: ", meta.level(), meta.target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
