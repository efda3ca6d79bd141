//! Plain-text event formatter that prefixes each line with the active span path.
//!
//! Used by `logging::init()` for file and stderr logs. A line inside the `run` span looks like
//! `2026-01-01T00:00:00Z INFO span=run#1 memoproxy::cache::proxy: cache hit key="x"`.

use std::fmt;

use tracing_core::Subscriber;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Formatter writing `TIMESTAMP LEVEL [span=a#1/b#2] target: fields`.
///
/// The span path runs from the root span to the event's parent, each as `name#id`; it is omitted
/// for events outside any span.
pub struct SpanPathText {
    timer: SystemTime,
    with_target: bool,
}

impl Default for SpanPathText {
    fn default() -> Self {
        Self {
            timer: SystemTime,
            with_target: true,
        }
    }
}

impl SpanPathText {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_target(mut self, on: bool) -> Self {
        self.with_target = on;
        self
    }
}

impl<S, N> FormatEvent<S, N> for SpanPathText
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing_core::Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        write!(writer, " {}", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            let path: Vec<String> = scope
                .from_root()
                .map(|span| format!("{}#{}", span.name(), span.id().into_u64()))
                .collect();
            write!(writer, " span={}", path.join("/"))?;
        }

        if self.with_target {
            write!(writer, " {}:", event.metadata().target())?;
        }
        write!(writer, " ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
