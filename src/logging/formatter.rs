use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Wraps each prefix field in brackets.
/// Format: [TIMESTAMP] [LEVEL] [SPAN] [TARGET]: MESSAGE
///
/// `SPAN` is the outermost active span, i.e. the operation being run
/// (`distribute`, `split`, `subset`, `stats`), or `-` outside of one.
pub struct BracketedFormatter {
    /// Append `file:line` to the target; useful in log files, noisy on a terminal
    pub with_location: bool,
}

impl BracketedFormatter {
    pub fn terminal() -> Self {
        Self { with_location: false }
    }

    pub fn file() -> Self {
        Self { with_location: true }
    }
}

impl<S, N> FormatEvent<S, N> for BracketedFormatter
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
        let metadata = event.metadata();

        let now = chrono::Local::now();
        write!(writer, "[{}] ", now.format("%Y-%m-%d %H:%M:%S%.3f"))?;
        write!(writer, "[{:5}] ", metadata.level())?;

        let operation = ctx
            .event_scope()
            .and_then(|scope| scope.from_root().next().map(|span| span.name()))
            .unwrap_or("-");
        write!(writer, "[{}] ", operation)?;

        match (self.with_location, metadata.file(), metadata.line()) {
            (true, Some(file), Some(line)) => {
                write!(writer, "[{} {}:{}]: ", metadata.target(), file, line)?
            }
            _ => write!(writer, "[{}]: ", metadata.target())?,
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
