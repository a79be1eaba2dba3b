use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use time::{
    format_description::{self, BorrowedFormatItem},
    OffsetDateTime, UtcOffset,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{format, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
    FmtSubscriber,
};

/// Initialize the logging system
pub fn init_logging(level: Level) -> Result<()> {
    // Reading the offset is refused once threads exist, fall back to UTC then
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let time_format = format_description::parse_borrowed::<2>("[hour]:[minute]:[second]")
        .into_diagnostic()
        .wrap_err("Invalid log time format")?;

    let subscriber = FmtSubscriber::builder()
        .event_format(ConsoleLogger {
            offset: local_offset,
            time_format,
        })
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Setting default subscriber failed")
}

/// One line per event: local time, level, then the message
struct ConsoleLogger {
    offset: UtcOffset,
    time_format: Vec<BorrowedFormatItem<'static>>,
}

impl<S, N> FormatEvent<S, N> for ConsoleLogger
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();

        let now = OffsetDateTime::now_utc()
            .to_offset(self.offset)
            .time()
            .format(&self.time_format)
            .map_err(|_| std::fmt::Error)?;

        if writer.has_ansi_escapes() {
            let level = match level {
                Level::ERROR => level.red().to_string(),
                Level::WARN => level.yellow().to_string(),
                Level::DEBUG | Level::TRACE => level.blue().to_string(),
                _ => level.green().to_string(),
            };
            write!(&mut writer, "{} {:>5} ", now.dimmed(), level)?;
        } else {
            write!(&mut writer, "{now} {level:>5} ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
