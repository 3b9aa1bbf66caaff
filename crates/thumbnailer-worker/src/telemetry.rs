use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "thumbnailer=info,thumbnailer_worker=info,thumbnailer_processing=info,thumbnailer_storage=info,thumbnailer_graph=info";

/// Initialize tracing. Logs go to stderr; stdout carries outbound messages.
///
/// `log_format` is `json` for one JSON object per event, anything else for compact console output.
pub fn init_telemetry(log_format: &str) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        let console_fmt = tracing_subscriber::fmt::layer()
            .event_format(
                Format::default()
                    .compact()
                    .with_target(false)
                    .without_time(),
            )
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(console_fmt)
            .try_init()?;
    }

    tracing::debug!(log_format = %log_format, "Telemetry initialized");
    Ok(())
}
