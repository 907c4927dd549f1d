use {
    logspool::{FileSinkBuilder, LogLevel, TimeZone},
    tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = FileSinkBuilder::new("./logs/tracing.log")
        .max_retained_files(3)
        .min_level(LogLevel::Debug)
        .time_zone(TimeZone::Local)
        .build()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sink.layer())
        .try_init()?;

    tracing::info!("This is an info message");
    tracing::warn!(attempt = 3, "This is a warning message");
    tracing::error!("This is an error message");

    // Write out what the background flush has not picked up yet.
    sink.flush();
    Ok(())
}
