use logspool::{FileSinkBuilder, FlushMode, LogLevel, RotationSize};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = FileSinkBuilder::new("./logs/logger.log")
        .max_file_size(RotationSize::KB(256))
        .max_retained_files(3)
        .min_level(LogLevel::Information)
        .mode(FlushMode::Synchronous)
        .build()?;

    let logger = sink.create_logger("demo::logger");
    logger.information("This is an info message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");

    sink.dispose();
    Ok(())
}
