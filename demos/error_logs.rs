use {
    logspool::{ErrorInfo, FileSinkBuilder, LogLevel, TimeZone},
    std::backtrace::Backtrace,
};

#[derive(Debug, thiserror::Error)]
#[error("Server encountered an internal error (code {code})")]
struct ServerError {
    code: u16,
    #[source]
    cause: std::io::Error,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = FileSinkBuilder::new("./logs/error.log")
        .min_level(LogLevel::Warning)
        .time_zone(TimeZone::UTC)
        .build()?;
    let logger = sink.create_logger("demo::server");

    for code in [500, 502, 503, 504] {
        let err = ServerError {
            code,
            cause: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "upstream closed the connection"),
        };
        let info = ErrorInfo::from_error(&err).with_stack(Backtrace::force_capture().to_string());
        logger.log_error(LogLevel::Error, format!("Request failed with {code}"), info);
    }

    sink.dispose();
    Ok(())
}
