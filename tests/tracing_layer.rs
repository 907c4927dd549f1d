#![cfg(feature = "tracing")]

use {
    logspool::{FileSinkBuilder, FlushMode, LogLevel},
    std::fs,
    tracing_subscriber::{layer::SubscriberExt, Registry},
};

#[derive(Debug, thiserror::Error)]
#[error("request failed")]
struct RequestError {
    #[source]
    cause: std::io::Error,
}

#[test]
fn forwards_tracing_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracing.log");
    let sink = FileSinkBuilder::new(&path)
        .min_level(LogLevel::Information)
        .mode(FlushMode::Synchronous)
        .timestamp(false)
        .build()
        .unwrap();

    let subscriber = Registry::default().with(sink.layer());
    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(target: "svc", "not written");
        tracing::info!(target: "svc", "service started");
        tracing::warn!(target: "svc::pool", size = 4, name = "primary", "pool low");
    });
    sink.flush();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[Information]:\tsvc\tservice started\n[Warning]:\tsvc::pool\tpool low size=4 name=primary\n"
    );
}

#[test]
fn error_fields_become_the_error_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracing_error.log");
    let sink = FileSinkBuilder::new(&path)
        .mode(FlushMode::Synchronous)
        .timestamp(false)
        .build()
        .unwrap();

    let err = RequestError {
        cause: std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out"),
    };
    let subscriber = Registry::default().with(sink.layer());
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(target: "svc", error = &err as &(dyn std::error::Error + 'static), "call failed");
    });
    sink.flush();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[Error]:\tsvc\tcall failed\nStack trace:\n\tError:\trequest failed\n\tError:\tupstream timed out\n"
    );
}
