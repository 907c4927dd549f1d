use {
    logspool::{FileSinkBuilder, RotationSize},
    std::{sync::Arc, thread, time::Duration},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(
        FileSinkBuilder::new("./logs/sized.log")
            .max_file_size(RotationSize::KB(64)) // Rotate past 64 KiB
            .max_retained_files(5) // Keep sized.log.1 .. sized.log.5
            .flush_interval(Duration::from_millis(500))
            .buffer_lines(256)
            .build()?,
    );

    // Several producers writing concurrently; lines are spooled by the
    // background flush and rotation kicks in along the way.
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let logger = sink.create_logger(format!("demo::worker{worker}"));
            thread::spawn(move || {
                for i in 1..=1000 {
                    logger.information(format!(
                        "Log entry #{i}: This is a sample log message that will contribute to file size"
                    ));
                }
            })
        })
        .collect();
    for worker in workers {
        let _ = worker.join();
    }

    sink.flush();
    Ok(())
}
