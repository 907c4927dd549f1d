use {
    crate::{
        error::SinkError,
        format::FormattedLine,
        options::{FileSinkOptions, FlushMode},
        writer::AppendWriter,
    },
    std::{
        collections::VecDeque,
        sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
        thread::{self, JoinHandle},
        time::Duration,
    },
};

/// Lifecycle of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Accepting emits; in buffered mode the background flush is scheduled.
    Running,
    /// Shutdown requested. Emits are still queued for the final drain but the
    /// background flush will not start another drain.
    Draining,
    /// Queue empty, background flush joined. Further emits are dropped.
    Stopped,
}

/// Lines waiting for the next drain, plus the lifecycle state they are
/// guarded with.
struct Spool {
    lines: VecDeque<FormattedLine>,
    state: SinkState,
}

struct Inner {
    writer: Arc<AppendWriter>,
    mode: FlushMode,
    interval: Duration,
    watermark: usize,
    spool: Mutex<Spool>,
    wake: Condvar,
    /// Held from dequeue to the last write of a drain (and around every
    /// inline write in synchronous mode) so batches reach the file in queue
    /// order.
    drain_lock: Mutex<()>,
}

impl Inner {
    fn lock_spool(&self) -> MutexGuard<'_, Spool> {
        self.spool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drain(&self) -> usize {
        let _drain = self.drain_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let batch = std::mem::take(&mut self.lock_spool().lines);
        for line in &batch {
            self.writer.write(line);
        }
        batch.len()
    }

    /// Block until there is something to drain: the queue reached the
    /// watermark or the interval elapsed.
    /// # Returns
    /// `false` once the sink has left the running state.
    fn wait_for_work(&self) -> bool {
        let mut spool = self.lock_spool();
        loop {
            if spool.state != SinkState::Running {
                return false;
            }
            if spool.lines.len() >= self.watermark {
                return true;
            }
            let (guard, wait) = self
                .wake
                .wait_timeout(spool, self.interval)
                .unwrap_or_else(PoisonError::into_inner);
            spool = guard;
            if wait.timed_out() {
                return spool.state == SinkState::Running;
            }
        }
    }

    fn run(&self) {
        while self.wait_for_work() {
            self.drain();
        }
    }
}

/// Moves formatted lines from producers to the [`AppendWriter`].
///
/// In synchronous mode each submitted line is written inline. In buffered
/// mode lines are queued and a single background thread drains the queue
/// every `flush_interval`, or as soon as it holds `buffer_lines` lines.
/// Lines reach the file in the order they were queued, whichever thread
/// queued them.
pub struct FlushScheduler {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FlushScheduler {
    /// Start scheduling lines for `writer` according to `options`.
    pub fn start(writer: Arc<AppendWriter>, options: &FileSinkOptions) -> Result<FlushScheduler, SinkError> {
        let inner = Arc::new(Inner {
            writer,
            mode: options.mode,
            interval: options.flush_interval(),
            watermark: options.buffer_lines.max(1),
            spool: Mutex::new(Spool {
                lines: VecDeque::new(),
                state: SinkState::Running,
            }),
            wake: Condvar::new(),
            drain_lock: Mutex::new(()),
        });

        let worker = match options.mode {
            FlushMode::Synchronous => None,
            FlushMode::Buffered => {
                let worker_inner = Arc::clone(&inner);
                let handle = thread::Builder::new()
                    .name("logspool-flush".into())
                    .spawn(move || worker_inner.run())
                    .map_err(|err| SinkError::InternalError(format!("Failed to spawn flush thread: {err}")))?;
                Some(handle)
            }
        };

        Ok(FlushScheduler {
            inner,
            worker: Mutex::new(worker),
        })
    }

    /// Hand one line to the scheduler. `render` runs while the queue is
    /// locked, so lines are formatted in the order they are queued.
    /// # Returns
    /// `false` if the sink is stopped and the line was dropped.
    pub fn submit<F: FnOnce() -> FormattedLine>(&self, render: F) -> bool {
        match self.inner.mode {
            FlushMode::Synchronous => {
                let _drain = self.inner.drain_lock.lock().unwrap_or_else(PoisonError::into_inner);
                if self.inner.lock_spool().state == SinkState::Stopped {
                    return false;
                }
                self.inner.writer.write(&render());
                true
            }
            FlushMode::Buffered => {
                let mut spool = self.inner.lock_spool();
                if spool.state == SinkState::Stopped {
                    return false;
                }
                spool.lines.push_back(render());
                if spool.state == SinkState::Running && spool.lines.len() >= self.inner.watermark {
                    self.inner.wake.notify_one();
                }
                true
            }
        }
    }

    /// Write everything queued so far, on the calling thread.
    /// # Returns
    /// The number of lines written.
    pub fn drain_now(&self) -> usize {
        self.inner.drain()
    }

    /// Stop the background flush and write whatever is still queued.
    ///
    /// Blocks until the background thread has exited and the queue is
    /// empty. The thread is never interrupted mid-write; it finishes its
    /// current drain first. Calling this again is a no-op.
    pub fn shutdown(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut spool = self.inner.lock_spool();
            if spool.state == SinkState::Stopped {
                return;
            }
            spool.state = SinkState::Draining;
        }
        self.inner.wake.notify_all();

        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                eprintln!(
                    "Log flush thread for '{}' panicked",
                    self.inner.writer.path().display()
                );
            }
        }

        self.inner.lock_spool().state = SinkState::Stopped;
        self.inner.drain();
    }

    pub fn state(&self) -> SinkState {
        self.inner.lock_spool().state
    }

    /// Number of lines waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.inner.lock_spool().lines.len()
    }

    pub fn mode(&self) -> FlushMode {
        self.inner.mode
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
