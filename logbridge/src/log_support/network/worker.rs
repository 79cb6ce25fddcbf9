// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{sync::{Arc, Mutex,
                 atomic::{AtomicBool, Ordering},
                 mpsc::{Receiver, SyncSender, TrySendError, sync_channel}},
          thread::JoinHandle,
          time::{Duration, Instant}};

use chrono::{DateTime, Utc};
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

use crate::{ConsoleNotifier, EventBody, LogBridgeError, Severity, strip_ansi_sgr};

/// Records waiting for a worker. Anything beyond this is dropped.
pub const WORKER_QUEUE_CAPACITY: usize = 1024;

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One log record, as handed to a network sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Record {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A destination that runs on a worker thread. `deliver` may block.
pub trait RecordSink: Send + 'static {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns an error if the record could not be delivered. The worker reports the
    /// first error of a streak of failures and keeps going.
    fn deliver(&mut self, record: &Record) -> miette::Result<()>;
}

/// The sending half of a worker's queue, shared by its layer and its handle. `None`
/// once the handle has closed it.
#[derive(Debug)]
struct WorkerQueue {
    sender: Mutex<Option<SyncSender<Record>>>,
    is_dropping: AtomicBool,
}

/// A [Layer] that turns every event it sees into a [Record] and queues it for a worker
/// thread. Level filtering is done by the per layer filter it is wrapped in.
#[derive(Debug)]
pub struct NetworkLayer {
    name: &'static str,
    queue: Arc<WorkerQueue>,
    sanitize: bool,
    notifier: ConsoleNotifier,
}

/// Owned by the logger, so the worker can be drained before the process exits.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    queue: Arc<WorkerQueue>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkLayer {
    /// Spawn the worker thread for `sink`, and return the layer that feeds it along with
    /// the handle that can shut it down. See [`NetworkLayer::try_spawn_with_capacity`].
    ///
    /// # Errors
    ///
    /// Returns [`LogBridgeError::SpawnWorker`] if the thread can't be spawned.
    pub fn try_spawn(
        sink: impl RecordSink,
        sanitize: bool,
        notifier: ConsoleNotifier,
    ) -> miette::Result<(Self, WorkerHandle)> {
        Self::try_spawn_with_capacity(sink, sanitize, notifier, WORKER_QUEUE_CAPACITY)
    }

    /// Like [`NetworkLayer::try_spawn`], with a queue that holds at most `capacity`
    /// records. The thread exits once the queue is closed (by [`WorkerHandle::close`]
    /// or by dropping both the layer and the handle) and everything in it is delivered.
    ///
    /// # Errors
    ///
    /// Returns [`LogBridgeError::SpawnWorker`] if the thread can't be spawned.
    pub fn try_spawn_with_capacity(
        sink: impl RecordSink,
        sanitize: bool,
        notifier: ConsoleNotifier,
        capacity: usize,
    ) -> miette::Result<(Self, WorkerHandle)> {
        let (sender, receiver) = sync_channel::<Record>(capacity);
        let name = sink.name();
        let worker_notifier = notifier.clone();
        let thread = std::thread::Builder::new()
            .name(format!("logbridge-{}", name.replace(' ', "-")))
            .spawn(move || run_worker(sink, &receiver, &worker_notifier))
            .map_err(|source| LogBridgeError::SpawnWorker { sink: name, source })?;

        let queue = Arc::new(WorkerQueue {
            sender: Mutex::new(Some(sender)),
            is_dropping: AtomicBool::new(false),
        });
        let layer = Self {
            name,
            queue: Arc::clone(&queue),
            sanitize,
            notifier,
        };
        let handle = WorkerHandle {
            name,
            queue,
            thread: Mutex::new(Some(thread)),
        };
        Ok((layer, handle))
    }

    /// Queue a record. Never blocks. A record is dropped when the queue is full, or
    /// after the worker has been shut down. The first drop of a streak is reported.
    pub fn send(&self, record: Record) {
        let result = match self.queue.sender.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(sender) => sender.try_send(record),
                None => return,
            },
            Err(_) => return,
        };

        match result {
            Ok(()) => self.queue.is_dropping.store(false, Ordering::Relaxed),
            Err(TrySendError::Full(_)) => {
                if !self.queue.is_dropping.swap(true, Ordering::Relaxed) {
                    self.notifier.warn(&format!(
                        "{} sink queue is full, dropping records",
                        self.name
                    ));
                }
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl<S> Layer<S> for NetworkLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let severity = Severity::from(*event.metadata().level());
        let message = EventBody::from_event(event).render();
        let message = if self.sanitize {
            strip_ansi_sgr(&message).into_owned()
        } else {
            message
        };
        self.send(Record::new(severity, message));
    }
}

impl WorkerHandle {
    #[must_use]
    pub fn name(&self) -> &'static str { self.name }

    /// Stop accepting records. The worker keeps going until the queue is empty.
    pub fn close(&self) {
        if let Ok(mut sender) = self.queue.sender.lock() {
            drop(sender.take());
        }
    }

    /// [`WorkerHandle::close`] the queue, then wait until `deadline` for the worker to
    /// deliver what is left. Returns `true` if the worker is done, it can be called
    /// again after a `false`.
    pub fn close_and_join(&self, deadline: Instant) -> bool {
        self.close();

        let Ok(mut thread) = self.thread.lock() else {
            return false;
        };
        let Some(join_handle) = thread.take() else {
            return true;
        };
        while !join_handle.is_finished() {
            if Instant::now() >= deadline {
                *thread = Some(join_handle);
                return false;
            }
            std::thread::sleep(JOIN_POLL_INTERVAL);
        }
        join_handle.join().is_ok()
    }
}

fn run_worker(mut sink: impl RecordSink, receiver: &Receiver<Record>, notifier: &ConsoleNotifier) {
    let mut is_failing = false;
    for record in receiver {
        match sink.deliver(&record) {
            Ok(()) => is_failing = false,
            Err(report) => {
                if !is_failing {
                    notifier.warn_error(&format!("{} sink", sink.name()), &report);
                }
                is_failing = true;
            }
        }
    }
}
