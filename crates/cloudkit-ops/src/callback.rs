use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context for operation callbacks.
///
/// `Inline` runs callbacks on the task that finishes the operation. A serial
/// queue owns one background task; every operation sharing it has its
/// callbacks run one at a time in submission order.
#[derive(Clone, Default)]
pub enum CallbackQueue {
    #[default]
    Inline,
    Serial(SerialQueue),
}

#[derive(Clone)]
pub struct SerialQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl CallbackQueue {
    /// Starts a serial queue on the current tokio runtime.
    pub fn serial() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job();
            }
        });
        Self::Serial(SerialQueue { sender })
    }

    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        match self {
            Self::Inline => job(),
            Self::Serial(queue) => {
                if let Err(mpsc::error::SendError(job)) = queue.sender.send(Box::new(job)) {
                    debug!("serial callback queue closed; running callback inline");
                    job();
                }
            }
        }
    }
}

impl fmt::Debug for CallbackQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("Inline"),
            Self::Serial(_) => f.write_str("Serial"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    #[test]
    fn inline_queue_runs_immediately() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        CallbackQueue::Inline.dispatch(move || sink.lock().expect("lock").push(1));
        assert_eq!(*seen.lock().expect("lock"), vec![1]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn serial_queue_preserves_submission_order() {
        let queue = CallbackQueue::serial();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for value in 0..5 {
            let sink = seen.clone();
            queue.dispatch(move || sink.lock().expect("lock").push(value));
        }
        let (done_tx, done_rx) = oneshot::channel();
        queue.dispatch(move || {
            let _ = done_tx.send(());
        });

        done_rx.await.expect("serial queue should drain");
        assert_eq!(*seen.lock().expect("lock"), vec![0, 1, 2, 3, 4]);
    }
}
