use crate::{PilotError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Opt-in bounds for the crate's otherwise unbounded waits.
///
/// The default carries no deadline and no cancel signal, preserving the
/// hang-until-a-human-intervenes behavior of the login and publish flows.
/// Callers that need liveness attach a deadline, a cancel receiver, or both.
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    pub deadline: Option<Duration>,
    pub cancel: Option<watch::Receiver<bool>>,
}

impl WaitOptions {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    pub fn cancelled_by(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Creates a cancel handle pair: flip the sender to `true` to abort any wait
/// holding the receiver.
pub fn cancel_signal() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Runs `fut` under the given options. With no deadline and no cancel signal
/// this awaits `fut` directly; abandoning a wait does not abort whatever the
/// page is doing underneath, it only releases the caller.
pub async fn with_options<T, F>(opts: WaitOptions, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let deadline_ms = opts.deadline.map(|d| d.as_millis() as u64);

    let expired = async {
        match opts.deadline {
            Some(deadline) => tokio::time::sleep(deadline).await,
            None => std::future::pending().await,
        }
    };

    let cancelled = async {
        match opts.cancel {
            Some(mut rx) => {
                if *rx.borrow() {
                    return;
                }
                loop {
                    if rx.changed().await.is_err() {
                        // Sender dropped without cancelling; wait forever.
                        std::future::pending::<()>().await;
                    }
                    if *rx.borrow() {
                        return;
                    }
                }
            }
            None => std::future::pending().await,
        }
    };

    tokio::pin!(fut);
    tokio::select! {
        result = &mut fut => result,
        _ = cancelled => Err(PilotError::Cancelled),
        _ = expired => Err(PilotError::DeadlineExceeded(deadline_ms.unwrap_or(0))),
    }
}
