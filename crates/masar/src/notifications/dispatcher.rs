use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{NotificationError, NotificationSink, OutboundMessage};

enum Command {
    Deliver(OutboundMessage),
    Flush(oneshot::Sender<()>),
}

/// Failed delivery reported on the internal error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub message: OutboundMessage,
    pub error: NotificationError,
}

/// Handle for fire-and-forget notification delivery.
#[derive(Clone)]
pub struct NotificationDispatcher {
    commands: mpsc::UnboundedSender<Command>,
}

impl NotificationDispatcher {
    /// Starts the delivery worker and the failure logger on the current runtime.
    pub fn spawn<S>(sink: Arc<S>) -> Self
    where
        S: NotificationSink + ?Sized + 'static,
    {
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();
        tokio::spawn(log_failures(failures_rx));
        Self::spawn_with_failures(sink, failures_tx)
    }

    /// Like [`spawn`](Self::spawn) but hands failures to the caller's channel.
    pub fn spawn_with_failures<S>(
        sink: Arc<S>,
        failures: mpsc::UnboundedSender<DeliveryFailure>,
    ) -> Self
    where
        S: NotificationSink + ?Sized + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(deliver(sink, receiver, failures));
        Self { commands }
    }

    /// Enqueues a message. Never blocks and never reports failure to the caller.
    pub fn dispatch(&self, message: OutboundMessage) {
        if self.commands.send(Command::Deliver(message)).is_err() {
            warn!("notification worker stopped, message dropped");
        }
    }

    /// Resolves once every message enqueued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.commands.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn deliver<S>(
    sink: Arc<S>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    failures: mpsc::UnboundedSender<DeliveryFailure>,
) where
    S: NotificationSink + ?Sized,
{
    while let Some(command) = commands.recv().await {
        match command {
            Command::Deliver(message) => match sink.deliver(&message) {
                Ok(()) => debug!(to = %message.to, "notification delivered"),
                Err(error) => {
                    let _ = failures.send(DeliveryFailure { message, error });
                }
            },
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn log_failures(mut failures: mpsc::UnboundedReceiver<DeliveryFailure>) {
    while let Some(failure) = failures.recv().await {
        warn!(
            to = %failure.message.to,
            error = %failure.error,
            "notification delivery failed"
        );
    }
}
