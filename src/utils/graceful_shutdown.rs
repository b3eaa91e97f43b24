use std::sync::{Arc, OnceLock};

use eyre::{Result, WrapErr};
use tokio::{signal, sync::broadcast};

/// Why the accept loop is being stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Requested from code (tests, embedding)
    Requested,
}

/// Fans a single shutdown signal out to every interested task.
///
/// In-flight requests are left to finish; the server only stops accepting new connections.
#[derive(Clone)]
pub struct GracefulShutdown {
    shutdown_tx: broadcast::Sender<ShutdownReason>,
    // Set once by the first trigger; late waiters read it from here.
    reason: Arc<OnceLock<ShutdownReason>>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(4);
        Self {
            shutdown_tx,
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Get a receiver for shutdown signals
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.shutdown_tx.subscribe()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.reason.get().is_some()
    }

    /// Reason of the first trigger, if shutdown has started.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    /// Start shutdown. Only the first call has any effect.
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        if self.reason.set(reason).is_ok() {
            tracing::info!("Shutdown initiated: {:?}", reason);
            // No receivers simply means nobody is waiting yet.
            let _ = self.shutdown_tx.send(reason);
        } else {
            tracing::warn!("Shutdown already initiated, ignoring {:?}", reason);
        }
    }

    /// Wait for SIGINT or SIGTERM and trigger shutdown.
    pub async fn run_signal_handler(&self) -> Result<()> {
        tracing::debug!("Signal handler started. Listening for SIGTERM and SIGINT");

        #[cfg(unix)]
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .wrap_err("Failed to register SIGTERM handler")?;

        #[cfg(unix)]
        let terminate = sigterm.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            result = signal::ctrl_c() => {
                result.wrap_err("Failed to listen for Ctrl+C")?;
                self.trigger_shutdown(ShutdownReason::Interrupt);
            }
            _ = terminate => {
                self.trigger_shutdown(ShutdownReason::Terminate);
            }
        }

        Ok(())
    }

    /// Resolve once shutdown has been triggered, even if that happened before the call.
    pub async fn wait_for_shutdown_signal(&self) -> ShutdownReason {
        // Subscribe before checking so a trigger in between is still received.
        let mut receiver = self.subscribe();
        if let Some(reason) = self.reason() {
            return reason;
        }

        match receiver.recv().await {
            Ok(reason) => reason,
            Err(_) => {
                tracing::warn!("Shutdown channel closed unexpectedly");
                ShutdownReason::Requested
            }
        }
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}
