//! OS shutdown signal handling

use tokio::sync::mpsc;
use tracing::info;

/// Why the recorder is asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

/// Listens for SIGINT/SIGTERM and forwards them to one receiver
pub struct ShutdownSignals {
    receiver: mpsc::Receiver<ShutdownSignal>,
}

impl ShutdownSignals {
    #[cfg(unix)]
    pub fn install() -> Result<Self, std::io::Error> {
        use tokio::signal::unix::{signal, SignalKind};

        let (tx, rx) = mpsc::channel(4);

        for (kind, which) in [
            (SignalKind::interrupt(), ShutdownSignal::Interrupt),
            (SignalKind::terminate(), ShutdownSignal::Terminate),
        ] {
            let mut stream = signal(kind)?;
            let tx = tx.clone();
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    info!(signal = which.as_str(), "shutdown requested");
                    if tx.send(which).await.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(Self { receiver: rx })
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                let _ = tx.send(ShutdownSignal::Interrupt).await;
            }
        });
        Ok(Self { receiver: rx })
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_names() {
        assert_eq!(ShutdownSignal::Interrupt.as_str(), "SIGINT");
        assert_eq!(ShutdownSignal::Terminate.as_str(), "SIGTERM");
    }

    #[tokio::test]
    async fn installs_handlers() {
        assert!(ShutdownSignals::install().is_ok());
    }
}
