use std::fmt;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    OsSigInt,
    OsSigQuit,
    OsSigTerm,
    UserInt,
}

impl fmt::Display for Interrupted {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OsSigInt => write!(f, "an os sig int"),
            Self::OsSigQuit => write!(f, "an os sig quit"),
            Self::OsSigTerm => write!(f, "an os sig term"),
            Self::UserInt => write!(f, "a user request"),
        }
    }
}

/// After this many signals the process exits without waiting for in-flight requests.
const FORCE_QUIT_THRESHOLD: u8 = 3;

/// The receiving side of the shutdown broadcast channel.
#[derive(Debug)]
pub struct InterruptReceiver {
    interrupt_rx: broadcast::Receiver<Interrupted>,
}

impl InterruptReceiver {
    #[must_use]
    #[inline]
    pub const fn new(interrupt_rx: broadcast::Receiver<Interrupted>) -> Self {
        Self { interrupt_rx }
    }

    /// Wait for an interrupt signal to be received.
    ///
    /// # Errors
    ///
    /// Fails if the interrupt signal cannot be received (e.g. the sender has been dropped)
    #[inline]
    pub async fn wait(&mut self) -> Result<Interrupted, broadcast::error::RecvError> {
        self.interrupt_rx.recv().await
    }
}

/// The sending side of the shutdown broadcast channel.
#[derive(Debug, Clone)]
pub struct Terminator {
    interrupt_tx: broadcast::Sender<Interrupted>,
}

impl Terminator {
    #[must_use]
    #[inline]
    pub const fn new(interrupt_tx: broadcast::Sender<Interrupted>) -> Self {
        Self { interrupt_tx }
    }

    /// Ask the server to shut down.
    ///
    /// # Errors
    ///
    /// Fails if the interrupt signal cannot be sent (e.g. the receiver has been dropped)
    #[inline]
    pub fn terminate(&self, interrupted: Interrupted) -> anyhow::Result<()> {
        self.interrupt_tx.send(interrupted)?;

        Ok(())
    }

    fn forward(&self, interrupted: Interrupted, kill_count: &mut u8) {
        if let Err(e) = self.terminate(interrupted) {
            log::warn!("failed to forward {interrupted}: {e}");
        }
        *kill_count += 1;
        if *kill_count >= FORCE_QUIT_THRESHOLD {
            log::warn!(
                "Received {FORCE_QUIT_THRESHOLD} signals, forcefully terminating the server"
            );
            std::process::exit(1);
        }
    }
}

#[cfg(unix)]
async fn terminate_by_signal(terminator: Terminator) -> std::io::Result<()> {
    let mut interrupt_signal = signal(SignalKind::interrupt())?;
    let mut term_signal = signal(SignalKind::terminate())?;
    let mut quit_signal = signal(SignalKind::quit())?;

    let mut kill_count = 0;

    loop {
        let interrupted = tokio::select! {
            _ = interrupt_signal.recv() => Interrupted::OsSigInt,
            _ = term_signal.recv() => Interrupted::OsSigTerm,
            _ = quit_signal.recv() => Interrupted::OsSigQuit,
        };
        terminator.forward(interrupted, &mut kill_count);
    }
}

#[cfg(not(unix))]
async fn terminate_by_signal(terminator: Terminator) -> std::io::Result<()> {
    let mut kill_count = 0;

    loop {
        tokio::signal::ctrl_c().await?;
        terminator.forward(Interrupted::UserInt, &mut kill_count);
    }
}

/// Create the shutdown channel and start listening for OS signals.
///
/// Must be called from within a tokio runtime.
#[allow(clippy::module_name_repetitions)]
#[must_use]
#[inline]
pub fn create_termination() -> (Terminator, InterruptReceiver) {
    let (tx, rx) = broadcast::channel(2);
    let terminator = Terminator::new(tx);
    let interrupt = InterruptReceiver::new(rx);

    let terminator_clone = terminator.clone();
    tokio::spawn(async move {
        if let Err(e) = terminate_by_signal(terminator_clone).await {
            log::error!("Failed to listen for termination signals: {e}");
        }
    });

    (terminator, interrupt)
}
