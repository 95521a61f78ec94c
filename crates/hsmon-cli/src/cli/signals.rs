//! OS signal listener feeding the monitor's signal channel.
//!
//! Ctrl-C (and SIGTERM) detach. SIGQUIT requests an abort; the monitor only
//! acts on it when remote removal was enabled with `--delete-on-quit`.

use hsmon_core::monitor::{MonitorSignal, SignalSender};
use tokio::task::JoinHandle;

/// Waits for the first operator signal and forwards it. The sender is held
/// until the task is aborted so the monitor never sees a closed channel
/// before it has read the signal.
pub fn spawn_signal_listener(tx: SignalSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(?signal, "operator signal received");
                let _ = tx.send(Some(signal));
            }
            Err(e) => {
                tracing::warn!("could not install signal handlers: {}", e);
            }
        }
        std::future::pending::<()>().await;
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<MonitorSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = sigint.recv() => MonitorSignal::Detach,
        _ = sigterm.recv() => MonitorSignal::Detach,
        _ = sigquit.recv() => MonitorSignal::Abort,
    };
    Ok(received)
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<MonitorSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(MonitorSignal::Detach)
}
