//! Interrupt handling.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` on the first Ctrl-C.
///
/// Running recoveries stop before their next snapshot and no new recovery
/// starts, so the batch still reports everything finished so far. The task
/// exits without cancelling once `cancel` fires for another reason.
pub fn cancel_on_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => {
                        log::warn!("Interrupt received, finishing in-flight recoveries");
                        cancel.cancel();
                    }
                    Err(e) => log::error!("Failed to listen for interrupt: {}", e),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interrupt_task_exits_when_cancelled() {
        let cancel = CancellationToken::new();
        let handle = cancel_on_interrupt(cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
