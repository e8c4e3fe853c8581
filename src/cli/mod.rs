//! Command line interface
//!
//! - [`args`] - clap definitions
//! - [`commands`] - command implementations

pub mod args;
pub mod commands;

use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Process exit code for a failed command.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Timeout { .. } => 2,
        Error::Cancelled(_) => 130,
        _ => 1,
    }
}

/// Run `command` until it finishes or `cancel` fires.
///
/// A wait in progress sees the same token and reports its own operation id.
pub async fn run_until_cancelled<F>(command: F, cancel: &CancellationToken) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        biased;
        result = command => result,
        _ = cancel.cancelled() => {
            log::warn!("Command interrupted");
            Err(Error::Cancelled("command".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_request_in_flight() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        // Stands in for a request to a server that never answers.
        let stuck = async {
            tokio::time::sleep(Duration::from_secs(100)).await;
            Ok::<(), Error>(())
        };
        let started = tokio::time::Instant::now();
        let err = run_until_cancelled(stuck, &cancel).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled(_)));
        assert_eq!(exit_code(&err), 130);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_finished_command_keeps_its_result() {
        let cancel = CancellationToken::new();
        assert!(run_until_cancelled(async { Ok::<(), Error>(()) }, &cancel).await.is_ok());
        let err = run_until_cancelled(
            async { Err::<(), Error>(Error::invalid_argument("bad name")) },
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(
            exit_code(&Error::Timeout {
                operation_id: "op-123".into(),
                elapsed: Duration::from_secs(3)
            }),
            2
        );
        assert_eq!(exit_code(&Error::Cancelled("op-123".into())), 130);
        assert_eq!(exit_code(&Error::invalid_argument("x")), 1);
    }
}
