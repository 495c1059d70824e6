//! Time-bounded execution of external calls.

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::error::{Error, Result};

/// Run `call` on a worker thread and wait at most `timeout` for its result.
///
/// A call that overruns is not cancelled: its thread is left to finish on
/// its own and the result is discarded. With no timeout the call runs on
/// the current thread. A panicking call fails the stage either way.
pub fn run_with_timeout<T, F>(stage: &str, timeout: Option<Duration>, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let Some(timeout) = timeout else {
        return panic::catch_unwind(AssertUnwindSafe(call))
            .unwrap_or_else(|_| Err(Error::external(stage, "call panicked")));
    };

    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name(format!("gridtruth-{}", stage))
        .spawn(move || {
            let _ = tx.send(call());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("Stage '{}' exceeded {:?}", stage, timeout);
            Err(Error::Timeout {
                stage: stage.to_string(),
                after: timeout,
            })
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(Error::external(stage, "worker exited without a result"))
        }
    }
}
