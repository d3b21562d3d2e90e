// Panic isolation for worker safety
use std::any::Any;
use std::future::Future;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed (the value may itself be an error)
    Success(T),
    /// Execution panicked
    Panicked(String),
    /// The runtime cancelled the task before it finished
    Cancelled,
}

/// Execute a future with panic isolation
///
/// Logging is left to the caller, which knows which item ran.
///
/// The future runs in its own tokio task so a panic unwinds that task only
/// and comes back here as `PanicGuardResult::Panicked`. The caller keeps
/// running, which is what lets a worker move on to the next item.
///
/// # Example
/// ```text
/// let result = execute_guarded(async {
///     panic!("boom");
/// }).await;
///
/// assert!(matches!(result, PanicGuardResult::Panicked(_)));
/// ```
pub async fn execute_guarded<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn(future).await {
        Ok(value) => PanicGuardResult::Success(value),
        Err(join_err) if join_err.is_panic() => {
            PanicGuardResult::Panicked(panic_message(join_err.into_panic()))
        }
        Err(_) => PanicGuardResult::Cancelled,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
