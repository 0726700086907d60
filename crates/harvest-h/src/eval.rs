use chromiumoxide::Page;
use harvest_engine::DriverError;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Maximum retries while the page's execution context is being replaced.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// The page is mid-navigation and has no usable context yet.
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(
    page: &Page,
    expression: &str,
    timeout: Duration,
) -> Result<serde_json::Value, EvalError> {
    match tokio::time::timeout(timeout, page.evaluate(expression)).await {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => remote_object
            .into_value::<serde_json::Value>()
            .map_err(|e| EvalError::Other(format!("Failed to get result: {}", e))),
    }
}

/// Evaluates `expression` and deserializes its JSON result.
///
/// Context errors are retried; an evaluation that outlives `timeout` is reported
/// as [`DriverError::Timeout`].
pub async fn evaluate_json<T: DeserializeOwned>(
    page: &Page,
    expression: &str,
    timeout: Duration,
) -> Result<T, DriverError> {
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match evaluate_with_timeout(page, expression, timeout).await {
            Ok(value) => {
                return serde_json::from_value(value)
                    .map_err(|e| DriverError::Structure(e.to_string()));
            }
            Err(EvalError::Timeout) => {
                return Err(DriverError::Timeout(format!(
                    "script did not finish within {:?}",
                    timeout
                )));
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during evaluation (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => return Err(DriverError::Script(err_str)),
        }
    }

    Err(DriverError::Script(last_error.unwrap_or_else(|| {
        "evaluation failed after retries".to_string()
    })))
}
