//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs, helpers to extract
//! and validate JSON bodies in handlers, and the bridge that moves
//! CPU-bound proof work off the async runtime.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Business rules beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Run setup, proving or verification on the blocking pool.
pub async fn run_blocking<T, E, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    AppError: From<E>,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))?
        .map_err(AppError::from)
}

/// `http`/`https` URL check for webhook targets.
pub fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{field} must use http or https, not {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_scheme_is_checked() {
        assert!(validate_http_url("callback_url", "https://rp.example/hook").is_ok());
        assert!(validate_http_url("callback_url", "ftp://rp.example").is_err());
        assert!(validate_http_url("callback_url", "not a url").is_err());
    }

    #[tokio::test]
    async fn blocking_errors_are_converted() {
        let ok: Result<u8, AppError> = run_blocking(|| Ok::<_, AppError>(7)).await;
        assert_eq!(ok.unwrap(), 7);
        let err = run_blocking(|| Err::<u8, _>(AppError::BadRequest("no".into()))).await;
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }
}
