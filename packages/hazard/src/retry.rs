//! HTTP retry for hazard data requests.
//!
//! Route scoring happens while a pedestrian waits for an answer, so the
//! retry budget is small: two retries with a short exponential backoff
//! (250 ms, 500 ms). Rate limiting (429), server errors (5xx) and
//! connection-level failures are retried. Other 4xx responses are returned
//! immediately as [`HazardError::Status`] with the body attached, since
//! callers inspect `PostgREST` error codes.
//!
//! Callers give a total time budget for a lookup. Each attempt gets an equal
//! share of what is left after the backoff sleeps (see [`attempt_timeout`]),
//! so a slow first attempt still leaves room for the retries.

use std::time::Duration;

use crate::HazardError;

/// Retries after the first attempt.
const MAX_RETRIES: u32 = 2;

/// Base backoff delay, doubled on every retry.
const BASE_DELAY_MS: u64 = 125;

/// Maximum length of a response body kept in an error.
const BODY_PREVIEW_LEN: usize = 500;

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << attempt)
}

/// Timeout for a single attempt when the whole retry sequence, backoff
/// included, must finish within `budget`.
///
/// A budget too small to cover the backoff is handed to a single attempt.
#[must_use]
pub fn attempt_timeout(budget: Duration) -> Duration {
    let backoff: Duration = (1..=MAX_RETRIES).map(backoff_delay).sum();
    let remaining = budget.saturating_sub(backoff);
    if remaining.is_zero() {
        budget
    } else {
        remaining / (MAX_RETRIES + 1)
    }
}

/// Sends the request built by `build_request` and parses the body as JSON.
///
/// `build_request` is called once per attempt because request builders are
/// consumed by `send()`.
///
/// # Errors
///
/// Returns [`HazardError`] if every attempt fails, the server answers with a
/// non-retryable status, or the body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, HazardError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<HazardError> = None;

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    last_error = Some(HazardError::Http(e));
                    continue;
                }
                return Err(HazardError::Http(e));
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = preview(response.text().await.unwrap_or_default());
            if attempt < MAX_RETRIES {
                log::warn!("  HTTP {status}");
                last_error = Some(HazardError::Status {
                    status: status.as_u16(),
                    body,
                });
                continue;
            }
            return Err(HazardError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if status.is_client_error() {
            let body = preview(response.text().await.unwrap_or_default());
            return Err(HazardError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        return serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "JSON parse failed: {e}\n  body preview: {}",
                preview(text.clone())
            );
            HazardError::Json(e)
        });
    }

    Err(last_error.unwrap_or_else(|| HazardError::UnexpectedResponse {
        message: "request failed after all retries".to_string(),
    }))
}

fn preview(mut text: String) -> String {
    if text.len() > BODY_PREVIEW_LEN {
        let mut cut = BODY_PREVIEW_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
