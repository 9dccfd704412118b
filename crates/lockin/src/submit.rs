use chrono::Utc;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::meter::{Meter, Status, SubmitOutcome};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("relay rejected the notification with status {0}")]
    Rejected(StatusCode),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// Client side of the relay: one POST per submit, no retries.
pub struct Submitter {
    client: reqwest::Client,
    endpoint: String,
}

impl Submitter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Run one submit cycle for `meter`. The resulting status is shown on the
    /// meter whether or not the relay accepted the payload.
    pub async fn submit(&self, meter: &Meter) -> Result<Status, SubmitError> {
        let (level, payload) = meter.begin_submit(Utc::now()).ok_or(SubmitError::InFlight)?;
        info!(%level, endpoint = %self.endpoint, "submitting lock-in level");

        let result = match self.client.post(&self.endpoint).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(SubmitError::Rejected(resp.status())),
            Err(err) => Err(SubmitError::Transport(err)),
        };

        let outcome = match &result {
            Ok(()) => SubmitOutcome::Delivered,
            Err(SubmitError::Rejected(status)) => SubmitOutcome::Rejected(*status),
            Err(err) => SubmitOutcome::Failed(err.to_string()),
        };
        let status = meter.finish_submit(level, &outcome);
        if let Err(err) = &result {
            warn!(error = %err, "submission failed");
        }
        result.map(|()| status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LockinLevel;
    use crate::meter::StatusKind;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn delivered_submit_shows_notification_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Regex(
                r#""description":"\*\*Locked In Level: 95/100\*\*""#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let meter = Meter::default();
        meter.set_level(LockinLevel::new(95).unwrap());
        let submitter = Submitter::new(format!("{}/send", server.url()));

        let status = submitter.submit(&meter).await.unwrap();
        assert_eq!(status.kind, StatusKind::Success);
        assert_eq!(status.message, "✅ Get me in there! We're locked in!");
        assert_eq!(meter.status(), Some(status));
        assert!(!meter.is_submitting());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_submit_shows_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .with_status(500)
            .create_async()
            .await;

        let meter = Meter::default();
        let submitter = Submitter::new(format!("{}/send", server.url()));

        let err = submitter.submit(&meter).await.unwrap_err();
        assert_matches!(err, SubmitError::Rejected(status) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        });
        let shown = meter.status().unwrap();
        assert_eq!(shown.kind, StatusKind::Error);
        assert_eq!(shown.message, "❌ Failed to send. Check your webhook URL.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/send").expect(0).create_async().await;

        let meter = Meter::default();
        let _held = meter.begin_submit(Utc::now()).unwrap();
        let submitter = Submitter::new(format!("{}/send", server.url()));

        let err = submitter.submit(&meter).await.unwrap_err();
        assert_matches!(err, SubmitError::InFlight);
        assert!(meter.is_submitting());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transport_failure_shows_error_message() {
        let meter = Meter::default();
        let submitter = Submitter::new("http://127.0.0.1:9/send");

        let err = submitter.submit(&meter).await.unwrap_err();
        assert_matches!(err, SubmitError::Transport(_));
        let shown = meter.status().unwrap();
        assert!(shown.message.starts_with("❌ Error: "));
        assert!(!meter.is_submitting());
    }
}
