//! Domain calls: venue directory and session submission.

use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Deserialize;

use sesh_core::{MediaPart, SessionPayload, Venue};

use crate::{api_prefix, ApiClient, SubmitError};

/// Success response of the submission endpoint. Only `message` is
/// contractual; the id is kept when the backend sends one.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ApiClient {
    /// List surf spots for free surf sessions.
    pub async fn list_locations(&self) -> Result<Vec<Venue>, SubmitError> {
        self.get_json(&format!("{}/locations", api_prefix())).await
    }

    /// List surf schools for lesson sessions.
    pub async fn list_schools(&self) -> Result<Vec<Venue>, SubmitError> {
        self.get_json(&format!("{}/schools", api_prefix())).await
    }

    /// Submit an assembled session in one multipart request.
    ///
    /// All-or-nothing: there is no partial upload and no resume; a failed
    /// attempt is retried wholesale by the caller.
    pub async fn submit_session(
        &self,
        payload: &SessionPayload,
    ) -> Result<SubmitResponse, SubmitError> {
        if !payload.is_aligned() {
            return Err(SubmitError::MisalignedPayload);
        }

        let form = build_submission_form(payload)?;
        tracing::info!(
            items = payload.item_count(),
            photos = payload.fields.photo_count,
            videos = payload.fields.video_count,
            thumbnails = payload.thumbnails.len(),
            "Submitting session"
        );

        self.post_multipart(&format!("{}/sessions", api_prefix()), form)
            .await
    }
}

fn binary_part(part: &MediaPart) -> Result<Part, SubmitError> {
    Part::stream(Body::from(part.bytes.clone()))
        .file_name(part.file_name.clone())
        .mime_str(&part.content_type)
        .map_err(|_| SubmitError::InvalidPart(part.content_type.clone()))
}

pub(crate) fn build_submission_form(payload: &SessionPayload) -> Result<Form, SubmitError> {
    let mut form = Form::new();

    for part in &payload.media {
        form = form.part("media[]", binary_part(part)?);
    }
    for part in &payload.previews {
        form = form.part("previews[]", binary_part(part)?);
    }
    for part in &payload.thumbnails {
        form = form.part("thumbnails[]", binary_part(part)?);
    }

    let fields = &payload.fields;
    let form = form
        .text("widths", serde_json::to_string(&payload.widths)?)
        .text("heights", serde_json::to_string(&payload.heights)?)
        .text("venue_id", fields.venue_id.clone())
        .text("date", fields.date.clone())
        .text("start_hour", fields.start_hour.clone())
        .text("end_hour", fields.end_hour.clone())
        .text("photo_price", fields.photo_price.to_string())
        .text("video_price", fields.video_price.to_string())
        .text("kind", fields.kind.to_string())
        .text("photo_count", fields.photo_count.to_string())
        .text("video_count", fields.video_count.to_string());

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rust_decimal::Decimal;
    use sesh_core::{SessionFields, SessionKind};

    fn part(file_name: &str, content_type: &str) -> MediaPart {
        MediaPart {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from_static(&[7; 16]),
        }
    }

    fn payload() -> SessionPayload {
        SessionPayload {
            media: vec![part("wave.jpg", "image/jpeg"), part("ride.mp4", "video/mp4")],
            previews: vec![
                part("preview_wave.jpg", "image/jpeg"),
                part("preview_ride.mp4", "video/mp4"),
            ],
            thumbnails: vec![part("cover_0.jpg", "image/jpeg")],
            widths: vec![4000, 1920],
            heights: vec![3000, 1080],
            fields: SessionFields {
                venue_id: "loc-3".to_string(),
                date: "2024-07-14".to_string(),
                start_hour: "8:00".to_string(),
                end_hour: "10:00".to_string(),
                photo_price: Decimal::new(900, 2),
                video_price: Decimal::new(1800, 2),
                kind: SessionKind::FreeSurf,
                photo_count: 1,
                video_count: 1,
            },
        }
    }

    #[test]
    fn test_submission_form_builds_for_aligned_payload() {
        let form = build_submission_form(&payload()).unwrap();
        assert!(!form.boundary().is_empty());
    }

    #[test]
    fn test_invalid_content_type_is_reported() {
        let mut payload = payload();
        payload.media[0].content_type = "not a mime type".to_string();
        let error = build_submission_form(&payload).unwrap_err();
        assert!(matches!(error, SubmitError::InvalidPart(_)));
    }

    #[tokio::test]
    async fn test_misaligned_payload_is_rejected_before_upload() {
        // Port 9 (discard) is never dialed: the check runs first.
        let client = ApiClient::new("http://127.0.0.1:9".to_string(), "token".to_string()).unwrap();
        let mut payload = payload();
        payload.widths.pop();

        let error = client.submit_session(&payload).await.unwrap_err();
        assert!(matches!(error, SubmitError::MisalignedPayload));
    }

    #[test]
    fn test_submit_response_tolerates_missing_session_id() {
        let response: SubmitResponse =
            serde_json::from_str(r#"{"message":"Session created"}"#).unwrap();
        assert_eq!(response.message, "Session created");
        assert!(response.session_id.is_none());
    }
}
