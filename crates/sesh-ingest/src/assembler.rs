use thiserror::Error;

use sesh_core::{
    hour_label, preview_file_name, ItemState, MediaKind, MediaPart, PublishGate, SessionDraft,
    SessionFields, SessionPayload, UploadItem,
};
use sesh_processing::image::CoverThumbnailGenerator;

#[derive(Debug, Error)]
pub enum AssembleError {
    /// The publish gate still reports blockers.
    #[error("Session is not ready to submit: {0}")]
    NotReady(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The gate passed but an item is not settled ready; indicates a race
    /// with a concurrent admit or remove.
    #[error("Item {file_name} has no preview")]
    ItemNotReady { file_name: String },
}

/// Builds the one multipart submission payload from a settled item list.
///
/// Everything per-item is produced in a single pass over a single
/// snapshot, which is what keeps originals, previews and dimension arrays
/// index-aligned through any reorder or removal that happened before
/// submission.
pub struct SessionAssembler {
    thumbnails: CoverThumbnailGenerator,
}

impl SessionAssembler {
    pub fn new(thumbnails: CoverThumbnailGenerator) -> Self {
        Self { thumbnails }
    }

    pub fn assemble(
        &self,
        draft: &SessionDraft,
        items: &[UploadItem],
    ) -> Result<SessionPayload, AssembleError> {
        let blockers = PublishGate::evaluate(draft, items);
        if !blockers.is_empty() {
            let summary = blockers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AssembleError::NotReady(summary));
        }

        let venue = draft
            .venue
            .as_ref()
            .ok_or(AssembleError::MissingField("venue"))?;
        let date = draft.date.ok_or(AssembleError::MissingField("date"))?;
        let start_hour = draft
            .start_hour
            .ok_or(AssembleError::MissingField("start_hour"))?;
        let end_hour = draft
            .end_hour
            .ok_or(AssembleError::MissingField("end_hour"))?;

        let mut media = Vec::with_capacity(items.len());
        let mut previews = Vec::with_capacity(items.len());
        let mut widths = Vec::with_capacity(items.len());
        let mut heights = Vec::with_capacity(items.len());
        let mut photo_count = 0;
        let mut video_count = 0;

        for item in items {
            let ItemState::Ready(asset) = &item.state else {
                return Err(AssembleError::ItemNotReady {
                    file_name: item.source.file_name.clone(),
                });
            };

            match item.kind() {
                MediaKind::Image => photo_count += 1,
                MediaKind::Video => video_count += 1,
            }

            media.push(MediaPart {
                file_name: item.source.file_name.clone(),
                content_type: item.source.content_type.clone(),
                bytes: item.source.bytes.clone(),
            });
            previews.push(MediaPart {
                file_name: preview_file_name(&item.source.file_name, item.kind()),
                content_type: asset.preview.content_type().to_string(),
                bytes: asset.preview.bytes().clone(),
            });
            widths.push(asset.dimensions.width);
            heights.push(asset.dimensions.height);
        }

        let thumbnails = self.thumbnails.generate(items);

        tracing::debug!(
            items = media.len(),
            photos = photo_count,
            videos = video_count,
            thumbnails = thumbnails.len(),
            "Assembled session payload"
        );

        Ok(SessionPayload {
            media,
            previews,
            thumbnails,
            widths,
            heights,
            fields: SessionFields {
                venue_id: venue.id().to_string(),
                date: date.format("%Y-%m-%d").to_string(),
                start_hour: hour_label(start_hour),
                end_hour: hour_label(end_hour),
                photo_price: draft.photo_price,
                video_price: draft.video_price,
                kind: draft.kind,
                photo_count,
                video_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::NaiveDate;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use rust_decimal::Decimal;
    use sesh_core::{
        Dimensions, IngestConfig, PreviewAsset, ReadyAsset, SessionKind, SourceFile, VenueRef,
    };
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([90, 160, 220, 255]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        Bytes::from(buffer.into_inner())
    }

    fn ready_item(file_name: &str, kind: MediaKind) -> UploadItem {
        let (content_type, bytes, preview) = match kind {
            MediaKind::Image => (
                "image/png",
                png_bytes(320, 240),
                PreviewAsset::Still(Bytes::from_static(b"still-preview")),
            ),
            MediaKind::Video => (
                "video/mp4",
                Bytes::from_static(b"source-video"),
                PreviewAsset::Clip(Bytes::from_static(b"clip-preview")),
            ),
        };

        let mut item = UploadItem::new(SourceFile {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            kind,
            bytes,
        });
        item.state = ItemState::Ready(ReadyAsset {
            preview,
            dimensions: Dimensions {
                width: 3840,
                height: 2160,
            },
            quality: None,
        });
        item
    }

    fn ready_items(images: usize, videos: usize) -> Vec<UploadItem> {
        let mut items: Vec<_> = (0..images)
            .map(|i| ready_item(&format!("wave_{:02}.png", i), MediaKind::Image))
            .collect();
        items.extend((0..videos).map(|i| ready_item(&format!("ride_{:02}.mp4", i), MediaKind::Video)));
        items
    }

    fn complete_draft() -> SessionDraft {
        let mut draft = SessionDraft::new(SessionKind::FreeSurf);
        draft.venue = Some(VenueRef::Location {
            id: "loc-42".to_string(),
        });
        draft.date = NaiveDate::from_ymd_opt(2024, 6, 1);
        draft.start_hour = Some(9);
        draft.end_hour = Some(11);
        draft.photo_price = Decimal::new(1250, 2);
        draft.video_price = Decimal::new(2500, 2);
        draft
    }

    fn assembler() -> SessionAssembler {
        SessionAssembler::new(CoverThumbnailGenerator::new(&IngestConfig::default()))
    }

    #[test]
    fn test_assemble_aligns_all_sequences() {
        let items = ready_items(20, 5);
        let payload = assembler().assemble(&complete_draft(), &items).unwrap();

        assert!(payload.is_aligned());
        assert_eq!(payload.item_count(), 25);
        assert_eq!(payload.fields.photo_count, 20);
        assert_eq!(payload.fields.video_count, 5);
        assert_eq!(payload.thumbnails.len(), 4);

        // previews mirror originals positionally
        assert_eq!(payload.media[0].file_name, "wave_00.png");
        assert_eq!(payload.previews[0].file_name, "preview_wave_00.jpg");
        assert_eq!(payload.media[20].file_name, "ride_00.mp4");
        assert_eq!(payload.previews[20].file_name, "preview_ride_00.mp4");
        assert_eq!(payload.widths[20], 3840);
        assert_eq!(payload.heights[20], 2160);
    }

    #[test]
    fn test_assemble_formats_scalar_fields() {
        let items = ready_items(20, 0);
        let payload = assembler().assemble(&complete_draft(), &items).unwrap();

        assert_eq!(payload.fields.venue_id, "loc-42");
        assert_eq!(payload.fields.date, "2024-06-01");
        assert_eq!(payload.fields.start_hour, "9:00");
        assert_eq!(payload.fields.end_hour, "11:00");
        assert_eq!(payload.fields.kind, SessionKind::FreeSurf);
        assert_eq!(payload.fields.photo_price, Decimal::new(1250, 2));
    }

    #[test]
    fn test_assemble_refuses_blocked_draft() {
        // 19 items is under the session minimum
        let items = ready_items(19, 0);
        let error = assembler()
            .assemble(&complete_draft(), &items)
            .unwrap_err();

        assert!(matches!(error, AssembleError::NotReady(_)));
        assert!(error.to_string().contains("fewer than 20 items"));
    }

    #[test]
    fn test_assemble_reflects_removal_in_every_sequence() {
        let mut items = ready_items(22, 3);
        let payload = assembler().assemble(&complete_draft(), &items).unwrap();
        assert_eq!(payload.item_count(), 25);
        let removed_width_slot = payload.widths.len();

        // drop one image as a user would before submitting
        items.remove(5);
        let payload = assembler().assemble(&complete_draft(), &items).unwrap();

        assert!(payload.is_aligned());
        assert_eq!(payload.item_count(), 24);
        assert_eq!(payload.widths.len(), removed_width_slot - 1);
        assert!(payload
            .media
            .iter()
            .all(|part| part.file_name != "wave_05.png"));
        assert!(payload
            .previews
            .iter()
            .all(|part| part.file_name != "preview_wave_05.jpg"));
        assert_eq!(payload.fields.photo_count, 21);
    }

    #[test]
    fn test_video_still_fallback_keeps_mp4_name_with_jpeg_content_type() {
        let mut items = ready_items(20, 0);
        let mut video = ready_item("ride.mp4", MediaKind::Video);
        video.state = ItemState::Ready(ReadyAsset {
            preview: PreviewAsset::Still(Bytes::from_static(b"fallback-frame")),
            dimensions: Dimensions {
                width: 1920,
                height: 1080,
            },
            quality: None,
        });
        items.push(video);

        let payload = assembler().assemble(&complete_draft(), &items).unwrap();
        let preview = payload.previews.last().unwrap();
        assert_eq!(preview.file_name, "preview_ride.mp4");
        assert_eq!(preview.content_type, "image/jpeg");
    }

    #[test]
    fn test_thumbnails_come_from_first_images_only() {
        let mut items = vec![ready_item("lead.mp4", MediaKind::Video)];
        items.extend(ready_items(24, 0));

        let payload = assembler().assemble(&complete_draft(), &items).unwrap();
        assert_eq!(payload.thumbnails.len(), 4);
        assert!(payload
            .thumbnails
            .iter()
            .enumerate()
            .all(|(i, part)| part.file_name == format!("cover_{}.jpg", i)));
    }
}
