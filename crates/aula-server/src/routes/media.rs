//! Token-gated media streaming with HTTP range request support.
//!
//! The query-string token is the only credential on this route: the signed
//! URL handed out by the session issuer must work in a bare `<video>`
//! element, which cannot attach bearer headers. Verification happens at use
//! time -- signature first, then expiry, then the lecture binding, then a
//! fresh enrollment re-check for the viewer named in the claims. A token
//! minted for one lecture cannot fetch another, and revoking an enrollment
//! cuts off streaming even for tokens that are still unexpired.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use aula_core::Error;

use crate::access::{authorize, AccessDecision};
use crate::context::AppContext;
use crate::error::AppError;
use crate::signer::TokenError;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub token: String,
}

/// GET /api/media/stream/{lecture_id}?token=...
pub async fn stream_lecture(
    State(ctx): State<AppContext>,
    Path(lecture_id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let lecture_id: aula_core::LectureId = lecture_id
        .parse()
        .map_err(|_| Error::Validation("Invalid lecture ID".into()))?;

    // Capability check before anything touches the database.
    let claims = match ctx.issuer.signer().verify(&query.token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => return Err(Error::SessionExpired.into()),
        Err(TokenError::Invalid) => {
            return Err(Error::Unauthorized("Invalid playback token".into()).into())
        }
    };

    if claims.lecture_id != lecture_id {
        return Err(Error::Unauthorized("Token not valid for this lecture".into()).into());
    }

    // Re-check enrollment at use time; a lapsed approval kills streaming
    // even while the token is unexpired.
    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let lecture = aula_db::queries::lectures::get_lecture(&conn, lecture_id)?;
    let enrollment = match &lecture {
        Some(l) => aula_db::queries::enrollments::get_enrollment(&conn, claims.viewer_id, l.course_id)?
            .map(|e| e.status),
        None => None,
    };
    let lecture = match authorize(lecture.as_ref(), enrollment) {
        AccessDecision::Allow => lecture.expect("allow implies lecture exists"),
        AccessDecision::Deny(reason) => return Err(Error::denied(reason).into()),
    };

    if lecture.media_path.is_empty() {
        return Err(Error::not_found("video for lecture", lecture_id).into());
    }
    // Defense against traversal in stored paths.
    if lecture.media_path.contains("..") {
        return Err(Error::Validation("Invalid media path".into()).into());
    }

    let file_path = ctx.config.media.storage_dir.join(&lecture.media_path);

    let metadata = tokio::fs::metadata(&file_path)
        .await
        .map_err(|_| Error::not_found("media file", lecture_id))?;
    let file_size = metadata.len();

    let range = headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| parse_range_header(s, file_size));

    let content_type = content_type_for(&lecture.media_path);

    let response = match range {
        Some((start, end)) => {
            let length = end - start + 1;

            let mut file = File::open(&file_path)
                .await
                .map_err(|_| Error::not_found("media file", lecture_id))?;
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| Error::Internal(format!("seek failed: {e}")))?;

            let stream = ReaderStream::new(file.take(length));
            let body = Body::from_stream(stream);

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{file_size}"),
                )
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CACHE_CONTROL, "no-store")
                .body(body)
                .map_err(|e| Error::Internal(format!("response build failed: {e}")))?
        }
        None => {
            let file = File::open(&file_path)
                .await
                .map_err(|_| Error::not_found("media file", lecture_id))?;

            let stream = ReaderStream::new(file);
            let body = Body::from_stream(stream);

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, file_size.to_string())
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CACHE_CONTROL, "no-store")
                .body(body)
                .map_err(|e| Error::Internal(format!("response build failed: {e}")))?
        }
    };

    Ok(response.into_response())
}

/// Parse HTTP Range header.
///
/// Supports formats:
/// - bytes=0-499
/// - bytes=500-
/// - bytes=-500 (last 500 bytes)
fn parse_range_header(header: &str, file_size: u64) -> Option<(u64, u64)> {
    let header = header.strip_prefix("bytes=")?;

    let (start, end) = header.split_once('-')?;
    let start = start.trim();
    let end = end.trim();

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let suffix_len: u64 = end.parse().ok()?;
            if suffix_len == 0 {
                return None;
            }
            let start = file_size.saturating_sub(suffix_len);
            Some((start, file_size.checked_sub(1)?))
        }
        // bytes=500- (from 500 to end)
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            if start >= file_size {
                return None;
            }
            Some((start, file_size - 1))
        }
        // bytes=0-499
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if start >= file_size {
                return None;
            }
            let end = end.min(file_size - 1);
            if start > end {
                return None;
            }
            Some((start, end))
        }
        // bytes=- (invalid)
        (true, true) => None,
    }
}

/// Determine content type from the media file extension.
fn content_type_for(media_path: &str) -> &'static str {
    let ext = media_path.rsplit('.').next().unwrap_or("");
    match ext.to_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "m3u8" => "application/vnd.apple.mpegurl",
        "ts" => "video/mp2t",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_full() {
        assert_eq!(parse_range_header("bytes=0-499", 1000), Some((0, 499)));
    }

    #[test]
    fn range_open_end() {
        assert_eq!(parse_range_header("bytes=500-", 1000), Some((500, 999)));
    }

    #[test]
    fn range_suffix() {
        assert_eq!(parse_range_header("bytes=-200", 1000), Some((800, 999)));
    }

    #[test]
    fn range_clamped_to_file_size() {
        assert_eq!(parse_range_header("bytes=0-2000", 1000), Some((0, 999)));
    }

    #[test]
    fn range_invalid_start() {
        assert_eq!(parse_range_header("bytes=1500-", 1000), None);
    }

    #[test]
    fn range_invalid_format() {
        assert_eq!(parse_range_header("bytes=-", 1000), None);
        assert_eq!(parse_range_header("bytes=abc-def", 1000), None);
        assert_eq!(parse_range_header("octets=0-1", 1000), None);
    }

    #[test]
    fn range_zero_suffix() {
        assert_eq!(parse_range_header("bytes=-0", 1000), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("intro.mp4"), "video/mp4");
        assert_eq!(content_type_for("playlist.m3u8"), "application/vnd.apple.mpegurl");
        assert_eq!(content_type_for("seg.ts"), "video/mp2t");
        assert_eq!(content_type_for("clip.webm"), "video/webm");
        assert_eq!(content_type_for("unknown.bin"), "application/octet-stream");
    }
}
