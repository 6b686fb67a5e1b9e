//! Axum route handler for CV uploads.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::cv::Cv;
use crate::state::AppState;
use crate::upload::parser::{extract_text, is_allowed_mime, resolve_mime, DocumentKind};

/// Multipart field carrying the CV.
pub const FILE_FIELD: &str = "file";

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

/// POST /api/v1/upload
///
/// Accepts a PDF, DOCX, DOC or TXT file and returns the CV with its extracted text.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Cv>, AppError> {
    let max_bytes = state.config.max_upload_bytes;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("cv").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;
        upload = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
        break;
    }

    let upload = upload.ok_or_else(|| AppError::Validation("No file found".to_string()))?;

    if upload.data.len() > max_bytes {
        return Err(too_large(max_bytes));
    }

    let mime = resolve_mime(upload.content_type.as_deref(), &upload.file_name);
    if !is_allowed_mime(&mime) {
        warn!(file_name = %upload.file_name, %mime, "Rejected upload with unsupported type");
        return Err(AppError::Validation(
            "Unsupported file format. Use PDF, DOCX, DOC or TXT".to_string(),
        ));
    }

    let kind = DocumentKind::from_mime(&mime)?;
    let file_size = upload.data.len() as u64;
    let content = extract_text(upload.data, kind).await?;

    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "File content could not be read or is empty".to_string(),
        ));
    }

    let cv = Cv::new(upload.file_name, content, file_size, mime);
    info!(
        cv_id = %cv.id,
        file_name = %cv.file_name,
        file_size = cv.file_size,
        chars = cv.content.len(),
        "CV uploaded"
    );

    Ok(Json(cv))
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::Validation(format!(
        "File size cannot exceed {}MB",
        max_bytes.div_ceil(1024 * 1024)
    ))
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        AppError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::{build_router, MULTIPART_OVERHEAD_BYTES};
    use crate::upload::parser::{build_docx, MIME_DOCX, MIME_PDF, MIME_TEXT};

    const BOUNDARY: &str = "cvmatch-test-boundary";

    fn multipart_body(
        field: &str,
        file_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
                .as_bytes(),
        );
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn upload(state: AppState, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn state() -> AppState {
        AppState::for_tests(None)
    }

    #[tokio::test]
    async fn test_text_upload_returns_cv() {
        let body = multipart_body(
            "file",
            "jane.txt",
            Some(MIME_TEXT),
            b"Jane Doe\nRust, Go, Kubernetes",
        );
        let (status, json) = upload(state(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["id"].as_str().unwrap().starts_with("cv-"));
        assert_eq!(json["fileName"], "jane.txt");
        assert_eq!(json["fileType"], MIME_TEXT);
        assert_eq!(json["fileSize"], 29);
        assert!(json["content"].as_str().unwrap().contains("Kubernetes"));
        assert!(json["uploadedAt"].is_string());
    }

    #[tokio::test]
    async fn test_docx_upload_extracts_text() {
        let docx = build_docx(
            r#"<w:document><w:body><w:p><w:r><w:t>Senior Go developer</w:t></w:r></w:p></w:body></w:document>"#,
        );
        let body = multipart_body("file", "cv.docx", Some(MIME_DOCX), &docx);
        let (status, json) = upload(state(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["content"], "Senior Go developer");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_inferred_from_extension() {
        let body = multipart_body("file", "notes.txt", None, b"Python developer");
        let (status, json) = upload(state(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fileType"], MIME_TEXT);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_400() {
        let body = multipart_body("attachment", "cv.txt", Some(MIME_TEXT), b"hello");
        let (status, json) = upload(state(), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "No file found");
    }

    #[tokio::test]
    async fn test_unsupported_type_is_400() {
        let body = multipart_body("file", "photo.png", Some("image/png"), b"\x89PNG");
        let (status, json) = upload(state(), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Unsupported file format"));
    }

    #[tokio::test]
    async fn test_oversized_file_is_400() {
        let mut state = state();
        state.config.max_upload_bytes = 1024;
        let body = multipart_body("file", "big.txt", Some(MIME_TEXT), &vec![b'a'; 2048]);
        let (status, json) = upload(state, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("File size cannot exceed"));
    }

    #[tokio::test]
    async fn test_body_over_router_limit_is_400() {
        let mut state = state();
        state.config.max_upload_bytes = 1024;
        let data = vec![b'a'; 1024 + MULTIPART_OVERHEAD_BYTES + 4096];
        let body = multipart_body("file", "huge.txt", Some(MIME_TEXT), &data);
        let (status, json) = upload(state, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "File size cannot exceed 1MB");
    }

    #[tokio::test]
    async fn test_blank_text_is_400() {
        let body = multipart_body("file", "empty.txt", Some(MIME_TEXT), b"  \n\t ");
        let (status, json) = upload(state(), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"],
            "File content could not be read or is empty"
        );
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_422() {
        let body = multipart_body("file", "cv.pdf", Some(MIME_PDF), b"%PDF-broken");
        let (status, json) = upload(state(), body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "UNPROCESSABLE_ENTITY");
    }
}
