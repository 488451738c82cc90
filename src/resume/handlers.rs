use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    resume::extract::ExtractError,
    state::AppState,
};

const RESUME_FIELD: &str = "resume";
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/parse-resume", post(parse_resume))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResume {
    pub success: bool,
    pub text: String,
    pub num_pages: u32,
    pub ats_keywords: String,
}

#[instrument(skip(state, multipart))]
pub async fn parse_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ParsedResume>> {
    let no_file = || AppError::validation("No file uploaded");
    let mut multipart = multipart.map_err(|e| {
        warn!(error = %e, "parse-resume without multipart body");
        no_file()
    })?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        no_file()
    })? {
        if field.name() == Some(RESUME_FIELD) {
            let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
            let data = field.bytes().await.map_err(|e| {
                warn!(error = %e, "failed to read upload");
                no_file()
            })?;
            upload = Some((file_name, data));
            break;
        }
    }
    let (file_name, data) = upload.filter(|(_, d)| !d.is_empty()).ok_or_else(no_file)?;
    info!(%file_name, bytes = data.len(), "resume received");

    let extracted = state.resume_text.extract(&file_name, data).await.map_err(|e| {
        error!(error = %e, "resume text extraction failed");
        match e {
            ExtractError::Status(code) => AppError::Processing(format!("Failed to parse PDF ({code})")),
            _ => AppError::Processing("Failed to parse PDF".into()),
        }
    })?;

    let ats_keywords = match state.keywords.keywords(&extracted.text).await {
        Ok(k) => k,
        Err(e) => {
            warn!(error = %e, "keyword extraction failed; continuing without keywords");
            String::new()
        }
    };

    Ok(Json(ParsedResume {
        success: true,
        text: extracted.text,
        num_pages: extracted.num_pages,
        ats_keywords,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{
        app::build_app,
        config::ResumeConfig,
        resume::extract::{
            fake::{FakeKeywordExtractor, FakeTextExtractor},
            ExtractedText, HttpTextExtractor,
        },
        state::AppState,
    };

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_body(field: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"cv.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        )
    }

    async fn upload(state: AppState, body: String) -> (StatusCode, Value) {
        let res = build_app(state)
            .oneshot(
                Request::post("/parse-resume")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn parses_and_extracts_keywords() {
        let (status, body) = upload(AppState::fake(), multipart_body("resume", "%PDF-1.4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["numPages"], 1);
        assert_eq!(body["atsKeywords"], "Rust, SQL");
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let (status, body) = upload(AppState::fake(), multipart_body("other", "%PDF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn extraction_failure_is_500() {
        let mut state = AppState::fake();
        state.resume_text = Arc::new(FakeTextExtractor { text: None });
        let (status, body) = upload(state, multipart_body("resume", "garbage")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Failed to parse PDF"));
    }

    #[tokio::test]
    async fn unreachable_extractor_does_not_leak_its_address() {
        let mut state = AppState::fake();
        state.resume_text = Arc::new(
            HttpTextExtractor::new(&ResumeConfig {
                extractor_url: "http://127.0.0.1:1".into(),
                groq_api_key: None,
                groq_base_url: "http://127.0.0.1:1".into(),
                groq_model: "test".into(),
                timeout_secs: 2,
            })
            .unwrap(),
        );
        let (status, body) = upload(state, multipart_body("resume", "%PDF")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to parse PDF");
        assert!(!body.to_string().contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn keyword_failure_degrades_to_empty() {
        let mut state = AppState::fake();
        state.resume_text = Arc::new(FakeTextExtractor {
            text: Some(ExtractedText { text: "hello".into(), num_pages: 3 }),
        });
        state.keywords = Arc::new(FakeKeywordExtractor { keywords: None });
        let (status, body) = upload(state, multipart_body("resume", "%PDF")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "hello");
        assert_eq!(body["numPages"], 3);
        assert_eq!(body["atsKeywords"], "");
    }
}
