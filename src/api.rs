use reqwest::multipart;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{PostCreated, SubmissionDraft};

/// Error body the board API returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Thin reqwest client for the board's content API.
///
/// Two endpoints, both multipart: create a thread on a board, or reply to an
/// existing thread. Empty draft fields are omitted from the body entirely.
#[derive(Clone)]
pub struct ContentApi {
    http: reqwest::Client,
    base_url: String,
}

impl ContentApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// `POST /api/{board}/threads`
    pub async fn create_thread(&self, board: &str, draft: &SubmissionDraft) -> Result<PostCreated> {
        let url = format!("{}/api/{}/threads", self.base_url, board);
        self.submit(&url, draft, true).await
    }

    /// `POST /api/{board}/threads/{thread_no}/posts`
    pub async fn create_post(
        &self,
        board: &str,
        thread_no: u64,
        draft: &SubmissionDraft,
    ) -> Result<PostCreated> {
        let url = format!("{}/api/{}/threads/{}/posts", self.base_url, board, thread_no);
        self.submit(&url, draft, false).await
    }

    async fn submit(
        &self,
        url: &str,
        draft: &SubmissionDraft,
        include_subject: bool,
    ) -> Result<PostCreated> {
        let mut form = multipart::Form::new();

        if !draft.content.is_empty() {
            form = form.text("content", draft.content.clone());
        }
        if !draft.author.is_empty() {
            form = form.text("author", draft.author.clone());
        }
        if !draft.email.is_empty() {
            form = form.text("email", draft.email.clone());
        }
        // Replies have no subject field
        if include_subject && !draft.subject.is_empty() {
            form = form.text("subject", draft.subject.clone());
        }
        if !draft.tripcode_password.is_empty() {
            form = form.text("tripcode_password", draft.tripcode_password.clone());
        }
        if let Some(image) = &draft.image {
            let part = multipart::Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime_type)?;
            form = form.part("image", part);
        }

        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();

        if status.is_success() {
            let created = response.json::<PostCreated>().await?;
            Ok(created)
        } else {
            // The API reports failures as {"error": "..."}; anything else
            // (HTML error page, empty body) is a transport-level failure.
            let body = response.json::<ApiErrorBody>().await?;
            tracing::debug!("Submission rejected ({}): {}", status, body.error);
            if body.error.is_empty() {
                Err(AppError::Rejected("Failed to submit post".to_string()))
            } else {
                Err(AppError::Rejected(body.error))
            }
        }
    }
}
