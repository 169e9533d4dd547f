use std::sync::Arc;

use crate::api::ContentApi;
use crate::constants::{
    MAX_AUTHOR_LEN, MAX_CONTENT_LEN, MAX_IMAGE_SIZE, MAX_SUBJECT_LEN, MAX_TRIPCODE_PASSWORD_LEN,
};
use crate::cooldown::{format_remaining, Clock, CooldownTracker, Countdown, SystemClock};
use crate::error::{AppError, Result};
use crate::models::{
    CooldownKey, CooldownStatus, FormState, PostCreated, SubmissionDraft, SubmitOutcome,
};

type PostedCallback = Box<dyn Fn(&PostCreated) + Send + Sync>;

/// The post form state machine.
///
/// `Collapsed` (hidden) -> `Editing` (composing) -> `Submitting` (request in
/// flight) -> back to `Collapsed` on success or `Editing` on failure. The
/// draft survives failed submissions so the user can retry without retyping;
/// it is cleared only after the API confirms acceptance.
///
/// Submission is gated twice: an empty draft is rejected, and the cooldown
/// tracker is re-checked at the moment of submit. The tracker is armed only
/// after a confirmed success, never on a failed attempt.
pub struct PostForm {
    api: ContentApi,
    tracker: CooldownTracker,
    clock: Arc<dyn Clock>,
    key: CooldownKey,
    state: FormState,
    draft: SubmissionDraft,
    on_posted: Option<PostedCallback>,
}

impl PostForm {
    pub fn new(api: ContentApi, tracker: CooldownTracker, key: CooldownKey) -> Self {
        Self::with_clock(api, tracker, key, Arc::new(SystemClock))
    }

    pub fn with_clock(
        api: ContentApi,
        tracker: CooldownTracker,
        key: CooldownKey,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            tracker,
            clock,
            key,
            state: FormState::Collapsed,
            draft: SubmissionDraft::default(),
            on_posted: None,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn key(&self) -> &CooldownKey {
        &self.key
    }

    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    /// Register a callback invoked with the created post on every success.
    pub fn on_posted(&mut self, callback: impl Fn(&PostCreated) + Send + Sync + 'static) {
        self.on_posted = Some(Box::new(callback));
    }

    /// Show the form. No-op unless currently collapsed.
    pub fn open(&mut self) {
        if self.state == FormState::Collapsed {
            self.state = FormState::Editing;
        }
    }

    /// Hide the form and discard the draft. No-op while a request is in
    /// flight; the submission runs to completion first.
    pub fn cancel(&mut self) {
        if self.state == FormState::Editing {
            self.draft = SubmissionDraft::default();
            self.state = FormState::Collapsed;
        }
    }

    /// Mutable access to the draft, only while editing. Returns `None` in any
    /// other state so a request in flight can never see its draft change.
    pub fn draft_mut(&mut self) -> Option<&mut SubmissionDraft> {
        if self.state == FormState::Editing {
            Some(&mut self.draft)
        } else {
            None
        }
    }

    /// Point the form at a different target and report its cooldown status.
    ///
    /// Any countdown obtained for the old key should be dropped by the caller;
    /// its ticks refer to a bucket this form no longer submits to.
    pub async fn retarget(&mut self, key: CooldownKey) -> CooldownStatus {
        self.key = key;
        self.status().await
    }

    /// Current cooldown status for this form's target.
    pub async fn status(&self) -> CooldownStatus {
        self.tracker.status(&self.key, self.clock.now_millis()).await
    }

    /// Start a one-second countdown for this form's target.
    pub async fn countdown(&self) -> Countdown {
        self.tracker.watch(self.key.clone(), self.clock.clone()).await
    }

    /// Validate, check the rate limit, and submit the draft.
    ///
    /// Local rejections (validation, cooldown) leave the state untouched and
    /// never reach the network. On success the draft is cleared, the tracker
    /// armed, and the form collapses; new threads additionally yield the
    /// redirect path to the created thread.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        if self.state != FormState::Editing {
            return Err(AppError::InvalidState("form is not open for editing"));
        }

        self.validate()?;

        let status = self.status().await;
        if status.limited {
            return Err(AppError::RateLimited(format_remaining(status.remaining_millis)));
        }

        self.state = FormState::Submitting;

        let result = match &self.key {
            CooldownKey::NewThread { board } => self.api.create_thread(board, &self.draft).await,
            CooldownKey::Reply { board, thread_no } => {
                self.api.create_post(board, *thread_no, &self.draft).await
            }
        };

        match result {
            Ok(created) => {
                // Cooldown starts only once the API has accepted the post
                self.tracker.arm(&self.key, self.clock.now_millis()).await;
                self.draft = SubmissionDraft::default();
                self.state = FormState::Collapsed;

                if let Some(callback) = &self.on_posted {
                    callback(&created);
                }

                let redirect = match &self.key {
                    CooldownKey::NewThread { board } => match created.thread_number {
                        Some(no) => Some(format!("/{}/thread/{}", board, no)),
                        None => {
                            tracing::warn!("Thread created but response had no threadNumber");
                            None
                        }
                    },
                    CooldownKey::Reply { .. } => None,
                };

                Ok(SubmitOutcome { created, redirect })
            }
            Err(e) => {
                // Draft is preserved for retry
                self.state = FormState::Editing;
                Err(e)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.draft.is_empty() {
            return Err(AppError::Validation(
                "Please enter content or select an image".to_string(),
            ));
        }
        if self.draft.content.chars().count() > MAX_CONTENT_LEN {
            return Err(AppError::Validation(format!(
                "Comment is too long (max {} characters)",
                MAX_CONTENT_LEN
            )));
        }
        if self.draft.author.chars().count() > MAX_AUTHOR_LEN {
            return Err(AppError::Validation(format!(
                "Name is too long (max {} characters)",
                MAX_AUTHOR_LEN
            )));
        }
        if self.draft.tripcode_password.chars().count() > MAX_TRIPCODE_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Tripcode password is too long (max {} characters)",
                MAX_TRIPCODE_PASSWORD_LEN
            )));
        }
        if self.draft.subject.chars().count() > MAX_SUBJECT_LEN {
            return Err(AppError::Validation(format!(
                "Subject is too long (max {} characters)",
                MAX_SUBJECT_LEN
            )));
        }
        if let Some(image) = &self.draft.image {
            if image.bytes.len() > MAX_IMAGE_SIZE {
                return Err(AppError::Validation(format!(
                    "Image is too large (max {}MB)",
                    MAX_IMAGE_SIZE / (1024 * 1024)
                )));
            }
        }
        Ok(())
    }
}
