use serde::Deserialize;

use crate::constants::STORAGE_KEY_PREFIX;

/// What a submission is aimed at: an existing thread or a brand new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    NewThread,
    Thread,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::NewThread => write!(f, "newThread"),
            TargetKind::Thread => write!(f, "thread"),
        }
    }
}

/// Identifies a rate-limit bucket: one per (board, optional thread) target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CooldownKey {
    NewThread { board: String },
    Reply { board: String, thread_no: u64 },
}

impl CooldownKey {
    pub fn new_thread(board: impl Into<String>) -> Self {
        CooldownKey::NewThread { board: board.into() }
    }

    pub fn reply(board: impl Into<String>, thread_no: u64) -> Self {
        CooldownKey::Reply { board: board.into(), thread_no }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            CooldownKey::NewThread { .. } => TargetKind::NewThread,
            CooldownKey::Reply { .. } => TargetKind::Thread,
        }
    }

    pub fn board(&self) -> &str {
        match self {
            CooldownKey::NewThread { board } => board,
            CooldownKey::Reply { board, .. } => board,
        }
    }

    /// Serialized form used as the persisted record key. Injective over
    /// (kind, board, thread): the thread number segment only appears for
    /// replies, and the two kinds spell differently.
    pub fn storage_key(&self) -> String {
        match self {
            CooldownKey::NewThread { board } => {
                format!("{}{}_{}", STORAGE_KEY_PREFIX, TargetKind::NewThread, board)
            }
            CooldownKey::Reply { board, thread_no } => {
                format!("{}{}_{}_{}", STORAGE_KEY_PREFIX, TargetKind::Thread, board, thread_no)
            }
        }
    }
}

/// Result of a cooldown check at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownStatus {
    pub limited: bool,
    pub remaining_millis: u64,
}

impl CooldownStatus {
    pub fn clear() -> Self {
        Self { limited: false, remaining_millis: 0 }
    }
}

/// Image blob attached to a draft.
#[derive(Debug, Clone)]
pub struct AttachedImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// The in-memory contents of the post form. Ephemeral: cleared on a
/// successful submission, preserved across failed ones so the user can retry.
#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    pub content: String,
    pub author: String,
    pub email: String,
    pub subject: String,
    pub tripcode_password: String,
    pub image: Option<AttachedImage>,
}

impl SubmissionDraft {
    /// A draft with neither text nor an image has nothing to submit.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.image.is_none()
    }
}

/// Success payload returned by the board API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreated {
    pub thread_number: Option<u64>,
    pub post_number: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// What a successful submission produced, plus where to navigate for
/// freshly created threads.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub created: PostCreated,
    pub redirect: Option<String>,
}

/// Form lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Collapsed,
    Editing,
    Submitting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_for_new_thread() {
        let key = CooldownKey::new_thread("g");
        assert_eq!(key.storage_key(), "postform_last_newThread_g");
        assert_eq!(key.kind(), TargetKind::NewThread);
    }

    #[test]
    fn storage_key_for_reply() {
        let key = CooldownKey::reply("a", 7);
        assert_eq!(key.storage_key(), "postform_last_thread_a_7");
        assert_eq!(key.kind(), TargetKind::Thread);
        assert_eq!(key.board(), "a");
    }

    #[test]
    fn empty_draft_detection() {
        let mut draft = SubmissionDraft::default();
        assert!(draft.is_empty());

        draft.content = "hello".to_string();
        assert!(!draft.is_empty());

        draft.content.clear();
        draft.image = Some(AttachedImage {
            file_name: "cat.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![0u8; 4],
        });
        assert!(!draft.is_empty());
    }
}
