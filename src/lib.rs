//! Client-side posting toolkit for 4chan-style imageboards.
//!
//! Two pieces make up the core:
//!
//! - [`cooldown::CooldownTracker`]: per-target rate limiting over a persisted
//!   "last submission" timestamp, with a one-second [`cooldown::Countdown`]
//!   re-poll while a window is active.
//! - [`workflow::PostForm`]: the form state machine that collects a draft,
//!   gates submission on validation and the cooldown, posts it to the board's
//!   content API, and re-arms the cooldown on confirmed success.
//!
//! Persistence is injected through [`storage::CooldownStore`], so embedders
//! can use the durable [`storage::SqliteStore`] while tests run against
//! [`storage::MemoryStore`].

pub mod api;
pub mod config;
pub mod constants;
pub mod cooldown;
pub mod error;
pub mod models;
pub mod storage;
pub mod workflow;

pub use api::ContentApi;
pub use cooldown::{format_remaining, CooldownPolicy, CooldownTracker, Countdown};
pub use error::{AppError, Result};
pub use models::{
    AttachedImage, CooldownKey, CooldownStatus, FormState, PostCreated, SubmissionDraft,
    SubmitOutcome, TargetKind,
};
pub use storage::{CooldownStore, MemoryStore, SqliteStore};
pub use workflow::PostForm;
