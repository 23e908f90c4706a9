//! Session controller for voice enrollment and verification.
//!
//! The core of the client: acquires an audio asset (file pick,
//! drag-and-drop, or live capture), validates and stages it, drives exactly
//! one in-flight request against the recognition backend, and keeps a
//! locally cached user directory consistent with server-side enrollment.
//!
//! The crate splits into a pure state machine and an async driver:
//!
//! - [`Session`] is a plain value with explicit transitions
//!   (stage / submit / resolve / switch mode) and a request-generation
//!   token that silently discards stale completions.
//! - [`SessionController`] runs the session in a single task, polling at
//!   most one submission future alongside its command channel, and owns
//!   the [`Directory`] cache and gateway client.
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use voiceid_gateway::Client;
//! use voiceid_session::{acquire_picked, SessionController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:5000")?;
//!     let handle = SessionController::new(client).spawn();
//!
//!     handle.reload_directory().await?;
//!     let wav = Bytes::from(std::fs::read("sample.wav")?);
//!     handle.stage(acquire_picked(wav, "audio/wav", "sample.wav")?).await?;
//!     handle.set_subject("alice").await?;
//!
//!     if let Some(outcome) = handle.submit().await? {
//!         println!("{outcome:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod asset;
mod controller;
mod directory;
mod error;
mod session;

pub use asset::{
    acquire_dropped, acquire_picked, acquire_recording, AssetMeta, AssetOrigin, AudioAsset,
};
pub use controller::{ControllerHandle, SessionController};
pub use directory::Directory;
pub use error::{Result, SessionError, ValidationError};
pub use session::{
    Mode, Outcome, RequestState, Session, SessionSnapshot, SessionState, SubmitRequest,
};
