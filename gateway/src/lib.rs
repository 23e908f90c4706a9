//! HTTP client for the voice recognition backend.
//!
//! The backend exposes three operations over HTTP with JSON and multipart
//! payloads: listing enrolled users, enrolling ("training") a WAV sample
//! under a name, and verifying ("predicting") a sample against a name.
//! This crate wraps them behind a typed [`Client`] so callers never branch
//! on loose payload shapes: a verification returns a [`Verdict`], and a
//! negative match is a successful completion rather than an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use voiceid_gateway::{Client, Verdict};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:5000")?;
//!
//!     let wav = Bytes::from(std::fs::read("sample.wav")?);
//!     client.train("alice", wav.clone(), "sample.wav").await?;
//!
//!     match client.predict("alice", wav, "sample.wav").await? {
//!         Verdict::Matched => println!("voice match confirmed"),
//!         Verdict::NotMatched => println!("voice match failed"),
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod http;
mod types;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use types::{Enrollment, PredictResponse, TrainResponse, UsersResponse, Verdict};
