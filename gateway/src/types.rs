//! Wire types for the recognition backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Response from `GET /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    /// Names with an enrolled voice model.
    pub users: Vec<String>,
}

/// Response from `POST /train-model`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainResponse {
    /// Human-readable confirmation from the backend.
    pub message: String,
}

/// Response from `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    /// True if the sample matched the named subject.
    pub prediction: bool,
}

/// A completed enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// Confirmation message from the backend.
    pub message: String,
}

/// Outcome of a verification request.
///
/// Both variants are successful completions; a negative match is not an
/// error. Transport and server failures surface as [`crate::Error`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The sample matched the named subject.
    Matched,
    /// The sample did not match the named subject.
    NotMatched,
}

impl Verdict {
    /// Returns true for a positive match.
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Matched)
    }

    /// Returns the string representation of the verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Matched => "matched",
            Verdict::NotMatched => "not-matched",
        }
    }
}

impl From<bool> for Verdict {
    fn from(prediction: bool) -> Self {
        if prediction {
            Verdict::Matched
        } else {
            Verdict::NotMatched
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error body shapes the backend is known to emit.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}
