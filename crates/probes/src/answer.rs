//! Query answers handed to the assertion layer.

use serde::Serialize;

/// Answer to a single probe query.
///
/// `Unknown` means the probe has no result to consult (missing file,
/// unparsable content, target not found). `Skipped` means the question cannot
/// be asked here at all, on this platform or with this provider, and carries
/// the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Answer<T> {
    Known(T),
    Unknown,
    Skipped(String),
}

impl<T> Answer<T> {
    /// Skip answer with a reason.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Answer::Skipped(reason.into())
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Answer::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Answer::Unknown)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Answer::Skipped(_))
    }

    /// The known value, if any.
    pub fn known(&self) -> Option<&T> {
        match self {
            Answer::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Consume into the known value, if any.
    pub fn into_known(self) -> Option<T> {
        match self {
            Answer::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Reason attached to a skip.
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Answer::Skipped(reason) => Some(reason),
            _ => None,
        }
    }

    /// Transform the known value, keeping unknown and skip answers.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Answer<U> {
        match self {
            Answer::Known(value) => Answer::Known(f(value)),
            Answer::Unknown => Answer::Unknown,
            Answer::Skipped(reason) => Answer::Skipped(reason),
        }
    }

    /// Chain a query that may itself be unknown or skipped.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Answer<U>) -> Answer<U> {
        match self {
            Answer::Known(value) => f(value),
            Answer::Unknown => Answer::Unknown,
            Answer::Skipped(reason) => Answer::Skipped(reason),
        }
    }
}

impl<T> From<Option<T>> for Answer<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Answer::Unknown, Answer::Known)
    }
}
