//! Contact form: turning a relay response into what the status line shows.

use serde::Deserialize;

use crate::config::FormConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

impl StatusKind {
    pub fn class_name(self) -> &'static str {
        match self {
            StatusKind::Success => "alert alert-success",
            StatusKind::Error => "alert alert-danger",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn is_success(&self) -> bool {
        self.kind == StatusKind::Success
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct FieldError {
    #[serde(default)]
    message: String,
}

/// Joined per-field messages from a structured error body, if it has one.
pub fn field_errors(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    Some(
        parsed
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Status line for a completed request.
pub fn interpret_response(status: u16, body: &str, cfg: &FormConfig) -> StatusMessage {
    if (200..300).contains(&status) {
        return StatusMessage {
            kind: StatusKind::Success,
            text: cfg.success_message.clone(),
        };
    }
    let reason = field_errors(body).unwrap_or_else(|| cfg.generic_failure.clone());
    failure(&reason, cfg)
}

/// Status line for a request that never produced a response.
pub fn failure(reason: &str, cfg: &FormConfig) -> StatusMessage {
    StatusMessage {
        kind: StatusKind::Error,
        text: format!("{}{}", cfg.error_prefix, reason),
    }
}

/// Single-flight guard for the submit handler.
#[derive(Debug, Default)]
pub struct Submission {
    in_flight: bool,
    /// Bumped on every accepted submit; a hide timer only fires for its own.
    generation: u32,
}

impl Submission {
    /// Claim the form for a new request. `None` if one is already running.
    pub fn begin(&mut self) -> Option<u32> {
        if self.in_flight {
            return None;
        }
        self.in_flight = true;
        self.generation = self.generation.wrapping_add(1);
        Some(self.generation)
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether a timer armed for `generation` is still current.
    pub fn is_current(&self, generation: u32) -> bool {
        self.generation == generation
    }
}
