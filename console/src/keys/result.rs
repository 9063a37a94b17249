//! Key request results and the current-result register

use serde::Serialize;
use tracing::debug;

/// Outcome of a key request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// Result of one key request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRequestResult {
    pub outcome: Outcome,

    /// IP the request was issued for
    pub target_ip: String,

    /// Extracted key, present only on success
    pub api_key: Option<String>,

    /// Why the request failed, absent on success
    pub error: Option<String>,

    /// Response text, or the error description when no response was read
    pub raw_body: String,
}

impl KeyRequestResult {
    pub fn success(target_ip: impl Into<String>, api_key: impl Into<String>, raw_body: String) -> Self {
        Self {
            outcome: Outcome::Success,
            target_ip: target_ip.into(),
            api_key: Some(api_key.into()),
            error: None,
            raw_body,
        }
    }

    /// Failure where no response body was read; the description doubles as
    /// the displayed body
    pub fn failure(target_ip: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            outcome: Outcome::Failure,
            target_ip: target_ip.into(),
            api_key: None,
            error: Some(description.clone()),
            raw_body: description,
        }
    }

    /// Failure that keeps the response body for inspection
    pub fn failure_with_body(
        target_ip: impl Into<String>,
        description: impl Into<String>,
        raw_body: String,
    ) -> Self {
        Self {
            outcome: Outcome::Failure,
            target_ip: target_ip.into(),
            api_key: None,
            error: Some(description.into()),
            raw_body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Lifecycle of a single key request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    InFlight,
    Completed,
}

/// How the register treats a completion that is older than the latest issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultPolicy {
    /// Whichever completion arrives last occupies the slot
    #[default]
    LastWriterWins,

    /// Completions for superseded requests are dropped
    DiscardStale,
}

/// Ticket handed out when a request is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestSeq(u64);

/// Single-slot holder of the current key request result
#[derive(Debug, Default)]
pub struct ResultRegister {
    policy: ResultPolicy,
    issued: u64,
    current: Option<KeyRequestResult>,
    in_flight: usize,
}

impl ResultRegister {
    pub fn new(policy: ResultPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Mark a request as issued and return its sequence ticket
    pub fn begin(&mut self) -> RequestSeq {
        self.issued += 1;
        self.in_flight += 1;
        RequestSeq(self.issued)
    }

    /// Store a completed result
    ///
    /// Returns false when the result was discarded as stale.
    pub fn complete(&mut self, seq: RequestSeq, result: KeyRequestResult) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.policy == ResultPolicy::DiscardStale && seq.0 < self.issued {
            debug!(
                "Discarding stale result #{} for {} (latest is #{})",
                seq.0, result.target_ip, self.issued
            );
            return false;
        }

        self.current = Some(result);
        true
    }

    pub fn current(&self) -> Option<&KeyRequestResult> {
        self.current.as_ref()
    }

    /// Key and IP of the current result, when it succeeded
    pub fn current_key(&self) -> Option<(&str, &str)> {
        let result = self.current.as_ref()?;
        let key = result.api_key.as_deref()?;
        Some((result.target_ip.as_str(), key))
    }

    /// Clear the slot
    pub fn dismiss(&mut self) -> Option<KeyRequestResult> {
        self.current.take()
    }

    pub fn state(&self) -> WorkflowState {
        if self.in_flight > 0 {
            WorkflowState::InFlight
        } else if self.current.is_some() {
            WorkflowState::Completed
        } else {
            WorkflowState::Idle
        }
    }
}
