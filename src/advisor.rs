//! Oracle text service boundary
//!
//! On defeat, or when the player asks for a tip, the game fires a request at
//! an external text-generation service and shows whatever comes back. The
//! simulation never waits for it. Every request carries the id of the run
//! that issued it, and answers for an older run are dropped, so a slow reply
//! can't overwrite the message of a fresh run.

use serde::{Deserialize, Serialize};

use crate::error::AdvisoryError;
use crate::progression::GameStats;

/// System prompt sent along with every request
pub const ORACLE_INSTRUCTION: &str = "You are the Ancient Unicorn Oracle of the Ring World. \
You speak in a mystical, slightly sarcastic, yet encouraging tone. \
You are observing a unicorn running around a small circular world fighting shadows. \
Keep responses short (under 2 sentences). \
If the player died, write a short eulogy. \
If the player is asking for a tip, give a cryptic gameplay hint based on their stats.";

/// Identity of one run, bumped on every restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl RunId {
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvisoryKind {
    Death,
    Tip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub run_id: RunId,
    pub kind: AdvisoryKind,
    pub stats: GameStats,
}

impl AdvisoryRequest {
    pub fn prompt(&self) -> String {
        let s = &self.stats;
        match self.kind {
            AdvisoryKind::Death => format!(
                "The unicorn has fallen. Stats: Survived {}s, Killed {} shadows, Collected {} shards. Write a eulogy.",
                s.seconds_survived(),
                s.enemies_killed,
                s.shards
            ),
            AdvisoryKind::Tip => format!(
                "The unicorn seeks wisdom. Current Stats: Survived {}s, Berries: {}. Give a gameplay tip about farming or fighting.",
                s.seconds_survived(),
                s.berries
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryResponse {
    pub run_id: RunId,
    pub text: String,
}

/// A text-generation backend
pub trait AdvisoryService {
    fn consult(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError>;
}

/// Backend used when no API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

impl AdvisoryService for OfflineAdvisor {
    fn consult(&self, _request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::MissingCredentials)
    }
}

/// Player-facing text for a failed consultation
pub fn fallback_text(error: &AdvisoryError) -> &'static str {
    match error {
        AdvisoryError::MissingCredentials => "The Oracle is silent (Missing API_KEY).",
        AdvisoryError::Transport(_) => "The void interferes with my vision (API Error).",
        AdvisoryError::EmptyResponse => "The stars are cloudy today...",
    }
}

/// Ask `service` and turn any failure into fallback text. Never fails.
pub fn consult<S: AdvisoryService + ?Sized>(service: &S, request: &AdvisoryRequest) -> AdvisoryResponse {
    let result = service.consult(request).and_then(|text| {
        if text.trim().is_empty() {
            Err(AdvisoryError::EmptyResponse)
        } else {
            Ok(text)
        }
    });
    let text = match result {
        Ok(text) => text,
        Err(err) => {
            log::warn!("Oracle consultation failed: {}", err);
            fallback_text(&err).to_string()
        }
    };
    AdvisoryResponse {
        run_id: request.run_id,
        text,
    }
}

/// Outstanding requests and the message currently shown, scoped to one run
#[derive(Debug, Clone, Default)]
pub struct AdvisoryBoard {
    run_id: RunId,
    outbox: Vec<AdvisoryRequest>,
    awaiting: usize,
    message: Option<String>,
}

impl AdvisoryBoard {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            ..Default::default()
        }
    }

    /// Forget everything from the previous run
    pub fn reset(&mut self, run_id: RunId) {
        *self = Self::new(run_id);
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Queue a request for the external service
    pub fn request(&mut self, kind: AdvisoryKind, stats: &GameStats) {
        self.outbox.push(AdvisoryRequest {
            run_id: self.run_id,
            kind,
            stats: stats.clone(),
        });
        self.awaiting += 1;
    }

    /// Requests to send out; the caller dispatches them however it likes
    pub fn take_requests(&mut self) -> Vec<AdvisoryRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Accept an answer. Returns false (and changes nothing) for a stale run.
    pub fn deliver(&mut self, response: AdvisoryResponse) -> bool {
        if response.run_id != self.run_id {
            log::debug!(
                "Dropping oracle answer for run {} (current run {})",
                response.run_id.0,
                self.run_id.0
            );
            return false;
        }
        self.awaiting = self.awaiting.saturating_sub(1);
        self.message = Some(response.text);
        true
    }

    pub fn is_loading(&self) -> bool {
        self.awaiting > 0
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
