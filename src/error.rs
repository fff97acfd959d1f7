// Engine error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::StorageError;

/// Coarse error class surfaced to callers, mapping one-to-one onto the
/// HTTP-equivalent a request layer would answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 404: league, room, or team does not exist.
    NotFound,
    /// 403: actor lacks the required role.
    Forbidden,
    /// 400: operation not valid in the current lifecycle state.
    InvalidState,
    /// 409: turn/uniqueness violation; cheap and safe to retry after
    /// re-reading state.
    Conflict,
    /// 500: storage or data-integrity failure.
    Internal,
}

/// Everything the draft engine can refuse to do.
///
/// No variant is retried internally; all are surfaced synchronously and the
/// caller decides whether to re-fetch state and resubmit.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("league not found: {0}")]
    LeagueNotFound(String),

    #[error("draft room not found for league {0}")]
    RoomNotFound(String),

    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("only the commissioner can {action}")]
    NotCommissioner { action: &'static str },

    #[error("need at least 2 teams to start the draft, have {have}")]
    InsufficientTeams { have: usize },

    #[error("draft already started for league {0}")]
    AlreadyStarted(String),

    #[error("draft is complete")]
    DraftComplete,

    #[error("draft is paused")]
    DraftPaused,

    #[error("draft is not paused")]
    NotPaused,

    #[error("league is full")]
    LeagueFull,

    #[error("user {0} already has a team in this league")]
    AlreadyJoined(String),

    #[error("not your turn to pick")]
    NotYourTurn,

    #[error("player {0} already drafted")]
    AlreadyDrafted(i64),

    #[error("draft positions are not a contiguous 1..=n permutation")]
    CorruptDraftOrder,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DraftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DraftError::LeagueNotFound(_)
            | DraftError::RoomNotFound(_)
            | DraftError::TeamNotFound(_) => ErrorKind::NotFound,
            DraftError::NotCommissioner { .. } => ErrorKind::Forbidden,
            DraftError::InsufficientTeams { .. }
            | DraftError::AlreadyStarted(_)
            | DraftError::DraftComplete
            | DraftError::DraftPaused
            | DraftError::NotPaused => ErrorKind::InvalidState,
            DraftError::LeagueFull
            | DraftError::AlreadyJoined(_)
            | DraftError::NotYourTurn
            | DraftError::AlreadyDrafted(_) => ErrorKind::Conflict,
            // A lost CAS write is a turn race with another committer, so it
            // shares the retry-after-refresh contract of the other conflicts.
            DraftError::Storage(StorageError::VersionConflict { .. }) => ErrorKind::Conflict,
            DraftError::CorruptDraftOrder | DraftError::Storage(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_taxonomy() {
        assert_eq!(
            DraftError::LeagueNotFound("league1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            DraftError::NotCommissioner { action: "start the draft" }.kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            DraftError::InsufficientTeams { have: 1 }.kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(DraftError::DraftComplete.kind(), ErrorKind::InvalidState);
        assert_eq!(DraftError::NotYourTurn.kind(), ErrorKind::Conflict);
        assert_eq!(DraftError::AlreadyDrafted(101).kind(), ErrorKind::Conflict);
        assert_eq!(DraftError::CorruptDraftOrder.kind(), ErrorKind::Internal);
    }

    #[test]
    fn display_messages_are_caller_actionable() {
        assert_eq!(
            DraftError::NotYourTurn.to_string(),
            "not your turn to pick"
        );
        assert_eq!(
            DraftError::AlreadyDrafted(101).to_string(),
            "player 101 already drafted"
        );
        assert_eq!(
            DraftError::InsufficientTeams { have: 1 }.to_string(),
            "need at least 2 teams to start the draft, have 1"
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::InvalidState).unwrap(),
            "\"invalid_state\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotFound).unwrap(),
            "\"not_found\""
        );
    }
}
