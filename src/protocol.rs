// Wire messages between the request layer and its clients.

use serde::{Deserialize, Serialize};

use crate::draft::pick::{Pick, PlayerRef};
use crate::engine::RoomStateView;
use crate::error::{DraftError, ErrorKind};
use crate::league::{League, Team};
use crate::notify::ChangeKind;

/// Commands a client may send, tagged JSON (`{"type": "pick_player", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    CreateLeague {
        name: String,
        user_id: String,
        #[serde(default)]
        max_teams: Option<u32>,
    },
    JoinDraft {
        league_id: String,
        user_id: String,
        #[serde(default)]
        team_name: Option<String>,
    },
    StartDraft {
        league_id: String,
        user_id: String,
    },
    PickPlayer {
        league_id: String,
        team_id: String,
        user_id: String,
        player: PlayerRef,
    },
    PauseDraft {
        league_id: String,
        user_id: String,
    },
    ResumeDraft {
        league_id: String,
        user_id: String,
    },
    GetRoom {
        league_id: String,
    },
    GetLeague {
        league_id: String,
    },
    GetDraftedPlayers {
        league_id: String,
    },
    GetMyTeam {
        league_id: String,
        user_id: String,
    },
}

/// Replies and broadcasts, tagged the same way as commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    League {
        league: League,
    },
    Team {
        team: Team,
    },
    Room {
        room: RoomStateView,
    },
    PickMade {
        pick: Pick,
        next_team: Option<Team>,
    },
    DraftedPlayers {
        player_ids: Vec<i64>,
    },
    /// Success reply for commands with no payload (pause/resume).
    Ack,
    Error {
        kind: ErrorKind,
        message: String,
    },
    /// Pushed to every subscriber after a committed state transition.
    Update {
        league_id: String,
        change: ChangeKind,
    },
}

impl ServerMessage {
    pub fn error(err: &DraftError) -> Self {
        ServerMessage::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_command_parses_from_tagged_json() {
        let json = r#"{
            "type": "pick_player",
            "league_id": "league1",
            "team_id": "team2",
            "user_id": "user2",
            "player": {"id": 101, "name": "Nikola Jokic", "team": "DEN", "position": "C"}
        }"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::PickPlayer {
                league_id: "league1".into(),
                team_id: "team2".into(),
                user_id: "user2".into(),
                player: PlayerRef::new(101, "Nikola Jokic", "DEN", "C"),
            }
        );
    }

    #[test]
    fn optional_fields_default() {
        let json = r#"{"type": "join_draft", "league_id": "league1", "user_id": "user3"}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::JoinDraft {
                league_id: "league1".into(),
                user_id: "user3".into(),
                team_name: None,
            }
        );
    }

    #[test]
    fn unknown_command_type_fails_to_parse() {
        let json = r#"{"type": "trade_player", "league_id": "league1"}"#;
        assert!(serde_json::from_str::<ClientCommand>(json).is_err());
    }

    #[test]
    fn errors_serialize_kind_and_message() {
        let msg = ServerMessage::error(&DraftError::NotYourTurn);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "conflict");
        assert_eq!(json["message"], "not your turn to pick");
    }

    #[test]
    fn ack_is_bare_tag() {
        let json = serde_json::to_string(&ServerMessage::Ack).unwrap();
        assert_eq!(json, r#"{"type":"ack"}"#);
    }
}
