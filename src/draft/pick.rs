// Pick records and the player tuple they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `{id, name, team, position}` tuple supplied by the player catalog.
///
/// The engine trusts this verbatim and stores it denormalized on picks and
/// roster entries; it never validates the player against the catalog itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Catalog player ID.
    pub id: i64,
    /// Display name (e.g. "Nikola Jokic").
    pub name: String,
    /// Real-world team abbreviation (e.g. "DEN").
    pub team: String,
    /// Position string (e.g. "C", "PG").
    pub position: String,
}

impl PlayerRef {
    pub fn new(id: i64, name: &str, team: &str, position: &str) -> Self {
        PlayerRef {
            id,
            name: name.to_string(),
            team: team.to_string(),
            position: position.to_string(),
        }
    }
}

/// An immutable record of one completed selection.
///
/// Once appended to a draft room, a pick is never modified or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    /// ID of the team that made the pick.
    pub team_id: String,
    /// Display name of the team at pick time.
    pub team_name: String,
    /// Catalog ID of the drafted player.
    pub player_id: i64,
    /// Denormalized player fields for display.
    pub player_name: String,
    pub player_team: String,
    pub player_position: String,
    /// Round the pick was made in (1-based).
    pub round: u32,
    /// Slot within the round (1-based, before the snake reversal).
    pub pick_in_round: u32,
    /// Overall pick number across the whole draft.
    pub overall: u32,
    /// When the pick was recorded.
    pub picked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_ref_construction() {
        let player = PlayerRef::new(101, "Nikola Jokic", "DEN", "C");
        assert_eq!(player.id, 101);
        assert_eq!(player.name, "Nikola Jokic");
        assert_eq!(player.team, "DEN");
        assert_eq!(player.position, "C");
    }

    #[test]
    fn pick_serde_roundtrip_preserves_denormalized_fields() {
        let pick = Pick {
            team_id: "team1".into(),
            team_name: "Mile High".into(),
            player_id: 101,
            player_name: "Nikola Jokic".into(),
            player_team: "DEN".into(),
            player_position: "C".into(),
            round: 2,
            pick_in_round: 3,
            overall: 6,
            picked_at: Utc::now(),
        };

        let json = serde_json::to_string(&pick).unwrap();
        let back: Pick = serde_json::from_str(&json).unwrap();
        assert_eq!(back.player_id, 101);
        assert_eq!(back.player_team, "DEN");
        assert_eq!(back.overall, 6);
        assert_eq!(back.pick_in_round, 3);
    }
}
