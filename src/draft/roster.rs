// Per-team roster ledger.

use serde::{Deserialize, Serialize};

use super::pick::PlayerRef;

/// How a player ended up on a roster.
///
/// Only `Draft` is produced by this crate; the variant exists so waiver and
/// trade acquisitions from a season layer share the same record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionType {
    Draft,
    Waiver,
    Trade,
}

/// One acquired player on a team's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: i64,
    pub player_name: String,
    pub player_team: String,
    pub player_position: String,
    pub acquisition: AcquisitionType,
}

/// A team's accumulated players, in acquisition order.
///
/// The ledger is append-only: entries are added by the draft engine as a side
/// effect of a successful pick and never modified or removed afterwards, so it
/// stays a derived view of the room's pick sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Append a drafted player.
    pub fn add_drafted(&mut self, player: &PlayerRef) {
        self.entries.push(RosterEntry {
            player_id: player.id,
            player_name: player.name.clone(),
            player_team: player.team.clone(),
            player_position: player.position.clone(),
            acquisition: AcquisitionType::Draft,
        });
    }

    pub fn contains_player(&self, player_id: i64) -> bool {
        self.entries.iter().any(|e| e.player_id == player_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_roster_is_empty() {
        let roster = Roster::new();
        assert!(roster.is_empty());
        assert_eq!(roster.len(), 0);
        assert!(!roster.contains_player(101));
    }

    #[test]
    fn add_drafted_appends_in_order() {
        let mut roster = Roster::new();
        roster.add_drafted(&PlayerRef::new(101, "Nikola Jokic", "DEN", "C"));
        roster.add_drafted(&PlayerRef::new(202, "Luka Doncic", "DAL", "PG"));

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.entries()[0].player_id, 101);
        assert_eq!(roster.entries()[1].player_id, 202);
        assert_eq!(roster.entries()[1].player_position, "PG");
    }

    #[test]
    fn drafted_entries_are_marked_as_draft_acquisitions() {
        let mut roster = Roster::new();
        roster.add_drafted(&PlayerRef::new(101, "Nikola Jokic", "DEN", "C"));
        assert_eq!(roster.entries()[0].acquisition, AcquisitionType::Draft);
    }

    #[test]
    fn contains_player_matches_by_id() {
        let mut roster = Roster::new();
        roster.add_drafted(&PlayerRef::new(101, "Nikola Jokic", "DEN", "C"));
        assert!(roster.contains_player(101));
        assert!(!roster.contains_player(102));
    }
}
