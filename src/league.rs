// League and team entities.

use serde::{Deserialize, Serialize};

use crate::draft::roster::Roster;

/// League lifecycle status, driven only by the draft engine.
///
/// `Active` means "draft finished, season live", not "currently drafting".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    Pending,
    Drafting,
    Active,
    Completed,
}

/// Draft variant. Snake is the only one supported today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftKind {
    Snake,
}

/// A participant slot within exactly one league.
///
/// Immutable after creation except for roster growth, which only the draft
/// engine performs as a side effect of recording a pick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    /// Owning user identity.
    pub user_id: String,
    pub name: String,
    /// Fixed 1-based turn-order rank, assigned as `team_count + 1` at join.
    pub draft_position: u32,
    pub roster: Roster,
}

/// A group of teams competing under one commissioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    /// The only identity permitted to start (or pause) the draft.
    pub commissioner_id: String,
    pub max_teams: u32,
    pub draft_kind: DraftKind,
    pub status: LeagueStatus,
    /// Owned teams, in join order.
    pub teams: Vec<Team>,
}

impl League {
    pub fn new(id: &str, name: &str, commissioner_id: &str, max_teams: u32) -> Self {
        League {
            id: id.to_string(),
            name: name.to_string(),
            commissioner_id: commissioner_id.to_string(),
            max_teams,
            draft_kind: DraftKind::Snake,
            status: LeagueStatus::Pending,
            teams: Vec::new(),
        }
    }

    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn team_mut(&mut self, team_id: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == team_id)
    }

    pub fn team_for_user(&self, user_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.user_id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.teams.len() as u32 >= self.max_teams
    }

    /// Teams ordered by draft position, the fixed turn order for every round.
    pub fn teams_by_draft_position(&self) -> Vec<&Team> {
        let mut ordered: Vec<&Team> = self.teams.iter().collect();
        ordered.sort_by_key(|t| t.draft_position);
        ordered
    }

    /// Whether draft positions form a contiguous 1..=n permutation.
    ///
    /// Join-order assignment guarantees this; a gap means the stored league
    /// data is corrupt and the draft cannot be run over it.
    pub fn draft_positions_contiguous(&self) -> bool {
        let mut positions: Vec<u32> = self.teams.iter().map(|t| t.draft_position).collect();
        positions.sort_unstable();
        positions
            .iter()
            .enumerate()
            .all(|(i, &p)| p == i as u32 + 1)
    }
}
