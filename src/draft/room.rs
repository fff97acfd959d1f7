// Draft room: round/pick pointers, recorded picks, pause state, deadline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::order::{overall_pick_number, snake_slot};
use super::pick::{Pick, PlayerRef};
use crate::league::League;

/// One participant in the draft, snapshotted when the room is created.
///
/// The snapshot fixes the participant set for the whole draft; joins after
/// start are rejected at the engine level, so the slots never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSlot {
    pub team_id: String,
    pub team_name: String,
    pub draft_position: u32,
}

/// The live draft session for one league.
///
/// Owned exclusively by the draft engine: all mutation happens inside the
/// engine's per-league critical section, and `version` is bumped on every
/// committed write so storage can reject stale snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRoom {
    pub league_id: String,
    /// Current round, 1-based. Increases monotonically; the room is terminal
    /// once it passes `total_rounds`.
    pub current_round: u32,
    /// Slot within the current round, 1-based, in `1..=num_teams` while the
    /// draft is in progress.
    pub current_pick: u32,
    pub total_rounds: u32,
    /// Participant slots ordered by draft position.
    pub teams: Vec<TeamSlot>,
    /// All recorded picks, in the order they were made.
    pub picks: Vec<Pick>,
    pub is_paused: bool,
    pub seconds_per_pick: u32,
    /// Advisory deadline for the pick currently on the clock.
    pub pick_deadline: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Write sequence number for compare-and-swap storage commits.
    pub version: u64,
}

impl DraftRoom {
    /// Create the room for a league, snapshotting its current team list as
    /// the fixed participant set.
    pub fn start(
        league: &League,
        total_rounds: u32,
        seconds_per_pick: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let teams = league
            .teams_by_draft_position()
            .into_iter()
            .map(|t| TeamSlot {
                team_id: t.id.clone(),
                team_name: t.name.clone(),
                draft_position: t.draft_position,
            })
            .collect();

        DraftRoom {
            league_id: league.id.clone(),
            current_round: 1,
            current_pick: 1,
            total_rounds,
            teams,
            picks: Vec::new(),
            is_paused: false,
            seconds_per_pick,
            pick_deadline: now + Duration::seconds(seconds_per_pick as i64),
            started_at: now,
            completed_at: None,
            version: 0,
        }
    }

    pub fn num_teams(&self) -> u32 {
        self.teams.len() as u32
    }

    /// Whether the draft has run past its final round.
    pub fn is_complete(&self) -> bool {
        self.current_round > self.total_rounds
    }

    /// The participant slot currently on the clock, or `None` once the room
    /// is complete or when no team occupies the computed position (corrupt
    /// draft positions).
    pub fn current_slot(&self) -> Option<&TeamSlot> {
        if self.is_complete() {
            return None;
        }
        let target = snake_slot(self.current_round, self.num_teams(), self.current_pick);
        self.teams.iter().find(|t| t.draft_position == target)
    }

    pub fn has_player(&self, player_id: i64) -> bool {
        self.picks.iter().any(|p| p.player_id == player_id)
    }

    /// Record a pick for the team currently on the clock and advance the
    /// draft: append the pick, move the pointer (wrapping into the next
    /// round), stamp `completed_at` past the final round, otherwise reset the
    /// pick deadline.
    ///
    /// The caller must have validated turn and player uniqueness already; the
    /// whole check-then-record sequence runs under the engine's per-league
    /// lock so the pointer cannot move between validation and this call.
    pub fn record_pick(&mut self, player: &PlayerRef, now: DateTime<Utc>) -> Pick {
        let slot = self
            .current_slot()
            .expect("record_pick called without a team on the clock");

        let pick = Pick {
            team_id: slot.team_id.clone(),
            team_name: slot.team_name.clone(),
            player_id: player.id,
            player_name: player.name.clone(),
            player_team: player.team.clone(),
            player_position: player.position.clone(),
            round: self.current_round,
            pick_in_round: self.current_pick,
            overall: overall_pick_number(self.current_round, self.num_teams(), self.current_pick),
            picked_at: now,
        };
        self.picks.push(pick.clone());

        self.current_pick += 1;
        if self.current_pick > self.num_teams() {
            self.current_pick = 1;
            self.current_round += 1;
        }

        if self.is_complete() {
            self.completed_at = Some(now);
        } else {
            self.reset_deadline(now);
        }

        pick
    }

    /// Put the next pick back on a full clock.
    pub fn reset_deadline(&mut self, now: DateTime<Utc>) {
        self.pick_deadline = now + Duration::seconds(self.seconds_per_pick as i64);
    }
}
