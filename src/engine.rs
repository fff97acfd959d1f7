// Draft orchestration: turn validation, pick recording, lifecycle.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::db::Storage;
use crate::draft::pick::{Pick, PlayerRef};
use crate::draft::room::DraftRoom;
use crate::draft::roster::Roster;
use crate::error::DraftError;
use crate::league::{League, LeagueStatus, Team};
use crate::notify::{ChangeKind, Notifier};

/// Fixed draft parameters applied when a room is created.
#[derive(Debug, Clone)]
pub struct DraftSettings {
    /// Rounds per draft; every team ends with this many drafted players.
    pub total_rounds: u32,
    /// Advisory pick clock, used to compute `pick_deadline`.
    pub seconds_per_pick: u32,
    /// Team cap applied when a league is created without an explicit one.
    pub default_max_teams: u32,
}

impl Default for DraftSettings {
    fn default() -> Self {
        DraftSettings {
            total_rounds: 13,
            seconds_per_pick: 90,
            default_max_teams: 10,
        }
    }
}

/// A successful pick plus the team now on the clock (`None` once complete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickOutcome {
    pub pick: Pick,
    pub next_team: Option<Team>,
}

/// Read-only snapshot of a draft room for callers and displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStateView {
    pub league_id: String,
    pub current_round: u32,
    pub current_pick: u32,
    pub total_rounds: u32,
    pub current_team: Option<Team>,
    pub picks: Vec<Pick>,
    pub is_paused: bool,
    pub seconds_per_pick: u32,
    pub pick_deadline: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The draft state machine.
///
/// Stateless between calls apart from the per-league lock table: every
/// operation loads entity snapshots through the storage seam, validates and
/// mutates them inside the owning league's critical section, commits, and
/// then notifies observers. Two leagues never contend with each other.
pub struct DraftEngine {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    settings: DraftSettings,
    /// Per-league mutexes, created on first touch. The outer std mutex is
    /// held only long enough to clone the entry.
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DraftEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        settings: DraftSettings,
    ) -> Self {
        DraftEngine {
            storage,
            notifier,
            settings,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &DraftSettings {
        &self.settings
    }

    fn league_lock(&self, league_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock table mutex poisoned");
        locks
            .entry(league_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a league's lock entry once no further serialized work can arrive
    /// for it. In-flight holders keep their mutex alive through their own Arc
    /// clones, and every operation revalidates against storage after locking,
    /// so a fresh entry for the same ID cannot let two live mutations through.
    fn evict_league_lock(&self, league_id: &str) {
        let mut locks = self.locks.lock().expect("lock table mutex poisoned");
        locks.remove(league_id);
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.locks.lock().expect("lock table mutex poisoned").len()
    }

    /// Timestamp-derived league ID with a process-wide sequence suffix, so
    /// creations in the same millisecond still mint distinct IDs.
    fn generate_league_id() -> String {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        format!("{}_{seq}", Utc::now().format("league_%Y%m%d_%H%M%S_%3f"))
    }

    // ------------------------------------------------------------------
    // Pre-draft operations
    // ------------------------------------------------------------------

    /// Create a league in `Pending` status with no teams.
    pub async fn create_league(
        &self,
        name: &str,
        commissioner_id: &str,
        max_teams: Option<u32>,
    ) -> Result<League, DraftError> {
        let id = Self::generate_league_id();
        let league = League::new(
            &id,
            name,
            commissioner_id,
            max_teams.unwrap_or(self.settings.default_max_teams),
        );
        self.storage.insert_league(&league)?;
        info!("created league {id} ({name}) for {commissioner_id}");
        Ok(league)
    }

    /// Add a team for `user_id`, assigning the next draft position.
    ///
    /// Rejected once the draft has started: positions are fixed when the room
    /// snapshots the participant set.
    pub async fn join_draft(
        &self,
        league_id: &str,
        user_id: &str,
        team_name: Option<&str>,
    ) -> Result<Team, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let Some(mut league) = self.storage.load_league(league_id)? else {
            drop(_guard);
            self.evict_league_lock(league_id);
            return Err(DraftError::LeagueNotFound(league_id.to_string()));
        };

        if league.status != LeagueStatus::Pending {
            return Err(DraftError::AlreadyStarted(league_id.to_string()));
        }
        if league.is_full() {
            return Err(DraftError::LeagueFull);
        }
        if league.team_for_user(user_id).is_some() {
            return Err(DraftError::AlreadyJoined(user_id.to_string()));
        }

        let position = league.teams.len() as u32 + 1;
        let team = Team {
            id: format!("team{position}"),
            user_id: user_id.to_string(),
            name: team_name
                .map(str::to_string)
                .unwrap_or_else(|| format!("Team {position}")),
            draft_position: position,
            roster: Roster::new(),
        };
        league.teams.push(team.clone());
        self.storage.store_league(&league)?;
        drop(_guard);

        info!("user {user_id} joined {league_id} at position {position}");
        self.notifier.notify(league_id, ChangeKind::TeamJoined);
        Ok(team)
    }

    // ------------------------------------------------------------------
    // Draft lifecycle
    // ------------------------------------------------------------------

    /// Start the draft: create the room, fix the participant set, move the
    /// league to `Drafting`. Commissioner only; never restarts an already
    /// started draft.
    pub async fn start_draft(
        &self,
        league_id: &str,
        acting_user_id: &str,
    ) -> Result<DraftRoom, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let Some(mut league) = self.storage.load_league(league_id)? else {
            drop(_guard);
            self.evict_league_lock(league_id);
            return Err(DraftError::LeagueNotFound(league_id.to_string()));
        };

        if league.commissioner_id != acting_user_id {
            return Err(DraftError::NotCommissioner {
                action: "start the draft",
            });
        }
        if league.status != LeagueStatus::Pending || self.storage.load_room(league_id)?.is_some() {
            return Err(DraftError::AlreadyStarted(league_id.to_string()));
        }
        if league.teams.len() < 2 {
            return Err(DraftError::InsufficientTeams {
                have: league.teams.len(),
            });
        }
        if !league.draft_positions_contiguous() {
            warn!("league {league_id} has non-contiguous draft positions");
            return Err(DraftError::CorruptDraftOrder);
        }

        let room = DraftRoom::start(
            &league,
            self.settings.total_rounds,
            self.settings.seconds_per_pick,
            Utc::now(),
        );
        league.status = LeagueStatus::Drafting;
        self.storage.store_draft(&league, &room, None)?;
        drop(_guard);

        info!(
            "draft started for {league_id}: {} teams, {} rounds",
            room.num_teams(),
            room.total_rounds
        );
        self.notifier.notify(league_id, ChangeKind::DraftStarted);
        Ok(room)
    }

    /// Record a pick for the team on the clock.
    ///
    /// The check-validate-mutate-commit sequence runs as one unit under the
    /// league's lock, so at most one concurrent caller can observe itself as
    /// the due team for a given pointer value. Losers get a Conflict and
    /// decide for themselves whether to re-read state and resubmit.
    pub async fn pick_player(
        &self,
        league_id: &str,
        team_id: &str,
        player: PlayerRef,
        acting_user_id: &str,
    ) -> Result<PickOutcome, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let Some(mut league) = self.storage.load_league(league_id)? else {
            drop(_guard);
            self.evict_league_lock(league_id);
            return Err(DraftError::LeagueNotFound(league_id.to_string()));
        };
        let mut room = self
            .storage
            .load_room(league_id)?
            .ok_or_else(|| DraftError::RoomNotFound(league_id.to_string()))?;

        if room.is_complete() {
            return Err(DraftError::DraftComplete);
        }
        if room.is_paused {
            return Err(DraftError::DraftPaused);
        }

        let on_clock = room.current_slot().ok_or(DraftError::CorruptDraftOrder)?;
        if on_clock.team_id != team_id {
            return Err(DraftError::NotYourTurn);
        }
        if room.has_player(player.id) {
            return Err(DraftError::AlreadyDrafted(player.id));
        }

        let pick = room.record_pick(&player, Utc::now());
        let team = league
            .team_mut(team_id)
            .ok_or_else(|| DraftError::TeamNotFound(team_id.to_string()))?;
        team.roster.add_drafted(&player);

        let completed = room.is_complete();
        if completed {
            league.status = LeagueStatus::Active;
        }

        let expected = room.version;
        room.version += 1;
        self.storage.store_draft(&league, &room, Some(expected))?;

        let next_team = room
            .current_slot()
            .and_then(|slot| league.team(&slot.team_id))
            .cloned();
        drop(_guard);
        if completed {
            // No further mutation can succeed for this league, so its lock
            // entry has nothing left to serialize.
            self.evict_league_lock(league_id);
        }

        info!(
            "pick {} in {league_id}: {} takes {} ({}, acting user {acting_user_id})",
            pick.overall, pick.team_name, pick.player_name, pick.player_position
        );
        self.notifier.notify(league_id, ChangeKind::PickMade);
        if completed {
            info!("draft complete for {league_id}");
            self.notifier.notify(league_id, ChangeKind::DraftCompleted);
        }

        Ok(PickOutcome { pick, next_team })
    }

    /// Commissioner-only: freeze the draft clock and reject picks.
    pub async fn pause_draft(
        &self,
        league_id: &str,
        acting_user_id: &str,
    ) -> Result<(), DraftError> {
        self.set_paused(league_id, acting_user_id, true).await
    }

    /// Commissioner-only: unfreeze and put the next pick on a full clock.
    pub async fn resume_draft(
        &self,
        league_id: &str,
        acting_user_id: &str,
    ) -> Result<(), DraftError> {
        self.set_paused(league_id, acting_user_id, false).await
    }

    async fn set_paused(
        &self,
        league_id: &str,
        acting_user_id: &str,
        paused: bool,
    ) -> Result<(), DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let Some(league) = self.storage.load_league(league_id)? else {
            drop(_guard);
            self.evict_league_lock(league_id);
            return Err(DraftError::LeagueNotFound(league_id.to_string()));
        };
        if league.commissioner_id != acting_user_id {
            return Err(DraftError::NotCommissioner {
                action: if paused {
                    "pause the draft"
                } else {
                    "resume the draft"
                },
            });
        }

        let mut room = self
            .storage
            .load_room(league_id)?
            .ok_or_else(|| DraftError::RoomNotFound(league_id.to_string()))?;
        if room.is_complete() {
            return Err(DraftError::DraftComplete);
        }
        if room.is_paused == paused {
            return Err(if paused {
                DraftError::DraftPaused
            } else {
                DraftError::NotPaused
            });
        }

        room.is_paused = paused;
        if !paused {
            room.reset_deadline(Utc::now());
        }
        let expected = room.version;
        room.version += 1;
        self.storage.store_draft(&league, &room, Some(expected))?;
        drop(_guard);

        self.notifier.notify(
            league_id,
            if paused {
                ChangeKind::DraftPaused
            } else {
                ChangeKind::DraftResumed
            },
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read views
    // ------------------------------------------------------------------

    /// The team currently on the clock; `None` when there is no room, or the
    /// draft is complete.
    pub async fn current_drafting_team(
        &self,
        league_id: &str,
    ) -> Result<Option<Team>, DraftError> {
        let Some(league) = self.storage.load_league(league_id)? else {
            return Ok(None);
        };
        let Some(room) = self.storage.load_room(league_id)? else {
            return Ok(None);
        };
        Ok(room
            .current_slot()
            .and_then(|slot| league.team(&slot.team_id))
            .cloned())
    }

    /// IDs of every player picked so far. Empty when no room exists yet.
    pub async fn drafted_player_ids(&self, league_id: &str) -> Result<HashSet<i64>, DraftError> {
        match self.storage.load_room(league_id)? {
            Some(room) => Ok(room.picks.iter().map(|p| p.player_id).collect()),
            None => Ok(HashSet::new()),
        }
    }

    /// Full room snapshot, with the current team resolved to its league
    /// entity.
    pub async fn room_state(&self, league_id: &str) -> Result<RoomStateView, DraftError> {
        let league = self
            .storage
            .load_league(league_id)?
            .ok_or_else(|| DraftError::LeagueNotFound(league_id.to_string()))?;
        let room = self
            .storage
            .load_room(league_id)?
            .ok_or_else(|| DraftError::RoomNotFound(league_id.to_string()))?;

        let current_team = room
            .current_slot()
            .and_then(|slot| league.team(&slot.team_id))
            .cloned();
        Ok(RoomStateView {
            league_id: room.league_id,
            current_round: room.current_round,
            current_pick: room.current_pick,
            total_rounds: room.total_rounds,
            current_team,
            picks: room.picks,
            is_paused: room.is_paused,
            seconds_per_pick: room.seconds_per_pick,
            pick_deadline: room.pick_deadline,
            started_at: room.started_at,
            completed_at: room.completed_at,
        })
    }

    /// The league entity, teams and rosters included.
    pub async fn league_info(&self, league_id: &str) -> Result<League, DraftError> {
        self.storage
            .load_league(league_id)?
            .ok_or_else(|| DraftError::LeagueNotFound(league_id.to_string()))
    }

    /// The acting user's team in a league.
    pub async fn my_team(&self, league_id: &str, user_id: &str) -> Result<Team, DraftError> {
        let league = self
            .storage
            .load_league(league_id)?
            .ok_or_else(|| DraftError::LeagueNotFound(league_id.to_string()))?;
        league
            .team_for_user(user_id)
            .cloned()
            .ok_or_else(|| DraftError::TeamNotFound(user_id.to_string()))
    }
}
