// Draft domain: order math, pick records, room state, roster ledger.

pub mod order;
pub mod pick;
pub mod room;
pub mod roster;
