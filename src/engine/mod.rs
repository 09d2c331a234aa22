//! Settlement engine.
//!
//! Pure, synchronous computation that turns per-player session results into
//! a short list of point-to-point payments. Two passes:
//!
//! 1. [`group_entities`] collapses players into settlement entities — a
//!    partnership's two members merge into one entity carrying the sum of
//!    their results; everyone else stands alone.
//! 2. [`settle`] greedily matches the largest creditor against the largest
//!    debtor until every balance is cleared, emitting one transfer per
//!    match.
//!
//! # Invariants
//!
//! - For every entity, payments received minus payments made equals its
//!   starting balance, to the cent.
//! - Every emitted amount is positive; an entity never pays itself.
//! - At most `n - 1` transfers for `n` entities with non-zero balances.
//! - Identical input order yields an identical transfer sequence.
//!
//! The engine assumes results sum to zero (chips are conserved at the
//! table) but does not enforce it: a violated precondition leaves one side
//! with an unmatched residual and the transfer list simply stops short.
//! Callers who care must check the sum themselves before trusting the
//! output as fully settled.
//!
//! The greedy match is not a minimum-transaction solver; it trades
//! optimality for determinism and simplicity.

pub mod grouping;
pub mod money;
pub mod optimizer;

pub use grouping::group_entities;
pub use money::CURRENCY_EPSILON;
pub use optimizer::settle;

use serde::{Deserialize, Serialize};

/// One player's signed result for a session. Positive means the player won.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticipantResult {
    pub participant_id: String,
    /// Label only; never used for identity comparison.
    pub display_name: String,
    pub net_result: f64,
}

/// A standing two-player pairing that settles as one party. The unit id is
/// supplied by the caller (storage's partnership id); the engine does not
/// synthesize identifiers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementUnit {
    pub unit_id: String,
    pub member_ids: [String; 2],
    pub active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Individual,
    Unit,
}

/// The unit of account the optimizer operates on: a lone player or a merged
/// partnership. Lives only for the duration of one settlement run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementEntity {
    pub entity_id: String,
    pub kind: EntityKind,
    pub display_name: String,
    pub balance: f64,
    pub member_ids: Vec<String>,
}

/// One directed payment instruction. `amount` is always positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_entity_id: String,
    pub to_entity_id: String,
    pub amount: f64,
}
