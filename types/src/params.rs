//! Settlement parameters: voting periods, quorum, slashing and split limits.

use serde::{Deserialize, Serialize};

/// Tunable parameters of the triage and settlement engines.
///
/// Every field has a serde default so a partial TOML table is enough.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementParams {
    // ── Triage voting ────────────────────────────────────────────────────
    /// Voting window for a standard vote, in seconds.
    pub standard_voting_period_secs: u64,

    /// Voting window for an urgent (premium-paid) vote, in seconds.
    pub urgent_voting_period_secs: u64,

    /// Minimum total stake before a standard vote may finalize.
    pub default_min_quorum: u64,

    /// Quorum multiplier applied to urgent votes.
    pub urgent_quorum_multiplier: u64,

    /// Smallest premium that makes a vote urgent.
    pub min_urgent_premium: u64,

    /// Fraction of the minority stake redistributed to the majority (basis points).
    pub slash_bps: u32,

    /// How long past the deadline a vote without quorum stays open before
    /// its creator may cancel it.
    pub stale_vote_grace_secs: u64,

    // ── Split settlement ─────────────────────────────────────────────────
    /// Maximum number of recipients in one split proposal.
    pub max_split_recipients: usize,
}

impl Default for SettlementParams {
    fn default() -> Self {
        Self {
            standard_voting_period_secs: 259_200,
            urgent_voting_period_secs: 86_400,
            default_min_quorum: 1_000,
            urgent_quorum_multiplier: 2,
            min_urgent_premium: 100,
            slash_bps: 1_000,
            stale_vote_grace_secs: 604_800,
            max_split_recipients: 20,
        }
    }
}
