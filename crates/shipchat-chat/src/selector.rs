//! Tier health tracking and fallback ordering.
//!
//! Health moves `untested -> healthy -> degraded` and never back. A degraded
//! tier is skipped for the rest of the session without re-probing. The local
//! tier cannot fail upward, so it is never degraded and always comes last.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::transport::Tier;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierHealth {
    #[default]
    Untested,
    Healthy,
    Degraded,
}

impl fmt::Display for TierHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierHealth::Untested => write!(f, "untested"),
            TierHealth::Healthy => write!(f, "healthy"),
            TierHealth::Degraded => write!(f, "degraded"),
        }
    }
}

impl TierHealth {
    /// Health after a successful call.
    pub fn on_success(self) -> Self {
        match self {
            TierHealth::Degraded => TierHealth::Degraded,
            _ => TierHealth::Healthy,
        }
    }

    /// Health after a failed call or probe.
    pub fn on_failure(self) -> Self {
        TierHealth::Degraded
    }

    pub fn is_usable(self) -> bool {
        !matches!(self, TierHealth::Degraded)
    }
}

/// Per-session health of every tier.
#[derive(Debug, Clone, Default)]
pub struct TierBoard {
    health: BTreeMap<Tier, TierHealth>,
}

impl TierBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self, tier: Tier) -> TierHealth {
        self.health.get(&tier).copied().unwrap_or_default()
    }

    pub fn record_success(&mut self, tier: Tier) {
        let next = self.health(tier).on_success();
        self.health.insert(tier, next);
    }

    /// Marks `tier` degraded. Returns `true` when this call changed its health.
    pub fn record_failure(&mut self, tier: Tier) -> bool {
        if tier == Tier::Local {
            return false;
        }
        let previous = self.health(tier);
        self.health.insert(tier, previous.on_failure());
        previous != TierHealth::Degraded
    }

    pub fn snapshot(&self) -> Vec<(Tier, TierHealth)> {
        Tier::PRIORITY
            .iter()
            .map(|tier| (*tier, self.health(*tier)))
            .collect()
    }
}

/// Tiers to try for one message, best first.
///
/// Only tiers in `available` are considered. Degraded tiers are dropped and
/// the local tier, when available, is placed last.
pub fn order(available: &[Tier], board: &TierBoard) -> Vec<Tier> {
    let mut tiers: Vec<Tier> = available
        .iter()
        .copied()
        .filter(|tier| *tier == Tier::Local || board.health(*tier).is_usable())
        .collect();
    tiers.sort();
    tiers.dedup();
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Tier; 3] = Tier::PRIORITY;

    #[test]
    fn test_health_is_monotonic() {
        assert_eq!(TierHealth::Untested.on_success(), TierHealth::Healthy);
        assert_eq!(TierHealth::Healthy.on_failure(), TierHealth::Degraded);
        assert_eq!(TierHealth::Degraded.on_success(), TierHealth::Degraded);
        assert_eq!(TierHealth::Untested.on_failure(), TierHealth::Degraded);
    }

    #[test]
    fn test_fresh_board_tries_everything_in_priority_order() {
        let board = TierBoard::new();
        assert_eq!(order(&ALL, &board), ALL.to_vec());
        assert_eq!(
            order(&[Tier::Local, Tier::RemoteHttp, Tier::Realtime], &board),
            ALL.to_vec()
        );
    }

    #[test]
    fn test_degraded_tier_is_skipped() {
        let mut board = TierBoard::new();
        assert!(board.record_failure(Tier::Realtime));
        assert!(!board.record_failure(Tier::Realtime));
        board.record_success(Tier::Realtime);

        assert_eq!(board.health(Tier::Realtime), TierHealth::Degraded);
        assert_eq!(order(&ALL, &board), vec![Tier::RemoteHttp, Tier::Local]);
    }

    #[test]
    fn test_local_is_never_degraded() {
        let mut board = TierBoard::new();
        board.record_failure(Tier::Realtime);
        board.record_failure(Tier::RemoteHttp);
        assert!(!board.record_failure(Tier::Local));
        assert_eq!(order(&ALL, &board), vec![Tier::Local]);
    }

    #[test]
    fn test_unavailable_tiers_are_not_ordered() {
        let board = TierBoard::new();
        assert_eq!(
            order(&[Tier::RemoteHttp, Tier::Local], &board),
            vec![Tier::RemoteHttp, Tier::Local]
        );
    }

    #[test]
    fn test_snapshot_lists_every_tier() {
        let mut board = TierBoard::new();
        board.record_success(Tier::RemoteHttp);
        assert_eq!(
            board.snapshot(),
            vec![
                (Tier::Realtime, TierHealth::Untested),
                (Tier::RemoteHttp, TierHealth::Healthy),
                (Tier::Local, TierHealth::Untested),
            ]
        );
        assert_eq!(TierHealth::Degraded.to_string(), "degraded");
    }
}
