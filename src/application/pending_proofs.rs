//! Pending proof registry.
//!
//! Bounded, keyed, ephemeral map from user to the proof they announced.
//! A restart drops everything in it; users simply press "I paid" again.

use std::collections::HashMap;

use chrono::Duration;
use tokio::sync::RwLock;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::PendingProof;

pub const DEFAULT_PROOF_TTL_HOURS: i64 = 24;
pub const DEFAULT_PROOF_CAPACITY: usize = 10_000;

pub struct PendingProofRegistry {
    entries: RwLock<HashMap<UserId, PendingProof>>,
    ttl: Duration,
    capacity: usize,
}

impl PendingProofRegistry {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a proof, replacing any earlier one of the same user.
    ///
    /// When full, the oldest entry makes room.
    pub async fn record(&self, proof: PendingProof) {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&proof.user_id) && entries.len() >= self.capacity {
            let oldest = entries
                .values()
                .min_by_key(|p| p.submitted_at)
                .map(|p| p.user_id);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                tracing::warn!(user_id = %oldest, "Pending proof evicted, registry full");
            }
        }

        entries.insert(proof.user_id, proof);
    }

    /// Remove and return the proof of `user`, unless it is stale.
    pub async fn take(&self, user: UserId, now: Timestamp) -> Option<PendingProof> {
        let proof = self.entries.write().await.remove(&user)?;
        if proof.is_stale(now, self.ttl) {
            tracing::debug!(user_id = %user, "Pending proof expired");
            return None;
        }
        Some(proof)
    }

    /// Drop stale entries. Returns how many were removed.
    pub async fn purge_expired(&self, now: Timestamp) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, proof| !proof.is_stale(now, self.ttl));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for PendingProofRegistry {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_PROOF_TTL_HOURS), DEFAULT_PROOF_CAPACITY)
    }
}
