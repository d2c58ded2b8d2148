use std::collections::{BTreeMap, HashSet};

use catalog::Camera;
use foundation::CameraId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::active_set::{ActiveCamera, ActiveSet, Resolution};
use crate::policy::{AdmissionConfig, AdmissionPolicy};
use crate::ticket::{FetchError, FetchRequest, FetchTicket};

/// What one admission transition changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transition {
    pub retained: Vec<CameraId>,
    /// Left the visible set.
    pub evicted: Vec<CameraId>,
    /// Still visible, but removed at random to respect the bound.
    pub pruned: Vec<CameraId>,
    /// One fetch per newly admitted camera.
    pub requests: Vec<FetchRequest>,
}

impl Transition {
    /// True when the active set is exactly what it was before.
    pub fn is_noop(&self) -> bool {
        self.evicted.is_empty() && self.pruned.is_empty() && self.requests.is_empty()
    }

    pub fn admitted(&self) -> impl Iterator<Item = &CameraId> {
        self.requests.iter().map(|r| &r.camera_id)
    }
}

/// Result of applying one fetch completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Activated(CameraId),
    /// The fetch failed; the camera left the active set and its slot is free.
    Failed(CameraId, FetchError),
    /// Arrived for a camera that is no longer expecting it; discarded.
    Stale(Option<CameraId>),
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AdmissionStats {
    pub transitions: u64,
    pub admitted: u64,
    pub evicted: u64,
    pub pruned: u64,
    pub activated: u64,
    pub failed: u64,
    pub stale: u64,
}

/// Keeps a bounded, randomly refreshed set of active cameras.
///
/// Each transition retains still-visible cameras, prunes uniformly at random
/// down to `max_active`, then fills free slots from a uniformly shuffled pool
/// of qualifying visible cameras. A camera is never admitted while a fetch for
/// it is outstanding, so there is at most one fetch per camera id.
#[derive(Debug)]
pub struct AdmissionController<H, R = StdRng> {
    config: AdmissionConfig,
    set: ActiveSet<H>,
    rng: R,
    next_ticket: u64,
    stats: AdmissionStats,
}

impl<H> AdmissionController<H, StdRng> {
    pub fn new(config: AdmissionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: AdmissionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<H, R: Rng> AdmissionController<H, R> {
    pub fn with_rng(config: AdmissionConfig, rng: R) -> Self {
        Self {
            config,
            set: ActiveSet::new(),
            rng,
            next_ticket: 1,
            stats: AdmissionStats::default(),
        }
    }

    pub fn config(&self) -> AdmissionConfig {
        self.config
    }

    pub fn max_active(&self) -> usize {
        self.config.max_active
    }

    /// Takes effect at the next transition.
    pub fn set_max_active(&mut self, max_active: usize) {
        self.config.max_active = max_active;
    }

    pub fn set_policy(&mut self, policy: AdmissionPolicy) {
        self.config.policy = policy;
    }

    pub fn active(&self) -> &ActiveSet<H> {
        &self.set
    }

    pub fn stats(&self) -> AdmissionStats {
        self.stats
    }

    /// Recomputes the active set for a new visible set.
    ///
    /// The new set is built completely before it replaces the old one.
    /// Evicted and pruned cameras are dropped here, releasing their images.
    pub fn transition(&mut self, visible: &[&Camera]) -> Transition {
        self.stats.transitions += 1;
        let max_active = self.config.max_active;
        let visible_by_id: BTreeMap<&CameraId, &Camera> =
            visible.iter().map(|&c| (&c.id, c)).collect();

        let mut out = Transition::default();
        let mut retained: Vec<(CameraId, ActiveCamera<H>)> = Vec::new();
        for (id, mut entry) in self.set.take_entries() {
            match visible_by_id.get(&id) {
                Some(camera) => {
                    entry.camera = (*camera).clone();
                    retained.push((id, entry));
                }
                None => {
                    debug!(camera = %id, "evicting camera that left the viewport");
                    self.set.release(entry);
                    out.evicted.push(id);
                }
            }
        }

        while retained.len() > max_active {
            let victim = self.rng.gen_range(0..retained.len());
            let (id, entry) = retained.remove(victim);
            debug!(camera = %id, max_active, "pruning camera over capacity");
            self.set.release(entry);
            out.pruned.push(id);
        }

        let slots = max_active - retained.len();
        let mut entries: BTreeMap<CameraId, ActiveCamera<H>> = retained.into_iter().collect();

        if slots > 0 {
            let mut seen: HashSet<CameraId> = HashSet::new();
            let mut candidates: Vec<&Camera> = visible
                .iter()
                .copied()
                .filter(|c| seen.insert(c.id.clone()))
                .filter(|c| !entries.contains_key(&c.id))
                .filter(|c| !self.set.has_fetch_in_flight(&c.id))
                .filter(|c| self.config.policy.admits(c.status))
                .collect();
            candidates.shuffle(&mut self.rng);

            for camera in candidates.into_iter().take(slots) {
                let ticket = FetchTicket(self.next_ticket);
                self.next_ticket += 1;
                self.set.track_fetch(ticket, camera.id.clone());
                entries.insert(camera.id.clone(), ActiveCamera::pending(camera.clone(), ticket));
                out.requests.push(FetchRequest {
                    camera_id: camera.id.clone(),
                    ticket,
                });
            }
        }

        out.retained = entries
            .keys()
            .filter(|id| !out.requests.iter().any(|r| &r.camera_id == *id))
            .cloned()
            .collect();
        self.set.install(entries);

        self.stats.evicted += out.evicted.len() as u64;
        self.stats.pruned += out.pruned.len() as u64;
        self.stats.admitted += out.requests.len() as u64;
        if !out.is_noop() {
            debug!(
                retained = out.retained.len(),
                evicted = out.evicted.len(),
                pruned = out.pruned.len(),
                admitted = out.requests.len(),
                "admission transition"
            );
        }
        out
    }

    /// Applies the result of the fetch identified by `ticket`.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<H, FetchError>) -> Completion {
        let error = result.as_ref().err().cloned();
        match self.set.resolve(ticket, result) {
            Resolution::Activated(id) => {
                self.stats.activated += 1;
                Completion::Activated(id)
            }
            Resolution::Failed(id) => {
                self.stats.failed += 1;
                let error = error.unwrap_or(FetchError::Cancelled);
                debug!(camera = %id, %error, "dropping camera after failed fetch");
                Completion::Failed(id, error)
            }
            Resolution::Stale(id) => {
                self.stats.stale += 1;
                debug!(ticket = ticket.0, camera = ?id, "discarding stale fetch result");
                Completion::Stale(id)
            }
        }
    }
}
