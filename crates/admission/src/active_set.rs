use std::collections::BTreeMap;

use catalog::Camera;
use foundation::CameraId;

use crate::ticket::FetchTicket;

/// Lifecycle of an admitted camera.
///
/// Inactive cameras are simply absent from the [`ActiveSet`].
#[derive(Debug)]
pub enum Residency<H> {
    /// Admitted; the image fetch identified by the ticket is in flight.
    Pending { ticket: FetchTicket },
    /// The fetch succeeded and the image resource is owned here.
    Active { image: H },
}

/// Whether an active camera has something to paint yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageState {
    Loading,
    Ready,
}

/// A camera in the bounded working set.
///
/// Dropping an `ActiveCamera` drops its image resource, which is how images
/// are released on eviction.
#[derive(Debug)]
pub struct ActiveCamera<H> {
    pub camera: Camera,
    residency: Residency<H>,
}

impl<H> ActiveCamera<H> {
    pub(crate) fn pending(camera: Camera, ticket: FetchTicket) -> Self {
        Self {
            camera,
            residency: Residency::Pending { ticket },
        }
    }

    pub fn id(&self) -> &CameraId {
        &self.camera.id
    }

    pub fn residency(&self) -> &Residency<H> {
        &self.residency
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.residency, Residency::Pending { .. })
    }

    pub fn image(&self) -> Option<&H> {
        match &self.residency {
            Residency::Active { image } => Some(image),
            Residency::Pending { .. } => None,
        }
    }

    pub fn image_state(&self) -> ImageState {
        if self.is_loading() {
            ImageState::Loading
        } else {
            ImageState::Ready
        }
    }

    pub fn pending_ticket(&self) -> Option<FetchTicket> {
        match self.residency {
            Residency::Pending { ticket } => Some(ticket),
            Residency::Active { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    camera_id: CameraId,
    /// The camera was evicted while this fetch was outstanding.
    orphaned: bool,
}

/// How a fetch completion was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Activated(CameraId),
    Failed(CameraId),
    /// The camera was evicted before the fetch resolved, or the ticket is
    /// unknown. Any delivered resource has been dropped.
    Stale(Option<CameraId>),
}

/// The active working set plus bookkeeping for every outstanding fetch.
///
/// Keyed by `BTreeMap` so iteration order, and with it random selection under
/// a seeded generator, is reproducible.
#[derive(Debug)]
pub struct ActiveSet<H> {
    entries: BTreeMap<CameraId, ActiveCamera<H>>,
    in_flight: BTreeMap<FetchTicket, InFlight>,
}

impl<H> Default for ActiveSet<H> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            in_flight: BTreeMap::new(),
        }
    }
}

impl<H> ActiveSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &CameraId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &CameraId) -> Option<&ActiveCamera<H>> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveCamera<H>> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &CameraId> {
        self.entries.keys()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.values().filter(|c| c.is_loading()).count()
    }

    /// Number of fetches still outstanding, including orphaned ones.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// True while any fetch for `id` is outstanding, even if `id` was evicted.
    pub fn has_fetch_in_flight(&self, id: &CameraId) -> bool {
        self.in_flight.values().any(|f| &f.camera_id == id)
    }

    pub(crate) fn take_entries(&mut self) -> BTreeMap<CameraId, ActiveCamera<H>> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn install(&mut self, entries: BTreeMap<CameraId, ActiveCamera<H>>) {
        self.entries = entries;
    }

    pub(crate) fn track_fetch(&mut self, ticket: FetchTicket, camera_id: CameraId) {
        self.in_flight.insert(
            ticket,
            InFlight {
                camera_id,
                orphaned: false,
            },
        );
    }

    /// Releases an entry that left the set. A pending fetch becomes orphaned.
    pub(crate) fn release(&mut self, entry: ActiveCamera<H>) {
        if let Some(ticket) = entry.pending_ticket()
            && let Some(f) = self.in_flight.get_mut(&ticket)
        {
            f.orphaned = true;
        }
        drop(entry);
    }

    /// Applies a fetch completion. Exactly one of the three outcomes happens:
    /// the pending camera becomes active, the camera is dropped, or the result
    /// is discarded.
    pub(crate) fn resolve<E>(&mut self, ticket: FetchTicket, result: Result<H, E>) -> Resolution {
        let Some(flight) = self.in_flight.remove(&ticket) else {
            return Resolution::Stale(None);
        };
        if flight.orphaned {
            return Resolution::Stale(Some(flight.camera_id));
        }

        let expected = self
            .entries
            .get(&flight.camera_id)
            .and_then(ActiveCamera::pending_ticket);
        if expected != Some(ticket) {
            return Resolution::Stale(Some(flight.camera_id));
        }

        match result {
            Ok(image) => {
                if let Some(entry) = self.entries.get_mut(&flight.camera_id) {
                    entry.residency = Residency::Active { image };
                }
                Resolution::Activated(flight.camera_id)
            }
            Err(_) => {
                self.entries.remove(&flight.camera_id);
                Resolution::Failed(flight.camera_id)
            }
        }
    }
}
