//! Handle allocation, one counter per handle space.
//!
//! Fresh handles always exceed every handle seen so far in the space, seeded,
//! reserved or claimed, so a freshly allocated handle can never collide.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use gwa_model::{EntityHeader, Handle, HandleSpace};

use crate::error::{Result, SyncError};

/// A handle that already exists on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub space: HandleSpace,
    pub handle: Handle,
    pub application_id: Option<String>,
}

impl Seed {
    pub fn new(space: HandleSpace, handle: u32, application_id: Option<&str>) -> Self {
        Self {
            space,
            handle: Handle(handle),
            application_id: application_id.map(str::to_string),
        }
    }

    /// Seeds for every assigned entity of a previously received model.
    pub fn from_model(model: &gwa_model::Model) -> Vec<Seed> {
        let mut seeds = Vec::new();
        for kind in gwa_model::EntityKind::ALL {
            if kind == gwa_model::EntityKind::Mesh {
                for face in model.meshes.iter().flat_map(|m| &m.faces) {
                    seeds.push(Seed {
                        space: HandleSpace::Element,
                        handle: face.header.handle,
                        application_id: face.header.application_id.clone(),
                    });
                }
                continue;
            }
            for (space, header) in model.spaced_headers(kind) {
                seeds.push(Seed {
                    space,
                    handle: header.handle,
                    application_id: header.application_id.clone(),
                });
            }
        }
        seeds.retain(|s| s.handle.is_set());
        seeds
    }
}

#[derive(Debug, Default)]
struct SpaceState {
    highest: u32,
    claimed: BTreeSet<Handle>,
    /// Handles preset on entities of this operation, claimed later.
    reserved: BTreeSet<Handle>,
    /// Handles present on the receiving side, by application id.
    seeded: HashMap<String, Handle>,
    /// Application ids of entities handled in this operation.
    app_ids: HashMap<String, Vec<Handle>>,
}

impl SpaceState {
    fn bump(&mut self, handle: Handle) {
        self.highest = self.highest.max(handle.0);
    }
}

/// Hands out handles for one operation.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    spaces: BTreeMap<HandleSpace, SpaceState>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seeds(seeds: &[Seed]) -> Self {
        let mut allocator = Self::new();
        for seed in seeds {
            allocator.seed(seed.space, seed.handle, seed.application_id.as_deref());
        }
        allocator
    }

    fn space(&mut self, space: HandleSpace) -> &mut SpaceState {
        self.spaces.entry(space).or_default()
    }

    /// Registers a handle already present on the receiving side. Entities
    /// with the same application id and no handle reuse it.
    pub fn seed(&mut self, space: HandleSpace, handle: Handle, application_id: Option<&str>) {
        if !handle.is_set() {
            return;
        }
        let state = self.space(space);
        state.bump(handle);
        if let Some(id) = application_id {
            state.seeded.entry(id.to_string()).or_insert(handle);
        }
    }

    /// Keeps `handle` out of allocation without claiming it. Used for handles
    /// preset on entities that are assigned later in the operation.
    pub fn reserve(&mut self, space: HandleSpace, handle: Handle) {
        if handle.is_set() {
            let state = self.space(space);
            state.reserved.insert(handle);
            state.bump(handle);
        }
    }

    /// Claims a preset handle. Claiming the same handle twice is fatal.
    pub fn claim(&mut self, space: HandleSpace, handle: Handle) -> Result<()> {
        let state = self.space(space);
        if !state.claimed.insert(handle) {
            return Err(SyncError::DuplicateHandleRequest { space, handle });
        }
        state.bump(handle);
        Ok(())
    }

    /// Allocates and claims the next free handle.
    pub fn next(&mut self, space: HandleSpace) -> Handle {
        let state = self.space(space);
        let handle = Handle(state.highest + 1);
        state.highest = handle.0;
        state.claimed.insert(handle);
        handle
    }

    /// Gives `header` its handle for this operation and writes it back.
    ///
    /// A preset handle is claimed; an unset one reuses the seeded handle of
    /// the same application id when no other entity claimed or presets it,
    /// or is allocated.
    pub fn assign(&mut self, space: HandleSpace, header: &mut EntityHeader) -> Result<Handle> {
        let handle = if header.handle.is_set() {
            self.claim(space, header.handle)?;
            header.handle
        } else {
            let reusable = header.application_id.as_ref().and_then(|id| {
                let state = self.spaces.get(&space)?;
                state
                    .seeded
                    .get(id)
                    .copied()
                    .filter(|h| !state.claimed.contains(h) && !state.reserved.contains(h))
            });
            match reusable {
                Some(handle) => {
                    self.claim(space, handle)?;
                    handle
                }
                None => self.next(space),
            }
        };
        header.handle = handle;
        if let Some(id) = &header.application_id {
            self.register(space, id, handle);
        }
        Ok(handle)
    }

    /// Records that `application_id` resolves to `handle` in this operation.
    pub fn register(&mut self, space: HandleSpace, application_id: &str, handle: Handle) {
        let handles = self
            .space(space)
            .app_ids
            .entry(application_id.to_string())
            .or_default();
        if !handles.contains(&handle) {
            handles.push(handle);
        }
    }

    /// Handles registered for an application id, in registration order.
    pub fn resolve(&self, space: HandleSpace, application_id: &str) -> &[Handle] {
        self.spaces
            .get(&space)
            .and_then(|state| state.app_ids.get(application_id))
            .map(|handles| handles.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_claimed(&self, space: HandleSpace, handle: Handle) -> bool {
        self.spaces
            .get(&space)
            .is_some_and(|state| state.claimed.contains(&handle))
    }

    pub fn highest(&self, space: HandleSpace) -> Handle {
        Handle(self.spaces.get(&space).map_or(0, |state| state.highest))
    }
}
