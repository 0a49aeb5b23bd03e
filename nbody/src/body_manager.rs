//! Owns all bodies and maintains a dense, contiguous view of the enabled
//! subset for tight iteration (spec.md §4.2).

use std::collections::BinaryHeap;

use crate::body::{Body, BodyId, NOT_ENABLED};

/// Fields `tryUpdateBody` may change; any field left `None` is untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyUpdates {
    pub enabled: Option<bool>,
    pub mass: Option<f64>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub vel_x: Option<f64>,
    pub vel_y: Option<f64>,
    pub acc_x: Option<f64>,
    pub acc_y: Option<f64>,
}

/// Synchronous lifecycle signals, delivered inside the call that causes
/// them (spec.md §4.2, §5).
#[derive(Debug, Clone, Copy)]
pub enum BodyManagerEvent {
    BodyAdded(Body),
    BodyRemoved(BodyId),
    EnabledContentModified,
}

/// Owns body storage and the dense enabled-subset list.
///
/// Bodies are stored in a `Vec<Option<Body>>` indexed directly by
/// `BodyId` (ids are small non-negative integers assigned by `create_body`/
/// `try_add_body`), so lookup by id is a plain array index rather than a
/// hash lookup. `create_body` assigns the lowest currently-unused id,
/// tracked with a min-heap of freed ids (spec.md §4.2).
#[derive(Default)]
pub struct BodyManager {
    storage: Vec<Option<Body>>,
    free_ids: BinaryHeap<std::cmp::Reverse<u64>>,
    enabled: Vec<BodyId>,
    count: usize,
    listeners: Vec<Box<dyn FnMut(&BodyManagerEvent)>>,
}

impl BodyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked synchronously for every subsequent
    /// signal. There is no unsubscribe; callbacks live as long as the
    /// manager.
    pub fn subscribe(&mut self, listener: Box<dyn FnMut(&BodyManagerEvent)>) {
        self.listeners.push(listener);
    }

    fn emit(&mut self, event: BodyManagerEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    fn lowest_unused_id(&mut self) -> BodyId {
        if let Some(std::cmp::Reverse(id)) = self.free_ids.pop() {
            BodyId(id)
        } else {
            BodyId(self.storage.len() as u64)
        }
    }

    fn place(&mut self, body: Body) {
        let index = body.id.value() as usize;
        if index == self.storage.len() {
            self.storage.push(Some(body));
        } else if index < self.storage.len() {
            debug_assert!(
                self.storage[index].is_none(),
                "attempted to place a body on top of an occupied id"
            );
            self.storage[index] = Some(body);
        } else {
            // Caller supplied an id beyond the current high-water mark
            // (only possible via try_add_body): the gap ids become free.
            for gap in self.storage.len() as u64..body.id.value() {
                self.free_ids.push(std::cmp::Reverse(gap));
            }
            self.storage.resize(index, None);
            self.storage.push(Some(body));
        }
        self.count += 1;
    }

    /// Assigns the lowest unused non-negative id, builds the body via
    /// `factory`, and inserts it. Debug builds assert `factory` returned a
    /// body whose id matches the one it was given (spec.md §4.2).
    pub fn create_body(&mut self, factory: impl FnOnce(BodyId) -> Body) -> Body {
        let id = self.lowest_unused_id();
        let body = factory(id);
        debug_assert_eq!(
            body.id(),
            id,
            "body factory must construct a body with the id it was given"
        );
        self.place(body);
        if body.enabled {
            self.push_enabled(body.id);
        }
        self.emit(BodyManagerEvent::BodyAdded(body));
        if body.enabled {
            self.emit(BodyManagerEvent::EnabledContentModified);
        }
        body
    }

    /// Inserts `body` under its own id. Returns `false` without effect if
    /// that id is already present.
    pub fn try_add_body(&mut self, body: Body) -> bool {
        if self.has_body(body.id) {
            return false;
        }
        self.place(body);
        if body.enabled {
            self.push_enabled(body.id);
        }
        self.emit(BodyManagerEvent::BodyAdded(body));
        if body.enabled {
            self.emit(BodyManagerEvent::EnabledContentModified);
        }
        true
    }

    /// Removes the body with `id`. Returns `false` without effect if absent.
    pub fn try_delete_body(&mut self, id: BodyId) -> bool {
        let index = id.value() as usize;
        let Some(slot) = self.storage.get_mut(index) else {
            return false;
        };
        let Some(body) = slot.take() else {
            return false;
        };
        self.count -= 1;
        self.free_ids.push(std::cmp::Reverse(id.value()));
        let was_enabled = body.enabled;
        if was_enabled {
            self.remove_enabled(body.enabled_index);
        }
        self.emit(BodyManagerEvent::BodyRemoved(id));
        if was_enabled {
            self.emit(BodyManagerEvent::EnabledContentModified);
        }
        true
    }

    /// Atomically applies every `Some` field in `updates`. Returns `false`
    /// without effect if `id` is absent.
    pub fn try_update_body(&mut self, id: BodyId, updates: BodyUpdates) -> bool {
        let index = id.value() as usize;
        let Some(Some(mut body)) = self.storage.get(index).copied() else {
            return false;
        };
        let was_enabled = body.enabled;
        let old_enabled_index = body.enabled_index;

        if let Some(mass) = updates.mass {
            body.mass = mass;
        }
        if let Some(x) = updates.pos_x {
            body.position.x = x;
        }
        if let Some(y) = updates.pos_y {
            body.position.y = y;
        }
        if let Some(x) = updates.vel_x {
            body.velocity.x = x;
        }
        if let Some(y) = updates.vel_y {
            body.velocity.y = y;
        }
        if let Some(x) = updates.acc_x {
            body.acceleration.x = x;
        }
        if let Some(y) = updates.acc_y {
            body.acceleration.y = y;
        }
        if let Some(enabled) = updates.enabled {
            body.enabled = enabled;
        }
        let now_enabled = body.enabled;

        self.storage[index] = Some(body);

        if now_enabled && !was_enabled {
            self.push_enabled(id);
        } else if !now_enabled && was_enabled {
            self.remove_enabled(old_enabled_index);
            self.get_mut_unchecked(id).enabled_index = NOT_ENABLED;
        }

        // Fires whenever the enabled set changes, or an already-enabled
        // body is updated in place (spec.md §4.2).
        if was_enabled || now_enabled {
            self.emit(BodyManagerEvent::EnabledContentModified);
        }
        true
    }

    pub fn try_get_body(&self, id: BodyId) -> Option<&Body> {
        self.storage.get(id.value() as usize)?.as_ref()
    }

    pub fn get_body_or_null(&self, id: BodyId) -> Option<Body> {
        self.try_get_body(id).copied()
    }

    pub fn has_body(&self, id: BodyId) -> bool {
        self.try_get_body(id).is_some()
    }

    pub fn body_count(&self) -> usize {
        self.count
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }

    /// All bodies, in no particular order (sparse ids permitted).
    pub fn all_bodies(&self) -> impl Iterator<Item = &Body> {
        self.storage.iter().filter_map(|slot| slot.as_ref())
    }

    /// The dense enabled-subset ids, in the order their owning bodies hold
    /// `enabled_index` (spec.md §4.2 "Dense enabled-subset invariant").
    pub fn enabled_ids(&self) -> &[BodyId] {
        &self.enabled
    }

    pub fn enabled_bodies(&self) -> impl Iterator<Item = &Body> {
        self.enabled.iter().map(move |id| self.get_unchecked(*id))
    }

    fn get_unchecked(&self, id: BodyId) -> &Body {
        self.storage[id.value() as usize].as_ref().unwrap()
    }

    /// Mutable access by id, used by `Simulation` to integrate enabled
    /// bodies without going through the public update path (which would
    /// fire a signal per field).
    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.storage.get_mut(id.value() as usize)?.as_mut()
    }

    fn push_enabled(&mut self, id: BodyId) {
        let enabled_index = self.enabled.len();
        self.enabled.push(id);
        self.get_mut_unchecked(id).enabled_index = enabled_index;
    }

    fn get_mut_unchecked(&mut self, id: BodyId) -> &mut Body {
        self.storage[id.value() as usize].as_mut().unwrap()
    }

    /// Drops every body without emitting `BodyRemoved`/`EnabledContentModified`
    /// per body; used by `Engine::import` to replace the whole population in
    /// one bulk operation rather than as a flurry of individual deletes.
    /// Registered listeners are untouched.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.free_ids.clear();
        self.enabled.clear();
        self.count = 0;
    }

    /// Removes an entry from the dense enabled list by swapping with the
    /// last element and fixing up the swapped body's `enabled_index`
    /// (spec.md §4.2, §9 "Dense enabled list with swap-remove").
    fn remove_enabled(&mut self, enabled_index: usize) {
        debug_assert_ne!(enabled_index, NOT_ENABLED);
        self.enabled.swap_remove(enabled_index);
        if let Some(&moved_id) = self.enabled.get(enabled_index) {
            self.get_mut_unchecked(moved_id).enabled_index = enabled_index;
        }
    }
}
