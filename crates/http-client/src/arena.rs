//! Generation-checked storage for in-flight requests
//!
//! A request is owned by the arena from creation until its handler runs or it
//! is cancelled. Handles held by the application, the transaction map or the
//! postponed list go stale once the slot is freed: the generation stored in
//! the [`RequestId`] no longer matches and lookups return `None`.

use std::fmt;

/// Handle of a request owned by an [`HttpClient`](crate::HttpClient)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId {
    index: u32,
    generation: u32,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}.{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct RequestArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for RequestArena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> RequestArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value built from its own id
    pub fn insert_with(&mut self, build: impl FnOnce(RequestId) -> T) -> RequestId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                RequestId { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, value: None });
                RequestId { index, generation: 0 }
            }
        };
        self.slots[id.index as usize].value = Some(build(id));
        self.len += 1;
        id
    }

    pub fn insert(&mut self, value: T) -> RequestId {
        self.insert_with(|_| value)
    }

    pub fn get(&self, id: RequestId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: RequestId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.get(id).is_some()
    }

    /// Take the value out; the id and its copies become stale
    pub fn remove(&mut self, id: RequestId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ids(&self) -> Vec<RequestId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| RequestId { index: index as u32, generation: slot.generation })
            .collect()
    }
}
