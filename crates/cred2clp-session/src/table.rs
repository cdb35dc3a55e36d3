use std::collections::BTreeMap;

use crate::error::{EngineError, Result};
use crate::session::{Session, SessionHandle};

/// Live sessions keyed by handle.
///
/// Handles come from a counter that starts at 1, wraps around, and skips zero
/// and any handle still in use.
#[derive(Debug)]
pub struct SessionTable {
    sessions: BTreeMap<SessionHandle, Session>,
    next: u32,
    capacity: u64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// A table whose first allocation tries `next`.
    pub fn starting_at(next: u32) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next,
            capacity: u64::from(u32::MAX),
        }
    }

    /// Limit the number of live sessions below the full handle space.
    pub fn with_capacity_limit(mut self, capacity: u32) -> Self {
        self.capacity = u64::from(capacity);
        self
    }

    /// Reserve a fresh handle. The handle is not live until `insert`.
    pub fn allocate(&mut self) -> Result<SessionHandle> {
        if self.sessions.len() as u64 >= self.capacity {
            return Err(EngineError::SessionTableFull);
        }
        loop {
            let candidate = self.next;
            self.next = self.next.wrapping_add(1);
            if let Some(handle) = SessionHandle::from_raw(candidate) {
                if !self.sessions.contains_key(&handle) {
                    return Ok(handle);
                }
            }
        }
    }

    /// Make `session` live under its handle.
    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.handle, session);
    }

    pub fn find(&self, handle: u32) -> Result<&Session> {
        SessionHandle::from_raw(handle)
            .and_then(|h| self.sessions.get(&h))
            .ok_or(EngineError::InvalidSession(handle))
    }

    pub fn find_mut(&mut self, handle: u32) -> Result<&mut Session> {
        SessionHandle::from_raw(handle)
            .and_then(|h| self.sessions.get_mut(&h))
            .ok_or(EngineError::InvalidSession(handle))
    }

    /// Remove a session. Returns false if no session had this handle.
    pub fn remove(&mut self, handle: u32) -> bool {
        SessionHandle::from_raw(handle)
            .and_then(|h| self.sessions.remove(&h))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Live handles in ascending order.
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
