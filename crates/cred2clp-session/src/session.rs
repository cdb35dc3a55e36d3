use std::fmt;
use std::num::NonZeroU32;

use cred2clp_transport::{BaudRate, BaudRateSet};
use serde::Serialize;

/// Opaque, non-zero handle identifying one open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionHandle(NonZeroU32);

impl SessionHandle {
    /// Wrap a raw handle from the host. Zero is never a valid handle.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selector registers that choose which sub-quantity a dependent register
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    Indicator,
    Temperature,
    UserSet,
    Power,
}

/// Per-session selector values. All start at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectorState {
    pub indicator: i32,
    pub temperature: i32,
    pub user_set: i32,
    pub power: i32,
}

impl SelectorState {
    pub fn get(&self, selector: Selector) -> i32 {
        match selector {
            Selector::Indicator => self.indicator,
            Selector::Temperature => self.temperature,
            Selector::UserSet => self.user_set,
            Selector::Power => self.power,
        }
    }

    pub fn set(&mut self, selector: Selector, value: i32) {
        match selector {
            Selector::Indicator => self.indicator = value,
            Selector::Temperature => self.temperature = value,
            Selector::UserSet => self.user_set = value,
            Selector::Power => self.power = value,
        }
    }
}

/// State kept for one open connection between probe and disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub handle: SessionHandle,
    /// Fully-qualified device ID issued at probe time.
    pub device_id: String,
    pub active_baud_rate: BaudRate,
    pub supported_baud_rates: BaudRateSet,
    pub selectors: SelectorState,
}

impl Session {
    pub fn new(
        handle: SessionHandle,
        device_id: impl Into<String>,
        active_baud_rate: BaudRate,
        supported_baud_rates: BaudRateSet,
    ) -> Self {
        Self {
            handle,
            device_id: device_id.into(),
            active_baud_rate,
            supported_baud_rates,
            selectors: SelectorState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_handle() {
        assert!(SessionHandle::from_raw(0).is_none());
        assert_eq!(SessionHandle::from_raw(7).map(SessionHandle::get), Some(7));
    }

    #[test]
    fn selectors_are_independent() {
        let mut state = SelectorState::default();
        state.set(Selector::Temperature, 3);
        state.set(Selector::Power, -1);
        assert_eq!(state.get(Selector::Temperature), 3);
        assert_eq!(state.get(Selector::Power), -1);
        assert_eq!(state.get(Selector::UserSet), 0);
        assert_eq!(state.get(Selector::Indicator), 0);
    }
}
