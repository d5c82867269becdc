//! Container state machine.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{DiError, DiResult};

/// Lifecycle state of a [`Container`](crate::Container).
///
/// ```text
/// Uninitialized --initialize--> Ready --close--> Closed --(cleared)--> Uninitialized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContainerState {
    /// Accepting registrations; lookups fail
    Uninitialized = 0,
    /// Initialized; lookups succeed, registrations fail
    Ready = 1,
    /// Shutting down; closeable singletons are being closed
    Closed = 2,
}

impl ContainerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ContainerState::Ready,
            2 => ContainerState::Closed,
            _ => ContainerState::Uninitialized,
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerState::Uninitialized => "uninitialized",
            ContainerState::Ready => "ready",
            ContainerState::Closed => "closed",
        })
    }
}

/// Lock-free state flag. Written only under the registry lock.
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ContainerState::Uninitialized as u8))
    }

    pub(crate) fn load(&self) -> ContainerState {
        ContainerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ContainerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Lookups are legal only once the container is ready.
    pub(crate) fn require_ready(&self) -> DiResult<()> {
        match self.load() {
            ContainerState::Ready => Ok(()),
            ContainerState::Closed => Err(DiError::Closed),
            ContainerState::Uninitialized => Err(DiError::NotInitialized),
        }
    }

    /// Registrations and initialization are legal only before initialization.
    pub(crate) fn require_uninitialized(&self, operation: &'static str) -> DiResult<()> {
        match self.load() {
            ContainerState::Uninitialized => Ok(()),
            _ => Err(DiError::AlreadyInitialized { operation }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_round_trip() {
        let cell = StateCell::new();
        assert_eq!(cell.load(), ContainerState::Uninitialized);
        assert!(matches!(cell.require_ready(), Err(DiError::NotInitialized)));

        cell.store(ContainerState::Ready);
        assert!(cell.require_ready().is_ok());
        assert!(matches!(
            cell.require_uninitialized("can't register new bean"),
            Err(DiError::AlreadyInitialized { operation: "can't register new bean" })
        ));

        cell.store(ContainerState::Closed);
        assert!(matches!(cell.require_ready(), Err(DiError::Closed)));
        assert_eq!(cell.load().to_string(), "closed");
    }
}
