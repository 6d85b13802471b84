use std::fmt;

use thiserror::Error;

/// Lifecycle of a collection's working snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HydrationState {
    /// Nothing has been read yet.
    #[default]
    Unloaded,
    /// Persisted state is being read; writes are not allowed.
    Loading,
    /// The working snapshot holds persisted or seeded data; reads and writes are allowed.
    Ready,
}

impl fmt::Display for HydrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationState::Unloaded => write!(f, "unloaded"),
            HydrationState::Loading => write!(f, "loading"),
            HydrationState::Ready => write!(f, "ready"),
        }
    }
}

/// Error type for hydration state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HydrationError {
    #[error("hydration already started (state: {0})")]
    AlreadyStarted(HydrationState),
    #[error("hydration not in progress (state: {0})")]
    NotLoading(HydrationState),
    #[error("not hydrated yet (state: {0})")]
    NotReady(HydrationState),
}

/// One-shot gate: `Unloaded -> Loading -> Ready`.
///
/// Nothing may be saved or rendered before `Ready`; a premature save would
/// overwrite real persisted data with seed defaults.
#[derive(Debug, Default)]
pub struct HydrationGuard {
    state: HydrationState,
}

impl HydrationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HydrationState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == HydrationState::Ready
    }

    /// `Unloaded -> Loading`. Happens once per guard.
    pub fn begin(&mut self) -> Result<(), HydrationError> {
        match self.state {
            HydrationState::Unloaded => {
                self.state = HydrationState::Loading;
                Ok(())
            }
            state => Err(HydrationError::AlreadyStarted(state)),
        }
    }

    /// `Loading -> Ready`, once the working snapshot is in place.
    pub fn complete(&mut self) -> Result<(), HydrationError> {
        match self.state {
            HydrationState::Loading => {
                self.state = HydrationState::Ready;
                Ok(())
            }
            state => Err(HydrationError::NotLoading(state)),
        }
    }

    pub fn ensure_ready(&self) -> Result<(), HydrationError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(HydrationError::NotReady(self.state))
        }
    }
}
