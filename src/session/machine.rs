//! Scan session states as enforced by the native layer
//!
//! The bridge never tracks this itself, native implementations drive the
//! machine and the bridge only issues the triggering calls.

use ndef_macros::display_as_str;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Default, uniffi::Enum)]
pub enum SessionState {
    #[default]
    Idle,
    Scanning,
    TagPresent,
    Writing,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, uniffi::Enum)]
pub enum SessionTrigger {
    Begin,
    TagDetected,
    WriteRequested,
    /// Write finished, successfully or not, the session closes either way
    WriteFinished,
    End,
    /// Closed without the application asking, its error callback fires
    ClosedExternally,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{trigger} is not valid while {state}")]
    InvalidTransition {
        state: SessionState,
        trigger: SessionTrigger,
    },
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Scanning => "scanning",
            SessionState::TagPresent => "tag present",
            SessionState::Writing => "writing",
        }
    }

    pub const fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

impl SessionTrigger {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionTrigger::Begin => "begin",
            SessionTrigger::TagDetected => "tag detected",
            SessionTrigger::WriteRequested => "write requested",
            SessionTrigger::WriteFinished => "write finished",
            SessionTrigger::End => "end",
            SessionTrigger::ClosedExternally => "closed externally",
        }
    }
}

display_as_str!(SessionState);
display_as_str!(SessionTrigger);

/// Session state plus whether a write is waiting for the next tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMachine {
    state: SessionState,
    write_pending: bool,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn write_pending(&self) -> bool {
        self.write_pending
    }

    /// Apply a trigger, returning the new state
    ///
    /// On error the machine is left unchanged
    pub fn apply(&mut self, trigger: SessionTrigger) -> Result<SessionState, SessionError> {
        use SessionState as S;
        use SessionTrigger as T;

        let (state, write_pending) = match (self.state, trigger) {
            (_, T::Begin) => (S::Scanning, false),

            (S::Scanning | S::TagPresent, T::TagDetected) if self.write_pending => {
                (S::Writing, false)
            }
            (S::Scanning | S::TagPresent, T::TagDetected) => (S::TagPresent, false),

            (S::TagPresent, T::WriteRequested) => (S::Writing, false),
            // no tag yet, the write waits for the next one
            (S::Idle | S::Scanning, T::WriteRequested) => (S::Scanning, true),

            (S::Writing, T::WriteFinished) => (S::Idle, false),

            (_, T::End) => (S::Idle, false),

            (S::Scanning | S::TagPresent | S::Writing, T::ClosedExternally) => (S::Idle, false),

            (state, trigger) => return Err(SessionError::InvalidTransition { state, trigger }),
        };

        self.state = state;
        self.write_pending = write_pending;

        Ok(state)
    }
}
