//! Capture session state machine

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Armed,
    Recording,
    Stopping,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }

    /// Whether the session holds capture devices in this state
    pub const fn owns_devices(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an operation is requested in the wrong state
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Session state machine.
///
/// State machine:
///   IDLE -> ARMED (arm)
///   ARMED -> IDLE (disarm)
///   ARMED -> RECORDING (start_recording)
///   RECORDING -> ARMED (revert_start)
///   RECORDING -> STOPPING (begin_stopping)
///   STOPPING -> IDLE (finish_stopping)
///   any -> IDLE (abort)
#[derive(Debug, Default)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    /// Create a new machine in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_armed(&self) -> bool {
        self.state == SessionState::Armed
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_stopping(&self) -> bool {
        self.state == SessionState::Stopping
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Transition from IDLE to ARMED (streams acquired)
    pub fn arm(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Idle, SessionState::Armed, "arm")
    }

    /// Transition from ARMED to IDLE (streams released without recording)
    pub fn disarm(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Armed, SessionState::Idle, "disarm")
    }

    /// Transition from ARMED to RECORDING
    pub fn start_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Armed,
            SessionState::Recording,
            "start recording",
        )
    }

    /// Transition from RECORDING back to ARMED when the recorder failed to start
    pub fn revert_start(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Recording,
            SessionState::Armed,
            "revert start",
        )
    }

    /// Transition from RECORDING to STOPPING
    pub fn begin_stopping(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Recording,
            SessionState::Stopping,
            "stop recording",
        )
    }

    /// Transition from STOPPING to IDLE (recorder teardown confirmed)
    pub fn finish_stopping(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Stopping,
            SessionState::Idle,
            "finish stopping",
        )
    }

    /// Return to IDLE from any state after an unrecoverable error
    pub fn abort(&mut self) {
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_machine_is_idle() {
        let machine = SessionMachine::new();
        assert!(machine.is_idle());
        assert!(!machine.is_armed());
        assert!(!machine.state().owns_devices());
    }

    #[test]
    fn start_from_idle_fails() {
        let mut machine = SessionMachine::new();
        let err = machine.start_recording().unwrap_err();
        assert_eq!(err.current_state, SessionState::Idle);
        assert!(err.action.contains("start recording"));
        assert!(machine.is_idle());
    }

    #[test]
    fn arm_then_start() {
        let mut machine = SessionMachine::new();
        machine.arm().unwrap();
        assert!(machine.is_armed());
        machine.start_recording().unwrap();
        assert!(machine.is_recording());
    }

    #[test]
    fn arm_twice_fails() {
        let mut machine = SessionMachine::new();
        machine.arm().unwrap();
        let err = machine.arm().unwrap_err();
        assert_eq!(err.current_state, SessionState::Armed);
    }

    #[test]
    fn disarm_returns_to_idle() {
        let mut machine = SessionMachine::new();
        machine.arm().unwrap();
        machine.disarm().unwrap();
        assert!(machine.is_idle());
    }

    #[test]
    fn revert_start_keeps_streams() {
        let mut machine = SessionMachine::new();
        machine.arm().unwrap();
        machine.start_recording().unwrap();
        machine.revert_start().unwrap();
        assert!(machine.is_armed());
    }

    #[test]
    fn stop_from_armed_fails() {
        let mut machine = SessionMachine::new();
        machine.arm().unwrap();
        let err = machine.begin_stopping().unwrap_err();
        assert_eq!(err.current_state, SessionState::Armed);
    }

    #[test]
    fn stopping_owns_devices_until_finished() {
        let mut machine = SessionMachine::new();
        machine.arm().unwrap();
        machine.start_recording().unwrap();
        machine.begin_stopping().unwrap();
        assert!(machine.state().owns_devices());
        machine.finish_stopping().unwrap();
        assert!(machine.is_idle());
    }

    #[test]
    fn abort_from_anywhere() {
        let mut machine = SessionMachine::new();
        machine.arm().unwrap();
        machine.start_recording().unwrap();
        machine.abort();
        assert!(machine.is_idle());
    }

    #[test]
    fn full_cycle_repeats() {
        let mut machine = SessionMachine::new();
        for _ in 0..2 {
            machine.arm().unwrap();
            machine.start_recording().unwrap();
            machine.begin_stopping().unwrap();
            machine.finish_stopping().unwrap();
        }
        assert!(machine.is_idle());
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Armed.to_string(), "armed");
        assert_eq!(SessionState::Recording.to_string(), "recording");
        assert_eq!(SessionState::Stopping.to_string(), "stopping");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: SessionState::Idle,
            action: "start recording".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start recording"));
        assert!(msg.contains("idle"));
    }
}
