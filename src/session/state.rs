use std::sync::Mutex;

use crate::errors::{ScreenMonitorError, ScreenMonitorResult};

/// Where the capture flow currently is. Only one capture runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    /// Overlay is open, waiting for a drag or Esc.
    Selecting,
    /// Capture + API round-trip in flight on a background task.
    Analyzing,
}

#[derive(Debug)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
        }
    }

    pub fn current(&self) -> SessionState {
        *self.lock()
    }

    /// Idle → Selecting. Any other state means a capture is already underway.
    pub fn begin_selection(&self) -> ScreenMonitorResult<()> {
        self.transition(SessionState::Idle, SessionState::Selecting)
    }

    /// Selecting → Analyzing.
    pub fn begin_analysis(&self) -> ScreenMonitorResult<()> {
        self.transition(SessionState::Selecting, SessionState::Analyzing)
    }

    /// Selecting → Idle. Returns false when there was no selection to cancel.
    pub fn cancel_selection(&self) -> bool {
        self.transition(SessionState::Selecting, SessionState::Idle).is_ok()
    }

    /// Back to Idle from wherever the flow stopped.
    pub fn finish(&self) {
        let mut state = self.lock();
        tracing::debug!(from = ?*state, "session finished");
        *state = SessionState::Idle;
    }

    fn transition(&self, from: SessionState, to: SessionState) -> ScreenMonitorResult<()> {
        let mut state = self.lock();
        if *state != from {
            return Err(ScreenMonitorError::Busy(format!(
                "cannot go from {:?} to {:?}",
                *state, to
            )));
        }
        tracing::debug!(?from, ?to, "session transition");
        *state = to;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // Poisoning ignored: the guarded value is a Copy enum.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle() {
        let s = Session::new();
        assert_eq!(s.current(), SessionState::Idle);
        s.begin_selection().unwrap();
        assert_eq!(s.current(), SessionState::Selecting);
        s.begin_analysis().unwrap();
        assert_eq!(s.current(), SessionState::Analyzing);
        s.finish();
        assert_eq!(s.current(), SessionState::Idle);
    }

    #[test]
    fn second_trigger_while_selecting_is_busy() {
        let s = Session::new();
        s.begin_selection().unwrap();
        assert!(matches!(s.begin_selection(), Err(ScreenMonitorError::Busy(_))));
        assert_eq!(s.current(), SessionState::Selecting);
    }

    #[test]
    fn trigger_while_analyzing_is_busy() {
        let s = Session::new();
        s.begin_selection().unwrap();
        s.begin_analysis().unwrap();
        assert!(s.begin_selection().is_err());
        assert!(!s.cancel_selection());
        assert_eq!(s.current(), SessionState::Analyzing);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let s = Session::new();
        assert!(!s.cancel_selection());
        s.begin_selection().unwrap();
        assert!(s.cancel_selection());
        assert_eq!(s.current(), SessionState::Idle);
    }

    #[test]
    fn submit_without_selection_is_rejected() {
        let s = Session::new();
        assert!(s.begin_analysis().is_err());
        assert_eq!(s.current(), SessionState::Idle);
    }
}
