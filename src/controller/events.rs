//! Push-based progress stream built on the controller's watch channel.

use tokio::sync::watch;

use super::state::{ControllerState, Phase};

/// One observed change of an attempt's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub upload: f64,
    pub processing: f64,
    pub overall: f64,
    /// Set on the final event of a failed attempt
    pub error: Option<String>,
}

impl From<&ControllerState> for ProgressEvent {
    fn from(state: &ControllerState) -> Self {
        Self {
            phase: state.phase,
            upload: state.progress.upload,
            processing: state.progress.processing,
            overall: state.overall_progress(),
            error: state.error.clone(),
        }
    }
}

/// Progress of the running (or next) attempt.
///
/// Intermediate values may be coalesced; the stream always ends with the
/// terminal state. It ends after `completed` or `error`, or when a running
/// attempt is reset back to `idle`.
pub struct ProgressEvents {
    rx: watch::Receiver<ControllerState>,
    active: bool,
    finished: bool,
    /// Attempt count when the stream was created
    attempts: u64,
}

impl ProgressEvents {
    pub(crate) fn new(mut rx: watch::Receiver<ControllerState>) -> Self {
        let (active, attempts) = {
            let state = rx.borrow_and_update();
            (state.phase.is_active(), state.attempts)
        };
        if active {
            // Report the attempt already in flight straight away
            rx.mark_changed();
        }
        Self {
            rx,
            active,
            finished: false,
            attempts,
        }
    }

    pub async fn next(&mut self) -> Option<ProgressEvent> {
        while !self.finished {
            if self.rx.changed().await.is_err() {
                self.finished = true;
                return None;
            }

            let (event, attempts) = {
                let state = self.rx.borrow_and_update();
                (ProgressEvent::from(&*state), state.attempts)
            };
            // An attempt may start and be reset between two polls of the channel
            let started = self.active || attempts > self.attempts;
            match event.phase {
                Phase::Uploading | Phase::Processing => self.active = true,
                Phase::Completed | Phase::Error => self.finished = true,
                // Asset selection before an attempt starts is not an event
                Phase::Idle if !started => continue,
                Phase::Idle => self.finished = true,
            }
            return Some(event);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(phase: Phase, upload: f64) -> ControllerState {
        let mut s = ControllerState::default();
        s.set_phase(phase);
        s.progress.upload = upload;
        s
    }

    #[tokio::test]
    async fn test_stream_ends_on_terminal_phase() {
        let (tx, rx) = watch::channel(ControllerState::default());
        let mut events = ProgressEvents::new(rx);

        tx.send_replace(state(Phase::Uploading, 50.0));
        let e = events.next().await.unwrap();
        assert_eq!(e.phase, Phase::Uploading);
        assert_eq!(e.overall, 20.0);

        tx.send_replace(state(Phase::Completed, 100.0));
        assert_eq!(events.next().await.unwrap().phase, Phase::Completed);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_idle_before_start_is_skipped() {
        let (tx, rx) = watch::channel(ControllerState::default());
        let mut events = ProgressEvents::new(rx);

        tx.send_replace(state(Phase::Idle, 0.0));
        tx.send_replace(state(Phase::Uploading, 10.0));
        assert_eq!(events.next().await.unwrap().phase, Phase::Uploading);
    }

    #[tokio::test]
    async fn test_reset_mid_attempt_ends_stream() {
        let (tx, rx) = watch::channel(state(Phase::Processing, 100.0));
        let mut events = ProgressEvents::new(rx);

        assert_eq!(events.next().await.unwrap().phase, Phase::Processing);
        tx.send_replace(ControllerState::default());
        assert_eq!(events.next().await.unwrap().phase, Phase::Idle);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_reset_before_first_poll_ends_stream() {
        let (tx, rx) = watch::channel(ControllerState::default());
        let mut events = ProgressEvents::new(rx);

        let mut running = state(Phase::Processing, 100.0);
        running.attempts = 1;
        tx.send_replace(running);
        let mut reset = ControllerState::default();
        reset.attempts = 1;
        tx.send_replace(reset);

        assert_eq!(events.next().await.unwrap().phase, Phase::Idle);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_channel_ends_stream() {
        let (tx, rx) = watch::channel(ControllerState::default());
        let mut events = ProgressEvents::new(rx);
        drop(tx);
        assert!(events.next().await.is_none());
    }
}
