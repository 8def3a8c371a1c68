//! Bounded, non-blocking transition delivery
//!
//! The engine publishes state transitions toward the UI-facing consumer
//! through a fixed-depth queue. Publishing never blocks: when the consumer
//! has fallen behind and the queue is full, the event is dropped and logged.
//! There is no replay or coalescing, so a lagging consumer's notion of the
//! current state can stay behind the engine's until the next successful
//! publish.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use tracing::warn;

use crate::types::StateTransition;

/// Queue depth used by the device firmware.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

/// Factory for the transition queue endpoints.
pub struct TransitionChannel;

impl TransitionChannel {
    /// Create a bounded transition queue of the given depth.
    pub fn bounded(capacity: usize) -> (TransitionTx, TransitionRx) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (TransitionTx { tx }, TransitionRx { rx })
    }
}

/// Producer endpoint held by the inference engine task.
#[derive(Clone)]
pub struct TransitionTx {
    tx: SyncSender<StateTransition>,
}

impl TransitionTx {
    /// Attempt a non-blocking send.
    ///
    /// Returns `false` if the queue is full (event dropped, consumer misses
    /// this transition permanently) or the consumer is gone. The engine's
    /// cycle never stalls here.
    pub fn publish(&self, event: StateTransition) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    previous = %event.previous,
                    next = %event.next,
                    "transition queue full, event dropped"
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("transition consumer disconnected, event dropped");
                false
            }
        }
    }
}

/// Consumer endpoint polled by the UI-facing collaborator.
pub struct TransitionRx {
    rx: Receiver<StateTransition>,
}

impl TransitionRx {
    /// Non-blocking poll for the next transition.
    ///
    /// `None` when the queue is empty or the engine side is gone.
    pub fn try_receive(&self) -> Option<StateTransition> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BehaviorState;
    use chrono::Utc;
    use uuid::Uuid;

    fn transition(previous: BehaviorState, next: BehaviorState) -> StateTransition {
        StateTransition {
            previous,
            next,
            time_in_previous_ms: 1_000,
            occurred_at_utc: Utc::now(),
            engine_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_publish_and_receive_in_order() {
        let (tx, rx) = TransitionChannel::bounded(4);

        assert!(tx.publish(transition(BehaviorState::Idle, BehaviorState::Sniffing)));
        assert!(tx.publish(transition(BehaviorState::Sniffing, BehaviorState::Excited)));

        assert_eq!(rx.try_receive().unwrap().next, BehaviorState::Sniffing);
        assert_eq!(rx.try_receive().unwrap().next, BehaviorState::Excited);
        assert!(rx.try_receive().is_none());
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (tx, rx) = TransitionChannel::bounded(2);

        assert!(tx.publish(transition(BehaviorState::Idle, BehaviorState::Sniffing)));
        assert!(tx.publish(transition(BehaviorState::Sniffing, BehaviorState::Learning)));
        // Queue full: dropped, not blocked
        assert!(!tx.publish(transition(BehaviorState::Learning, BehaviorState::Idle)));

        // The consumer sees only the first two; the third is gone for good
        assert_eq!(rx.try_receive().unwrap().next, BehaviorState::Sniffing);
        assert_eq!(rx.try_receive().unwrap().next, BehaviorState::Learning);
        assert!(rx.try_receive().is_none());
    }

    #[test]
    fn test_publish_after_consumer_gone() {
        let (tx, rx) = TransitionChannel::bounded(2);
        drop(rx);
        assert!(!tx.publish(transition(BehaviorState::Idle, BehaviorState::Error)));
    }

    #[test]
    fn test_receive_after_engine_gone_drains_then_none() {
        let (tx, rx) = TransitionChannel::bounded(2);
        assert!(tx.publish(transition(BehaviorState::Idle, BehaviorState::Tracking)));
        drop(tx);

        assert_eq!(rx.try_receive().unwrap().next, BehaviorState::Tracking);
        assert!(rx.try_receive().is_none());
    }
}
