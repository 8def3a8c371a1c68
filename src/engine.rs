//! Behavioral inference engine
//!
//! Single consumer of the sensor store. Once per cycle it evaluates a
//! fixed-priority decision list against one atomic snapshot plus the carried
//! momentum, picks exactly one next state, and emits a transition event when
//! the state changes. Priorities, first match wins:
//!
//! 1. `Error` — free memory below the low-memory floor; overrides everything
//!    so an out-of-resource condition is always visible downstream.
//! 2. `Sniffing`/`Excited` — high WiFi activity builds excitement; past the
//!    watermark the device reads as excited rather than merely sniffing.
//! 3. `Tracking` — enough strong BLE devices nearby.
//! 4. `Learning` — the device has been sniffing long enough to digest.
//! 5. `Sleeping` — nothing on the air, nobody touching it, long enough.
//! 6. `Idle` — none of the above.
//!
//! Excitement additionally decays by one step per quiet decay interval,
//! tracked on an elapsed-time accumulator rather than a wall-clock check so
//! the cadence survives scheduling jitter.
//!
//! The engine performs no I/O and holds no locks; a missed snapshot simply
//! means the caller skips the cycle and the state stays frozen.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::momentum::Momentum;
use crate::types::{BehaviorState, SensorReadings, StateTransition};

/// Outcome of one pass over the decision list.
struct Decision {
    next: BehaviorState,
    /// Whether the high-activity rule fired and reinforced excitement.
    reinforced: bool,
}

/// Periodic behavioral classifier with hysteresis.
///
/// Owns its [`Momentum`] outright; nothing here is shared or locked.
pub struct BehaviorEngine {
    config: EngineConfig,
    momentum: Momentum,
    current_state: BehaviorState,
    updating: bool,
    instance_id: Uuid,
    metrics_elapsed_ms: u32,
}

impl Default for BehaviorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorEngine {
    /// Create an engine with the shipped device tuning, starting at `Idle`.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with explicit tuning.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            momentum: Momentum::new(),
            current_state: BehaviorState::Idle,
            updating: false,
            instance_id: Uuid::new_v4(),
            metrics_elapsed_ms: 0,
        }
    }

    /// State selected by the most recent cycle.
    pub fn current_state(&self) -> BehaviorState {
        self.current_state
    }

    /// Carried momentum, read-only.
    pub fn momentum(&self) -> &Momentum {
        &self.momentum
    }

    /// Identity stamped on every emitted transition.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Active tuning.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mark the start or end of a firmware update window.
    ///
    /// While set, the engine reports `Updating` unless the low-memory rule
    /// fires; with the flag clear (the default) the decision list runs
    /// unmodified.
    pub fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
    }

    /// Run one inference cycle over a snapshot taken `period_ms` after the
    /// previous one.
    ///
    /// Returns the transition event when the selected state differs from the
    /// current one; otherwise advances the dwell clock and returns `None`.
    /// Callers that fail to obtain a snapshot skip this call entirely,
    /// leaving state, dwell and momentum untouched for the cycle.
    pub fn tick(&mut self, readings: &SensorReadings, period_ms: u32) -> Option<StateTransition> {
        let decision = self.select_state(readings);

        if decision.reinforced {
            self.momentum.reset_decay_clock();
        } else {
            self.momentum.accrue_decay(
                period_ms,
                self.config.decay_interval_ms,
                self.config.decay_step,
            );
        }

        self.log_metrics_maybe(period_ms);

        if decision.next != self.current_state {
            let event = StateTransition {
                previous: self.current_state,
                next: decision.next,
                time_in_previous_ms: self.momentum.time_in_state_ms(),
                occurred_at_utc: Utc::now(),
                engine_id: self.instance_id,
            };
            debug!(
                previous = %event.previous,
                next = %event.next,
                dwell_ms = event.time_in_previous_ms,
                "behavior state change"
            );
            self.momentum.reset_dwell();
            self.current_state = decision.next;
            self.apply_entry_adjustment(decision.next);
            Some(event)
        } else {
            self.momentum.advance_dwell(period_ms);
            None
        }
    }

    /// The fixed-priority decision list. Mutates momentum for the rules that
    /// carry side effects (2, 4, 5), exactly once for the rule that fires.
    fn select_state(&mut self, r: &SensorReadings) -> Decision {
        if r.free_memory_bytes < self.config.low_memory_bytes {
            return Decision {
                next: BehaviorState::Error,
                reinforced: false,
            };
        }

        if self.updating {
            return Decision {
                next: BehaviorState::Updating,
                reinforced: false,
            };
        }

        if r.wifi_network_count >= self.config.high_wifi_activity {
            self.momentum.raise_excitement(self.config.excitement_step);
            let next = if self.momentum.excitement() > self.config.excited_watermark {
                BehaviorState::Excited
            } else {
                BehaviorState::Sniffing
            };
            return Decision {
                next,
                reinforced: true,
            };
        }

        if r.ble_device_count > self.config.ble_device_floor
            && r.ble_avg_rssi > self.config.ble_strong_rssi_dbm
        {
            return Decision {
                next: BehaviorState::Tracking,
                reinforced: false,
            };
        }

        if self.current_state == BehaviorState::Sniffing
            && self.momentum.time_in_state_ms() > self.config.sniff_dwell_ms
        {
            self.momentum.raise_learning(self.config.learning_step);
            return Decision {
                next: BehaviorState::Learning,
                reinforced: false,
            };
        }

        if r.wifi_network_count == 0
            && r.ble_device_count == 0
            && !r.user_interaction
            && self.momentum.time_in_state_ms() > self.config.inactivity_dwell_ms
        {
            self.momentum.ease_excitement(self.config.sleep_excitement_drop);
            return Decision {
                next: BehaviorState::Sleeping,
                reinforced: false,
            };
        }

        Decision {
            next: BehaviorState::Idle,
            reinforced: false,
        }
    }

    /// Momentum adjustment applied on entry to a new state.
    fn apply_entry_adjustment(&mut self, next: BehaviorState) {
        match next {
            BehaviorState::Learning => {
                self.momentum.raise_learning(self.config.learning_entry_bonus);
            }
            BehaviorState::Excited => {
                self.momentum.raise_excitement(self.config.excited_entry_bonus);
            }
            BehaviorState::Sleeping => {
                self.momentum
                    .ease_learning(self.config.sleep_learning_drop, self.config.sleep_learning_floor);
            }
            _ => {}
        }
    }

    fn log_metrics_maybe(&mut self, period_ms: u32) {
        self.metrics_elapsed_ms = self.metrics_elapsed_ms.saturating_add(period_ms);
        if self.metrics_elapsed_ms >= self.config.metrics_log_interval_ms {
            self.metrics_elapsed_ms = 0;
            info!(
                engine_id = %self.instance_id,
                state = %self.current_state,
                dwell_ms = self.momentum.time_in_state_ms(),
                excitement = self.momentum.excitement(),
                learning = self.momentum.learning_progress(),
                "engine metrics"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD_MS: u32 = 200;

    /// Readings with healthy memory and nothing on the air.
    fn quiet_readings() -> SensorReadings {
        SensorReadings {
            free_memory_bytes: 100_000,
            uptime_seconds: 600,
            ..SensorReadings::default()
        }
    }

    fn high_wifi_readings() -> SensorReadings {
        SensorReadings {
            wifi_network_count: 12,
            wifi_avg_rssi: -60,
            ..quiet_readings()
        }
    }

    #[test]
    fn test_low_memory_overrides_everything() {
        let mut engine = BehaviorEngine::new();
        let readings = SensorReadings {
            wifi_network_count: 50,
            ble_device_count: 20,
            ble_avg_rssi: -30,
            user_interaction: true,
            free_memory_bytes: 5_000, // below the 10240 floor
            ..SensorReadings::default()
        };

        let event = engine.tick(&readings, PERIOD_MS).unwrap();
        assert_eq!(event.previous, BehaviorState::Idle);
        assert_eq!(event.next, BehaviorState::Error);
        assert_eq!(engine.current_state(), BehaviorState::Error);
    }

    #[test]
    fn test_high_wifi_is_sniffing_below_watermark() {
        let mut engine = BehaviorEngine::new();

        let event = engine.tick(&high_wifi_readings(), PERIOD_MS).unwrap();
        assert_eq!(event.next, BehaviorState::Sniffing);
        assert_eq!(engine.momentum().excitement(), 5);
    }

    #[test]
    fn test_sustained_wifi_crosses_into_excited() {
        let mut engine = BehaviorEngine::new();
        let readings = high_wifi_readings();

        let mut saw_excited = false;
        for _ in 0..30 {
            if let Some(event) = engine.tick(&readings, PERIOD_MS) {
                if event.next == BehaviorState::Excited {
                    saw_excited = true;
                    break;
                }
            }
        }

        assert!(saw_excited);
        // 17 ticks at +5 reach 85, plus the +10 entry bonus
        assert_eq!(engine.momentum().excitement(), 95);
        assert_eq!(engine.current_state(), BehaviorState::Excited);
    }

    #[test]
    fn test_excitement_stays_bounded_under_sustained_activity() {
        let mut engine = BehaviorEngine::new();
        let readings = high_wifi_readings();

        for _ in 0..500 {
            engine.tick(&readings, PERIOD_MS);
        }

        assert!(engine.momentum().excitement() <= 100);
        assert_eq!(engine.current_state(), BehaviorState::Excited);
    }

    #[test]
    fn test_strong_ble_selects_tracking() {
        let mut engine = BehaviorEngine::new();
        let readings = SensorReadings {
            ble_device_count: 7,
            ble_avg_rssi: -40,
            ..quiet_readings()
        };

        let event = engine.tick(&readings, PERIOD_MS).unwrap();
        assert_eq!(event.next, BehaviorState::Tracking);
    }

    #[test]
    fn test_weak_or_sparse_ble_does_not_track() {
        let mut engine = BehaviorEngine::new();

        // Enough devices, too weak
        let weak = SensorReadings {
            ble_device_count: 7,
            ble_avg_rssi: -60,
            ..quiet_readings()
        };
        assert!(engine.tick(&weak, PERIOD_MS).is_none());
        assert_eq!(engine.current_state(), BehaviorState::Idle);

        // Strong enough, too few (floor is strict)
        let sparse = SensorReadings {
            ble_device_count: 5,
            ble_avg_rssi: -40,
            ..quiet_readings()
        };
        assert!(engine.tick(&sparse, PERIOD_MS).is_none());
        assert_eq!(engine.current_state(), BehaviorState::Idle);
    }

    #[test]
    fn test_long_sniff_shifts_to_learning() {
        let mut engine = BehaviorEngine::new();

        // Enter Sniffing, then dwell past the 5 s threshold
        engine.tick(&high_wifi_readings(), 1_000);
        for _ in 0..6 {
            assert!(engine.tick(&high_wifi_readings(), 1_000).is_none());
        }

        // Activity fades while the dwell clock is past the threshold
        let event = engine.tick(&quiet_readings(), 1_000).unwrap();
        assert_eq!(event.previous, BehaviorState::Sniffing);
        assert_eq!(event.next, BehaviorState::Learning);
        // +10 rule step, +5 entry bonus
        assert_eq!(engine.momentum().learning_progress(), 15);
    }

    #[test]
    fn test_inactivity_shifts_to_sleeping_and_eases_excitement() {
        let mut engine = BehaviorEngine::new();

        // Build a little excitement first
        engine.tick(&high_wifi_readings(), PERIOD_MS);
        let before = engine.momentum().excitement();

        // Drop back to Idle
        let quiet = quiet_readings();
        engine.tick(&quiet, PERIOD_MS);
        assert_eq!(engine.current_state(), BehaviorState::Idle);

        // Two long quiet cycles push the dwell clock past 60 s
        assert!(engine.tick(&quiet, 61_000).is_none());
        let event = engine.tick(&quiet, 61_000).unwrap();
        assert_eq!(event.next, BehaviorState::Sleeping);

        // Rule drop (2) plus accumulated decay, never below zero
        assert!(engine.momentum().excitement() < before);
    }

    #[test]
    fn test_interaction_blocks_sleep() {
        let mut engine = BehaviorEngine::new();
        let readings = SensorReadings {
            user_interaction: true,
            ..quiet_readings()
        };

        engine.tick(&readings, 61_000);
        assert!(engine.tick(&readings, 61_000).is_none());
        assert_eq!(engine.current_state(), BehaviorState::Idle);
    }

    #[test]
    fn test_momentum_bounded_over_arbitrary_histories() {
        let mut engine = BehaviorEngine::new();
        let phases = [
            high_wifi_readings(),
            quiet_readings(),
            SensorReadings {
                ble_device_count: 9,
                ble_avg_rssi: -35,
                ..quiet_readings()
            },
            SensorReadings {
                free_memory_bytes: 1_000,
                ..SensorReadings::default()
            },
        ];

        for cycle in 0..2_000 {
            let readings = &phases[cycle % phases.len()];
            engine.tick(readings, PERIOD_MS);
            assert!(engine.momentum().excitement() <= 100);
            assert!(engine.momentum().learning_progress() <= 100);
        }
    }

    #[test]
    fn test_excitement_decays_during_quiet_stretches() {
        let mut engine = BehaviorEngine::new();

        // Excitement to 25 via five high-activity cycles
        for _ in 0..5 {
            engine.tick(&high_wifi_readings(), PERIOD_MS);
        }
        assert_eq!(engine.momentum().excitement(), 25);

        // Idle cycles: one decay step per accumulated 10 s
        let quiet = SensorReadings {
            user_interaction: true, // keep the sleep rule out of the way
            ..quiet_readings()
        };
        for _ in 0..50 {
            engine.tick(&quiet, PERIOD_MS); // 50 * 200 ms = one interval
        }
        assert_eq!(engine.momentum().excitement(), 24);
    }

    #[test]
    fn test_no_event_without_state_change() {
        let mut engine = BehaviorEngine::new();
        let quiet = quiet_readings();

        assert!(engine.tick(&quiet, PERIOD_MS).is_none());
        assert!(engine.tick(&quiet, PERIOD_MS).is_none());
        assert_eq!(engine.momentum().time_in_state_ms(), 2 * PERIOD_MS);
    }

    #[test]
    fn test_transition_resets_dwell_and_stamps_previous_dwell() {
        let mut engine = BehaviorEngine::new();
        let quiet = quiet_readings();

        for _ in 0..10 {
            engine.tick(&quiet, PERIOD_MS);
        }
        let event = engine.tick(&high_wifi_readings(), PERIOD_MS).unwrap();

        assert_eq!(event.time_in_previous_ms, 10 * PERIOD_MS);
        assert_eq!(event.engine_id, engine.instance_id());
        assert_eq!(engine.momentum().time_in_state_ms(), 0);
    }

    #[test]
    fn test_updating_window_reports_updating() {
        let mut engine = BehaviorEngine::new();
        engine.set_updating(true);

        let event = engine.tick(&high_wifi_readings(), PERIOD_MS).unwrap();
        assert_eq!(event.next, BehaviorState::Updating);

        // Low memory still wins over the update window
        let starved = SensorReadings {
            free_memory_bytes: 100,
            ..quiet_readings()
        };
        let event = engine.tick(&starved, PERIOD_MS).unwrap();
        assert_eq!(event.next, BehaviorState::Error);

        // Clearing the flag restores the plain decision list
        engine.set_updating(false);
        let event = engine.tick(&quiet_readings(), PERIOD_MS).unwrap();
        assert_eq!(event.next, BehaviorState::Idle);
    }

    #[test]
    fn test_error_scenario_from_field_report() {
        // memory = 5000 bytes with threshold 10240 reads Error even at
        // wifi_network_count = 50
        let mut engine = BehaviorEngine::new();
        let readings = SensorReadings {
            wifi_network_count: 50,
            free_memory_bytes: 5_000,
            ..SensorReadings::default()
        };

        let event = engine.tick(&readings, PERIOD_MS).unwrap();
        assert_eq!(event.next, BehaviorState::Error);
    }
}
