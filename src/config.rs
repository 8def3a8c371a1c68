//! Engine and runtime tuning
//!
//! Every threshold, step and interval the inference engine evaluates lives in
//! [`EngineConfig`]; task periods and lock timeouts live in [`RuntimeConfig`].
//! Both serialize to JSON so a deployment can ship tuned values next to the
//! firmware image.

use serde::{Deserialize, Serialize};

use crate::error::MindError;

/// Thresholds and momentum steps for the behavioral decision list.
///
/// Defaults match the shipped device tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Free-heap floor below which the engine reports `Error` (bytes)
    pub low_memory_bytes: u32,
    /// WiFi network count at or above which activity is "high"
    pub high_wifi_activity: u32,
    /// Excitement added on each high-activity cycle
    pub excitement_step: u8,
    /// Excitement above which high activity reads as `Excited`
    pub excited_watermark: u8,
    /// BLE device count must exceed this for `Tracking`
    pub ble_device_floor: u32,
    /// BLE average RSSI must exceed this for `Tracking` (dBm)
    pub ble_strong_rssi_dbm: i32,
    /// Dwell in `Sniffing` before the engine shifts to `Learning` (ms)
    pub sniff_dwell_ms: u32,
    /// Learning progress added when shifting to `Learning`
    pub learning_step: u8,
    /// Dwell with zero activity before the engine shifts to `Sleeping` (ms)
    pub inactivity_dwell_ms: u32,
    /// Excitement removed when shifting to `Sleeping`
    pub sleep_excitement_drop: u8,
    /// Elapsed quiet time per excitement decay step (ms)
    pub decay_interval_ms: u32,
    /// Excitement removed per decay interval
    pub decay_step: u8,
    /// Learning progress added on entry to `Learning`
    pub learning_entry_bonus: u8,
    /// Excitement added on entry to `Excited`
    pub excited_entry_bonus: u8,
    /// Learning progress removed on entry to `Sleeping`
    pub sleep_learning_drop: u8,
    /// Learning progress is only eased while above this floor
    pub sleep_learning_floor: u8,
    /// Cadence of the engine metrics log line (ms)
    pub metrics_log_interval_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_memory_bytes: 10_240,
            high_wifi_activity: 10,
            excitement_step: 5,
            excited_watermark: 80,
            ble_device_floor: 5,
            ble_strong_rssi_dbm: -50,
            sniff_dwell_ms: 5_000,
            learning_step: 10,
            inactivity_dwell_ms: 60_000,
            sleep_excitement_drop: 2,
            decay_interval_ms: 10_000,
            decay_step: 1,
            learning_entry_bonus: 5,
            excited_entry_bonus: 10,
            sleep_learning_drop: 2,
            sleep_learning_floor: 20,
            metrics_log_interval_ms: 30_000,
        }
    }
}

impl EngineConfig {
    /// Deserialize a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, MindError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String, MindError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configs the engine cannot run with.
    ///
    /// Momentum counters are bounded to [0, 100]; watermarks or floors
    /// outside that range would make their rules unreachable or always-on.
    pub fn validate(&self) -> Result<(), MindError> {
        if self.excited_watermark > 100 {
            return Err(MindError::InvalidConfig(format!(
                "excited_watermark {} exceeds the 0-100 excitement range",
                self.excited_watermark
            )));
        }
        if self.sleep_learning_floor > 100 {
            return Err(MindError::InvalidConfig(format!(
                "sleep_learning_floor {} exceeds the 0-100 learning range",
                self.sleep_learning_floor
            )));
        }
        for (name, step) in [
            ("excitement_step", self.excitement_step),
            ("learning_step", self.learning_step),
            ("sleep_excitement_drop", self.sleep_excitement_drop),
            ("decay_step", self.decay_step),
            ("learning_entry_bonus", self.learning_entry_bonus),
            ("excited_entry_bonus", self.excited_entry_bonus),
            ("sleep_learning_drop", self.sleep_learning_drop),
        ] {
            if step > 100 {
                return Err(MindError::InvalidConfig(format!(
                    "{name} {step} exceeds the 0-100 momentum range"
                )));
            }
        }
        if self.decay_interval_ms == 0 {
            return Err(MindError::InvalidConfig(
                "decay_interval_ms must be nonzero".to_string(),
            ));
        }
        if self.metrics_log_interval_ms == 0 {
            return Err(MindError::InvalidConfig(
                "metrics_log_interval_ms must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Task periods and lock timeouts for the periodic runtime.
///
/// Defaults match the shipped device: a 200 ms inference cycle, 50 ms
/// snapshot timeout, 100 ms producer update timeout, a 10-deep transition
/// queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Inference cycle period (ms)
    pub engine_period_ms: u32,
    /// Bound on the engine's snapshot lock wait (ms)
    pub snapshot_timeout_ms: u32,
    /// Bound on a producer's update lock wait (ms)
    pub update_timeout_ms: u32,
    /// Transition queue depth
    pub channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine_period_ms: 200,
            snapshot_timeout_ms: 50,
            update_timeout_ms: 100,
            channel_capacity: 10,
        }
    }
}

impl RuntimeConfig {
    /// Reject configs the runtime cannot run with.
    pub fn validate(&self) -> Result<(), MindError> {
        if self.engine_period_ms == 0 {
            return Err(MindError::InvalidConfig(
                "engine_period_ms must be nonzero".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(MindError::InvalidConfig(
                "channel_capacity must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
