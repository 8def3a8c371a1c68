//! FFI bindings for Hydra Mind
//!
//! C-compatible surface for the display firmware: state-code to label/glyph
//! lookup (total over the whole code range, falling back to the "Unknown"
//! pair) and an opaque engine handle for hosts that drive inference cycles
//! from C. Lookup strings are static and must not be freed.

use std::os::raw::c_char;

use crate::engine::BehaviorEngine;
use crate::types::{BehaviorState, SensorReadings};

// NUL-terminated copies of the display tables; `label()`/`glyph()` stay the
// Rust-facing source of truth and the tests pin these to them.
fn label_cstr(code: u8) -> &'static str {
    match BehaviorState::from_code(code) {
        Some(BehaviorState::Idle) => "Idle\0",
        Some(BehaviorState::Sniffing) => "Sniffing\0",
        Some(BehaviorState::Tracking) => "Tracking\0",
        Some(BehaviorState::Learning) => "Learning\0",
        Some(BehaviorState::Excited) => "Excited\0",
        Some(BehaviorState::Sleeping) => "Sleeping\0",
        Some(BehaviorState::Error) => "Error\0",
        Some(BehaviorState::Updating) => "Updating\0",
        None => "Unknown\0",
    }
}

fn glyph_cstr(code: u8) -> &'static str {
    match BehaviorState::from_code(code) {
        Some(BehaviorState::Idle) => "\u{1F60A}\0",
        Some(BehaviorState::Sniffing) => "\u{1F443}\0",
        Some(BehaviorState::Tracking) => "\u{1F441}\0",
        Some(BehaviorState::Learning) => "\u{1F9E0}\0",
        Some(BehaviorState::Excited) => "\u{1F929}\0",
        Some(BehaviorState::Sleeping) => "\u{1F634}\0",
        Some(BehaviorState::Error) => "\u{1F480}\0",
        Some(BehaviorState::Updating) => "\u{1F504}\0",
        None => "\u{1F914}\0",
    }
}

/// Label for a raw behavioral state code.
///
/// Total: out-of-range codes return "Unknown". The returned pointer is
/// static; do not free it.
#[no_mangle]
pub extern "C" fn mind_state_label(code: u8) -> *const c_char {
    label_cstr(code).as_ptr() as *const c_char
}

/// Mood glyph (UTF-8) for a raw behavioral state code.
///
/// Total: out-of-range codes return the fallback glyph. The returned pointer
/// is static; do not free it.
#[no_mangle]
pub extern "C" fn mind_state_glyph(code: u8) -> *const c_char {
    glyph_cstr(code).as_ptr() as *const c_char
}

/// Allocate an engine with the shipped default tuning.
///
/// # Safety
/// The returned handle must be released with [`mind_engine_free`].
#[no_mangle]
pub extern "C" fn mind_engine_new() -> *mut BehaviorEngine {
    Box::into_raw(Box::new(BehaviorEngine::new()))
}

/// Release an engine handle.
///
/// # Safety
/// `engine` must be a handle returned by [`mind_engine_new`], released at
/// most once. NULL is ignored.
#[no_mangle]
pub unsafe extern "C" fn mind_engine_free(engine: *mut BehaviorEngine) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Run one inference cycle.
///
/// Returns 1 when the cycle produced a state change, 0 when the state held,
/// -1 on a NULL argument. The host reads the resulting state through
/// [`mind_engine_current_state`]; transition details stay on the Rust side.
///
/// # Safety
/// `engine` must be a live handle from [`mind_engine_new`]; `readings` must
/// point to a valid [`SensorReadings`].
#[no_mangle]
pub unsafe extern "C" fn mind_engine_tick(
    engine: *mut BehaviorEngine,
    readings: *const SensorReadings,
    period_ms: u32,
) -> i32 {
    let engine = match engine.as_mut() {
        Some(engine) => engine,
        None => return -1,
    };
    let readings = match readings.as_ref() {
        Some(readings) => readings,
        None => return -1,
    };
    match engine.tick(readings, period_ms) {
        Some(_) => 1,
        None => 0,
    }
}

/// Wire code of the engine's current state.
///
/// # Safety
/// `engine` must be a live handle from [`mind_engine_new`]. NULL returns the
/// `Error` state code so a broken host still renders something alarming.
#[no_mangle]
pub unsafe extern "C" fn mind_engine_current_state(engine: *const BehaviorEngine) -> u8 {
    match engine.as_ref() {
        Some(engine) => engine.current_state().code(),
        None => BehaviorState::Error.code(),
    }
}

/// Mark the start or end of a firmware update window.
///
/// # Safety
/// `engine` must be a live handle from [`mind_engine_new`]. NULL is ignored.
#[no_mangle]
pub unsafe extern "C" fn mind_engine_set_updating(engine: *mut BehaviorEngine, updating: bool) {
    if let Some(engine) = engine.as_mut() {
        engine.set_updating(updating);
    }
}
