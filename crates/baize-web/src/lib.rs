//! Browser exports for the snooker session.
//!
//! wasm-bindgen cannot export the runner directly, so one runner lives in a
//! `thread_local!` and free functions forward to it. Calls made before
//! `baize_init` are ignored.

pub mod runner;

pub use runner::SessionRunner;

use std::cell::RefCell;

use baize_engine::{GameMode, InputEvent};
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<SessionRunner>> = const { RefCell::new(None) };
}

fn with_runner<R: Default>(f: impl FnOnce(&mut SessionRunner) -> R) -> R {
    RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(runner) => f(runner),
        None => {
            log::warn!("baize: call before baize_init()");
            R::default()
        }
    })
}

fn push(event: InputEvent) {
    with_runner(|r| r.push_input(event));
}

/// Create the session. `config_json` may be empty for the defaults.
#[wasm_bindgen]
pub fn baize_init(config_json: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let runner = SessionRunner::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("baize: initialized");
    Ok(())
}

#[wasm_bindgen]
pub fn baize_tick(dt: f32) {
    with_runner(|r| r.tick(dt));
}

/// 1 standard, 2 random reds, 3 random everything.
#[wasm_bindgen]
pub fn baize_select_mode(mode: u32) {
    match GameMode::from_code(mode) {
        Some(mode) => push(InputEvent::SelectMode(mode)),
        None => log::warn!("baize: unknown mode {}", mode),
    }
}

#[wasm_bindgen]
pub fn baize_pointer_down(x: f32, y: f32) {
    push(InputEvent::PointerDown { x, y });
}

#[wasm_bindgen]
pub fn baize_pointer_move(x: f32, y: f32, modifier: bool) {
    push(InputEvent::PointerMove { x, y, modifier });
}

#[wasm_bindgen]
pub fn baize_pointer_drag(x: f32, y: f32) {
    push(InputEvent::PointerDrag { x, y });
}

#[wasm_bindgen]
pub fn baize_pointer_up(x: f32, y: f32) {
    push(InputEvent::PointerUp { x, y });
}

#[wasm_bindgen]
pub fn baize_key_down(key_code: u32) {
    with_runner(|r| r.push_key(key_code));
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn baize_frame_ptr() -> *const f32 {
    RUNNER.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |r| r.frame_ptr())
    })
}

#[wasm_bindgen]
pub fn baize_frame_len() -> u32 {
    with_runner(|r| r.frame_len())
}

/// Copy of the current frame, for hosts without shared memory access.
#[wasm_bindgen]
pub fn baize_frame() -> js_sys::Float32Array {
    RUNNER.with(|cell| match cell.borrow().as_ref() {
        Some(r) => js_sys::Float32Array::from(r.frame()),
        None => js_sys::Float32Array::new_with_length(0),
    })
}

#[wasm_bindgen]
pub fn baize_snapshot_json() -> String {
    with_runner(|r| r.snapshot_json())
}

#[wasm_bindgen]
pub fn baize_alpha() -> f32 {
    with_runner(|r| r.alpha())
}
