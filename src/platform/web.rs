//! Browser facade
//!
//! Thin wasm-bindgen wrapper over `CosmosEngine`. The page owns the canvas
//! and the animation loop; it forwards timestamps and input here and reads
//! back JSON snapshots plus flat buffers for drawing.

use wasm_bindgen::prelude::*;

use crate::engine::CosmosEngine;
use crate::sim::InteractionMode;
use crate::tuning::Tuning;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebCosmos {
    engine: CosmosEngine,
}

#[wasm_bindgen]
impl WebCosmos {
    /// Create and initialize an engine. `tuning_json` overrides defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, tuning_json: Option<String>) -> Result<WebCosmos, JsValue> {
        super::init_logging();
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(to_js)?,
            None => Tuning::default(),
        };
        let seed = js_sys::Date::now() as u64;
        let mut engine = CosmosEngine::new(tuning, seed);
        engine.initialize(width, height);
        log::info!("WebCosmos ready with seed: {}", seed);
        Ok(WebCosmos { engine })
    }

    /// Call from `requestAnimationFrame`; returns the simulated delta
    pub fn frame(&mut self, timestamp: f64) -> f32 {
        self.engine.frame(timestamp)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.engine.resize(width, height);
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn resume(&mut self) {
        self.engine.resume();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn destroy(&mut self) {
        self.engine.destroy();
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.engine.handle_pointer_down(x, y);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.engine.handle_pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.engine.handle_pointer_up(x, y);
    }

    /// `KeyboardEvent.code`; true if the key was handled
    pub fn key(&mut self, code: &str) -> bool {
        self.engine.handle_key(code)
    }

    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, mode: &str) -> bool {
        match InteractionMode::from_name(mode) {
            Some(mode) => {
                self.engine.set_interaction_mode(mode);
                true
            }
            None => false,
        }
    }

    #[wasm_bindgen(js_name = bigBang)]
    pub fn big_bang(&mut self) -> bool {
        self.engine.attempt_big_bang()
    }

    #[wasm_bindgen(js_name = enterBody)]
    pub fn enter_body(&mut self, id: u32) -> bool {
        self.engine.enter_body(id)
    }

    #[wasm_bindgen(js_name = exitBody)]
    pub fn exit_body(&mut self) -> Option<u32> {
        self.engine.exit_current_body()
    }

    /// Current `CosmosSnapshot` as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.snapshot()).map_err(to_js)
    }

    /// Focused body (with its interior) as JSON, or null
    #[wasm_bindgen(js_name = focusedBody)]
    pub fn focused_body(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.focused_body()).map_err(to_js)
    }

    /// Particles as `[x, y, energy, phase]` quadruples
    pub fn particles(&self) -> Vec<f32> {
        self.engine
            .world()
            .particles
            .iter()
            .flat_map(|p| [p.pos.x, p.pos.y, p.energy, p.phase])
            .collect()
    }

    /// Top-level bodies as `[x, y, size, hue]` quadruples
    pub fn bodies(&self) -> Vec<f32> {
        self.engine
            .world()
            .bodies
            .iter()
            .flat_map(|b| [b.pos.x, b.pos.y, b.size, b.hue])
            .collect()
    }

    /// Field values, row-major
    pub fn field(&self) -> Vec<f32> {
        self.engine.world().field.cells().to_vec()
    }

    #[wasm_bindgen(js_name = fieldColumns)]
    pub fn field_columns(&self) -> usize {
        self.engine.world().field.cols()
    }
}
