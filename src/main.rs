//! Cosmos Sandbox entry point
//!
//! Native builds run a scripted headless session and print the final
//! snapshot as JSON. The browser build is driven through `WebCosmos`.
//!
//! Usage: `cosmos-sandbox [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::process::ExitCode;

    use cosmos_sandbox::sim::{CosmosEvent, InteractionMode};
    use cosmos_sandbox::{CosmosEngine, CosmosSnapshot, Observer, Tuning, TuningError};

    /// Frame interval of the simulated display (ms)
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Length of the scripted session (s)
    const SESSION_SECS: f64 = 90.0;

    /// Logs events and a summary line every few seconds
    struct LogObserver {
        ticks: u64,
    }

    impl Observer for LogObserver {
        fn on_tick(&mut self, snapshot: &CosmosSnapshot) {
            self.ticks += 1;
            if self.ticks % 300 == 0 {
                log::info!(
                    "t={:.0}s phase={} score={} energy={:.0} particles={} bodies={}",
                    snapshot.elapsed,
                    snapshot.phase_name,
                    snapshot.score,
                    snapshot.energy,
                    snapshot.particle_count,
                    snapshot.body_count
                );
            }
        }

        fn on_event(&mut self, event: &CosmosEvent) {
            log::debug!("{:?}", event);
        }
    }

    fn load_tuning(path: Option<&String>) -> Result<Tuning, TuningError> {
        let Some(path) = path else {
            return Ok(Tuning::default());
        };
        log::info!("Loading tuning from {}", path);
        let json = std::fs::read_to_string(path)?;
        Tuning::from_json(&json)
    }

    /// Scripted input at a given session time (s)
    fn script(engine: &mut CosmosEngine, t: f64) {
        let (w, h) = (engine.world().width(), engine.world().height());
        let (cx, cy) = (w / 2.0, h / 2.0);
        match t as u32 {
            1 => {
                engine.handle_key("KeyB");
            }
            5 => {
                engine.set_interaction_mode(InteractionMode::Create);
                for i in 0..4 {
                    let x = cx - 150.0 + i as f32 * 100.0;
                    engine.handle_pointer_down(x, cy);
                    engine.handle_pointer_move(x + 30.0, cy + 30.0);
                    engine.handle_pointer_up(x + 30.0, cy + 30.0);
                }
            }
            12 => {
                engine.handle_key("Digit2");
                engine.handle_pointer_down(cx, cy);
                engine.handle_pointer_move(cx + 100.0, cy);
                engine.handle_pointer_up(cx + 130.0, cy);
            }
            20 => {
                engine.handle_key("Digit3");
                engine.handle_pointer_down(cx - 250.0, cy - 150.0);
                engine.handle_pointer_up(cx + 50.0, cy + 50.0);
            }
            30 => {
                engine.handle_key("Digit4");
                engine.handle_pointer_down(cx, cy);
                engine.handle_pointer_move(cx + 60.0, cy);
                engine.handle_pointer_up(cx + 80.0, cy);
            }
            _ => {}
        }
    }

    pub fn run() -> ExitCode {
        cosmos_sandbox::platform::init_logging();
        log::info!("Cosmos Sandbox (headless) starting...");

        let args: Vec<String> = std::env::args().skip(1).collect();
        let seed = match args.first().map(|s| s.parse::<u64>()) {
            Some(Ok(seed)) => seed,
            Some(Err(e)) => {
                log::error!("Invalid seed {:?}: {}", args[0], e);
                return ExitCode::FAILURE;
            }
            None => 42,
        };
        let tuning = match load_tuning(args.get(1)) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning: {}", e);
                return ExitCode::FAILURE;
            }
        };

        let mut engine = CosmosEngine::new(tuning, seed);
        engine.add_observer(Box::new(LogObserver { ticks: 0 }));
        engine.initialize(1280.0, 720.0);

        let frames = (SESSION_SECS * 1000.0 / FRAME_MS) as u64;
        let mut last_second = None;
        for frame in 0..=frames {
            let timestamp = frame as f64 * FRAME_MS;
            let second = (timestamp / 1000.0) as u32;
            if last_second != Some(second) {
                last_second = Some(second);
                script(&mut engine, second as f64);
            }
            engine.frame(timestamp);
        }

        match serde_json::to_string_pretty(&engine.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Failed to serialize snapshot: {}", e);
                return ExitCode::FAILURE;
            }
        }
        engine.destroy();
        ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser entry point is `WebCosmos`; this only satisfies the bin target
}
