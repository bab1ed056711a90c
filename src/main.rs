//! Neon Arcade entry point
//!
//! On the web the library's `WebArcade` is driven by the page. Natively this
//! runs each game headless with scripted input and logs how the runs end.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use neon_arcade::platform::{InputEvent, Key};
    use neon_arcade::sim::{GameEvent, GamePhase};
    use neon_arcade::{Arcade, ArcadeConfig, GameKind};

    env_logger::init();
    log::info!("Neon Arcade (native) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| ArcadeConfig::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => ArcadeConfig::default(),
    };

    let mut arcade = match Arcade::new(config, 0x5EED) {
        Ok(arcade) => arcade,
        Err(e) => {
            log::error!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };

    // Simulated frames at ~60 Hz, two minutes per game at most
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 120;
    let script = [Key::Up, Key::Right, Key::Down, Key::Left];

    for kind in GameKind::ALL {
        arcade.mount(kind);
        arcade.handle_input(&InputEvent::KeyDown(Key::Enter));

        for frame in 0..MAX_FRAMES {
            // A turn every half second; flappy flaps whenever it sinks
            if frame % 30 == 0 {
                let key = script[(frame / 30) as usize % script.len()];
                arcade.handle_input(&InputEvent::KeyDown(key));
            }
            if kind == GameKind::Flappy && frame % 20 == 0 {
                arcade.handle_input(&InputEvent::Pointer);
            }

            for event in arcade.advance(FRAME_MS) {
                if let GameEvent::Crashed { cause, score, tick } = event {
                    println!("{:>6}: {:?} after {} ticks, score {}", kind.as_str(), cause, tick, score);
                }
            }
            if arcade.phase() != Some(GamePhase::Running) {
                break;
            }
        }

        if let Some(snapshot) = arcade.snapshot() {
            if !snapshot.is_over {
                println!("{:>6}: still running after {} ticks, score {}", kind.as_str(), snapshot.tick, snapshot.score);
            }
        }
        arcade.unmount();
    }

    for kind in GameKind::ALL {
        println!("{:>6} best: {}", kind.as_str(), arcade.scores().best(kind));
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the library's `init`, this is just to satisfy the compiler
}
