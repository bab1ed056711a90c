//! Browser host binding
//!
//! `WebArcade` owns the requestAnimationFrame loop and the keydown
//! listener. Each frame feeds elapsed time to the arcade and hands the
//! snapshot (as JSON) to a page callback for drawing. The loop parks itself
//! when the game stops running and is resumed by the next start.

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::KeyboardEvent;

use crate::arcade::Arcade;
use crate::platform::{InputEvent, Key};
use crate::settings::{ArcadeConfig, GameKind};
use crate::sim::GamePhase;

type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| js_err("no window"))
}

#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).map_err(js_err)?;
    log::info!("Neon Arcade loaded");
    Ok(())
}

struct Host {
    arcade: Arcade,
    on_frame: Option<js_sys::Function>,
    raf_id: Option<i32>,
    last_time: Option<f64>,
}

impl Host {
    fn snapshot_json(&self) -> Option<String> {
        let snapshot = self.arcade.snapshot()?;
        match serde_json::to_string(&snapshot) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Snapshot serialization failed: {}", e);
                None
            }
        }
    }

    fn is_running(&self) -> bool {
        self.arcade.phase() == Some(GamePhase::Running)
    }
}

/// Call the page's draw callback. Must not be called while `Host` is
/// borrowed: the callback may call back into `WebArcade`.
fn emit(callback: Option<js_sys::Function>, json: Option<String>) {
    if let (Some(callback), Some(json)) = (callback, json) {
        if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::warn!("Frame callback threw: {:?}", e);
        }
    }
}

fn request_frame(frame: &FrameSlot, host: &Rc<RefCell<Host>>) -> Result<(), JsValue> {
    if host.borrow().raf_id.is_some() {
        return Ok(());
    }
    let slot = frame.borrow();
    let Some(closure) = slot.as_ref() else {
        return Ok(());
    };
    let id = window()?.request_animation_frame(closure.as_ref().unchecked_ref())?;
    host.borrow_mut().raf_id = Some(id);
    Ok(())
}

/// Route input and restart the parked frame loop if it started a run
fn send(host: &Rc<RefCell<Host>>, frame: &FrameSlot, event: &InputEvent) {
    let resume = {
        let mut h = host.borrow_mut();
        let was_running = h.is_running();
        h.arcade.handle_input(event);
        !was_running && h.is_running()
    };
    if resume {
        if let Err(e) = request_frame(frame, host) {
            log::error!("requestAnimationFrame failed: {:?}", e);
        }
    }
}

#[wasm_bindgen]
pub struct WebArcade {
    host: Rc<RefCell<Host>>,
    frame: FrameSlot,
    keydown: Option<Closure<dyn FnMut(KeyboardEvent)>>,
}

#[wasm_bindgen]
impl WebArcade {
    /// Create the arcade, optionally overriding tuning with a JSON string
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WebArcade, JsValue> {
        let config = match config_json {
            Some(json) => ArcadeConfig::from_json(&json).map_err(js_err)?,
            None => ArcadeConfig::default(),
        };
        let seed = js_sys::Date::now() as u64;
        let arcade = Arcade::new(config, seed).map_err(js_err)?;
        log::info!("Arcade initialized with seed: {}", seed);

        let host = Rc::new(RefCell::new(Host {
            arcade,
            on_frame: None,
            raf_id: None,
            last_time: None,
        }));
        let frame: FrameSlot = Rc::new(RefCell::new(None));

        let loop_frame = frame.clone();
        let loop_host = host.clone();
        *frame.borrow_mut() = Some(Closure::new(move |time: f64| {
            let (callback, json, running) = {
                let mut h = loop_host.borrow_mut();
                h.raf_id = None;
                let elapsed = h.last_time.map(|last| time - last).unwrap_or(0.0);
                h.last_time = Some(time);
                h.arcade.advance(elapsed);
                (h.on_frame.clone(), h.snapshot_json(), h.is_running())
            };
            emit(callback, json);

            if running {
                if let Err(e) = request_frame(&loop_frame, &loop_host) {
                    log::error!("requestAnimationFrame failed: {:?}", e);
                }
            } else {
                loop_host.borrow_mut().last_time = None;
                log::debug!("Frame loop parked");
            }
        }));

        Ok(WebArcade {
            host,
            frame,
            keydown: None,
        })
    }

    /// Mount a game by name ("snake", "flappy", "racer") and register the
    /// draw callback, which receives each snapshot as a JSON string
    pub fn mount(&mut self, kind: &str, on_frame: js_sys::Function) -> Result<(), JsValue> {
        let kind = GameKind::from_str(kind).ok_or_else(|| js_err(format!("unknown game: {}", kind)))?;
        self.unmount()?;

        let (callback, json) = {
            let mut h = self.host.borrow_mut();
            h.arcade.mount(kind);
            h.on_frame = Some(on_frame);
            (h.on_frame.clone(), h.snapshot_json())
        };

        let host = self.host.clone();
        let frame = self.frame.clone();
        let keydown = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let name = event.key();
            let Some(key) = Key::from_dom(&name) else {
                return;
            };
            if Key::scrolls_page(&name) {
                event.prevent_default();
            }
            send(&host, &frame, &InputEvent::KeyDown(key));
        });
        window()?.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        self.keydown = Some(keydown);

        // Draw the idle layout before the first start
        emit(callback, json);
        Ok(())
    }

    /// Start or restart the mounted game
    pub fn start(&mut self) -> Result<bool, JsValue> {
        if !self.host.borrow_mut().arcade.start() {
            return Ok(false);
        }
        request_frame(&self.frame, &self.host)?;
        Ok(true)
    }

    /// Click or tap on the game surface
    pub fn pointer(&mut self) {
        send(&self.host, &self.frame, &InputEvent::Pointer);
    }

    /// Leaderboard rank the current run would take if it ended now
    pub fn live_rank(&self) -> Option<u32> {
        self.host.borrow().arcade.live_rank().map(|rank| rank as u32)
    }

    /// Current snapshot as JSON, if a game is mounted
    pub fn snapshot(&self) -> Option<String> {
        self.host.borrow().snapshot_json()
    }

    pub fn best_score(&self, kind: &str) -> Option<f64> {
        let kind = GameKind::from_str(kind)?;
        Some(self.host.borrow().arcade.scores().best(kind) as f64)
    }

    /// Cancel the frame loop, remove the listener and tear the game down
    pub fn unmount(&mut self) -> Result<(), JsValue> {
        let window = window()?;
        if let Some(id) = self.host.borrow_mut().raf_id.take() {
            window.cancel_animation_frame(id)?;
        }
        if let Some(keydown) = self.keydown.take() {
            window.remove_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        }

        let mut h = self.host.borrow_mut();
        h.arcade.unmount();
        h.on_frame = None;
        h.last_time = None;
        Ok(())
    }
}

impl Drop for WebArcade {
    fn drop(&mut self) {
        if let Err(e) = self.unmount() {
            log::warn!("Unmount on drop failed: {:?}", e);
        }
        // Break the frame closure's reference back to its own slot
        self.frame.borrow_mut().take();
    }
}
