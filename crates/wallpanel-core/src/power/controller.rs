// wallpanel — turn a spare screen into a presence-aware wall display

//! The display power state machine.
//!
//! Every input (motion, proximity, timer firings, explicit requests) is
//! funneled through one mpsc queue into a single task that owns all mutable
//! state; reads and writes of the screen state never race. The state itself
//! is published read-only through a `watch` channel.

use super::timer::InactivityTimer;
use crate::display::{DisplayDriver, SLEEP_BRIGHTNESS, WAKE_BRIGHTNESS};
use crate::proximity::{PowerIntent, ProximityEvaluator, ProximitySample};
use crate::settings::Settings;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Whether the display is currently lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    On,
    Off,
}

impl ScreenState {
    pub fn is_on(self) -> bool {
        matches!(self, ScreenState::On)
    }
}

/// Inputs accepted by the controller task.
#[derive(Debug)]
pub enum PowerCommand {
    /// Motion score from the frame analyzer (already known to be > 0).
    Motion { level: f64 },
    /// Raw proximity sensor sample.
    Proximity(ProximitySample),
    /// Qualifying activity (UI interaction, page-load completion) that keeps
    /// the display awake without waking it.
    Activity,
    /// Explicit on/off request.
    SetScreen { on: bool },
    /// Inactivity timer firing; acted on only while its generation is
    /// current.
    InactivityElapsed(u64),
    /// Swap in a freshly loaded settings snapshot.
    Reload(Settings),
    /// Stop the controller task.
    Shutdown,
}

/// Handle to a running power controller.
#[derive(Clone)]
pub struct PowerControllerHandle {
    tx: mpsc::Sender<PowerCommand>,
    state_rx: watch::Receiver<ScreenState>,
}

impl PowerControllerHandle {
    pub fn screen_state(&self) -> ScreenState {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.state_rx.clone()
    }

    pub async fn on_motion(&self, level: f64) {
        self.send(PowerCommand::Motion { level }).await;
    }

    pub async fn on_proximity(&self, sample: ProximitySample) {
        self.send(PowerCommand::Proximity(sample)).await;
    }

    pub async fn notify_activity(&self) {
        self.send(PowerCommand::Activity).await;
    }

    pub async fn set_screen(&self, on: bool) {
        self.send(PowerCommand::SetScreen { on }).await;
    }

    pub async fn reload(&self, settings: Settings) {
        self.send(PowerCommand::Reload(settings)).await;
    }

    /// Cancel the pending timer and stop the controller task. Commands
    /// already queued ahead of the shutdown are still processed.
    pub async fn shutdown(&self) {
        self.send(PowerCommand::Shutdown).await;
    }

    async fn send(&self, command: PowerCommand) {
        // A closed channel means the controller already shut down; input
        // arriving during teardown is dropped on purpose.
        let _ = self.tx.send(command).await;
    }
}

struct PowerController {
    settings: Settings,
    state: ScreenState,
    display: Arc<dyn DisplayDriver>,
    evaluator: ProximityEvaluator,
    timer: InactivityTimer,
    state_tx: watch::Sender<ScreenState>,
    tx: mpsc::Sender<PowerCommand>,
}

/// Start the controller task.
///
/// The session starts with the display lit; the inactivity timer is armed
/// right away when motion detection is enabled.
pub fn start_power_controller(
    settings: Settings,
    display: Arc<dyn DisplayDriver>,
) -> PowerControllerHandle {
    let (tx, mut rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let (state_tx, state_rx) = watch::channel(ScreenState::On);

    let evaluator = ProximityEvaluator::new(settings.proximity_mode, settings.detection_delay());
    let mut controller = PowerController {
        settings,
        state: ScreenState::On,
        display,
        evaluator,
        timer: InactivityTimer::new(),
        state_tx,
        tx: tx.clone(),
    };

    tokio::spawn(async move {
        if controller.settings.motion_detection_enabled {
            controller.rearm_timer();
        }
        info!("power controller started (screen on)");
        while let Some(command) = rx.recv().await {
            if controller.handle(command) {
                break;
            }
        }
        controller.timer.cancel();
        debug!("power controller task exited");
    });

    PowerControllerHandle { tx, state_rx }
}

impl PowerController {
    /// Returns true when the controller should shut down.
    fn handle(&mut self, command: PowerCommand) -> bool {
        match command {
            PowerCommand::Motion { level } => self.on_motion(level),
            PowerCommand::Proximity(sample) => self.on_proximity(sample),
            PowerCommand::Activity => self.rearm_timer(),
            PowerCommand::SetScreen { on } => {
                if on {
                    self.turn_on();
                } else {
                    self.turn_off();
                }
            }
            PowerCommand::InactivityElapsed(generation) => self.on_inactivity(generation),
            PowerCommand::Reload(settings) => self.apply_settings(settings),
            PowerCommand::Shutdown => return true,
        }
        false
    }

    fn on_motion(&mut self, level: f64) {
        if !self.settings.motion_detection_enabled {
            return;
        }
        if level <= self.settings.motion_threshold {
            return;
        }
        debug!(
            "motion accepted: level={:.1} threshold={:.1}",
            level, self.settings.motion_threshold
        );
        if !self.state.is_on() {
            info!("motion detected, waking display");
            self.turn_on();
        }
        self.rearm_timer();
    }

    fn on_proximity(&mut self, sample: ProximitySample) {
        if !self.settings.proximity_enabled {
            return;
        }
        // tokio's clock, so paused-time tests drive the debounce window.
        let now = tokio::time::Instant::now().into_std();
        match self.evaluator.handle_sample(sample, now, self.state.is_on()) {
            Some(PowerIntent::Wake) => {
                info!("proximity wake intent");
                self.turn_on();
            }
            Some(PowerIntent::Sleep) => {
                info!("proximity sleep intent");
                self.turn_off();
            }
            None => {}
        }
    }

    fn on_inactivity(&mut self, generation: u64) {
        if !self.timer.is_current(generation) {
            debug!("stale inactivity firing ignored (generation {})", generation);
            return;
        }
        if self.state.is_on()
            && (self.settings.motion_detection_enabled || self.settings.proximity_enabled)
        {
            info!(
                "no activity for {}ms, putting display to sleep",
                self.settings.screen_off_delay_ms
            );
            self.turn_off();
        }
    }

    fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.evaluator
            .reconfigure(self.settings.proximity_mode, self.settings.detection_delay());
        if self.settings.motion_detection_enabled || self.settings.proximity_enabled {
            self.rearm_timer();
        } else {
            self.timer.cancel();
        }
        info!("power settings reloaded");
    }

    /// Schedule the sleep timer. Armed only while the screen is on and at
    /// least one sensor can wake it back up; otherwise the screen stays on
    /// indefinitely by design.
    fn rearm_timer(&mut self) {
        if !self.state.is_on() {
            return;
        }
        if !(self.settings.motion_detection_enabled || self.settings.proximity_enabled) {
            return;
        }
        self.timer.rearm(self.settings.screen_off_delay(), &self.tx);
    }

    fn turn_on(&mut self) {
        if self.state.is_on() {
            return;
        }
        self.state = ScreenState::On;
        let _ = self.state_tx.send(ScreenState::On);
        info!("turning display on");
        self.display.set_brightness(WAKE_BRIGHTNESS);
        self.display.show_content();
        if self.settings.motion_detection_enabled {
            self.rearm_timer();
        }
    }

    fn turn_off(&mut self) {
        if !self.state.is_on() {
            return;
        }
        self.state = ScreenState::Off;
        let _ = self.state_tx.send(ScreenState::Off);
        info!("turning display off");
        self.timer.cancel();
        self.display.set_brightness(SLEEP_BRIGHTNESS);
        self.display.hide_content();
        if let Err(e) = self.display.request_lock() {
            warn!("screen lock request failed: {e:#}");
        }
    }
}
