// wallpanel — turn a spare screen into a presence-aware wall display

//! Sensor-fusion core for the wallpanel display controller.
//!
//! This crate holds the pieces that decide when the display should be lit:
//! the camera frame analyzer, the proximity evaluator, and the power state
//! machine with its inactivity timer. It has no network surface; the server
//! crate wires these into the running service.

pub mod analyzer;
pub mod display;
pub mod power;
pub mod proximity;
pub mod settings;

pub use analyzer::{Frame, FrameAnalysis, FrameAnalyzer};
pub use display::{DisplayDriver, SLEEP_BRIGHTNESS, WAKE_BRIGHTNESS};
pub use power::{start_power_controller, PowerCommand, PowerControllerHandle, ScreenState};
pub use proximity::{PowerIntent, ProximityEvaluator, ProximityMode, ProximitySample};
pub use settings::{Settings, SettingsStore};
