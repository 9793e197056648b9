// wallpanel — turn a spare screen into a presence-aware wall display

//! Display power management.
//!
//! ```text
//! controller.rs - command-queue actor owning the single on/off state
//! timer.rs      - cancellable rearming inactivity timer
//! ```

pub mod controller;
pub mod timer;

pub use controller::{start_power_controller, PowerCommand, PowerControllerHandle, ScreenState};
