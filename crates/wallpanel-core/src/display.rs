// wallpanel — turn a spare screen into a presence-aware wall display

//! The display hardware seam.

use anyhow::Result;

/// Brightness applied when the display sleeps: effectively dark while the
/// panel can still wake instantly.
pub const SLEEP_BRIGHTNESS: f64 = 0.01;
/// Brightness applied when the display wakes.
pub const WAKE_BRIGHTNESS: f64 = 1.0;

/// Boundary to the actual display hardware.
///
/// Implementations must be cheap and non-blocking; they are invoked from the
/// power controller's command loop.
pub trait DisplayDriver: Send + Sync {
    /// Set panel brightness, 0.0-1.0.
    fn set_brightness(&self, level: f64);

    /// Make the foreground content visible again.
    fn show_content(&self);

    /// Hide the foreground content while the display sleeps.
    fn hide_content(&self);

    /// Ask the platform to lock the screen. Best-effort: a failure must not
    /// prevent the display from dimming.
    fn request_lock(&self) -> Result<()>;
}
