// wallpanel — turn a spare screen into a presence-aware wall display

//! Display drivers.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, warn};
use wallpanel_core::DisplayDriver;

/// Driver that only logs transitions. Used when no panel hardware is wired
/// up; real deployments implement [`DisplayDriver`] against their display
/// stack.
pub struct LoggingDisplay;

impl DisplayDriver for LoggingDisplay {
    fn set_brightness(&self, level: f64) {
        info!("display brightness -> {:.2}", level);
    }

    fn show_content(&self) {
        info!("display content shown");
    }

    fn hide_content(&self) {
        info!("display content hidden");
    }

    fn request_lock(&self) -> Result<()> {
        debug!("screen lock not applicable without panel hardware");
        Ok(())
    }
}

/// Linux backlight driver: scales brightness against the panel's
/// `max_brightness` and writes the sysfs control file. Screen lock goes
/// through `loginctl`, which may fail without a seat session.
pub struct SysfsBacklight {
    brightness_path: PathBuf,
    max_brightness: u32,
}

impl SysfsBacklight {
    /// Open `/sys/class/backlight/<device>`. Fails when the device is
    /// missing or its `max_brightness` is unreadable.
    pub fn open(device: &str) -> Result<Self> {
        let base = PathBuf::from("/sys/class/backlight").join(device);
        let raw = fs::read_to_string(base.join("max_brightness"))
            .with_context(|| format!("no backlight device at {}", base.display()))?;
        let max_brightness = raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("unparsable max_brightness for {}", device))?;
        info!(
            "backlight {} opened (max_brightness={})",
            device, max_brightness
        );
        Ok(Self {
            brightness_path: base.join("brightness"),
            max_brightness,
        })
    }
}

impl DisplayDriver for SysfsBacklight {
    fn set_brightness(&self, level: f64) {
        let value = (level.clamp(0.0, 1.0) * f64::from(self.max_brightness)).round() as u32;
        if let Err(e) = fs::write(&self.brightness_path, value.to_string()) {
            warn!("backlight write failed: {}", e);
        }
    }

    // Content visibility belongs to the on-screen browser shell; this driver
    // only controls the panel itself.
    fn show_content(&self) {}

    fn hide_content(&self) {}

    fn request_lock(&self) -> Result<()> {
        let status = Command::new("loginctl")
            .arg("lock-session")
            .status()
            .context("failed to spawn loginctl")?;
        if !status.success() {
            bail!("loginctl lock-session exited with {}", status);
        }
        Ok(())
    }
}
