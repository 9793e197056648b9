// wallpanel — turn a spare screen into a presence-aware wall display

//! Session wiring: settings, frame analyzer, power controller, broadcaster.
//!
//! The session is the single owner of the running subsystems. Sensor input
//! arrives through the HTTP surface, gets routed here, and fans out to the
//! controller and the stream server.

use crate::mjpeg::MjpegServer;
use anyhow::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{error, info};
use wallpanel_core::{
    start_power_controller, DisplayDriver, Frame, FrameAnalysis, FrameAnalyzer,
    PowerControllerHandle, ProximitySample, ScreenState, Settings, SettingsStore,
};

/// Informational brightness before any frame has been analyzed.
const INITIAL_BRIGHTNESS: f64 = 255.0;

pub struct Session {
    store: SettingsStore,
    settings: RwLock<Settings>,
    power: PowerControllerHandle,
    mjpeg: RwLock<Arc<MjpegServer>>,
    analyzer: Mutex<FrameAnalyzer>,
    brightness_tx: watch::Sender<f64>,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Load settings once and bring up the controller and, when enabled, the
    /// stream server. A stream bind failure is logged and leaves streaming
    /// off; the display controller still runs.
    pub async fn start(store: SettingsStore, display: Arc<dyn DisplayDriver>) -> Arc<Self> {
        let settings = store.load();
        info!("session starting: {:?}", settings);

        let power = start_power_controller(settings.clone(), display);
        let mjpeg = Arc::new(MjpegServer::new(settings.stream_port));
        if settings.stream_enabled {
            if let Err(e) = mjpeg.start().await {
                error!("camera stream disabled: {e:#}");
            }
        }
        let (brightness_tx, _) = watch::channel(INITIAL_BRIGHTNESS);

        Arc::new(Self {
            store,
            settings: RwLock::new(settings),
            power,
            mjpeg: RwLock::new(mjpeg),
            analyzer: Mutex::new(FrameAnalyzer::new()),
            brightness_tx,
            started_at: Utc::now(),
        })
    }

    /// Feed one raw camera frame through the analyzer. Returns `None` for
    /// frames the analyzer's cadence skips.
    pub async fn analyze_frame(&self, frame: Frame) -> Option<FrameAnalysis> {
        let analysis = self.analyzer.lock().await.analyze(&frame)?;
        let _ = self.brightness_tx.send(analysis.brightness);
        if analysis.motion > 0.0 {
            self.power.on_motion(analysis.motion).await;
        }
        Some(analysis)
    }

    /// Publish a pre-encoded JPEG to the stream viewers.
    pub async fn publish_frame(&self, jpeg: Bytes) {
        self.mjpeg.read().await.publish(jpeg).await;
    }

    pub async fn handle_proximity(&self, sample: ProximitySample) {
        self.power.on_proximity(sample).await;
    }

    pub async fn notify_activity(&self) {
        self.power.notify_activity().await;
    }

    pub async fn set_screen(&self, on: bool) {
        self.power.set_screen(on).await;
    }

    pub fn screen_state(&self) -> ScreenState {
        self.power.screen_state()
    }

    pub fn last_brightness(&self) -> f64 {
        *self.brightness_tx.borrow()
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub async fn viewer_count(&self) -> usize {
        self.mjpeg.read().await.viewer_count()
    }

    pub async fn stream_running(&self) -> bool {
        self.mjpeg.read().await.is_running().await
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Re-read the settings file and apply it: the explicit "settings
    /// changed" signal.
    pub async fn reload_settings(&self) -> Settings {
        let new = self.store.load();
        self.apply(new.clone()).await;
        new
    }

    /// Persist a full settings record, then apply it.
    pub async fn update_settings(&self, new: Settings) -> Result<()> {
        self.store.save(&new)?;
        self.apply(new).await;
        Ok(())
    }

    async fn apply(&self, new: Settings) {
        self.power.reload(new.clone()).await;

        let current = self.mjpeg.read().await.clone();
        let port_changed = current.port() != new.stream_port;
        if !new.stream_enabled || port_changed {
            current.stop().await;
        }
        if new.stream_enabled {
            if port_changed {
                let fresh = Arc::new(MjpegServer::new(new.stream_port));
                if let Err(e) = fresh.start().await {
                    error!("camera stream disabled: {e:#}");
                }
                *self.mjpeg.write().await = fresh;
            } else if let Err(e) = current.start().await {
                error!("camera stream disabled: {e:#}");
            }
        }

        *self.settings.write().await = new;
        info!("settings applied");
    }

    /// Teardown: the power controller (cancelling its pending timer) first,
    /// the stream server last. Callers must have stopped feeding sensor
    /// input before this.
    pub async fn shutdown(&self) {
        info!("session shutting down");
        self.power.shutdown().await;
        self.mjpeg.read().await.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingDisplay {
        shows: AtomicUsize,
        hides: AtomicUsize,
    }

    impl DisplayDriver for CountingDisplay {
        fn set_brightness(&self, _level: f64) {}
        fn show_content(&self) {
            self.shows.fetch_add(1, Ordering::SeqCst);
        }
        fn hide_content(&self) {
            self.hides.fetch_add(1, Ordering::SeqCst);
        }
        fn request_lock(&self) -> Result<()> {
            Err(anyhow!("unsupported in tests"))
        }
    }

    fn scratch_store(name: &str) -> SettingsStore {
        let path = std::env::temp_dir().join(format!(
            "wallpanel-session-{}-{}.json",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        SettingsStore::new(path)
    }

    fn uniform_frame(value: u8) -> Frame {
        Frame {
            data: Bytes::from(vec![value; 64 * 64]),
            width: 64,
            height: 64,
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn analyzed_motion_wakes_the_display() {
        let display = Arc::new(CountingDisplay::default());
        let session = Session::start(scratch_store("motion"), display.clone()).await;
        settle().await;

        session.set_screen(false).await;
        settle().await;
        assert_eq!(session.screen_state(), ScreenState::Off);

        // Two processed frames seed the analyzer, the third carries a
        // full-frame intensity jump well above the motion threshold.
        for _ in 0..6 {
            let _ = session.analyze_frame(uniform_frame(10)).await;
        }
        for _ in 0..3 {
            let _ = session.analyze_frame(uniform_frame(250)).await;
        }
        settle().await;

        assert_eq!(session.screen_state(), ScreenState::On);
        assert_eq!(display.shows.load(Ordering::SeqCst), 1);
        assert!(session.last_brightness() > 200.0);
    }

    #[tokio::test(start_paused = true)]
    async fn brightness_watch_starts_at_full_scale() {
        let display = Arc::new(CountingDisplay::default());
        let session = Session::start(scratch_store("brightness"), display).await;
        assert_eq!(session.last_brightness(), 255.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_stays_off_by_default() {
        let display = Arc::new(CountingDisplay::default());
        let session = Session::start(scratch_store("stream-off"), display).await;
        assert!(!session.stream_running().await);
        assert_eq!(session.viewer_count().await, 0);
    }

    #[tokio::test]
    async fn updating_settings_toggles_the_stream() {
        let display = Arc::new(CountingDisplay::default());
        let session = Session::start(scratch_store("stream-toggle"), display).await;
        assert!(!session.stream_running().await);

        session
            .update_settings(Settings {
                stream_enabled: true,
                stream_port: 0,
                ..Settings::default()
            })
            .await
            .unwrap();
        assert!(session.stream_running().await);

        session
            .update_settings(Settings {
                stream_enabled: false,
                ..Settings::default()
            })
            .await
            .unwrap();
        assert!(!session.stream_running().await);

        session.shutdown().await;
    }
}
