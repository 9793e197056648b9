// wallpanel — turn a spare screen into a presence-aware wall display

//! Service shell for the wallpanel display controller: the MJPEG broadcast
//! server, the HTTP control/ingest surface, display drivers, and the session
//! that wires them to the sensor-fusion core.

pub mod cli;
pub mod display;
pub mod mjpeg;
pub mod routes;
pub mod server;
pub mod session;

pub use cli::Cli;
pub use display::{LoggingDisplay, SysfsBacklight};
pub use mjpeg::MjpegServer;
pub use server::{build_router, serve, AppState};
pub use session::Session;
