// wallpanel — turn a spare screen into a presence-aware wall display

//! Camera frame analysis: average brightness plus a grid-based motion score.
//!
//! Operates on the luminance plane of raw camera frames. Only every third
//! frame is processed and only every fourth pixel is sampled: presence
//! detection does not need full-resolution diffing, and the analyzer runs on
//! every camera callback.

use bytes::Bytes;
use serde::Serialize;

/// Rows in the motion-detection grid.
pub const GRID_ROWS: usize = 8;
/// Columns in the motion-detection grid.
pub const GRID_COLS: usize = 8;

/// Only every Nth incoming frame is analyzed; the rest are discarded.
const ANALYZE_EVERY_N_FRAMES: u64 = 3;
/// Stride used when sampling pixels for averages.
const SAMPLE_STRIDE: usize = 4;
/// Per-cell intensity delta at or below this is treated as sensor noise.
const CELL_NOISE_FLOOR: f64 = 5.0;
/// Scale applied to the raw motion level so thresholds land in a
/// human-tunable range.
const MOTION_SCALE: f64 = 10.0;

/// One captured camera frame: the luminance plane plus its dimensions.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Result of analyzing one processed frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FrameAnalysis {
    /// Mean sampled intensity, 0-255.
    pub brightness: f64,
    /// Motion score; 0 when the frame matches its predecessor.
    pub motion: f64,
}

/// Grid-based motion and brightness analyzer.
///
/// Holds the previous frame's grid snapshot and diffs each processed frame
/// against it cell by cell. A cell only counts when its delta exceeds
/// [`CELL_NOISE_FLOOR`]; the score then weighs both how much the significant
/// cells changed and how many of them there are, so a hand entering at the
/// frame edge registers while single-pixel noise does not.
pub struct FrameAnalyzer {
    frame_count: u64,
    previous_len: Option<usize>,
    previous_grid: Option<Vec<f64>>,
}

impl Default for FrameAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAnalyzer {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            previous_len: None,
            previous_grid: None,
        }
    }

    /// Analyze one incoming frame.
    ///
    /// Returns `None` for the frames the cadence skips. A frame whose buffer
    /// length differs from its predecessor yields motion 0 rather than an
    /// error; a dropped detection cycle is preferable to taking down a
    /// service that runs unattended.
    pub fn analyze(&mut self, frame: &Frame) -> Option<FrameAnalysis> {
        self.frame_count += 1;
        if self.frame_count % ANALYZE_EVERY_N_FRAMES != 0 {
            return None;
        }

        let brightness = average_brightness(&frame.data);
        let motion = self.motion_level(frame);
        self.previous_len = Some(frame.data.len());

        Some(FrameAnalysis { brightness, motion })
    }

    fn motion_level(&mut self, frame: &Frame) -> f64 {
        let Some(previous_len) = self.previous_len else {
            return 0.0;
        };
        // Length mismatch: leave the snapshot untouched so the next
        // well-formed frame diffs against real data.
        if previous_len != frame.data.len() {
            return 0.0;
        }

        let current = grid_values(frame);
        let motion = match &self.previous_grid {
            None => 0.0,
            Some(previous) => {
                let mut total_diff = 0.0;
                let mut significant = 0usize;
                for (cur, prev) in current.iter().zip(previous.iter()) {
                    let diff = (cur - prev).abs();
                    if diff > CELL_NOISE_FLOOR {
                        total_diff += diff;
                        significant += 1;
                    }
                }
                if significant == 0 {
                    0.0
                } else {
                    let cell_count = (GRID_ROWS * GRID_COLS) as f64;
                    (total_diff / significant as f64)
                        * (significant as f64 / cell_count)
                        * MOTION_SCALE
                }
            }
        };
        self.previous_grid = Some(current);
        motion
    }
}

fn average_brightness(data: &[u8]) -> f64 {
    let mut sum = 0u64;
    let mut count = 0u64;
    for byte in data.iter().step_by(SAMPLE_STRIDE) {
        sum += u64::from(*byte);
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Mean sampled intensity per grid cell.
fn grid_values(frame: &Frame) -> Vec<f64> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let data = &frame.data;
    let cell_width = width / GRID_COLS;
    let cell_height = height / GRID_ROWS;

    let mut values = vec![0.0; GRID_ROWS * GRID_COLS];
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let mut sum = 0u64;
            let mut count = 0u64;
            let end_y = ((row + 1) * cell_height).min(height);
            let end_x = ((col + 1) * cell_width).min(width);
            for y in (row * cell_height..end_y).step_by(SAMPLE_STRIDE) {
                for x in (col * cell_width..end_x).step_by(SAMPLE_STRIDE) {
                    let index = y * width + x;
                    if index < data.len() {
                        sum += u64::from(data[index]);
                        count += 1;
                    }
                }
            }
            values[row * GRID_COLS + col] = if count > 0 {
                sum as f64 / count as f64
            } else {
                0.0
            };
        }
    }
    values
}
