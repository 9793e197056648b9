// wallpanel — turn a spare screen into a presence-aware wall display

//! Proximity-driven wake/sleep intents.
//!
//! Raw near/far sensor samples are debounced and classified; confirmed
//! transitions are mapped to wake or sleep intents by the configured policy.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Policy applied to confirmed proximity transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityMode {
    /// A wave (near, then withdraw) wakes a dark display. Nothing else acts:
    /// walking away from a lit display does nothing.
    WaveWake,
    /// A wave toggles the display, in either direction.
    WaveToggle,
    /// Presence suppresses the display and absence restores it, the way a
    /// telephone handset darkens against an ear.
    NearOff,
}

/// One raw reading from the proximity sensor.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProximitySample {
    pub distance: f32,
    /// The sensor's maximum range; readings below it count as near.
    pub max_range: f32,
}

impl ProximitySample {
    pub fn is_near(&self) -> bool {
        self.distance < self.max_range
    }
}

/// Intent emitted toward the power controller on a confirmed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerIntent {
    Wake,
    Sleep,
}

/// Debounced near/far state machine.
///
/// Starts far: no assumption is made about the environment at boot.
pub struct ProximityEvaluator {
    mode: ProximityMode,
    detection_delay: Duration,
    near: bool,
    last_accepted: Option<Instant>,
}

impl ProximityEvaluator {
    pub fn new(mode: ProximityMode, detection_delay: Duration) -> Self {
        Self {
            mode,
            detection_delay,
            near: false,
            last_accepted: None,
        }
    }

    /// Apply new settings. The current near/far state and the debounce clock
    /// survive a reconfiguration.
    pub fn reconfigure(&mut self, mode: ProximityMode, detection_delay: Duration) {
        self.mode = mode;
        self.detection_delay = detection_delay;
    }

    pub fn is_near(&self) -> bool {
        self.near
    }

    /// Feed one raw sample; `screen_on` is the display state the policies
    /// evaluate against.
    ///
    /// Samples arriving within `detection_delay` of the last accepted sample
    /// are dropped outright, which keeps a flickering sensor from producing
    /// a storm of edge events. Accepted samples always advance the debounce
    /// clock, including ones that only confirm the current state.
    pub fn handle_sample(
        &mut self,
        sample: ProximitySample,
        now: Instant,
        screen_on: bool,
    ) -> Option<PowerIntent> {
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.detection_delay {
                return None;
            }
        }
        self.last_accepted = Some(now);

        let near = sample.is_near();
        if near == self.near {
            return None;
        }
        self.near = near;

        match self.mode {
            ProximityMode::WaveWake => {
                if !near && !screen_on {
                    Some(PowerIntent::Wake)
                } else {
                    None
                }
            }
            ProximityMode::WaveToggle => {
                if !near {
                    Some(if screen_on {
                        PowerIntent::Sleep
                    } else {
                        PowerIntent::Wake
                    })
                } else {
                    None
                }
            }
            ProximityMode::NearOff => {
                if near && screen_on {
                    Some(PowerIntent::Sleep)
                } else if !near && !screen_on {
                    Some(PowerIntent::Wake)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    fn near() -> ProximitySample {
        ProximitySample {
            distance: 1.0,
            max_range: 5.0,
        }
    }

    fn far() -> ProximitySample {
        ProximitySample {
            distance: 5.0,
            max_range: 5.0,
        }
    }

    #[test]
    fn sample_at_max_range_counts_as_far() {
        assert!(!far().is_near());
        assert!(near().is_near());
    }

    #[test]
    fn samples_inside_debounce_window_never_transition() {
        let mut eval = ProximityEvaluator::new(ProximityMode::NearOff, DELAY);
        let t0 = Instant::now();
        assert_eq!(eval.handle_sample(near(), t0, true), Some(PowerIntent::Sleep));
        assert!(eval.is_near());

        // Classification says far, but the window has not elapsed.
        let intent = eval.handle_sample(far(), t0 + Duration::from_millis(100), false);
        assert_eq!(intent, None);
        assert!(eval.is_near());
    }

    #[test]
    fn confirming_sample_advances_debounce_clock() {
        let mut eval = ProximityEvaluator::new(ProximityMode::NearOff, DELAY);
        let t0 = Instant::now();
        // Far sample while already far: accepted, no transition.
        assert_eq!(eval.handle_sample(far(), t0, true), None);
        // Near sample 400ms later is still inside the window measured from
        // the accepted far sample.
        assert_eq!(eval.handle_sample(near(), t0 + Duration::from_millis(400), true), None);
        assert!(!eval.is_near());
        // After the window it goes through.
        let intent = eval.handle_sample(near(), t0 + Duration::from_millis(600), true);
        assert_eq!(intent, Some(PowerIntent::Sleep));
        assert!(eval.is_near());
    }

    #[test]
    fn first_sample_is_always_accepted() {
        let mut eval = ProximityEvaluator::new(ProximityMode::NearOff, DELAY);
        let intent = eval.handle_sample(near(), Instant::now(), true);
        assert_eq!(intent, Some(PowerIntent::Sleep));
    }

    #[test]
    fn wave_wake_emits_one_wake_on_withdrawal() {
        let mut eval = ProximityEvaluator::new(ProximityMode::WaveWake, DELAY);
        let t0 = Instant::now();
        // Approach while the display is off: nothing yet.
        assert_eq!(eval.handle_sample(near(), t0, false), None);
        // Withdraw: the wake gesture.
        let intent = eval.handle_sample(far(), t0 + DELAY, false);
        assert_eq!(intent, Some(PowerIntent::Wake));
    }

    #[test]
    fn wave_wake_does_nothing_while_display_is_on() {
        let mut eval = ProximityEvaluator::new(ProximityMode::WaveWake, DELAY);
        let t0 = Instant::now();
        assert_eq!(eval.handle_sample(near(), t0, true), None);
        assert_eq!(eval.handle_sample(far(), t0 + DELAY, true), None);
    }

    #[test]
    fn wave_toggle_resolves_against_screen_state() {
        let mut eval = ProximityEvaluator::new(ProximityMode::WaveToggle, DELAY);
        let t0 = Instant::now();
        assert_eq!(eval.handle_sample(near(), t0, true), None);
        assert_eq!(
            eval.handle_sample(far(), t0 + DELAY, true),
            Some(PowerIntent::Sleep)
        );
        assert_eq!(eval.handle_sample(near(), t0 + DELAY * 2, false), None);
        assert_eq!(
            eval.handle_sample(far(), t0 + DELAY * 3, false),
            Some(PowerIntent::Wake)
        );
    }

    #[test]
    fn near_off_round_trip_is_idempotent() {
        let mut eval = ProximityEvaluator::new(ProximityMode::NearOff, DELAY);
        let t0 = Instant::now();
        assert_eq!(eval.handle_sample(near(), t0, true), Some(PowerIntent::Sleep));
        assert_eq!(
            eval.handle_sample(far(), t0 + DELAY, false),
            Some(PowerIntent::Wake)
        );
        // A second far sample while already far produces nothing.
        assert_eq!(eval.handle_sample(far(), t0 + DELAY * 2, false), None);
    }

    #[test]
    fn reconfigure_keeps_state_and_clock() {
        let mut eval = ProximityEvaluator::new(ProximityMode::WaveWake, DELAY);
        let t0 = Instant::now();
        assert_eq!(eval.handle_sample(near(), t0, false), None);
        assert!(eval.is_near());

        eval.reconfigure(ProximityMode::NearOff, Duration::from_millis(100));
        assert!(eval.is_near());
        // New, shorter window applies from the previously accepted sample.
        let intent = eval.handle_sample(far(), t0 + Duration::from_millis(150), false);
        assert_eq!(intent, Some(PowerIntent::Wake));
    }
}
