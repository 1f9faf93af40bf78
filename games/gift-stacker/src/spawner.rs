//! The sliding spawner and the optional auto-drop countdown.

/// Horizontal speed in px per reference frame at slide multiplier 1.0.
pub const BASE_SPEED: f32 = 6.25;
/// Reference frame length the speed is tuned against.
pub const REFERENCE_FRAME_MS: f32 = 16.67;
/// Delay between a drop and the next box appearing.
pub const RESPAWN_DELAY_MS: f64 = 1000.0;
/// Pause after a spawn before the countdown starts, so the bar can refill.
pub const TIMER_FILL_DELAY_MS: f32 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerState {
    /// No round in progress.
    Idle,
    /// A box is held and sliding.
    Holding,
    /// The box was dropped; the next one is scheduled.
    Released,
}

/// Countdown forcing a drop when the player waits too long.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTimer {
    max_ms: Option<f32>,
    current_ms: f32,
    fill_delay_ms: f32,
}

impl DropTimer {
    pub fn new(max_ms: Option<f32>) -> Self {
        Self {
            max_ms,
            current_ms: max_ms.unwrap_or(0.0),
            fill_delay_ms: 0.0,
        }
    }

    /// Refill for a fresh box.
    pub fn restart(&mut self) {
        self.current_ms = self.max_ms.unwrap_or(0.0);
        self.fill_delay_ms = TIMER_FILL_DELAY_MS;
    }

    /// Advance by `delta_ms`. Returns `true` on the frame the countdown hits zero.
    pub fn tick(&mut self, delta_ms: f32) -> bool {
        if self.max_ms.is_none() || self.current_ms <= 0.0 {
            return false;
        }
        if self.fill_delay_ms > 0.0 {
            self.fill_delay_ms -= delta_ms;
            return false;
        }
        self.current_ms -= delta_ms;
        if self.current_ms <= 0.0 {
            self.current_ms = 0.0;
            return true;
        }
        false
    }

    /// Remaining fraction in `[0, 1]`, or `None` when disabled.
    pub fn fraction(&self) -> Option<f32> {
        let max = self.max_ms?;
        if max <= 0.0 {
            return Some(0.0);
        }
        Some((self.current_ms / max).clamp(0.0, 1.0))
    }

    pub fn remaining_ms(&self) -> f32 {
        self.current_ms
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spawner {
    pub x: f32,
    /// Driven by the camera controller.
    pub y: f32,
    direction: f32,
    state: SpawnerState,
    timer: DropTimer,
}

impl Spawner {
    pub fn new(y: f32) -> Self {
        Self {
            x: 0.0,
            y,
            direction: 1.0,
            state: SpawnerState::Idle,
            timer: DropTimer::new(None),
        }
    }

    /// Prepare for a new round with the given auto-drop countdown.
    pub fn reset_round(&mut self, viewport_width: f32, y: f32, drop_time_ms: Option<f32>) {
        self.x = viewport_width / 2.0;
        self.y = y;
        self.direction = 1.0;
        self.state = SpawnerState::Idle;
        self.timer = DropTimer::new(drop_time_ms);
    }

    /// A new box is held: recenter and refill the timer.
    pub fn begin_hold(&mut self, viewport_width: f32) {
        self.x = viewport_width / 2.0;
        self.state = SpawnerState::Holding;
        self.timer.restart();
    }

    /// The held box was dropped.
    pub fn release(&mut self) {
        self.state = SpawnerState::Released;
    }

    pub fn idle(&mut self) {
        self.state = SpawnerState::Idle;
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn timer(&self) -> &DropTimer {
        &self.timer
    }

    /// Count down while holding. Returns `true` when the box must drop now.
    pub fn tick_timer(&mut self, delta_ms: f32) -> bool {
        self.state == SpawnerState::Holding && self.timer.tick(delta_ms)
    }

    /// Slide toward the current direction, bouncing off `[half_w, width - half_w]`.
    pub fn oscillate(&mut self, delta_ms: f32, slide_mult: f32, viewport_width: f32, half_w: f32) {
        if self.state != SpawnerState::Holding {
            return;
        }
        let lo = half_w;
        let hi = (viewport_width - half_w).max(lo);

        self.x += self.direction * BASE_SPEED * slide_mult * (delta_ms / REFERENCE_FRAME_MS);

        if (self.x > hi && self.direction > 0.0) || (self.x < lo && self.direction < 0.0) {
            self.direction = -self.direction;
        }
        self.x = self.x.min(hi).max(lo);
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn moves_at_base_speed_per_reference_frame() {
        let mut spawner = Spawner::new(100.0);
        spawner.begin_hold(800.0);
        spawner.oscillate(REFERENCE_FRAME_MS, 1.0, 800.0, 60.0);
        assert!((spawner.x - 406.25).abs() < 1e-3);
    }

    #[test]
    fn bounces_at_right_edge() {
        let mut spawner = Spawner::new(100.0);
        spawner.begin_hold(800.0);
        spawner.x = 738.0;
        spawner.oscillate(REFERENCE_FRAME_MS, 1.0, 800.0, 60.0);
        assert_eq!(spawner.x, 740.0);
        assert_eq!(spawner.direction(), -1.0);
        spawner.oscillate(REFERENCE_FRAME_MS, 1.0, 800.0, 60.0);
        assert!(spawner.x < 740.0);
    }

    #[test]
    fn does_not_move_unless_holding() {
        let mut spawner = Spawner::new(100.0);
        spawner.reset_round(800.0, 100.0, None);
        spawner.oscillate(100.0, 1.0, 800.0, 60.0);
        assert_eq!(spawner.x, 400.0);

        spawner.begin_hold(800.0);
        spawner.release();
        spawner.oscillate(100.0, 1.0, 800.0, 60.0);
        assert_eq!(spawner.x, 400.0);
    }

    #[test]
    fn each_hold_recenters() {
        let mut spawner = Spawner::new(100.0);
        spawner.begin_hold(800.0);
        spawner.oscillate(500.0, 1.0, 800.0, 60.0);
        spawner.release();
        spawner.begin_hold(800.0);
        assert_eq!(spawner.x, 400.0);
    }

    #[test]
    fn timer_waits_for_fill_delay() {
        let mut timer = DropTimer::new(Some(1000.0));
        timer.restart();
        assert!(!timer.tick(200.0));
        assert_eq!(timer.remaining_ms(), 1000.0);
        assert!(!timer.tick(100.0));
        assert!(!timer.tick(500.0));
        assert_eq!(timer.remaining_ms(), 500.0);
        assert!(timer.tick(600.0));
        assert_eq!(timer.remaining_ms(), 0.0);
        assert_eq!(timer.fraction(), Some(0.0));
        // Pinned at zero until the next restart.
        assert!(!timer.tick(16.0));
    }

    #[test]
    fn disabled_timer_never_fires() {
        let mut timer = DropTimer::new(None);
        timer.restart();
        assert!(!timer.tick(1e9));
        assert_eq!(timer.fraction(), None);
    }

    #[test]
    fn timer_only_counts_while_holding() {
        let mut spawner = Spawner::new(100.0);
        spawner.reset_round(800.0, 100.0, Some(500.0));
        spawner.begin_hold(800.0);
        spawner.release();
        assert!(!spawner.tick_timer(10_000.0));
        assert_eq!(spawner.timer().remaining_ms(), 500.0);
    }

    proptest! {
        #[test]
        fn spawner_stays_within_bounds(
            width in 200.0f32..2000.0,
            box_size in 60.0f32..120.0,
            slide in 0.1f32..3.0,
            deltas in proptest::collection::vec(0.0f32..250.0, 1..400),
        ) {
            let half_w = box_size / 2.0;
            let mut spawner = Spawner::new(100.0);
            spawner.reset_round(width, 100.0, None);
            spawner.begin_hold(width);
            for delta in deltas {
                spawner.oscillate(delta, slide, width, half_w);
                prop_assert!(spawner.x >= half_w && spawner.x <= width - half_w,
                    "x={} outside [{}, {}]", spawner.x, half_w, width - half_w);
            }
        }
    }
}
