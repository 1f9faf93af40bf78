/// Variable-rate frame clock driven by the host's animation timestamps.
///
/// The first frame after construction (or [`FrameClock::reset`]) reports a
/// delta of zero. A timestamp that runs backwards also yields zero.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
    now_ms: f64,
    delta_ms: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new frame timestamp. Returns the delta since the last frame in ms.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let delta = match self.last_ms {
            Some(last) if now_ms > last => (now_ms - last) as f32,
            _ => 0.0,
        };
        self.last_ms = Some(now_ms);
        self.now_ms = now_ms;
        self.delta_ms = delta;
        delta
    }

    /// Timestamp of the current frame.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Delta computed by the latest [`FrameClock::advance`].
    pub fn delta_ms(&self) -> f32 {
        self.delta_ms
    }

    /// Forget the previous frame so the next delta is zero again.
    pub fn reset(&mut self) {
        self.last_ms = None;
        self.delta_ms = 0.0;
    }
}

/// Length of one FPS sampling window.
pub const FPS_WINDOW_MS: f64 = 1000.0;
/// Windows averaging below this rate count as slow.
pub const FPS_FLOOR: f64 = 30.0;
/// Consecutive slow windows before the monitor trips.
pub const SLOW_WINDOWS_TO_TRIP: u32 = 3;

/// Watches frame rate and trips once when the device cannot keep up.
/// After tripping it stops sampling for good.
#[derive(Debug, Clone, Default)]
pub struct FpsMonitor {
    window_start: Option<f64>,
    frames: u32,
    slow_windows: u32,
    tripped: bool,
}

impl FpsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame. Returns `true` exactly once, on the frame where the
    /// third consecutive slow window closes.
    pub fn record_frame(&mut self, now_ms: f64) -> bool {
        if self.tripped {
            return false;
        }
        let start = *self.window_start.get_or_insert(now_ms);
        self.frames += 1;

        let elapsed = now_ms - start;
        if elapsed < FPS_WINDOW_MS {
            return false;
        }

        let fps = f64::from(self.frames) * 1000.0 / elapsed;
        if fps < FPS_FLOOR {
            self.slow_windows += 1;
        } else {
            self.slow_windows = 0;
        }
        self.frames = 0;
        self.window_start = Some(now_ms);

        if self.slow_windows >= SLOW_WINDOWS_TO_TRIP {
            self.tripped = true;
            return true;
        }
        false
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_has_zero_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(5000.0), 0.0);
        assert_eq!(clock.advance(5016.0), 16.0);
        assert_eq!(clock.now_ms(), 5016.0);
    }

    #[test]
    fn backwards_timestamp_yields_zero() {
        let mut clock = FrameClock::new();
        clock.advance(100.0);
        assert_eq!(clock.advance(90.0), 0.0);
        assert_eq!(clock.advance(106.0), 16.0);
    }

    #[test]
    fn reset_restarts_delta() {
        let mut clock = FrameClock::new();
        clock.advance(100.0);
        clock.reset();
        assert_eq!(clock.advance(900.0), 0.0);
    }

    fn run(monitor: &mut FpsMonitor, start: f64, frame_ms: f64, frames: u32) -> (f64, bool) {
        let mut t = start;
        let mut tripped = false;
        for _ in 0..frames {
            t += frame_ms;
            tripped |= monitor.record_frame(t);
        }
        (t, tripped)
    }

    #[test]
    fn fast_frames_never_trip() {
        let mut monitor = FpsMonitor::new();
        let (_, tripped) = run(&mut monitor, 0.0, 16.0, 600);
        assert!(!tripped);
        assert!(!monitor.is_tripped());
    }

    #[test]
    fn three_slow_windows_trip_once() {
        let mut monitor = FpsMonitor::new();
        // 50 ms frames = 20 FPS
        let (t, tripped) = run(&mut monitor, 0.0, 50.0, 70);
        assert!(tripped);
        assert!(monitor.is_tripped());
        let (_, again) = run(&mut monitor, t, 50.0, 100);
        assert!(!again);
    }

    #[test]
    fn recovery_resets_slow_count() {
        let mut monitor = FpsMonitor::new();
        let (t, a) = run(&mut monitor, 0.0, 50.0, 45);
        let (t, b) = run(&mut monitor, t, 16.0, 70);
        let (_, c) = run(&mut monitor, t, 50.0, 45);
        assert!(!(a || b || c));
    }
}
