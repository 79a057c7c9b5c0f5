use std::time::{Duration, Instant};

/// Windowed frame-rate meter.
///
/// Frames are counted over a fixed window; when the window elapses the average
/// rate is published and counting restarts. Between publications the last
/// published value is reported.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    current: f32,
}

impl FpsMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            window_start: None,
            frames: 0,
            current: 0.0,
        }
    }

    /// Records one presented frame. Returns the new rate when a window closes.
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window {
            return None;
        }

        self.current = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Some(now);
        Some(self.current)
    }

    /// Last published rate; `0.0` until the first window closes.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Drops the running window, e.g. after a surface rebuild stalled a frame.
    pub fn restart(&mut self) {
        self.window_start = None;
        self.frames = 0;
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_after_window() {
        let mut m = FpsMeter::new(Duration::from_secs(2));
        let base = Instant::now();
        assert_eq!(m.record(base), None);

        let step = Duration::from_micros(16_667);
        let mut published = None;
        for i in 1..=120u32 {
            if let Some(fps) = m.record(base + step * i) {
                published = Some(fps);
            }
        }
        let fps = published.expect("window should close after two seconds");
        assert!((fps - 60.0).abs() < 0.5, "fps = {fps}");
        assert_eq!(m.current(), fps);
    }

    #[test]
    fn reports_zero_before_first_window() {
        let mut m = FpsMeter::default();
        let base = Instant::now();
        m.record(base);
        m.record(base + Duration::from_millis(100));
        assert_eq!(m.current(), 0.0);
    }
}
