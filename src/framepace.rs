use std::time::{Duration, Instant};

/// Measures time between frames and holds frames to a target rate
pub struct Framepacer {
    instants: [Instant; 2],
    current: usize,
}

impl Framepacer {
    pub fn new() -> Self {
        Self {
            instants: [Instant::now(); 2],
            current: 0,
        }
    }

    /// Forgets the previous frame, the next delta time starts from now
    pub fn reset(&mut self) {
        self.instants = [Instant::now(); 2];
    }

    /// Seconds between the starts of the last two frames
    pub fn delta_time(&self) -> f32 {
        self.instants[self.current]
            .duration_since(self.instants[self.previous()])
            .as_secs_f32()
    }

    /// Seconds since the current frame started
    pub fn frametime(&self) -> f32 {
        self.instants[self.current].elapsed().as_secs_f32()
    }

    pub fn framerate(&self) -> f32 {
        let dt = self.delta_time();
        if dt > 0.0 {
            1.0 / dt
        } else {
            0.0
        }
    }

    /// Starts a frame and returns its delta time
    pub fn begin_frame(&mut self) -> f32 {
        self.current = self.previous();
        self.instants[self.current] = Instant::now();
        self.delta_time()
    }

    pub fn end_frame(&mut self, limit_frametime: f32) {
        if limit_frametime > f32::EPSILON && limit_frametime.is_finite() {
            const ACCURACY: f32 = 0.0001; // 100 microseconds
            let sleep_time = limit_frametime - self.frametime() - ACCURACY;

            if sleep_time > 0.0 {
                std::thread::sleep(Duration::from_secs_f32(sleep_time));
            }

            while self.frametime() < limit_frametime {
                std::thread::yield_now();
            }
        }
    }

    fn previous(&self) -> usize {
        (self.current + 1) % 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_after_reset_is_short() {
        let mut pacer = Framepacer::new();
        std::thread::sleep(Duration::from_millis(20));
        pacer.reset();

        assert!(pacer.begin_frame() < 0.015);
    }

    #[test]
    fn delta_time_spans_frames() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        std::thread::sleep(Duration::from_millis(10));
        let dt = pacer.begin_frame();

        assert!(dt >= 0.010);
        assert_eq!(dt, pacer.delta_time());
        assert!((pacer.framerate() - 1.0 / dt).abs() < 1e-3);
    }

    #[test]
    fn end_frame_waits_for_limit() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        pacer.end_frame(0.005);

        assert!(pacer.frametime() >= 0.005);
    }

    #[test]
    fn unlimited_does_not_wait() {
        let mut pacer = Framepacer::new();
        pacer.begin_frame();
        let start = Instant::now();
        pacer.end_frame(f32::INFINITY);
        pacer.end_frame(0.0);

        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
