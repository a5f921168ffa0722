pub const TARGET_FPS: u32 = 60;
pub const FIXED_DELTA: f32 = 1.0 / TARGET_FPS as f32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Run events, update and render with this delta.
    Fixed(f32),
    /// Not enough time has passed for an update; render only.
    RenderOnly,
}

/// Fixed-timestep accumulator with a once-per-second FPS average.
pub struct FrameClock {
    fixed_delta: f32,
    frame_time: f32,
    accum_time: f32,
    frame_count: u32,
    avg_fps: f32,
}

impl FrameClock {
    pub fn new() -> FrameClock {
        FrameClock::with_target_fps(TARGET_FPS)
    }

    pub fn with_target_fps(target_fps: u32) -> FrameClock {
        FrameClock {
            fixed_delta: 1.0 / target_fps.max(1) as f32,
            frame_time: 0.0,
            accum_time: 0.0,
            frame_count: 0,
            avg_fps: 0.0,
        }
    }

    pub fn fixed_delta(self: &Self) -> f32 {
        self.fixed_delta
    }

    pub fn advance(self: &mut Self, dt: f32) -> Step {
        self.frame_time += dt;
        self.accum_time += dt;

        if self.frame_time < self.fixed_delta {
            return Step::RenderOnly;
        }

        self.frame_count += 1;
        if self.accum_time >= 1.0 {
            self.avg_fps = self.frame_count as f32 / self.accum_time;
            self.frame_count = 0;
            self.accum_time -= 1.0;
        }

        self.frame_time = 0.0;
        Step::Fixed(self.fixed_delta)
    }

    pub fn average_fps(self: &Self) -> f32 {
        self.avg_fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        FrameClock::new()
    }
}
