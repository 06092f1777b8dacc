// src/playback.rs
//! Simulated playback clock. The host calls [`PlaybackClock::tick`] once per
//! frame with the real elapsed seconds; every view reads `current_time` from here.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackSpeed {
    Half,
    #[default]
    Normal,
    Double,
    Quadruple,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 4] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::Normal,
        PlaybackSpeed::Double,
        PlaybackSpeed::Quadruple,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackSpeed::Half => "0.5x",
            PlaybackSpeed::Normal => "1x",
            PlaybackSpeed::Double => "2x",
            PlaybackSpeed::Quadruple => "4x",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    pub speed: PlaybackSpeed,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackClock {
    state: PlaybackState,
    duration: f64,
}

impl PlaybackClock {
    pub fn new(duration: f64) -> Self {
        Self {
            state: PlaybackState::default(),
            duration: sanitize_duration(duration),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.state.speed
    }

    /// `current_time / duration`, 0 for an empty timeline.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            0.0
        } else {
            (self.state.current_time / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Replaces the timeline length and rewinds; used when a new recording arrives.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = sanitize_duration(duration);
        self.reset();
    }

    pub fn play(&mut self) {
        if self.duration <= 0.0 {
            return;
        }
        // No auto-loop: resuming from the end starts over.
        if self.state.current_time >= self.duration {
            self.state.current_time = 0.0;
        }
        self.state.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
    }

    pub fn stop(&mut self) {
        self.state.is_playing = false;
        self.state.current_time = 0.0;
    }

    /// Mode switches start their own timeline; keeps the chosen speed.
    pub fn reset(&mut self) {
        self.stop();
    }

    pub fn seek(&mut self, t: f64) {
        self.state.current_time = if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, self.duration)
        };
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.state.speed = speed;
    }

    /// Advances simulated time. Returns the simulated seconds actually advanced.
    pub fn tick(&mut self, real_elapsed_secs: f64) -> f64 {
        if !self.state.is_playing || !real_elapsed_secs.is_finite() || real_elapsed_secs <= 0.0 {
            return 0.0;
        }
        let before = self.state.current_time;
        let next = before + real_elapsed_secs * self.state.speed.multiplier();
        if next >= self.duration {
            self.state.current_time = self.duration;
            self.state.is_playing = false;
        } else {
            self.state.current_time = next;
        }
        self.state.current_time - before
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn ticking_never_overshoots_duration() {
        let mut rng = StdRng::seed_from_u64(7);
        for speed in PlaybackSpeed::ALL {
            let mut clock = PlaybackClock::new(3.0);
            clock.set_speed(speed);
            clock.play();
            for _ in 0..1_000 {
                clock.tick(rng.gen_range(0.0..0.2));
                assert!(clock.current_time() <= clock.duration());
            }
            assert_eq!(clock.current_time(), 3.0);
            assert!(!clock.is_playing());
        }
    }

    #[test]
    fn tick_scales_by_speed() {
        let mut clock = PlaybackClock::new(10.0);
        clock.set_speed(PlaybackSpeed::Quadruple);
        clock.play();
        let advanced = clock.tick(0.5);
        assert!((advanced - 2.0).abs() < 1e-12);
        assert!((clock.current_time() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn paused_clock_does_not_move() {
        let mut clock = PlaybackClock::new(10.0);
        assert_eq!(clock.tick(1.0), 0.0);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn play_from_end_restarts() {
        let mut clock = PlaybackClock::new(1.0);
        clock.play();
        clock.tick(5.0);
        assert!(!clock.is_playing());
        clock.play();
        assert!(clock.is_playing());
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn seek_is_clamped() {
        let mut clock = PlaybackClock::new(4.0);
        clock.seek(-3.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(99.0);
        assert_eq!(clock.current_time(), 4.0);
        clock.seek(f64::NAN);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(1.5);
        assert_eq!(clock.current_time(), 1.5);
    }

    #[test]
    fn stop_rewinds_and_reset_keeps_speed() {
        let mut clock = PlaybackClock::new(4.0);
        clock.set_speed(PlaybackSpeed::Half);
        clock.play();
        clock.tick(2.0);
        clock.stop();
        assert!(!clock.is_playing());
        assert_eq!(clock.current_time(), 0.0);
        clock.play();
        clock.tick(1.0);
        clock.reset();
        assert_eq!(clock.current_time(), 0.0);
        assert_eq!(clock.speed(), PlaybackSpeed::Half);
    }

    #[test]
    fn empty_timeline_never_plays() {
        let mut clock = PlaybackClock::new(0.0);
        clock.play();
        assert!(!clock.is_playing());
        assert_eq!(clock.progress(), 0.0);
    }
}
