//! Playback state machine over the audio clock.
//!
//! One continuous play run is bounded by a start offset (seconds into the
//! track) and the audio-clock time it began; elapsed position is derived
//! from those two numbers, never from wall time.

/// Tagged playback state. At most one live run exists at a time, and a
/// "playing" state cannot exist without its session bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transport {
    /// No track loaded
    Empty,
    /// Track loaded, not running; `offset_s` is where the next run starts
    Paused { offset_s: f64 },
    /// Live run: began at `start_offset_s` when the clock read `start_clock_s`
    Playing {
        start_offset_s: f64,
        start_clock_s: f64,
    },
}

impl Transport {
    pub fn new() -> Self {
        Transport::Empty
    }

    /// A track was installed: rewind to the start, paused.
    /// Valid from every state (loading replaces any live run).
    pub fn load(&mut self) {
        *self = Transport::Paused { offset_s: 0.0 };
    }

    /// Begin a run at the stored offset. Returns the offset to start the
    /// source at, or `None` when there is nothing to do (`Empty`, or
    /// already playing).
    pub fn play(&mut self, now_clock_s: f64) -> Option<f64> {
        match *self {
            Transport::Paused { offset_s } => {
                *self = Transport::Playing {
                    start_offset_s: offset_s,
                    start_clock_s: now_clock_s,
                };
                Some(offset_s)
            }
            Transport::Empty | Transport::Playing { .. } => None,
        }
    }

    /// End the live run, keeping the elapsed position as the next start
    /// offset. Returns the recorded offset, or `None` when not playing.
    pub fn pause(&mut self, now_clock_s: f64) -> Option<f64> {
        match *self {
            Transport::Playing {
                start_offset_s,
                start_clock_s,
            } => {
                let offset_s = start_offset_s + (now_clock_s - start_clock_s);
                *self = Transport::Paused { offset_s };
                Some(offset_s)
            }
            Transport::Empty | Transport::Paused { .. } => None,
        }
    }

    /// The track ran off its end: rewind so the next play replays from the
    /// start. No-op unless playing.
    pub fn finish(&mut self) {
        if let Transport::Playing { .. } = *self {
            *self = Transport::Paused { offset_s: 0.0 };
        }
    }

    /// Current position within the track (seconds)
    pub fn position_s(&self, now_clock_s: f64) -> f64 {
        match *self {
            Transport::Empty => 0.0,
            Transport::Paused { offset_s } => offset_s,
            Transport::Playing {
                start_offset_s,
                start_clock_s,
            } => start_offset_s + (now_clock_s - start_clock_s),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Transport::Playing { .. })
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rewinds_to_paused_zero() {
        let mut t = Transport::new();
        t.load();
        assert_eq!(t, Transport::Paused { offset_s: 0.0 });

        // Loading over a live run also rewinds
        t.play(10.0);
        t.load();
        assert_eq!(t, Transport::Paused { offset_s: 0.0 });
    }

    #[test]
    fn test_play_from_empty_is_noop() {
        let mut t = Transport::new();
        assert_eq!(t.play(5.0), None);
        assert_eq!(t, Transport::Empty);
    }

    #[test]
    fn test_pause_when_not_playing_is_noop() {
        let mut t = Transport::new();
        assert_eq!(t.pause(1.0), None);
        t.load();
        assert_eq!(t.pause(2.0), None);
        assert_eq!(t, Transport::Paused { offset_s: 0.0 });
    }

    #[test]
    fn test_play_while_playing_is_noop() {
        let mut t = Transport::new();
        t.load();
        t.play(1.0);
        let before = t;
        assert_eq!(t.play(7.0), None);
        assert_eq!(t, before);
    }

    #[test]
    fn test_pause_records_elapsed_and_play_resumes_there() {
        let mut t = Transport::new();
        t.load();

        assert_eq!(t.play(100.0), Some(0.0));
        assert_eq!(t.pause(103.5), Some(3.5));

        // Clock keeps running while paused; resume starts where we left off
        assert_eq!(t.play(110.0), Some(3.5));
        assert_eq!(t.pause(112.0), Some(5.5));
    }

    #[test]
    fn test_position_tracks_clock_only_while_playing() {
        let mut t = Transport::new();
        assert_eq!(t.position_s(42.0), 0.0);

        t.load();
        t.play(10.0);
        assert_eq!(t.position_s(14.0), 4.0);

        t.pause(14.0);
        assert_eq!(t.position_s(99.0), 4.0);
    }

    #[test]
    fn test_finish_rewinds_to_start() {
        let mut t = Transport::new();
        t.load();
        t.play(0.0);
        t.finish();
        assert_eq!(t, Transport::Paused { offset_s: 0.0 });

        // Replay after natural completion starts from zero
        assert_eq!(t.play(200.0), Some(0.0));
    }
}
