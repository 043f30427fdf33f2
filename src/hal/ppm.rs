//! PPM sum-signal decoder
//!
//! A PPM receiver multiplexes all channels on one wire: each channel is the
//! interval between two consecutive rising edges, and frames are separated
//! by a long sync gap. The decoder is fed edge timestamps from the capture
//! interrupt and publishes complete frames. A frame older than
//! [`FRAME_STALE_US`] is no longer served as a current sample.

use crate::types::{PulseWidth, RcChannel, RC_INPUT_CHANNELS};

/// Intervals at least this long (us) mark a frame boundary
pub const SYNC_MIN_US: u32 = 2700;

/// Shortest accepted channel interval (us)
pub const PULSE_MIN_US: u32 = 700;

/// Longest accepted channel interval (us)
pub const PULSE_MAX_US: u32 = 2300;

/// Frames with fewer channels are dropped as noise
pub const MIN_FRAME_CHANNELS: u8 = 4;

/// Age (us) after which the last frame no longer counts as current
///
/// About four frame periods of a standard 22.5 ms PPM stream.
pub const FRAME_STALE_US: u32 = 100_000;

const CHANNELS: usize = RC_INPUT_CHANNELS as usize;

/// One decoded PPM frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PpmFrame {
    channels: [u16; CHANNELS],
    count: u8,
}

impl PpmFrame {
    /// Number of channels carried
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.count
    }

    /// Pulse width of a channel, None if the frame did not carry it
    #[must_use]
    pub fn get(&self, channel: RcChannel) -> Option<PulseWidth> {
        (channel.number() <= self.count)
            .then(|| PulseWidth::from_us(self.channels[channel.index()]))
    }
}

/// Edge-timestamp to frame decoder
#[derive(Clone, Debug, Default)]
pub struct PpmDecoder {
    last_edge_us: Option<u32>,
    partial: PpmFrame,
    synced: bool,
    latest: Option<PpmFrame>,
    latest_at_us: u32,
    fresh: bool,
}

impl PpmDecoder {
    /// Create a decoder waiting for its first sync gap
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_edge_us: None,
            partial: PpmFrame {
                channels: [0; CHANNELS],
                count: 0,
            },
            synced: false,
            latest: None,
            latest_at_us: 0,
            fresh: false,
        }
    }

    /// Feed a rising-edge timestamp (free-running microsecond counter)
    ///
    /// Returns true when this edge completed a frame.
    pub fn on_edge(&mut self, now_us: u32) -> bool {
        let Some(last) = self.last_edge_us.replace(now_us) else {
            return false;
        };
        let interval = now_us.wrapping_sub(last);

        if interval >= SYNC_MIN_US {
            let completed = self.synced && self.partial.count >= MIN_FRAME_CHANNELS;
            if completed {
                self.latest = Some(self.partial);
                self.latest_at_us = now_us;
                self.fresh = true;
            }
            self.partial = PpmFrame::default();
            self.synced = true;
            return completed;
        }

        if !self.synced {
            return false;
        }

        if (PULSE_MIN_US..=PULSE_MAX_US).contains(&interval) {
            let slot = usize::from(self.partial.count);
            if slot < CHANNELS {
                // interval <= PULSE_MAX_US, fits in u16
                self.partial.channels[slot] = interval as u16;
                self.partial.count += 1;
            }
        } else {
            // Glitch: drop the frame and wait for the next sync gap
            self.partial = PpmFrame::default();
            self.synced = false;
        }
        false
    }

    /// Most recent complete frame
    #[must_use]
    pub const fn latest(&self) -> Option<PpmFrame> {
        self.latest
    }

    /// The latest frame, unless the receiver has been silent past
    /// [`FRAME_STALE_US`]
    #[must_use]
    pub fn current(&self, now_us: u32) -> Option<PpmFrame> {
        self.latest
            .filter(|_| now_us.wrapping_sub(self.latest_at_us) <= FRAME_STALE_US)
    }

    /// Whether a frame completed since the last call (clears the flag)
    pub fn take_fresh(&mut self) -> bool {
        core::mem::replace(&mut self.fresh, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(decoder: &mut PpmDecoder, start: u32, intervals: &[u32]) -> u32 {
        let mut t = start;
        decoder.on_edge(t);
        for interval in intervals {
            t = t.wrapping_add(*interval);
            decoder.on_edge(t);
        }
        t
    }

    #[test]
    fn decodes_frame_between_syncs() {
        let mut decoder = PpmDecoder::new();
        feed(
            &mut decoder,
            0,
            &[5000, 1100, 1200, 1300, 1400, 1500, 1600, 6000],
        );

        let frame = decoder.latest().expect("frame");
        assert_eq!(frame.count(), 6);
        let ch3 = RcChannel::new(3).expect("channel");
        assert_eq!(frame.get(ch3), Some(PulseWidth::from_us(1300)));
        let ch7 = RcChannel::new(7).expect("channel");
        assert_eq!(frame.get(ch7), None);
        assert!(decoder.take_fresh());
        assert!(!decoder.take_fresh());
    }

    #[test]
    fn ignores_pulses_before_first_sync() {
        let mut decoder = PpmDecoder::new();
        feed(&mut decoder, 0, &[1500, 1500, 1500, 1500, 1500, 4000]);
        assert!(decoder.latest().is_none());
    }

    #[test]
    fn glitch_discards_partial_frame() {
        let mut decoder = PpmDecoder::new();
        feed(&mut decoder, 0, &[4000, 1500, 1500, 300, 1500, 1500, 4000]);
        assert!(decoder.latest().is_none());
    }

    #[test]
    fn short_frames_are_dropped() {
        let mut decoder = PpmDecoder::new();
        feed(&mut decoder, 0, &[4000, 1500, 1500, 1500, 4000]);
        assert!(decoder.latest().is_none());
    }

    #[test]
    fn frame_goes_stale_after_silence() {
        let mut decoder = PpmDecoder::new();
        let end = feed(&mut decoder, 0, &[5000, 1900, 1900, 1500, 1500, 5000]);

        assert!(decoder.current(end + FRAME_STALE_US).is_some());
        assert!(decoder.current(end + FRAME_STALE_US + 1).is_none());
        assert!(decoder.latest().is_some());
    }

    #[test]
    fn survives_timer_wrap() {
        let mut decoder = PpmDecoder::new();
        feed(
            &mut decoder,
            u32::MAX - 3000,
            &[4000, 1000, 1100, 1200, 1300, 4000],
        );
        let frame = decoder.latest().expect("frame");
        assert_eq!(frame.count(), 4);
    }
}
