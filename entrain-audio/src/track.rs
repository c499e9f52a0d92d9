//! Track catalog - named frequency pairs for binaural playback

/// One binaural track: a distinct pure tone per ear.
///
/// The perceived beat is the difference between the two frequencies, so a
/// 210/220 Hz pair pulses at 10 Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub name: &'static str,
    pub left_hz: f32,
    pub right_hz: f32,
}

impl Track {
    /// Check the preconditions the engine relies on; names the failing
    /// field so callers can report something useful.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("track name is empty");
        }
        if !is_frequency(self.left_hz) {
            return Err("left frequency must be a finite positive number");
        }
        if !is_frequency(self.right_hz) {
            return Err("right frequency must be a finite positive number");
        }
        Ok(())
    }

    /// Beat frequency perceived when the pair plays one tone per ear.
    pub fn beat_hz(&self) -> f32 {
        (self.right_hz - self.left_hz).abs()
    }
}

fn is_frequency(hz: f32) -> bool {
    hz.is_finite() && hz > 0.0
}

/// Built-in catalog. Ordered, fixed at compile time, names unique.
pub const TRACKS: &[Track] = &[
    Track { name: "Alpha Waves", left_hz: 210.0, right_hz: 220.0 },
    Track { name: "Beta Waves", left_hz: 210.0, right_hz: 240.0 },
    Track { name: "Gamma Waves", left_hz: 210.0, right_hz: 260.0 },
];

/// First catalog entry named `name`, if any.
///
/// A miss is a normal, user-visible condition; callers reject the request
/// rather than treating it as a fault.
pub fn find_track(name: &str) -> Option<&'static Track> {
    TRACKS.iter().find(|track| track.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let track = find_track("Beta Waves").expect("catalog track");
        assert_eq!(track.left_hz, 210.0);
        assert_eq!(track.right_hz, 240.0);
    }

    #[test]
    fn test_catalog_lookup_miss() {
        assert!(find_track("Delta Waves").is_none());
        assert!(find_track("").is_none());
    }

    #[test]
    fn test_catalog_names_unique_and_valid() {
        for (i, track) in TRACKS.iter().enumerate() {
            assert!(track.validate().is_ok(), "catalog entry {i} invalid");
            assert!(
                TRACKS.iter().skip(i + 1).all(|other| other.name != track.name),
                "duplicate catalog name {}",
                track.name
            );
        }
    }

    #[test]
    fn test_validate_rejects_bad_tracks() {
        let base = Track { name: "Test", left_hz: 210.0, right_hz: 220.0 };

        assert!(Track { name: "", ..base }.validate().is_err());
        assert!(Track { name: "   ", ..base }.validate().is_err());
        assert!(Track { left_hz: 0.0, ..base }.validate().is_err());
        assert!(Track { left_hz: -40.0, ..base }.validate().is_err());
        assert!(Track { right_hz: f32::NAN, ..base }.validate().is_err());
        assert!(Track { right_hz: f32::INFINITY, ..base }.validate().is_err());
        assert!(base.validate().is_ok());
    }

    #[test]
    fn test_beat_frequency() {
        let track = Track { name: "Test", left_hz: 210.0, right_hz: 220.0 };
        assert_eq!(track.beat_hz(), 10.0);

        // Direction of the pair does not matter.
        let flipped = Track { name: "Test", left_hz: 220.0, right_hz: 210.0 };
        assert_eq!(flipped.beat_hz(), 10.0);
    }
}
