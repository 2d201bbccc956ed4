use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicStyle {
    #[default]
    Classic,
    House,
    Techno,
    Breakbeat,
}

impl MusicStyle {
    pub const ALL: [MusicStyle; 4] = [
        MusicStyle::Classic,
        MusicStyle::House,
        MusicStyle::Techno,
        MusicStyle::Breakbeat,
    ];

    pub const fn bpm(self) -> f64 {
        match self {
            MusicStyle::Classic => 100.0,
            MusicStyle::House => 124.0,
            MusicStyle::Techno => 132.0,
            MusicStyle::Breakbeat => 160.0,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&MusicStyle::Classic)
    }

    const fn name(self) -> &'static str {
        match self {
            MusicStyle::Classic => "classic",
            MusicStyle::House => "house",
            MusicStyle::Techno => "techno",
            MusicStyle::Breakbeat => "breakbeat",
        }
    }
}

impl fmt::Display for MusicStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MusicStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Style value is empty".to_string());
        }
        MusicStyle::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                format!(
                    "Style '{}' must be one of classic, house, techno, breakbeat",
                    trimmed
                )
            })
    }
}

/// Drum voice the audio layer should sound on a scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatCue {
    Kick,
    Snare,
    /// Quiet kick on beats 2 and 4 of the bar.
    Ghost,
    /// Off-beat subdivision.
    Hat,
}

/// Kick on 1 and 3, snare on 2 and 4 counting quarter notes from the
/// transport start; every tick between quarter notes is a hat.
pub fn beat_cue(tick: u64, ticks_per_beat: u32) -> BeatCue {
    let per_beat = u64::from(ticks_per_beat.max(1));
    if tick % per_beat != 0 {
        return BeatCue::Hat;
    }
    match (tick / per_beat) % 4 {
        0 => BeatCue::Kick,
        2 => BeatCue::Snare,
        _ => BeatCue::Ghost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn cue_pattern_on_eighth_note_ticks() {
        let cues: Vec<BeatCue> = (0..8).map(|t| beat_cue(t, 2)).collect();
        assert_eq!(
            cues,
            vec![
                BeatCue::Kick,
                BeatCue::Hat,
                BeatCue::Ghost,
                BeatCue::Hat,
                BeatCue::Snare,
                BeatCue::Hat,
                BeatCue::Ghost,
                BeatCue::Hat,
            ]
        );
        assert_eq!(beat_cue(16, 2), BeatCue::Kick);
    }

    #[test]
    fn cue_pattern_on_quarter_note_ticks() {
        let cues: Vec<BeatCue> = (0..4).map(|t| beat_cue(t, 1)).collect();
        assert_eq!(cues, vec![BeatCue::Kick, BeatCue::Ghost, BeatCue::Snare, BeatCue::Ghost]);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("TECHNO".parse::<MusicStyle>(), Ok(MusicStyle::Techno));
        assert_eq!(" house ".parse::<MusicStyle>(), Ok(MusicStyle::House));
        assert!("polka".parse::<MusicStyle>().is_err());
        assert!("".parse::<MusicStyle>().is_err());
    }

    #[test]
    fn random_style_is_deterministic_for_a_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let left: Vec<_> = (0..16).map(|_| MusicStyle::random(&mut a)).collect();
        let right: Vec<_> = (0..16).map(|_| MusicStyle::random(&mut b)).collect();
        assert_eq!(left, right);
    }
}
