use std::fmt;

use serde::{Deserialize, Serialize};

pub const MIN_LEVEL: u8 = 0;
pub const MAX_LEVEL: u8 = 100;
const DEFAULT_LEVEL: u8 = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("lock-in level {0} is outside 0..=100")]
    OutOfRange(i64),
}

/// Lock-in level, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct LockinLevel(u8);

impl LockinLevel {
    pub fn new(value: u8) -> Result<Self, LevelError> {
        Self::try_from(i64::from(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn tone(self) -> Tone {
        match self.0 {
            0..=29 => Tone::Red,
            30..=69 => Tone::Orange,
            _ => Tone::Green,
        }
    }

    pub fn status_label(self) -> &'static str {
        match self.0 {
            0..=19 => "😴 Barely awake",
            20..=39 => "🎮 Warming up",
            40..=59 => "💪 Getting focused",
            60..=79 => "🔥 In the zone",
            80..=94 => "⚡ Ultra locked in",
            _ => "🏆 MAXIMUM LOCK-IN",
        }
    }

    pub fn notification_text(self) -> &'static str {
        match self.0 {
            0..=19 => "❌ Yeah, we're not rising.",
            91..=MAX_LEVEL => "✅ Get me in there! We're locked in!",
            _ => "❌ You better lock tf in... I'm already tilted.",
        }
    }
}

impl Default for LockinLevel {
    fn default() -> Self {
        Self(DEFAULT_LEVEL)
    }
}

impl TryFrom<i64> for LockinLevel {
    type Error = LevelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_LEVEL)..=i64::from(MAX_LEVEL)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(LevelError::OutOfRange(value))
        }
    }
}

impl From<LockinLevel> for u8 {
    fn from(level: LockinLevel) -> Self {
        level.0
    }
}

impl fmt::Display for LockinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LockinLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s.trim().parse()?;
        Ok(Self::try_from(raw)?)
    }
}

/// Meter color band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Red,
    Orange,
    Green,
}

impl Tone {
    /// Embed color as the integer the webhook expects.
    pub fn color(self) -> u32 {
        match self {
            Tone::Red => 0xFF0000,
            Tone::Orange => 0xFFA500,
            Tone::Green => 0x51F856,
        }
    }
}

/// Inclusive level ranges where the label, tone or text changes.
pub fn bands() -> Vec<(LockinLevel, LockinLevel)> {
    const CUTS: [u8; 9] = [0, 20, 30, 40, 60, 70, 80, 91, 95];
    CUTS.iter()
        .enumerate()
        .map(|(i, start)| {
            let end = CUTS.get(i + 1).map(|next| next - 1).unwrap_or(MAX_LEVEL);
            (LockinLevel(*start), LockinLevel(end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lvl(v: u8) -> LockinLevel {
        LockinLevel::new(v).unwrap()
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(LockinLevel::try_from(-1i64), Err(LevelError::OutOfRange(-1)));
        assert_eq!(LockinLevel::try_from(101i64), Err(LevelError::OutOfRange(101)));
        assert!(LockinLevel::new(101).is_err());
        assert!("abc".parse::<LockinLevel>().is_err());
        assert_eq!(" 42 ".parse::<LockinLevel>().unwrap(), lvl(42));
    }

    #[test]
    fn status_label_cut_points() {
        let cases = [
            (0, "😴 Barely awake"),
            (19, "😴 Barely awake"),
            (20, "🎮 Warming up"),
            (39, "🎮 Warming up"),
            (40, "💪 Getting focused"),
            (59, "💪 Getting focused"),
            (60, "🔥 In the zone"),
            (79, "🔥 In the zone"),
            (80, "⚡ Ultra locked in"),
            (94, "⚡ Ultra locked in"),
            (95, "🏆 MAXIMUM LOCK-IN"),
            (100, "🏆 MAXIMUM LOCK-IN"),
        ];
        for (level, expected) in cases {
            assert_eq!(lvl(level).status_label(), expected, "level {level}");
        }
    }

    #[test]
    fn notification_text_cut_points() {
        assert_eq!(lvl(19).notification_text(), "❌ Yeah, we're not rising.");
        assert_eq!(
            lvl(20).notification_text(),
            "❌ You better lock tf in... I'm already tilted."
        );
        assert_eq!(
            lvl(90).notification_text(),
            "❌ You better lock tf in... I'm already tilted."
        );
        assert_eq!(lvl(91).notification_text(), "✅ Get me in there! We're locked in!");
    }

    #[test]
    fn mappings_are_total() {
        const LABELS: [&str; 6] = [
            "😴 Barely awake",
            "🎮 Warming up",
            "💪 Getting focused",
            "🔥 In the zone",
            "⚡ Ultra locked in",
            "🏆 MAXIMUM LOCK-IN",
        ];
        for v in MIN_LEVEL..=MAX_LEVEL {
            let level = lvl(v);
            assert!(LABELS.contains(&level.status_label()));
            assert_eq!(level.status_label(), level.status_label());
            assert!(!level.notification_text().is_empty());
        }
    }

    #[test]
    fn tone_colors() {
        assert_eq!(lvl(29).tone(), Tone::Red);
        assert_eq!(lvl(30).tone(), Tone::Orange);
        assert_eq!(lvl(69).tone(), Tone::Orange);
        assert_eq!(lvl(70).tone(), Tone::Green);
        assert_eq!(Tone::Red.color(), 16711680);
        assert_eq!(Tone::Orange.color(), 16753920);
        assert_eq!(Tone::Green.color(), 5371990);
    }

    #[test]
    fn bands_cover_the_whole_range() {
        let bands = bands();
        assert_eq!(bands.first().unwrap().0, lvl(0));
        assert_eq!(bands.last().unwrap().1, lvl(100));
        for pair in bands.windows(2) {
            assert_eq!(pair[0].1.value() + 1, pair[1].0.value());
        }
        for (start, end) in &bands {
            assert_eq!(start.status_label(), end.status_label());
            assert_eq!(start.tone(), end.tone());
            assert_eq!(start.notification_text(), end.notification_text());
        }
    }
}
