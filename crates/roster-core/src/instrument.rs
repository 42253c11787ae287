//! The instruments a musician can play, and the sound each one makes.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Piano,
    Trumpet,
    Flute,
    Violin,
    Drum,
}

impl Instrument {
    pub const ALL: [Instrument; 5] = [
        Instrument::Piano,
        Instrument::Trumpet,
        Instrument::Flute,
        Instrument::Violin,
        Instrument::Drum,
    ];

    /// Name used on the command line and in the `instrument` wire field.
    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Piano => "piano",
            Instrument::Trumpet => "trumpet",
            Instrument::Flute => "flute",
            Instrument::Violin => "violin",
            Instrument::Drum => "drum",
        }
    }

    /// Sound carried in the `sound` wire field.
    pub fn sound(self) -> &'static str {
        match self {
            Instrument::Piano => "ti-ta-ti",
            Instrument::Trumpet => "pouet",
            Instrument::Flute => "trulu",
            Instrument::Violin => "gzi-gzi",
            Instrument::Drum => "boum-boum",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownInstrument(s.to_string()))
    }
}
