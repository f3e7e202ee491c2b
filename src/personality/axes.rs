//! Personality axes, letters, codes and questionnaire answers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the four personality dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    Ei,
    Sn,
    Tf,
    Jp,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Ei, Axis::Sn, Axis::Tf, Axis::Jp];

    /// The two letters of this axis, tie-break default first.
    pub fn letters(self) -> (Letter, Letter) {
        match self {
            Self::Ei => (Letter::E, Letter::I),
            Self::Sn => (Letter::S, Letter::N),
            Self::Tf => (Letter::T, Letter::F),
            Self::Jp => (Letter::J, Letter::P),
        }
    }

    /// Lower-case field name used in JSON and storage (`"ei"`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Self::Ei => "ei",
            Self::Sn => "sn",
            Self::Tf => "tf",
            Self::Jp => "jp",
        }
    }

    /// Parse a letter that must belong to this axis.
    pub fn parse_letter(self, raw: &str) -> Option<Letter> {
        let letter: Letter = raw.parse().ok()?;
        (letter.axis() == self).then_some(letter)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A resolved axis letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    E,
    I,
    S,
    N,
    T,
    F,
    J,
    P,
}

impl Letter {
    pub fn axis(self) -> Axis {
        match self {
            Self::E | Self::I => Axis::Ei,
            Self::S | Self::N => Axis::Sn,
            Self::T | Self::F => Axis::Tf,
            Self::J | Self::P => Axis::Jp,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::E => 'E',
            Self::I => 'I',
            Self::S => 'S',
            Self::N => 'N',
            Self::T => 'T',
            Self::F => 'F',
            Self::J => 'J',
            Self::P => 'P',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'E' => Some(Self::E),
            'I' => Some(Self::I),
            'S' => Some(Self::S),
            'N' => Some(Self::N),
            'T' => Some(Self::T),
            'F' => Some(Self::F),
            'J' => Some(Self::J),
            'P' => Some(Self::P),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Letter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        };
        letter.ok_or_else(|| Error::Validation(format!("not a personality letter: {s:?}")))
    }
}

/// A four-letter personality code, one letter per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersonalityCode {
    ei: Letter,
    sn: Letter,
    tf: Letter,
    jp: Letter,
}

impl PersonalityCode {
    /// Build a code from four letters, each of which must sit on its own axis.
    pub fn new(ei: Letter, sn: Letter, tf: Letter, jp: Letter) -> Result<Self, Error> {
        for (axis, letter) in Axis::ALL.into_iter().zip([ei, sn, tf, jp]) {
            if letter.axis() != axis {
                return Err(Error::Validation(format!(
                    "letter {letter} does not belong to axis {axis}"
                )));
            }
        }
        Ok(Self { ei, sn, tf, jp })
    }

    pub fn get(&self, axis: Axis) -> Letter {
        match axis {
            Axis::Ei => self.ei,
            Axis::Sn => self.sn,
            Axis::Tf => self.tf,
            Axis::Jp => self.jp,
        }
    }

    /// Copy of this code with one axis replaced. `letter` must belong to `axis`.
    pub fn with(mut self, axis: Axis, letter: Letter) -> Self {
        debug_assert_eq!(letter.axis(), axis);
        match axis {
            Axis::Ei => self.ei = letter,
            Axis::Sn => self.sn = letter,
            Axis::Tf => self.tf = letter,
            Axis::Jp => self.jp = letter,
        }
        self
    }

    pub fn letters(&self) -> [Letter; 4] {
        [self.ei, self.sn, self.tf, self.jp]
    }
}

impl fmt::Display for PersonalityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for letter in self.letters() {
            write!(f, "{letter}")?;
        }
        Ok(())
    }
}

impl FromStr for PersonalityCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let letters: Vec<Letter> = s
            .trim()
            .chars()
            .map(|c| {
                Letter::from_char(c)
                    .ok_or_else(|| Error::Validation(format!("invalid personality code: {s:?}")))
            })
            .collect::<Result<_, _>>()?;
        match letters.as_slice() {
            [ei, sn, tf, jp] => Self::new(*ei, *sn, *tf, *jp),
            _ => Err(Error::Validation(format!(
                "personality code must have 4 letters: {s:?}"
            ))),
        }
    }
}

impl Serialize for PersonalityCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PersonalityCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One forced-choice questionnaire answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Answer {
    A,
    B,
}

impl FromStr for Answer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            other => Err(Error::Validation(format!(
                "answer must be A or B, got {other:?}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips_through_display() {
        let code: PersonalityCode = "entj".parse().unwrap();
        assert_eq!(code.to_string(), "ENTJ");
        assert_eq!(code.get(Axis::Sn), Letter::N);
    }

    #[test]
    fn code_rejects_letters_on_wrong_axis() {
        assert!("NETJ".parse::<PersonalityCode>().is_err());
        assert!("ENT".parse::<PersonalityCode>().is_err());
        assert!("ENTJX".parse::<PersonalityCode>().is_err());
    }

    #[test]
    fn with_replaces_single_axis() {
        let code: PersonalityCode = "ESTJ".parse().unwrap();
        let changed = code.with(Axis::Tf, Letter::F);
        assert_eq!(changed.to_string(), "ESFJ");
        assert_eq!(code.to_string(), "ESTJ");
    }

    #[test]
    fn axis_parse_letter_checks_membership() {
        assert_eq!(Axis::Ei.parse_letter("i"), Some(Letter::I));
        assert_eq!(Axis::Ei.parse_letter("S"), None);
        assert_eq!(Axis::Jp.parse_letter("PP"), None);
    }

    #[test]
    fn answer_parse_is_case_insensitive() {
        let answers: Vec<Answer> = serde_json::from_str(r#"["a", "B", " b "]"#).unwrap();
        assert_eq!(answers, vec![Answer::A, Answer::B, Answer::B]);
        assert!(serde_json::from_str::<Answer>(r#""C""#).is_err());
    }

    #[test]
    fn code_serializes_as_string() {
        let code: PersonalityCode = "INFP".parse().unwrap();
        assert_eq!(serde_json::to_value(code).unwrap(), "INFP");
    }
}
