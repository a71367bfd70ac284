use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptionError {
    #[error("invalid option label: {0:?}")]
    InvalidLabel(String),

    #[error("option index out of range: {0}")]
    IndexOutOfRange(usize),

    #[error("missing text for option {0}")]
    MissingOption(OptionLabel),
}

//
// ─── OPTION LABEL ─────────────────────────────────────────────────────────────
//

/// One of the four answer slots shown for every question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [OptionLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Zero-based slot position (A = 0).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// # Errors
    ///
    /// Returns `OptionError::IndexOutOfRange` for indices above 3.
    pub fn from_index(index: usize) -> Result<Self, OptionError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(OptionError::IndexOutOfRange(index))
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(OptionError::InvalidLabel(s.to_string())),
        }
    }
}

//
// ─── OPTION SET ───────────────────────────────────────────────────────────────
//

/// The four option texts of a question, addressed by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    texts: [String; 4],
}

impl OptionSet {
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>, d: impl Into<String>) -> Self {
        Self {
            texts: [a.into(), b.into(), c.into(), d.into()],
        }
    }

    /// Build from `(label, text)` pairs in any order.
    ///
    /// # Errors
    ///
    /// Returns `OptionError::MissingOption` if any of the four labels is absent.
    pub fn from_labeled<I, S>(pairs: I) -> Result<Self, OptionError>
    where
        I: IntoIterator<Item = (OptionLabel, S)>,
        S: Into<String>,
    {
        let mut slots: [Option<String>; 4] = Default::default();
        for (label, text) in pairs {
            slots[label.index()] = Some(text.into());
        }

        let [a, b, c, d] = slots;
        Ok(Self::new(
            a.ok_or(OptionError::MissingOption(OptionLabel::A))?,
            b.ok_or(OptionError::MissingOption(OptionLabel::B))?,
            c.ok_or(OptionError::MissingOption(OptionLabel::C))?,
            d.ok_or(OptionError::MissingOption(OptionLabel::D))?,
        ))
    }

    #[must_use]
    pub fn get(&self, label: OptionLabel) -> &str {
        &self.texts[label.index()]
    }

    /// Iterate `(label, text)` in A..D order.
    pub fn iter(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        OptionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.get(label)))
    }

    /// Label whose text equals `text`, if any.
    #[must_use]
    pub fn label_of(&self, text: &str) -> Option<OptionLabel> {
        self.iter()
            .find(|(_, candidate)| *candidate == text)
            .map(|(label, _)| label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parsing_is_lenient_about_case_and_space() {
        assert_eq!(" b ".parse::<OptionLabel>().unwrap(), OptionLabel::B);
        assert_eq!("d".parse::<OptionLabel>().unwrap(), OptionLabel::D);
        assert!("E".parse::<OptionLabel>().is_err());
        assert!("".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn label_index_roundtrip() {
        for label in OptionLabel::ALL {
            assert_eq!(OptionLabel::from_index(label.index()).unwrap(), label);
        }
        assert_eq!(
            OptionLabel::from_index(4),
            Err(OptionError::IndexOutOfRange(4))
        );
    }

    #[test]
    fn from_labeled_accepts_any_order() {
        let set = OptionSet::from_labeled([
            (OptionLabel::C, "three"),
            (OptionLabel::A, "one"),
            (OptionLabel::D, "four"),
            (OptionLabel::B, "two"),
        ])
        .unwrap();
        let texts: Vec<_> = set.iter().map(|(_, text)| text).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
        assert_eq!(set.label_of("three"), Some(OptionLabel::C));
    }

    #[test]
    fn from_labeled_rejects_missing_slot() {
        let err = OptionSet::from_labeled([
            (OptionLabel::A, "one"),
            (OptionLabel::B, "two"),
            (OptionLabel::D, "four"),
        ])
        .unwrap_err();
        assert_eq!(err, OptionError::MissingOption(OptionLabel::C));
    }

    #[test]
    fn label_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&OptionLabel::A).unwrap(), "\"A\"");
        let parsed: OptionLabel = serde_json::from_str("\"C\"").unwrap();
        assert_eq!(parsed, OptionLabel::C);
    }
}
