//! Fixed note color palette.
//!
//! Colors travel over the wire as CSS hex strings. Reads keep whatever string
//! the store holds; writes go through [`NoteColor`] so only palette values are
//! ever sent.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One entry of the note color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoteColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    DarkBlue,
    Purple,
    Pink,
    Brown,
    Gray,
}

impl NoteColor {
    /// Every palette entry, in display order.
    pub const ALL: [NoteColor; 12] = [
        NoteColor::Default,
        NoteColor::Red,
        NoteColor::Orange,
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Teal,
        NoteColor::Blue,
        NoteColor::DarkBlue,
        NoteColor::Purple,
        NoteColor::Pink,
        NoteColor::Brown,
        NoteColor::Gray,
    ];

    /// Hex value stored in the `color` column.
    pub fn value(self) -> &'static str {
        match self {
            Self::Default => "#ffffff",
            Self::Red => "#f28b82",
            Self::Orange => "#fbbc04",
            Self::Yellow => "#fff475",
            Self::Green => "#ccff90",
            Self::Teal => "#a7ffeb",
            Self::Blue => "#cbf0f8",
            Self::DarkBlue => "#aecbfa",
            Self::Purple => "#d7aefb",
            Self::Pink => "#fdcfe8",
            Self::Brown => "#e6c9a8",
            Self::Gray => "#e8eaed",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Red => "Red",
            Self::Orange => "Orange",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Teal => "Teal",
            Self::Blue => "Blue",
            Self::DarkBlue => "Dark blue",
            Self::Purple => "Purple",
            Self::Pink => "Pink",
            Self::Brown => "Brown",
            Self::Gray => "Gray",
        }
    }

    /// Look up a palette entry by its hex value (case-insensitive).
    pub fn from_value(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.value().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for NoteColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value())
    }
}

impl std::str::FromStr for NoteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(s).ok_or_else(|| format!("Color is not in the palette: {}", s))
    }
}

impl Serialize for NoteColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.value())
    }
}

impl<'de> Deserialize<'de> for NoteColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_first_entry() {
        assert_eq!(NoteColor::default(), NoteColor::ALL[0]);
        assert_eq!(NoteColor::default().value(), "#ffffff");
    }

    #[test]
    fn test_values_are_unique() {
        let mut values: Vec<&str> = NoteColor::ALL.iter().map(|c| c.value()).collect();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), NoteColor::ALL.len());
    }

    #[test]
    fn test_from_value_is_case_insensitive() {
        assert_eq!(NoteColor::from_value("#F28B82"), Some(NoteColor::Red));
        assert_eq!(NoteColor::from_value(" #aecbfa "), Some(NoteColor::DarkBlue));
        assert_eq!(NoteColor::from_value("#123456"), None);
    }

    #[test]
    fn test_serializes_as_hex() {
        let json = serde_json::to_string(&NoteColor::Teal).unwrap();
        assert_eq!(json, "\"#a7ffeb\"");
    }

    #[test]
    fn test_deserialize_rejects_unknown_color() {
        let result = serde_json::from_str::<NoteColor>("\"hotpink\"");
        assert!(result.is_err());
    }
}
