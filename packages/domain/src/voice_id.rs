//! Prebuilt voice identifiers accepted by the speech service.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Prebuilt voices. The string form is the wire `voiceName`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum VoiceId {
    #[default]
    Puck,
    Charon,
    Kore,
    Fenrir,
    Zephyr,
}

impl VoiceId {
    /// Name sent to the service.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(VoiceId::from_str("kore"), Ok(VoiceId::Kore));
        assert_eq!(VoiceId::from_str("ZEPHYR"), Ok(VoiceId::Zephyr));
        assert!(VoiceId::from_str("Aoede").is_err());
    }

    #[test]
    fn wire_name_matches_display() {
        for voice in VoiceId::iter() {
            assert_eq!(voice.wire_name(), voice.to_string());
        }
    }
}
