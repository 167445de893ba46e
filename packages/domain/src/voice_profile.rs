//! Static catalogue of the voices offered to the user.

use crate::voice_id::VoiceId;
use std::fmt;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Gender {
    Male,
    Female,
}

/// Read-only descriptor shown next to each selectable voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceProfile {
    pub id: VoiceId,
    pub display_name: &'static str,
    pub gender: Gender,
    pub description: &'static str,
    /// Accent colour name used by front ends (`blue`, `purple`, ...).
    pub color_tag: &'static str,
}

pub const VOICE_PROFILES: &[VoiceProfile] = &[
    VoiceProfile {
        id: VoiceId::Puck,
        display_name: "Puck",
        gender: Gender::Male,
        description: "Mischievous and energetic",
        color_tag: "blue",
    },
    VoiceProfile {
        id: VoiceId::Charon,
        display_name: "Charon",
        gender: Gender::Male,
        description: "Deep and authoritative",
        color_tag: "purple",
    },
    VoiceProfile {
        id: VoiceId::Kore,
        display_name: "Kore",
        gender: Gender::Female,
        description: "Calm and soothing",
        color_tag: "emerald",
    },
    VoiceProfile {
        id: VoiceId::Fenrir,
        display_name: "Fenrir",
        gender: Gender::Male,
        description: "Rough and intense",
        color_tag: "red",
    },
    VoiceProfile {
        id: VoiceId::Zephyr,
        display_name: "Zephyr",
        gender: Gender::Female,
        description: "Light and airy",
        color_tag: "cyan",
    },
];

impl VoiceProfile {
    /// Profile for a voice. Every `VoiceId` has exactly one entry.
    pub fn lookup(id: VoiceId) -> &'static VoiceProfile {
        VOICE_PROFILES
            .iter()
            .find(|profile| profile.id == id)
            .unwrap_or(&VOICE_PROFILES[0])
    }
}

impl fmt::Display for VoiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {}",
            self.display_name, self.gender, self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_voice_has_a_profile() {
        for voice in VoiceId::iter() {
            let profile = VoiceProfile::lookup(voice);
            assert_eq!(profile.id, voice);
            assert_eq!(profile.display_name, voice.wire_name());
        }
        assert_eq!(VOICE_PROFILES.len(), VoiceId::iter().count());
    }

    #[test]
    fn display_includes_gender_and_description() {
        let kore = VoiceProfile::lookup(VoiceId::Kore);
        assert_eq!(kore.to_string(), "Kore (Female) - Calm and soothing");
    }

    #[test]
    fn gender_displays_its_variant_name() {
        assert_eq!(Gender::Male.to_string(), "Male");
        assert_eq!(format!("{:<7}|", Gender::Female.to_string()), "Female |");
    }
}
