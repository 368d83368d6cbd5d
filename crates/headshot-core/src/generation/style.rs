use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

const IDENTITY_PREAMBLE: &str = "Keep the person's face, identity, skin tone and expression \
exactly as in the photo. Do not change their age, ethnicity or facial features.";

/// Preset looks for the first generation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HeadshotStyle {
    Corporate,
    Creative,
    Casual,
    Studio,
    Outdoor,
}

impl HeadshotStyle {
    fn scene(&self) -> &'static str {
        match self {
            Self::Corporate => {
                "wearing a tailored dark business suit, in front of a softly blurred modern office, \
                 even soft-box lighting"
            }
            Self::Creative => {
                "wearing smart casual clothing, in front of a colorful textured wall, \
                 dramatic side lighting"
            }
            Self::Casual => {
                "wearing a plain knit sweater, relaxed pose, warm natural window light, \
                 neutral home background"
            }
            Self::Studio => {
                "wearing a crisp collared shirt, solid light-grey seamless studio backdrop, \
                 classic three-point lighting"
            }
            Self::Outdoor => {
                "wearing a light blazer, outdoors with shallow depth of field greenery, \
                 golden-hour sunlight"
            }
        }
    }

    /// Prompt for turning a selfie into a headshot of this style.
    pub fn prompt(&self, extra: Option<&str>) -> String {
        let mut prompt = format!(
            "Transform this selfie into a professional headshot photograph, {}. \
             Frame from mid-chest up, sharp focus on the eyes, photorealistic. {}",
            self.scene(),
            IDENTITY_PREAMBLE
        );
        if let Some(extra) = extra.map(str::trim).filter(|s| !s.is_empty()) {
            prompt.push_str(" Additional direction: ");
            prompt.push_str(extra);
        }
        prompt
    }
}

/// Prompt for a follow-up edit of the current image.
pub fn edit_prompt(instruction: &str) -> String {
    format!(
        "Edit this professional headshot as follows: {}. Change nothing else. {}",
        instruction.trim(),
        IDENTITY_PREAMBLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_style_keeps_identity() {
        for style in HeadshotStyle::iter() {
            let prompt = style.prompt(None);
            assert!(prompt.contains("professional headshot"));
            assert!(prompt.contains(IDENTITY_PREAMBLE));
        }
    }

    #[test]
    fn test_extra_direction_appended() {
        let prompt = HeadshotStyle::Studio.prompt(Some("  navy tie "));
        assert!(prompt.ends_with("Additional direction: navy tie"));
        assert!(!HeadshotStyle::Studio.prompt(Some("   ")).contains("Additional"));
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!(HeadshotStyle::from_str("Corporate").unwrap(), HeadshotStyle::Corporate);
        assert_eq!(HeadshotStyle::Outdoor.to_string(), "outdoor");
    }

    #[test]
    fn test_edit_prompt() {
        let prompt = edit_prompt(" make the background blue ");
        assert!(prompt.starts_with("Edit this professional headshot as follows: make the background blue."));
    }
}
