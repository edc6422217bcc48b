//! Raw, string-typed profile settings.

use serde::{Deserialize, Serialize};

use super::profile::parse_field;
use super::PersonalizationProfile;
use crate::Error;

/// String form of a [`PersonalizationProfile`], as read from flags,
/// environment variables or JSON.
///
/// Converting into a profile validates every field and names the first
/// offending one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
#[serde(default)]
pub struct ProfileSettings {
    /// Tone of voice (formal, friendly, humorous).
    #[cfg_attr(
        feature = "config",
        arg(long = "tone", env = "DOCENT_TONE", default_value = "friendly")
    )]
    pub tone: String,

    /// Communication goal (educate, summarize, advise, entertain).
    #[cfg_attr(
        feature = "config",
        arg(long = "goal", env = "DOCENT_GOAL", default_value = "educate")
    )]
    pub goal: String,

    /// Response length (short, detailed).
    #[cfg_attr(
        feature = "config",
        arg(long = "length", env = "DOCENT_LENGTH", default_value = "detailed")
    )]
    pub length: String,

    /// Response style (storytelling, bullet_points, step_by_step).
    #[cfg_attr(
        feature = "config",
        arg(long = "style", env = "DOCENT_STYLE", default_value = "storytelling")
    )]
    pub style: String,

    /// Response language.
    #[cfg_attr(
        feature = "config",
        arg(long = "language", env = "DOCENT_LANGUAGE", default_value = "English")
    )]
    pub language: String,

    /// Target audience (beginner, domain_expert, ten_year_old).
    #[cfg_attr(
        feature = "config",
        arg(long = "persona", env = "DOCENT_PERSONA", default_value = "beginner")
    )]
    pub persona: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        PersonalizationProfile::default().into()
    }
}

impl TryFrom<ProfileSettings> for PersonalizationProfile {
    type Error = Error;

    fn try_from(settings: ProfileSettings) -> Result<Self, Self::Error> {
        PersonalizationProfile::new(
            parse_field("tone", &settings.tone)?,
            parse_field("goal", &settings.goal)?,
            parse_field("length", &settings.length)?,
            parse_field("style", &settings.style)?,
            &settings.language,
            parse_field("persona", &settings.persona)?,
        )
    }
}

impl From<PersonalizationProfile> for ProfileSettings {
    fn from(profile: PersonalizationProfile) -> Self {
        Self {
            tone: profile.tone().to_string(),
            goal: profile.goal().to_string(),
            length: profile.length().to_string(),
            style: profile.style().to_string(),
            language: profile.language().to_owned(),
            persona: profile.persona().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{Persona, Preset, Style};

    #[test]
    fn default_settings_round_trip_to_default_profile() {
        let profile = PersonalizationProfile::try_from(ProfileSettings::default()).unwrap();
        assert_eq!(profile, PersonalizationProfile::default());
    }

    #[test]
    fn settings_from_profile_parse_back() {
        let settings = ProfileSettings::from(Preset::Expert.profile());
        assert_eq!(settings.style, "bullet points");
        assert_eq!(settings.persona, "domain expert");

        let profile = PersonalizationProfile::try_from(settings).unwrap();
        assert_eq!(profile, Preset::Expert.profile());
    }

    #[test]
    fn human_labels_are_accepted() {
        let settings = ProfileSettings {
            style: "step-by-step".into(),
            persona: "10-year-old".into(),
            language: "Spanish".into(),
            ..Default::default()
        };
        let profile = PersonalizationProfile::try_from(settings).unwrap();

        assert_eq!(profile.style(), Style::StepByStep);
        assert_eq!(profile.persona(), Persona::TenYearOld);
        assert_eq!(profile.language(), "Spanish");
    }

    #[test]
    fn offending_field_is_named() {
        let settings = ProfileSettings {
            goal: "persuade".into(),
            ..Default::default()
        };
        let error = PersonalizationProfile::try_from(settings).unwrap_err();

        assert!(matches!(error, Error::Validation(_)));
        assert!(error.to_string().contains("invalid goal 'persuade'"));
    }
}
