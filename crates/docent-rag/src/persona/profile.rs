//! Personalization profile and its enumerated fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::ProfileSettings;
use crate::{Error, Result};

/// Default response language.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Tone of voice used in responses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Tone {
    Formal,
    #[default]
    Friendly,
    Humorous,
}

/// What the response is trying to achieve.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Goal {
    #[default]
    Educate,
    Summarize,
    Advise,
    Entertain,
}

/// Expected response verbosity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Length {
    Short,
    #[default]
    Detailed,
}

/// Structure of the response.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Style {
    #[default]
    #[strum(to_string = "storytelling")]
    Storytelling,
    #[strum(to_string = "bullet points", serialize = "bullet_points")]
    BulletPoints,
    #[strum(to_string = "step-by-step", serialize = "step_by_step")]
    StepByStep,
}

/// Audience the response is written for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Persona {
    #[default]
    #[strum(to_string = "beginner")]
    Beginner,
    #[strum(to_string = "domain expert", serialize = "domain_expert")]
    DomainExpert,
    #[strum(to_string = "10-year-old", serialize = "ten_year_old")]
    TenYearOld,
}

/// Parses one enumerated profile field, naming the accepted values on failure.
pub(crate) fn parse_field<T>(field: &str, value: &str) -> Result<T>
where
    T: FromStr + IntoEnumIterator + fmt::Display,
{
    value.trim().parse::<T>().map_err(|_| {
        let accepted = T::iter()
            .map(|variant| variant.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Error::validation(format!(
            "invalid {field} '{value}': expected one of {accepted}"
        ))
    })
}

/// Stylistic and audience parameters that shape prompt construction.
///
/// Profiles are immutable. A session replaces its profile wholesale rather
/// than patching individual fields, so every constructor validates the full
/// set of values up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProfileSettings")]
pub struct PersonalizationProfile {
    tone: Tone,
    goal: Goal,
    length: Length,
    style: Style,
    language: String,
    persona: Persona,
}

impl PersonalizationProfile {
    /// Creates a profile, validating the free-text language.
    pub fn new(
        tone: Tone,
        goal: Goal,
        length: Length,
        style: Style,
        language: impl AsRef<str>,
        persona: Persona,
    ) -> Result<Self> {
        let language = language.as_ref().trim();
        if language.is_empty() {
            return Err(Error::validation("language must not be empty"));
        }

        Ok(Self::from_parts(tone, goal, length, style, language, persona))
    }

    /// Builds a profile from values already known to be valid.
    pub(crate) fn from_parts(
        tone: Tone,
        goal: Goal,
        length: Length,
        style: Style,
        language: &str,
        persona: Persona,
    ) -> Self {
        Self {
            tone,
            goal,
            length,
            style,
            language: language.to_owned(),
            persona,
        }
    }

    /// Looks up a named preset ("Beginner", "Expert", "Young Learner").
    pub fn preset(name: &str) -> Result<Self> {
        let preset = parse_field::<super::Preset>("preset", name)?;
        Ok(preset.profile())
    }

    /// Returns the tone.
    pub fn tone(&self) -> Tone {
        self.tone
    }

    /// Returns the communication goal.
    pub fn goal(&self) -> Goal {
        self.goal
    }

    /// Returns the response length.
    pub fn length(&self) -> Length {
        self.length
    }

    /// Returns the response style.
    pub fn style(&self) -> Style {
        self.style
    }

    /// Returns the response language.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the target persona.
    pub fn persona(&self) -> Persona {
        self.persona
    }
}

impl Default for PersonalizationProfile {
    fn default() -> Self {
        Self::from_parts(
            Tone::Friendly,
            Goal::Educate,
            Length::Detailed,
            Style::Storytelling,
            DEFAULT_LANGUAGE,
            Persona::Beginner,
        )
    }
}

impl fmt::Display for PersonalizationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tone={}, goal={}, length={}, style={}, language={}, persona={}",
            self.tone, self.goal, self.length, self.style, self.language, self.persona
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_matches_documented_defaults() {
        let profile = PersonalizationProfile::default();

        assert_eq!(profile.tone(), Tone::Friendly);
        assert_eq!(profile.goal(), Goal::Educate);
        assert_eq!(profile.length(), Length::Detailed);
        assert_eq!(profile.style(), Style::Storytelling);
        assert_eq!(profile.language(), "English");
        assert_eq!(profile.persona(), Persona::Beginner);
    }

    #[test]
    fn enum_fields_accept_identifiers_and_labels() {
        assert_eq!(parse_field::<Style>("style", "bullet_points").unwrap(), Style::BulletPoints);
        assert_eq!(parse_field::<Style>("style", "bullet points").unwrap(), Style::BulletPoints);
        assert_eq!(parse_field::<Style>("style", "Step-By-Step").unwrap(), Style::StepByStep);
        assert_eq!(parse_field::<Persona>("persona", "10-year-old").unwrap(), Persona::TenYearOld);
        assert_eq!(parse_field::<Persona>("persona", "ten_year_old").unwrap(), Persona::TenYearOld);
        assert_eq!(parse_field::<Tone>("tone", " FORMAL ").unwrap(), Tone::Formal);
    }

    #[test]
    fn invalid_enum_value_lists_accepted_values() {
        let error = parse_field::<Tone>("tone", "sarcastic").unwrap_err();
        let message = error.to_string();

        assert!(matches!(error, Error::Validation(_)));
        assert!(message.contains("sarcastic"));
        assert!(message.contains("formal, friendly, humorous"));
    }

    #[test]
    fn empty_language_is_rejected() {
        let result = PersonalizationProfile::new(
            Tone::Formal,
            Goal::Advise,
            Length::Short,
            Style::BulletPoints,
            "   ",
            Persona::DomainExpert,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(Style::BulletPoints.to_string(), "bullet points");
        assert_eq!(Persona::DomainExpert.to_string(), "domain expert");
        assert_eq!(Goal::Summarize.to_string(), "summarize");
    }

    #[test]
    fn serde_uses_snake_case_and_validates() {
        let profile = PersonalizationProfile::default();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["style"], "storytelling");

        let invalid = serde_json::json!({
            "tone": "friendly",
            "goal": "educate",
            "length": "detailed",
            "style": "interpretive dance",
            "language": "English",
            "persona": "beginner",
        });
        assert!(serde_json::from_value::<PersonalizationProfile>(invalid).is_err());
    }
}
