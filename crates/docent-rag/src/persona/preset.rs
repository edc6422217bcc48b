//! Named profile presets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::{DEFAULT_LANGUAGE, Goal, Length, Persona, PersonalizationProfile, Style, Tone};

/// A named, ready-made [`PersonalizationProfile`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Preset {
    /// Friendly, educational, step-by-step answers for newcomers.
    #[strum(to_string = "Beginner")]
    Beginner,
    /// Formal, detailed bullet points for domain experts.
    #[strum(to_string = "Expert")]
    Expert,
    /// Short, humorous storytelling pitched at a 10-year-old.
    #[strum(
        to_string = "Young Learner",
        serialize = "young_learner",
        serialize = "young-learner"
    )]
    YoungLearner,
}

impl Preset {
    /// Returns the profile this preset stands for.
    pub fn profile(self) -> PersonalizationProfile {
        let (tone, goal, length, style, persona) = match self {
            Self::Beginner => (
                Tone::Friendly,
                Goal::Educate,
                Length::Detailed,
                Style::StepByStep,
                Persona::Beginner,
            ),
            Self::Expert => (
                Tone::Formal,
                Goal::Advise,
                Length::Detailed,
                Style::BulletPoints,
                Persona::DomainExpert,
            ),
            Self::YoungLearner => (
                Tone::Humorous,
                Goal::Entertain,
                Length::Short,
                Style::Storytelling,
                Persona::TenYearOld,
            ),
        };

        PersonalizationProfile::from_parts(tone, goal, length, style, DEFAULT_LANGUAGE, persona)
    }
}

impl From<Preset> for PersonalizationProfile {
    fn from(preset: Preset) -> Self {
        preset.profile()
    }
}
