//! Personalization profile arguments.

use clap::Args;
use docent_rag::persona::{PersonalizationProfile, ProfileSettings};
use serde::{Deserialize, Serialize};

/// Either a named preset or the six individual profile fields.
///
/// A preset takes precedence over the individual fields.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ProfileArgs {
    /// Named preset: "Beginner", "Expert" or "Young Learner".
    #[arg(long, env = "DOCENT_PRESET")]
    #[serde(default)]
    pub preset: Option<String>,

    #[clap(flatten)]
    #[serde(flatten)]
    pub settings: ProfileSettings,
}

impl ProfileArgs {
    /// Resolves the arguments into a validated profile.
    pub fn resolve(&self) -> docent_rag::Result<PersonalizationProfile> {
        match &self.preset {
            Some(name) => PersonalizationProfile::preset(name),
            None => PersonalizationProfile::try_from(self.settings.clone()),
        }
    }
}
