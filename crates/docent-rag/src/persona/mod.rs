//! Personalization of generated answers.
//!
//! A [`PersonalizationProfile`] carries six stylistic parameters that are
//! rendered into the system prompt of every question. Profiles can be built
//! field by field, parsed from raw [`ProfileSettings`], or taken from one of
//! the named [`Preset`]s.

mod preset;
mod profile;
mod settings;

pub use self::preset::Preset;
pub use self::profile::{
    DEFAULT_LANGUAGE, Goal, Length, Persona, PersonalizationProfile, Style, Tone,
};
pub use self::settings::ProfileSettings;
