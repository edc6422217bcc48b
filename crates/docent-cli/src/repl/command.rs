//! Input line parsing.

use std::path::PathBuf;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A question for the session.
    Ask(String),
    /// Replace the indexed documents.
    Ingest(Vec<PathBuf>),
    /// Add documents to the index.
    Append(Vec<PathBuf>),
    /// Switch to a named preset.
    Preset(String),
    /// Show the profile, or change the given `field=value` pairs.
    Profile(Vec<(String, String)>),
    History,
    Clear,
    Forget,
    Help,
    Quit,
    /// A malformed command, with the message to show.
    Invalid(String),
}

impl Command {
    /// Parses one input line. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Ask(line.to_owned()));
        };

        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, args)| (name, args.trim()));

        let command = match name.to_ascii_lowercase().as_str() {
            "ingest" => Self::paths(args, Self::Ingest),
            "append" => Self::paths(args, Self::Append),
            "preset" if args.is_empty() => Self::Invalid("usage: /preset <name>".to_owned()),
            "preset" => Self::Preset(args.to_owned()),
            "profile" => Self::profile(args),
            "history" => Self::History,
            "clear" => Self::Clear,
            "forget" => Self::Forget,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Invalid(format!("unknown command '/{other}', try /help")),
        };

        Some(command)
    }

    fn paths(args: &str, wrap: fn(Vec<PathBuf>) -> Self) -> Self {
        let paths: Vec<PathBuf> = args.split_whitespace().map(PathBuf::from).collect();
        if paths.is_empty() {
            return Self::Invalid("expected at least one document path".to_owned());
        }
        wrap(paths)
    }

    fn profile(args: &str) -> Self {
        let mut updates = Vec::new();

        for pair in args.split_whitespace() {
            let Some((field, value)) = pair.split_once('=') else {
                return Self::Invalid(format!("expected field=value, got '{pair}'"));
            };
            updates.push((field.to_ascii_lowercase(), value.to_owned()));
        }

        Self::Profile(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_questions() {
        assert_eq!(
            Command::parse("  what is RAG?  "),
            Some(Command::Ask("what is RAG?".to_owned()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn ingest_requires_paths() {
        assert_eq!(
            Command::parse("/ingest a.pdf b.txt"),
            Some(Command::Ingest(vec!["a.pdf".into(), "b.txt".into()]))
        );
        assert!(matches!(Command::parse("/ingest"), Some(Command::Invalid(_))));
    }

    #[test]
    fn preset_keeps_spaces() {
        assert_eq!(
            Command::parse("/preset Young Learner"),
            Some(Command::Preset("Young Learner".to_owned()))
        );
    }

    #[test]
    fn profile_updates_are_pairs() {
        assert_eq!(
            Command::parse("/profile Tone=formal language=Spanish"),
            Some(Command::Profile(vec![
                ("tone".to_owned(), "formal".to_owned()),
                ("language".to_owned(), "Spanish".to_owned()),
            ]))
        );
        assert_eq!(Command::parse("/profile"), Some(Command::Profile(Vec::new())));
        assert!(matches!(Command::parse("/profile tone"), Some(Command::Invalid(_))));
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(Command::parse("/QUIT"), Some(Command::Quit));
        assert!(matches!(Command::parse("/dance"), Some(Command::Invalid(_))));
    }
}
