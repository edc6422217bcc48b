//! Line-oriented question loop.

mod command;

use std::fmt::Write as _;
use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::Context;
use docent_rag::chat::ConversationSession;
use docent_rag::persona::{PersonalizationProfile, Preset, ProfileSettings};
use docent_rag::rag::IngestSummary;
use strum::IntoEnumIterator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub use self::command::Command;
use crate::TRACING_TARGET_REPL;

const HELP: &str = "\
Type a question, or one of:
  /ingest <paths...>      replace the indexed documents
  /append <paths...>      add documents to the index
  /preset <name>          switch preset (Beginner, Expert, Young Learner)
  /profile [field=value]  show or change tone, goal, length, style, language, persona
  /history                show the conversation so far
  /clear                  forget the conversation, keep the documents
  /forget                 drop every indexed document
  /quit                   exit";

/// Reads lines from an input, drives a [`ConversationSession`] and writes
/// replies to an output.
pub struct Repl<W> {
    session: ConversationSession,
    out: W,
}

impl<W> Repl<W>
where
    W: AsyncWrite + Unpin,
{
    /// Creates a loop over the given session and output.
    pub fn new(session: ConversationSession, out: W) -> Self {
        Self { session, out }
    }

    /// Runs until `/quit` or end of input.
    pub async fn run<R>(&mut self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        tracing::debug!(
            target: TRACING_TARGET_REPL,
            session_id = %self.session.id(),
            "Question loop started"
        );

        let chunks = self.session.engine().chunk_count().await;
        self.write(&format!(
            "docent ready ({chunks} chunks indexed, profile: {}). Type /help for commands.\n",
            self.session.profile()
        ))
        .await?;

        loop {
            self.write("> ").await?;

            let Some(line) = lines.next_line().await.context("failed to read input")? else {
                break;
            };

            let Some(command) = Command::parse(&line) else {
                continue;
            };

            if self.dispatch(command).await?.is_break() {
                break;
            }
        }

        tracing::debug!(
            target: TRACING_TARGET_REPL,
            session_id = %self.session.id(),
            exchanges = self.session.exchange_count(),
            "Question loop finished"
        );

        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> anyhow::Result<ControlFlow<()>> {
        let reply = match command {
            Command::Ask(question) => self.session.ask(&question).await,
            Command::Ingest(paths) => self.ingest(paths, false).await,
            Command::Append(paths) => self.ingest(paths, true).await,
            Command::Preset(name) => match PersonalizationProfile::preset(&name) {
                Ok(profile) => {
                    self.session.set_profile(profile);
                    format!("Profile: {}", self.session.profile())
                }
                Err(_) => {
                    let names: Vec<String> = Preset::iter().map(|p| p.to_string()).collect();
                    format!("Unknown preset '{name}'. Available: {}", names.join(", "))
                }
            },
            Command::Profile(updates) => self.update_profile(updates),
            Command::History => self.render_history(),
            Command::Clear => {
                self.session.clear_history();
                "Conversation cleared.".to_owned()
            }
            Command::Forget => match self.session.engine().clear().await {
                Ok(()) => "All documents removed.".to_owned(),
                Err(error) => format!("Could not remove documents: {error}"),
            },
            Command::Help => HELP.to_owned(),
            Command::Quit => return Ok(ControlFlow::Break(())),
            Command::Invalid(message) => message,
        };

        self.write(&reply).await?;
        self.write("\n").await?;
        Ok(ControlFlow::Continue(()))
    }

    async fn ingest(&self, paths: Vec<PathBuf>, append: bool) -> String {
        let engine = self.session.engine();
        let result = if append {
            engine.append_paths(&paths).await
        } else {
            engine.ingest_paths(&paths).await
        };

        match result {
            Ok(IngestSummary { documents, chunks }) => {
                format!("Indexed {chunks} chunks from {documents} document(s).")
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_REPL,
                    error = %error,
                    paths = paths.len(),
                    "Ingestion failed"
                );
                format!("Could not ingest documents: {error}")
            }
        }
    }

    fn update_profile(&mut self, updates: Vec<(String, String)>) -> String {
        if updates.is_empty() {
            return format!("Profile: {}", self.session.profile());
        }

        let mut settings = ProfileSettings::from(self.session.profile().clone());
        for (field, value) in updates {
            let slot = match field.as_str() {
                "tone" => &mut settings.tone,
                "goal" => &mut settings.goal,
                "length" => &mut settings.length,
                "style" => &mut settings.style,
                "language" => &mut settings.language,
                "persona" => &mut settings.persona,
                other => return format!("Unknown profile field '{other}'."),
            };
            *slot = value;
        }

        match PersonalizationProfile::try_from(settings) {
            Ok(profile) => {
                self.session.set_profile(profile);
                format!("Profile: {}", self.session.profile())
            }
            Err(error) => format!("Profile unchanged: {error}"),
        }
    }

    fn render_history(&self) -> String {
        let history = self.session.history();
        if history.is_empty() {
            return "No questions asked yet.".to_owned();
        }

        let mut text = String::new();
        for (number, exchange) in history.iter().enumerate() {
            let _ = writeln!(text, "[{}] You: {}", number + 1, exchange.user_text());
            let _ = writeln!(text, "    Docent: {}", exchange.assistant_text());
        }
        text.truncate(text.trim_end().len());
        text
    }

    async fn write(&mut self, text: &str) -> anyhow::Result<()> {
        self.out
            .write_all(text.as_bytes())
            .await
            .context("failed to write output")?;
        self.out.flush().await.context("failed to flush output")
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.out
    }
}
