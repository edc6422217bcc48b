//! Prompt construction from profile, context and history.

use std::fmt::Write;

use super::Exchange;
use crate::persona::{Goal, Length, Persona, PersonalizationProfile, Style, Tone};
use crate::provider::{ChatMessage, ChatPrompt};

/// Context line used when no documents have been processed yet.
pub const NO_DOCUMENTS_CONTEXT: &str = "No relevant documents have been processed yet.";

/// Context line used when the documents hold nothing relevant to the question.
pub const NO_MATCHES_CONTEXT: &str =
    "The processed documents contain no passages relevant to this question.";

/// Retrieved context for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptContext {
    /// Chunk texts, most relevant first.
    Documents(Vec<String>),
    /// Nothing has been ingested.
    NoDocuments,
    /// Documents exist but none matched.
    NoMatches,
}

impl PromptContext {
    fn render(&self, out: &mut String) {
        match self {
            Self::Documents(chunks) => {
                for (i, chunk) in chunks.iter().enumerate() {
                    let _ = write!(out, "[{}] {}\n\n", i + 1, chunk.trim());
                }
            }
            Self::NoDocuments => {
                out.push_str(NO_DOCUMENTS_CONTEXT);
                out.push_str("\n\n");
            }
            Self::NoMatches => {
                out.push_str(NO_MATCHES_CONTEXT);
                out.push_str("\n\n");
            }
        }
    }
}

fn tone_guidance(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => "professional and precise",
        Tone::Friendly => "warm and approachable",
        Tone::Humorous => "light-hearted, with gentle humour where it fits",
    }
}

fn goal_guidance(goal: Goal) -> &'static str {
    match goal {
        Goal::Educate => "help the reader understand the topic",
        Goal::Summarize => "condense the relevant material to its key points",
        Goal::Advise => "give practical, actionable recommendations",
        Goal::Entertain => "keep the reader engaged while staying accurate",
    }
}

fn style_guidance(style: Style) -> &'static str {
    match style {
        Style::Storytelling => "a narrative that flows from one idea to the next",
        Style::BulletPoints => "concise bullet points",
        Style::StepByStep => "numbered steps in logical order",
    }
}

fn persona_guidance(persona: Persona) -> &'static str {
    match persona {
        Persona::Beginner => "someone new to the subject; explain any jargon",
        Persona::DomainExpert => "an expert; technical vocabulary is welcome",
        Persona::TenYearOld => "a 10-year-old; use simple words and familiar comparisons",
    }
}

fn length_guidance(length: Length) -> &'static str {
    match length {
        Length::Short => "a brief answer of a few sentences",
        Length::Detailed => "a thorough, detailed answer",
    }
}

/// Builds the [`ChatPrompt`] for one question.
///
/// The system message describes every profile field and carries the
/// retrieved context. Prior exchanges follow as alternating user and
/// assistant messages, and the question is the final user message.
#[derive(Debug, Clone)]
pub struct PromptBuilder<'a> {
    profile: &'a PersonalizationProfile,
    context: PromptContext,
    history: &'a [Exchange],
    question: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Creates a builder for the given profile.
    pub fn new(profile: &'a PersonalizationProfile) -> Self {
        Self {
            profile,
            context: PromptContext::NoDocuments,
            history: &[],
            question: "",
        }
    }

    /// Sets the retrieved context.
    pub fn with_context(mut self, context: PromptContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the (already bounded) history.
    pub fn with_history(mut self, history: &'a [Exchange]) -> Self {
        self.history = history;
        self
    }

    /// Sets the question.
    pub fn with_question(mut self, question: &'a str) -> Self {
        self.question = question;
        self
    }

    /// Builds the system message text.
    pub fn build_system_prompt(&self) -> String {
        let p = self.profile;
        let mut prompt = String::from(
            "You are a personalized assistant that answers questions about the user's documents.\n\n",
        );

        prompt.push_str("## Response preferences\n\n");
        let _ = writeln!(prompt, "- Tone: {} ({})", p.tone(), tone_guidance(p.tone()));
        let _ = writeln!(
            prompt,
            "- Communication goal: {} ({})",
            p.goal(),
            goal_guidance(p.goal())
        );
        let _ = writeln!(
            prompt,
            "- Response style: {} ({})",
            p.style(),
            style_guidance(p.style())
        );
        let _ = writeln!(
            prompt,
            "- Target audience: {} ({})",
            p.persona(),
            persona_guidance(p.persona())
        );
        let _ = writeln!(prompt, "- Language: {}", p.language());
        let _ = writeln!(
            prompt,
            "- Length: {} ({})",
            p.length(),
            length_guidance(p.length())
        );

        prompt.push_str("\n## Context\n\n");
        self.context.render(&mut prompt);

        prompt.push_str(
            "Base the answer on the context above. If the context does not contain the answer, say so plainly.\n",
        );
        let _ = write!(
            prompt,
            "Provide a {} response in a {} style, written in {}.",
            p.length(),
            p.style(),
            p.language()
        );

        prompt
    }

    /// Builds the full prompt.
    pub fn build(&self) -> ChatPrompt {
        let mut prompt = ChatPrompt::new().with_message(ChatMessage::system(self.build_system_prompt()));

        for exchange in self.history {
            prompt.push(ChatMessage::user(exchange.user_text()));
            prompt.push(ChatMessage::assistant(exchange.assistant_text()));
        }

        prompt.push(ChatMessage::user(self.question));
        prompt
    }
}
