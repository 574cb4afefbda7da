//! Plain-text rendering of assistant results for the CLI.

use book_assist_core::models::TranslatedSection;
use book_assist_core::search::SearchOutcome;

use crate::models::{Answer, Routed, SearchReply, TranslationReport};
use crate::session::{ConversationMessage, Role};

/// Shown above any result produced by the local fallback.
pub const OFFLINE_BANNER: &str = "Offline mode: answering from the bundled book content.";

fn banner<T>(routed: &Routed<T>, out: &mut String) {
    if routed.is_degraded() {
        out.push_str(OFFLINE_BANNER);
        out.push('\n');
    }
}

pub fn format_search(query: &str, routed: &Routed<SearchReply>) -> String {
    let mut out = String::new();
    banner(routed, &mut out);

    match &routed.value {
        SearchReply::Answer(answer) => out.push_str(&format_answer_body(answer)),
        SearchReply::Lexical(SearchOutcome::NoQuery) => out.push_str("Type something to search."),
        SearchReply::Lexical(SearchOutcome::NoResults) => out.push_str(&format!(
            "No content found for \"{}\". Try different keywords.",
            query.trim()
        )),
        SearchReply::Lexical(SearchOutcome::Matches(results)) => {
            for (i, result) in results.iter().enumerate() {
                out.push_str(&format!(
                    "{}. [{:.2}] {}\n    excerpt: \"{}\"\n    id: {}\n",
                    i + 1,
                    result.score,
                    result.title,
                    result.excerpt.replace('\n', " ").trim(),
                    result.source_id
                ));
            }
        }
    }
    out.trim_end().to_string()
}

fn format_answer_body(answer: &Answer) -> String {
    let mut out = answer.text.clone();
    if let Some(explanation) = &answer.explanation {
        out.push_str(&format!("\n\n{}", explanation));
    }
    if !answer.sources.is_empty() {
        out.push_str(&format!("\n\nsources: {}", answer.sources.join(", ")));
    }
    if let Some(confidence) = answer.confidence {
        out.push_str(&format!("\nconfidence: {:.2}", confidence));
    }
    out
}

pub fn format_answer(routed: &Routed<Answer>) -> String {
    let mut out = String::new();
    banner(routed, &mut out);
    out.push_str(&format_answer_body(&routed.value));
    out
}

pub fn format_report(routed: &Routed<TranslationReport>) -> String {
    let mut out = String::new();
    banner(routed, &mut out);
    out.push_str(&routed.value.message);
    if let Some(url) = &routed.value.url {
        out.push_str(&format!("\nurl: {}", url));
    }
    if let Some(warning) = &routed.value.storage_warning {
        out.push_str(&format!("\nwarning: {}", warning));
    }
    out
}

pub fn format_message(message: &ConversationMessage) -> String {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant if message.degraded => "assistant (offline)",
        Role::Assistant => "assistant",
    };
    format!(
        "[{}] {}: {}",
        message.created_at.format("%H:%M:%S"),
        speaker,
        message.content
    )
}

pub fn format_section(id: &str, section: &TranslatedSection) -> String {
    format!("## {}\n({})\n\n{}\n", section.title, id, section.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DegradeCause, OperationState, Resolution};

    fn degraded<T>(value: T) -> Routed<T> {
        Routed {
            value,
            resolution: Resolution::Degraded(DegradeCause::ProbeFailed("down".into())),
            trace: vec![OperationState::Probing, OperationState::Local, OperationState::Degraded],
        }
    }

    #[test]
    fn test_no_results_message() {
        let routed = degraded(SearchReply::Lexical(SearchOutcome::NoResults));
        let text = format_search(" zzz ", &routed);
        assert!(text.starts_with(OFFLINE_BANNER));
        assert!(text.ends_with("No content found for \"zzz\". Try different keywords."));
    }

    #[test]
    fn test_answer_without_banner_when_remote() {
        let routed = Routed::immediate(Answer {
            text: "Humanoids walk.".to_string(),
            sources: vec!["a".to_string(), "b".to_string()],
            confidence: Some(0.5),
            explanation: None,
        });
        assert_eq!(
            format_answer(&routed),
            "Humanoids walk.\n\nsources: a, b\nconfidence: 0.50"
        );
    }

    #[test]
    fn test_report_with_warning() {
        let routed = degraded(TranslationReport {
            language: book_assist_core::models::Language::Ur,
            message: "Book translated to UR successfully. 6 sections translated.".to_string(),
            url: None,
            sections: Some(6),
            storage_warning: Some("disk full".to_string()),
        });
        let text = format_report(&routed);
        assert!(text.contains("6 sections translated."));
        assert!(text.ends_with("warning: disk full"));
    }
}
