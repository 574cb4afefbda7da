//! Dictionary translation with case transfer.
//!
//! A [`Translator`] rewrites text using an ordered lexicon of
//! `source → target` phrase rules. It is a lexical substitution, not machine
//! translation: anything not covered by a rule passes through unchanged.
//!
//! # Rewrite Algorithm
//!
//! Rules are applied one at a time, in declaration order. Each rule replaces
//! every case-insensitive, non-overlapping occurrence of its source phrase,
//! scanning left to right. The replacement takes the case shape of the
//! matched span (see [`transfer_case`]).
//!
//! Under [`CascadePolicy::Protect`] (the default) replaced spans are frozen:
//! later rules only see text that no earlier rule produced. Under
//! [`CascadePolicy::Cascade`] later rules also match earlier output, so the
//! lexicon author controls cascades through rule order.
//!
//! # Idempotence
//!
//! `translate(translate(t)) == translate(t)` needs more than "no target
//! contains a source". Frozen spans thaw in the output, so on a second pass a
//! source may match across the seam between a target and its neighbouring
//! text: with rules `x → q` and `qy → z`, `"xy"` becomes `"qy"` and then
//! `"z"`. Translation is idempotent when no source matches inside a target or
//! across a target boundary. The bundled Urdu lexicon meets this because its
//! sources are English and its targets are Urdu script.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::corpus::Corpus;
use crate::error::{CoreError, Result};
use crate::models::{Language, TranslatedCorpus, TranslatedSection};

const BUNDLED_URDU_LEXICON: &str = include_str!("../data/lexicon_ur.json");

/// One substitution rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LexiconRule {
    pub source: String,
    pub target: String,
}

impl LexiconRule {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// On-disk lexicon shape: a language code plus an ordered rule list.
#[derive(Debug, Deserialize)]
struct LexiconFile {
    language: Language,
    rules: Vec<LexiconRule>,
}

/// Whether later rules may rewrite text produced by earlier rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CascadePolicy {
    /// Substituted spans are never rewritten again.
    #[default]
    Protect,
    /// Sequential multi-pass rewrite over the whole text.
    Cascade,
}

struct CompiledRule {
    rule: LexiconRule,
    pattern: Regex,
}

impl CompiledRule {
    fn compile(rule: LexiconRule) -> Result<Self> {
        if rule.source.is_empty() {
            return Err(CoreError::InvalidLexicon(format!(
                "rule with target '{}' has an empty source",
                rule.target
            )));
        }
        let pattern = RegexBuilder::new(&regex::escape(&rule.source))
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                CoreError::InvalidLexicon(format!("rule '{}' failed to compile: {}", rule.source, e))
            })?;
        Ok(Self { rule, pattern })
    }

    fn replace_all(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &regex::Captures| {
                transfer_case(&caps[0], &self.rule.target)
            })
            .into_owned()
    }

    /// Split `text` around matches, freezing each replacement.
    fn rewrite_into(&self, text: &str, out: &mut Vec<Segment>) {
        let mut last = 0;
        for m in self.pattern.find_iter(text) {
            if m.start() > last {
                out.push(Segment::open(&text[last..m.start()]));
            }
            out.push(Segment::frozen(transfer_case(m.as_str(), &self.rule.target)));
            last = m.end();
        }
        if last < text.len() {
            out.push(Segment::open(&text[last..]));
        }
    }
}

struct Segment {
    text: String,
    frozen: bool,
}

impl Segment {
    fn open(text: &str) -> Self {
        Self {
            text: text.to_string(),
            frozen: false,
        }
    }

    fn frozen(text: String) -> Self {
        Self { text, frozen: true }
    }
}

/// Apply the case shape of `matched` to `target`.
///
/// - all upper-case span → target upper-cased
/// - all lower-case span → target lower-cased
/// - span starting with an upper-case letter → target capitalized, rest lower-cased
/// - anything else → target as declared
pub fn transfer_case(matched: &str, target: &str) -> String {
    if matched == matched.to_uppercase() {
        return target.to_uppercase();
    }
    if matched == matched.to_lowercase() {
        return target.to_lowercase();
    }
    if matched.chars().next().is_some_and(char::is_uppercase) {
        return capitalize(target);
    }
    target.to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

/// Ordered-lexicon translator for one target language.
pub struct Translator {
    language: Language,
    rules: Vec<CompiledRule>,
    policy: CascadePolicy,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("language", &self.language)
            .field("rules", &self.rules.len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Translator {
    /// Compile `rules` for `language`, keeping their order.
    ///
    /// # Errors
    ///
    /// Fails on a rule with an empty source, or when `language` is the
    /// source language of the book.
    pub fn new(language: Language, rules: Vec<LexiconRule>) -> Result<Self> {
        if language.is_source() {
            return Err(CoreError::InvalidLexicon(format!(
                "'{}' is the source language and cannot have a lexicon",
                language
            )));
        }
        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            language,
            rules,
            policy: CascadePolicy::default(),
        })
    }

    /// Parse a lexicon file: `{"language": "ur", "rules": [{"source", "target"}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidLexicon(format!("malformed lexicon JSON: {}", e)))?;
        Self::new(file.language, file.rules)
    }

    /// The bundled English → Urdu lexicon.
    pub fn urdu() -> Result<Self> {
        Self::from_json(BUNDLED_URDU_LEXICON)
    }

    pub fn with_policy(mut self, policy: CascadePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn policy(&self) -> CascadePolicy {
        self.policy
    }

    /// Rules in processing order.
    pub fn rules(&self) -> impl Iterator<Item = &LexiconRule> {
        self.rules.iter().map(|r| &r.rule)
    }

    /// Rewrite `text`. Total: unmapped text passes through unchanged.
    pub fn translate(&self, text: &str) -> String {
        match self.policy {
            CascadePolicy::Cascade => self
                .rules
                .iter()
                .fold(text.to_string(), |acc, rule| rule.replace_all(&acc)),
            CascadePolicy::Protect => {
                let mut segments = vec![Segment::open(text)];
                for rule in &self.rules {
                    let mut next = Vec::with_capacity(segments.len());
                    for segment in segments {
                        if segment.frozen {
                            next.push(segment);
                        } else {
                            rule.rewrite_into(&segment.text, &mut next);
                        }
                    }
                    segments = next;
                }
                segments.into_iter().map(|s| s.text).collect()
            }
        }
    }

    /// Translate every entry's title and body independently.
    ///
    /// The result has exactly the corpus' ids as keys.
    pub fn translate_corpus(&self, corpus: &Corpus) -> TranslatedCorpus {
        let sections: BTreeMap<String, TranslatedSection> = corpus
            .entries()
            .iter()
            .map(|entry| {
                (
                    entry.id.clone(),
                    TranslatedSection {
                        title: self.translate(&entry.title),
                        body: self.translate(&entry.body),
                    },
                )
            })
            .collect();
        TranslatedCorpus {
            language: self.language,
            sections,
        }
    }
}

/// The set of translators available for local translation.
#[derive(Debug, Default)]
pub struct LexiconRegistry {
    translators: Vec<Translator>,
}

impl LexiconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every lexicon bundled with the crate.
    pub fn bundled() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Translator::urdu()?);
        Ok(registry)
    }

    /// Add a translator, replacing any existing one for the same language.
    pub fn register(&mut self, translator: Translator) {
        self.translators
            .retain(|t| t.language() != translator.language());
        self.translators.push(translator);
    }

    pub fn supports(&self, language: Language) -> bool {
        self.translators.iter().any(|t| t.language() == language)
    }

    /// Languages with a registered lexicon.
    pub fn languages(&self) -> Vec<Language> {
        self.translators.iter().map(Translator::language).collect()
    }

    /// Look up the translator for `language`.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnsupportedLanguage`] if no lexicon is registered.
    pub fn get(&self, language: Language) -> Result<&Translator> {
        self.translators
            .iter()
            .find(|t| t.language() == language)
            .ok_or_else(|| CoreError::UnsupportedLanguage(language.code().to_string()))
    }

    /// Translate the whole corpus into `language`, or fail without output.
    pub fn translate_corpus(&self, corpus: &Corpus, language: Language) -> Result<TranslatedCorpus> {
        Ok(self.get(language)?.translate_corpus(corpus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CorpusEntry;

    fn translator(rules: &[(&str, &str)]) -> Translator {
        Translator::new(
            Language::Ur,
            rules
                .iter()
                .map(|(s, t)| LexiconRule::new(*s, *t))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_case_transfer() {
        let t = translator(&[("robotics", "Robotik")]);
        assert_eq!(t.translate("ROBOTICS"), "ROBOTIK");
        assert_eq!(t.translate("robotics"), "robotik");
        assert_eq!(t.translate("Robotics"), "Robotik");
        assert_eq!(t.translate("RoBoTiCs"), "Robotik");
    }

    #[test]
    fn test_mixed_case_without_leading_capital_uses_declared_target() {
        let t = translator(&[("robotics", "RoboTik")]);
        assert_eq!(t.translate("rOBOTICS"), "RoboTik");
    }

    #[test]
    fn test_transfer_case_rules() {
        assert_eq!(transfer_case("AI", "mind"), "MIND");
        assert_eq!(transfer_case("ai", "Mind"), "mind");
        assert_eq!(transfer_case("Deep", "sEA"), "Sea");
        assert_eq!(transfer_case("dEEP", "sEA"), "sEA");
        assert_eq!(transfer_case("Deep", ""), "");
    }

    #[test]
    fn test_unmapped_text_passes_through() {
        let t = translator(&[("robot", "bot")]);
        assert_eq!(t.translate("nothing to see"), "nothing to see");
        assert_eq!(t.translate(""), "");
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let t = translator(&[("robot", "bot")]);
        assert_eq!(t.translate("robot, Robot and ROBOT"), "bot, Bot and BOT");
    }

    #[test]
    fn test_matches_inside_words() {
        let t = translator(&[("robot", "bot")]);
        assert_eq!(t.translate("robotics"), "botics");
    }

    #[test]
    fn test_pattern_metacharacters_are_literal() {
        let t = translator(&[("decision-making", "choosing"), ("a.b", "x")]);
        assert_eq!(t.translate("Decision-making"), "Choosing");
        assert_eq!(t.translate("aXb a.b"), "aXb x");
    }

    #[test]
    fn test_declaration_order_wins() {
        let t = translator(&[("physical", "P"), ("physical ai", "PAI")]);
        assert_eq!(t.translate("physical ai"), "p ai");

        let t = translator(&[("physical ai", "PAI"), ("physical", "P")]);
        assert_eq!(t.translate("physical ai and physical"), "pai and p");
    }

    #[test]
    fn test_protect_policy_freezes_substitutions() {
        let t = translator(&[("cat", "dog"), ("dog", "wolf")]);
        assert_eq!(t.translate("cat and dog"), "dog and wolf");
    }

    #[test]
    fn test_cascade_policy_rewrites_earlier_output() {
        let t = translator(&[("cat", "dog"), ("dog", "wolf")]).with_policy(CascadePolicy::Cascade);
        assert_eq!(t.translate("cat and dog"), "wolf and wolf");
    }

    #[test]
    fn test_idempotent_when_no_source_spans_a_target() {
        let t = translator(&[("learning", "seekhna"), ("robot", "mashin"), ("AI", "zehanat")]);
        for text in [
            "Robot learning with AI",
            "ROBOT LEARNING",
            "nothing here",
            "robots and AI-driven learning",
        ] {
            let once = t.translate(text);
            assert_eq!(t.translate(&once), once, "not idempotent for {:?}", text);
        }
    }

    #[test]
    fn test_second_pass_can_match_across_target_boundary() {
        let t = translator(&[("x", "q"), ("qy", "z")]);
        let once = t.translate("xy");
        assert_eq!(once, "qy");
        assert_eq!(t.translate(&once), "z");
    }

    #[test]
    fn test_bundled_urdu_is_idempotent_over_corpus() {
        let t = Translator::urdu().unwrap();
        let corpus = Corpus::bundled().unwrap();
        for entry in corpus.entries() {
            let once = t.translate(&entry.body);
            assert_eq!(t.translate(&once), once);
        }
    }

    #[test]
    fn test_rejects_empty_source() {
        let err = Translator::new(Language::Ur, vec![LexiconRule::new("", "x")]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLexicon(_)));
    }

    #[test]
    fn test_rejects_source_language_lexicon() {
        assert!(Translator::new(Language::En, vec![]).is_err());
    }

    #[test]
    fn test_bundled_urdu_lexicon() {
        let t = Translator::urdu().unwrap();
        assert_eq!(t.language(), Language::Ur);
        let first = t.rules().next().unwrap();
        assert_eq!(first.source, "Humanoid");
        assert_eq!(t.translate("Perception Systems"), "ادراک سسٹم");
    }

    #[test]
    fn test_translate_corpus_keeps_keys() {
        let corpus = Corpus::from_entries(vec![
            CorpusEntry {
                id: "b".to_string(),
                title: "Robot".to_string(),
                body: "a robot".to_string(),
            },
            CorpusEntry {
                id: "a".to_string(),
                title: "Other".to_string(),
                body: "plain".to_string(),
            },
        ])
        .unwrap();
        let t = translator(&[("robot", "bot")]);
        let tc = t.translate_corpus(&corpus);
        assert_eq!(tc.language, Language::Ur);
        assert_eq!(tc.len(), 2);
        assert_eq!(tc.get("b").unwrap().title, "Bot");
        assert_eq!(tc.get("b").unwrap().body, "a bot");
        assert_eq!(tc.get("a").unwrap().body, "plain");
        let mut ids: Vec<&str> = corpus.ids().collect();
        ids.sort_unstable();
        assert_eq!(tc.sections.keys().map(String::as_str).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_registry_rejects_unsupported() {
        let registry = LexiconRegistry::bundled().unwrap();
        let corpus = Corpus::bundled().unwrap();
        assert!(registry.supports(Language::Ur));
        assert!(!registry.supports(Language::En));
        let err = registry.translate_corpus(&corpus, Language::En).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedLanguage(code) if code == "en"));
        let tc = registry.translate_corpus(&corpus, Language::Ur).unwrap();
        assert_eq!(tc.len(), corpus.len());
    }

    #[test]
    fn test_registry_register_replaces_language() {
        let mut registry = LexiconRegistry::new();
        registry.register(translator(&[("a", "b")]));
        registry.register(translator(&[("a", "c")]));
        assert_eq!(registry.languages(), vec![Language::Ur]);
        assert_eq!(registry.get(Language::Ur).unwrap().translate("a"), "c");
    }
}
