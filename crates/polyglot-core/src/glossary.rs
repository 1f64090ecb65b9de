//! Glossary substitution engine.
//!
//! Guild moderators pin preferred translations for domain terms ("guild",
//! "raid", product names).  Rules compile to case-insensitive whole-word
//! matchers and are applied as sequential text rewrites in ascending priority
//! order: each rule runs over the output of the previous one, so a term that
//! is a substring of an already-replaced term is not re-matched.  That
//! ordering is load-bearing for determinism; do not replace it with
//! span-based application.

use regex::{NoExpand, RegexBuilder};

/// One glossary rule as stored for a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryTerm {
    pub term: String,
    pub translation: String,
    /// Lower runs first, which gives it higher effective precedence.
    pub priority: i64,
}

/// A compiled matcher ready for application.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pattern: regex::Regex,
    replacement: String,
    pub term: String,
}

/// Sort entries ascending by priority and compile each term into a
/// case-insensitive whole-word matcher.  Terms that fail to compile (regex
/// size limits on pathological input) are skipped with a warning rather than
/// poisoning the whole glossary.
pub fn compile_glossary(entries: &[GlossaryTerm]) -> Vec<CompiledRule> {
    let mut sorted: Vec<&GlossaryTerm> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.priority);

    let mut compiled = Vec::with_capacity(sorted.len());
    for entry in sorted {
        let source = format!(r"\b{}\b", regex::escape(&entry.term));
        match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(pattern) => compiled.push(CompiledRule {
                pattern,
                replacement: entry.translation.clone(),
                term: entry.term.clone(),
            }),
            Err(e) => {
                tracing::warn!(term = %entry.term, error = %e, "skipping uncompilable glossary term");
            }
        }
    }
    compiled
}

/// Apply compiled rules sequentially, in the order produced by
/// [`compile_glossary`].
pub fn apply_glossary(text: &str, rules: &[CompiledRule]) -> String {
    let mut result = text.to_string();
    for rule in rules {
        // NoExpand: `$` in a replacement is a literal dollar, not a capture.
        result = rule
            .pattern
            .replace_all(&result, NoExpand(&rule.replacement))
            .into_owned();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(term: &str, translation: &str, priority: i64) -> GlossaryTerm {
        GlossaryTerm {
            term: term.to_string(),
            translation: translation.to_string(),
            priority,
        }
    }

    #[test]
    fn whole_word_case_insensitive() {
        let rules = compile_glossary(&[term("raid", "incursión", 100)]);
        assert_eq!(apply_glossary("Raid tonight, no raiding", &rules), "incursión tonight, no raiding");
    }

    #[test]
    fn priority_order_is_deterministic() {
        // Lower priority runs first; its output is not re-matched by the
        // later, longer term.
        let rules = compile_glossary(&[
            term("application", "solicitud", 200),
            term("app", "aplicación", 10),
        ]);
        assert_eq!(apply_glossary("the application", &rules), "the solicitud");
    }

    #[test]
    fn literal_dollar_in_replacement() {
        let rules = compile_glossary(&[term("price", "$1 cost", 100)]);
        assert_eq!(apply_glossary("the price", &rules), "the $1 cost");
    }

    #[test]
    fn regex_metacharacters_in_term_are_literal() {
        let rules = compile_glossary(&[term("node.js", "nodo", 100)]);
        assert_eq!(apply_glossary("we run node.js here", &rules), "we run nodo here");
        // The '.' is escaped, not a wildcard.
        assert_eq!(apply_glossary("nodexjs is different", &rules), "nodexjs is different");
    }

    #[test]
    fn empty_glossary_is_identity() {
        let rules = compile_glossary(&[]);
        assert_eq!(apply_glossary("untouched", &rules), "untouched");
    }
}
