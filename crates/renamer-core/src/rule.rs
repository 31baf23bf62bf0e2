use crate::template::{Template, TemplateContext};
use crate::RenameError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One transform in a rule chain: every match of `pattern` is replaced by the expanded `replace`
/// template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub pattern: String,
    #[serde(alias = "Replace")]
    pub replace: String,
}

/// A rule with its pattern compiled and its template parsed.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    regex: Regex,
    template: Template,
}

impl Rule {
    pub fn new(name: &str, pattern: &str, replace: &str) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            pattern: pattern.to_string(),
            replace: replace.to_string(),
        }
    }

    pub fn compile(&self) -> Result<CompiledRule, RenameError> {
        let regex = Regex::new(&self.pattern)
            .map_err(|e| RenameError::invalid_pattern(&self.pattern, &e))?;
        Ok(CompiledRule {
            regex,
            template: Template::parse(&self.replace),
        })
    }

    /// Compiles and applies in one step. Chains keep a [`CompiledRule`] instead.
    pub fn apply(&self, input: &str, ctx: &TemplateContext<'_>) -> Result<String, RenameError> {
        Ok(self.compile()?.apply(input, ctx))
    }
}

impl CompiledRule {
    pub fn apply(&self, input: &str, ctx: &TemplateContext<'_>) -> String {
        let output = self
            .regex
            .replace_all(input, |caps: &Captures<'_>| self.template.render(ctx, Some(caps)));
        debug!("Rule /{}/: '{}' -> '{}'", self.regex.as_str(), input, output);
        output.into_owned()
    }
}

/// Constructors for the common rename rules. Positions and counts are in characters.
pub mod factory {
    use super::Rule;

    pub fn add_prefix(prefix: &str) -> Rule {
        Rule::new("AddPrefix", "^", prefix)
    }

    pub fn add_suffix(suffix: &str) -> Rule {
        Rule::new("AddSuffix", "$", suffix)
    }

    pub fn add_after_pattern(pattern: &str, content: &str) -> Rule {
        Rule::new("AddAfterPattern", &format!("({pattern})"), &format!("${{1}}{content}"))
    }

    pub fn add_before_pattern(pattern: &str, content: &str) -> Rule {
        Rule::new("AddBeforePattern", &format!("({pattern})"), &format!("{content}${{1}}"))
    }

    pub fn add_at_position(position: usize, content: &str) -> Rule {
        Rule::new(
            "AddAtPosition",
            &format!("^(.{{{position}}})(.*)$"),
            &format!("${{1}}{content}${{2}}"),
        )
    }

    pub fn add_before_last_n(n: usize, content: &str) -> Rule {
        Rule::new(
            "AddBeforeLastN",
            &format!("^(.*?)(.{{{n}}})$"),
            &format!("${{1}}{content}${{2}}"),
        )
    }

    pub fn remove_pattern(pattern: &str) -> Rule {
        Rule::new("RemovePattern", pattern, "")
    }

    pub fn remove_numbers() -> Rule {
        Rule::new("RemoveNumbers", r"\d+", "")
    }

    pub fn remove_spaces() -> Rule {
        Rule::new("RemoveSpaces", r"\s+", "")
    }

    pub fn remove_letters() -> Rule {
        Rule::new("RemoveLetters", "[a-zA-Z]+", "")
    }

    pub fn remove_at_position(position: usize) -> Rule {
        Rule::new("RemoveAtPosition", &format!("^(.{{{position}}}).(.*)$"), "${1}${2}")
    }

    pub fn remove_from_end(n: usize) -> Rule {
        Rule::new("RemoveFromEnd", &format!("^(.*?)(.{{{n}}})$"), "${1}")
    }

    pub fn remove_range(start: usize, end: usize) -> Rule {
        let width = end.saturating_sub(start);
        Rule::new("RemoveRange", &format!("^(.{{{start}}}).{{{width}}}(.*)$"), "${1}${2}")
    }

    /// Empties the text between the delimiters and keeps the delimiters.
    pub fn remove_between_delimiters(open: &str, close: &str) -> Rule {
        Rule::new(
            "RemoveBetweenDelimiters",
            &between(open, close),
            &format!("{}{}", literal(open), literal(close)),
        )
    }

    pub fn remove_with_delimiters(open: &str, close: &str) -> Rule {
        Rule::new("RemoveWithDelimiters", &between(open, close), "")
    }

    pub fn replace_pattern(pattern: &str, replacement: &str) -> Rule {
        Rule::new("ReplacePattern", pattern, replacement)
    }

    pub fn replace_spaces(replacement: &str) -> Rule {
        Rule::new("ReplaceSpaces", r"\s+", replacement)
    }

    pub fn replace_numbers(replacement: &str) -> Rule {
        Rule::new("ReplaceNumbers", r"\d", replacement)
    }

    pub fn replace_letters(replacement: &str) -> Rule {
        Rule::new("ReplaceLetters", "[a-zA-Z]", replacement)
    }

    pub fn replace_at_position(position: usize, replacement: &str) -> Rule {
        Rule::new(
            "ReplaceAtPosition",
            &format!("^(.{{{position}}}).(.*)$"),
            &format!("${{1}}{replacement}${{2}}"),
        )
    }

    pub fn replace_range(start: usize, end: usize, replacement: &str) -> Rule {
        let width = end.saturating_sub(start);
        Rule::new(
            "ReplaceRange",
            &format!("^(.{{{start}}}).{{{width}}}(.*)$"),
            &format!("${{1}}{replacement}${{2}}"),
        )
    }

    pub fn replace_between_delimiters(open: &str, close: &str, replacement: &str) -> Rule {
        Rule::new(
            "ReplaceBetweenDelimiters",
            &between(open, close),
            &format!("{}{replacement}{}", literal(open), literal(close)),
        )
    }

    fn between(open: &str, close: &str) -> String {
        format!("{}.*?{}", regex::escape(open), regex::escape(close))
    }

    // Delimiters are written back through the template, where `$` and braces are syntax.
    fn literal(delimiter: &str) -> String {
        delimiter
            .replace('$', "$$")
            .replace('{', "{{")
            .replace('}', "}}")
    }
}
