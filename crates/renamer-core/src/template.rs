use chrono::{Local, NaiveDateTime};
use convert_case::{Case, Casing};
use regex::{Captures, Regex};
use std::str::FromStr;
use tracing::debug;

/// Source of the wall-clock time used by `{date}`, `{time}` and `{datetime}`.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Patterns for the timestamp placeholders, written with `YYYY`, `YY`, `MM`, `DD`, `HH`, `mm`
/// and `ss` tokens. Anything else is copied literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormats {
    pub date: String,
    pub time: String,
    pub datetime: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            date: "YYYY-MM-DD".to_string(),
            time: "HH:mm:ss".to_string(),
            datetime: "YYYY-MM-DD_HH:mm:ss".to_string(),
        }
    }
}

/// Widest zero padding `{index}` accepts. Wider requests are left verbatim.
const MAX_INDEX_PADDING: usize = 255;

/// Everything a placeholder may read while a single file is being renamed.
pub struct TemplateContext<'a> {
    /// Current value of the name being transformed.
    pub name: &'a str,
    /// Extension of the original file, without the leading dot.
    pub ext: &'a str,
    /// Zero-based position of the file within the current generation run.
    pub ordinal: u64,
    pub clock: &'a dyn Clock,
    pub formats: &'a DateFormats,
}

#[derive(Debug, Clone)]
pub enum Placeholder {
    Name,
    Ext,
    Lower,
    Upper,
    Title,
    Snake,
    Kebab,
    Camel,
    Pascal,
    Date,
    Time,
    DateTime,
    Index { start: u64, padding: usize },
    Split { separator: String, index: usize },
    Slice { start: i64, end: Option<i64> },
    Replace { from: String, to: String },
    Regex { regex: Regex, group: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CaptureRef {
    Index(usize),
    Named(String),
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Capture(CaptureRef),
    Placeholder(Placeholder),
}

/// A replacement template parsed once into literal text, capture references and placeholders.
#[derive(Debug, Clone, Default)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Placeholder {
    /// Parses the text between `{` and `}`. Returns `None` for anything that is not a
    /// recognised placeholder, which the template then keeps verbatim.
    pub fn parse(inner: &str) -> Option<Self> {
        let simple = match inner {
            "name" => Some(Self::Name),
            "ext" => Some(Self::Ext),
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            "title" => Some(Self::Title),
            "snake" => Some(Self::Snake),
            "kebab" => Some(Self::Kebab),
            "camel" => Some(Self::Camel),
            "pascal" => Some(Self::Pascal),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "datetime" => Some(Self::DateTime),
            "index" => Some(Self::Index { start: 1, padding: 0 }),
            _ => None,
        };
        if simple.is_some() {
            return simple;
        }

        let (kind, args) = inner.split_once(':')?;
        match kind {
            "index" => {
                let (start, padding) = args.split_once(':').unwrap_or((args, ""));
                Some(Self::Index {
                    start: parse_or(start, 1)?,
                    padding: parse_or(padding, 0).filter(|p| *p <= MAX_INDEX_PADDING)?,
                })
            }
            "split" => {
                let (separator, index) = args.rsplit_once(':')?;
                if separator.is_empty() {
                    return None;
                }
                Some(Self::Split {
                    separator: separator.to_string(),
                    index: index.parse().ok()?,
                })
            }
            "slice" => {
                let (start, end) = match args.split_once(':') {
                    Some((start, end)) if !end.is_empty() => (start, Some(end.parse().ok()?)),
                    Some((start, _)) => (start, None),
                    None => (args, None),
                };
                Some(Self::Slice {
                    start: parse_or(start, 0)?,
                    end,
                })
            }
            "replace" => {
                let (from, to) = args.split_once(':')?;
                if from.is_empty() {
                    return None;
                }
                Some(Self::Replace {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            }
            "regex" => {
                let (expr, group) = args.rsplit_once(':')?;
                let group = group.parse().ok()?;
                match Regex::new(expr) {
                    Ok(regex) => Some(Self::Regex { regex, group }),
                    Err(e) => {
                        debug!("Ignoring regex placeholder '{}': {}", expr, e);
                        None
                    }
                }
            }
            _ => None,
        }
    }

    pub fn evaluate(&self, ctx: &TemplateContext<'_>) -> String {
        let name = ctx.name;
        match self {
            Self::Name => name.to_string(),
            Self::Ext => ctx.ext.to_string(),
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase(),
            Self::Title => title_case(name),
            Self::Snake => name.to_case(Case::Snake),
            Self::Kebab => name.to_case(Case::Kebab),
            Self::Camel => name.to_case(Case::Camel),
            Self::Pascal => name.to_case(Case::Pascal),
            Self::Date => format_timestamp(ctx.clock.now(), &ctx.formats.date),
            Self::Time => format_timestamp(ctx.clock.now(), &ctx.formats.time),
            Self::DateTime => format_timestamp(ctx.clock.now(), &ctx.formats.datetime),
            Self::Index { start, padding } => match start.checked_add(ctx.ordinal) {
                Some(value) => zero_pad(value, *padding),
                None => format!("{{index:{start}:{padding}}}"),
            },
            Self::Split { separator, index } => name
                .split(separator.as_str())
                .nth(*index)
                .unwrap_or_default()
                .to_string(),
            Self::Slice { start, end } => slice_chars(name, *start, *end),
            Self::Replace { from, to } => name.replace(from.as_str(), to),
            Self::Regex { regex, group } => regex
                .captures(name)
                .and_then(|caps| caps.get(*group))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

impl Template {
    /// Single pass over the template. `{...}` is matched with brace depth so nested
    /// quantifiers such as `{regex:\d{2}:0}` stay inside their placeholder. `{{` and `}}`
    /// are literal braces.
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(c) = rest.chars().next() {
            match c {
                '{' | '}' if rest[1..].starts_with(c) => {
                    literal.push(c);
                    rest = &rest[2..];
                }
                '{' => match find_closing_brace(rest) {
                    Some(close) => {
                        let inner = &rest[1..close];
                        match Placeholder::parse(inner) {
                            Some(placeholder) => {
                                flush_literal(&mut literal, &mut segments);
                                segments.push(Segment::Placeholder(placeholder));
                            }
                            None => literal.push_str(&rest[..=close]),
                        }
                        rest = &rest[close + 1..];
                    }
                    None => {
                        literal.push_str(rest);
                        rest = "";
                    }
                },
                '$' if rest.starts_with("$$") => {
                    literal.push('$');
                    rest = &rest[2..];
                }
                '$' => {
                    let (consumed, capture) = parse_capture(rest);
                    match capture {
                        Some(capture) => {
                            flush_literal(&mut literal, &mut segments);
                            segments.push(Segment::Capture(capture));
                        }
                        None => literal.push_str(&rest[..consumed]),
                    }
                    rest = &rest[consumed..];
                }
                _ => {
                    literal.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        flush_literal(&mut literal, &mut segments);

        Self { segments }
    }

    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }

    /// Renders the template. Capture references resolve against `captures` and render empty
    /// when there is no match or the group did not participate.
    pub fn render(&self, ctx: &TemplateContext<'_>, captures: Option<&Captures<'_>>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(placeholder) => out.push_str(&placeholder.evaluate(ctx)),
                Segment::Capture(capture) => {
                    let matched = captures.and_then(|caps| match capture {
                        CaptureRef::Index(i) => caps.get(*i),
                        CaptureRef::Named(n) => caps.name(n),
                    });
                    if let Some(m) = matched {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
        out
    }
}

impl FromStr for Template {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Expands every placeholder in `template` for one file. Never fails; unknown tokens are kept.
pub fn expand(template: &str, ctx: &TemplateContext<'_>) -> String {
    Template::parse(template).render(ctx, None)
}

/// Converts a `YYYY-MM-DD` style pattern into a chrono format string.
pub fn to_chrono_format(pattern: &str) -> String {
    const TOKENS: [(&str, &str); 7] = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while let Some(c) = rest.chars().next() {
        for (token, directive) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(directive);
                rest = tail;
                continue 'outer;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn format_timestamp(now: NaiveDateTime, pattern: &str) -> String {
    now.format(&to_chrono_format(pattern)).to_string()
}

fn zero_pad(value: u64, width: usize) -> String {
    let digits = value.to_string();
    let mut out = "0".repeat(width.saturating_sub(digits.len()));
    out.push_str(&digits);
    out
}

fn parse_or<T: FromStr>(value: &str, default: T) -> Option<T> {
    if value.is_empty() {
        Some(default)
    } else {
        value.parse().ok()
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

/// Character based slice, both bounds clamped to `[0, len]`.
fn slice_chars(s: &str, start: i64, end: Option<i64>) -> String {
    let len = s.chars().count() as i64;
    let start = start.clamp(0, len) as usize;
    let end = end.unwrap_or(len).clamp(0, len) as usize;
    if start >= end {
        return String::new();
    }
    s.chars().skip(start).take(end - start).collect()
}

fn flush_literal(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

/// Byte offset of the `}` closing the `{` at the start of `s`.
fn find_closing_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `$N` or `${N}` / `${name}` at the start of `s`. Returns the number of bytes
/// consumed and the capture, or `None` when the consumed text is literal.
fn parse_capture(s: &str) -> (usize, Option<CaptureRef>) {
    let body = &s[1..];
    if let Some(braced) = body.strip_prefix('{') {
        if let Some(close) = braced.find('}') {
            let name = &braced[..close];
            let consumed = close + 3;
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                let capture = match name.parse::<usize>() {
                    Ok(i) => CaptureRef::Index(i),
                    Err(_) => CaptureRef::Named(name.to_string()),
                };
                return (consumed, Some(capture));
            }
        }
        return (1, None);
    }
    let digits = body.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Ok(i) = body[..digits].parse() {
            return (digits + 1, Some(CaptureRef::Index(i)));
        }
    }
    (1, None)
}
