#![forbid(unsafe_code)]

//! Compound CSS-like selectors.
//!
//! Supported grammar (whitespace only around commas):
//!
//! ```text
//! list     := compound ("," compound)*
//! compound := (tag | "*")? simple* negation*
//! simple   := "#" ident | "." ident | "[" ident ("=" value)? "]"
//! negation := ":not(" (tag | simple) ")"
//! value    := ident | '"' .. '"' | "'" .. "'"
//! ```
//!
//! Combinators (descendant, child, sibling) are rejected: callers scope
//! queries by passing a root element instead.
//!
//! # Failure Modes
//!
//! | Input | Error |
//! |-------|-------|
//! | `""` or `"a,,b"` | [`SelectorError::Empty`] |
//! | `"div p"` | [`SelectorError::UnsupportedCombinator`] |
//! | `"[href"` | [`SelectorError::Unterminated`] |
//! | `"a:hover"` | [`SelectorError::UnsupportedPseudo`] |

use std::fmt;

/// Errors produced while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// A selector (or one entry of a list) was empty.
    Empty,
    /// A character that cannot start or continue a selector part.
    UnexpectedChar { ch: char, pos: usize },
    /// A bracket, quote or `:not(` was never closed.
    Unterminated { pos: usize },
    /// Whitespace, `>`, `+` or `~` between compound selectors.
    UnsupportedCombinator { pos: usize },
    /// A pseudo-class other than `:not(..)`.
    UnsupportedPseudo(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty selector"),
            Self::UnexpectedChar { ch, pos } => {
                write!(f, "unexpected character '{ch}' at offset {pos}")
            }
            Self::Unterminated { pos } => write!(f, "unterminated selector part at offset {pos}"),
            Self::UnsupportedCombinator { pos } => {
                write!(f, "combinators are not supported (offset {pos})")
            }
            Self::UnsupportedPseudo(name) => write!(f, "unsupported pseudo-class ':{name}'"),
        }
    }
}

impl std::error::Error for SelectorError {}

/// One condition inside a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Id(String),
    Class(String),
    /// `[name]` when `value` is `None`, `[name=value]` otherwise.
    Attr { name: String, value: Option<String> },
}

/// A compound selector: every positive part must match, no negated part may.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub parts: Vec<SimpleSelector>,
    pub negated: Vec<SimpleSelector>,
}

/// A comma-separated selector list; matches when any entry matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorList {
    entries: Vec<CompoundSelector>,
}

/// Read-only view of an element used for matching.
pub trait ElementView {
    fn tag(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool;
}

impl SimpleSelector {
    fn matches(&self, el: &impl ElementView) -> bool {
        match self {
            Self::Tag(tag) => el.tag().eq_ignore_ascii_case(tag),
            Self::Id(id) => el.attribute("id") == Some(id.as_str()),
            Self::Class(class) => el.has_class(class),
            Self::Attr { name, value: None } => el.attribute(name).is_some(),
            Self::Attr {
                name,
                value: Some(value),
            } => el.attribute(name) == Some(value.as_str()),
        }
    }
}

impl CompoundSelector {
    /// Whether `el` satisfies this compound selector.
    pub fn matches(&self, el: &impl ElementView) -> bool {
        self.parts.iter().all(|p| p.matches(el)) && !self.negated.iter().any(|n| n.matches(el))
    }
}

impl SelectorList {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut entries = Vec::new();
        let mut offset = 0;
        for raw in input.split(',') {
            let leading = raw.len() - raw.trim_start().len();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(SelectorError::Empty);
            }
            entries.push(Parser::new(trimmed, offset + leading).compound()?);
            offset += raw.len() + 1;
        }
        Ok(Self { entries })
    }

    /// Append every entry of `other`.
    pub fn extend(&mut self, other: SelectorList) {
        self.entries.extend(other.entries);
    }

    /// Whether `el` matches any entry.
    pub fn matches(&self, el: &impl ElementView) -> bool {
        self.entries.iter().any(|e| e.matches(el))
    }

    /// Number of compound entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries (never matches).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::str::FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    base: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, base: usize) -> Self {
        Self { src, pos: 0, base }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(ch) => SelectorError::UnexpectedChar {
                    ch,
                    pos: self.offset(),
                },
                None => SelectorError::Unterminated { pos: self.offset() },
            });
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn compound(mut self) -> Result<CompoundSelector, SelectorError> {
        let mut sel = CompoundSelector::default();
        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_char(c) => sel.parts.push(SimpleSelector::Tag(self.ident()?)),
            _ => {}
        }
        while let Some(c) = self.peek() {
            match c {
                ':' => {
                    self.bump();
                    sel.negated.push(self.negation()?);
                }
                c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                    return Err(SelectorError::UnsupportedCombinator { pos: self.offset() });
                }
                _ => sel.parts.push(self.simple()?),
            }
        }
        if sel.parts.is_empty() && sel.negated.is_empty() && !self.src.starts_with('*') {
            return Err(SelectorError::Empty);
        }
        Ok(sel)
    }

    fn simple(&mut self) -> Result<SimpleSelector, SelectorError> {
        let pos = self.offset();
        match self.bump() {
            Some('#') => Ok(SimpleSelector::Id(self.ident()?)),
            Some('.') => Ok(SimpleSelector::Class(self.ident()?)),
            Some('[') => self.attribute(pos),
            Some(ch) => Err(SelectorError::UnexpectedChar { ch, pos }),
            None => Err(SelectorError::Unterminated { pos }),
        }
    }

    fn attribute(&mut self, open: usize) -> Result<SimpleSelector, SelectorError> {
        let name = self.ident()?;
        let value = match self.bump() {
            Some(']') => return Ok(SimpleSelector::Attr { name, value: None }),
            Some('=') => self.value(open)?,
            Some(ch) => {
                return Err(SelectorError::UnexpectedChar {
                    ch,
                    pos: self.offset() - ch.len_utf8(),
                });
            }
            None => return Err(SelectorError::Unterminated { pos: open }),
        };
        match self.bump() {
            Some(']') => Ok(SimpleSelector::Attr {
                name,
                value: Some(value),
            }),
            _ => Err(SelectorError::Unterminated { pos: open }),
        }
    }

    fn value(&mut self, open: usize) -> Result<String, SelectorError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == q => return Ok(self.src[start..self.pos - 1].to_string()),
                        Some(_) => {}
                        None => return Err(SelectorError::Unterminated { pos: open }),
                    }
                }
            }
            _ => self.ident(),
        }
    }

    fn negation(&mut self) -> Result<SimpleSelector, SelectorError> {
        let pos = self.offset();
        let name = self.ident()?;
        if name != "not" {
            return Err(SelectorError::UnsupportedPseudo(name));
        }
        if self.bump() != Some('(') {
            return Err(SelectorError::Unterminated { pos });
        }
        let inner = match self.peek() {
            Some(c) if is_ident_char(c) => SimpleSelector::Tag(self.ident()?),
            _ => self.simple()?,
        };
        if self.bump() != Some(')') {
            return Err(SelectorError::Unterminated { pos });
        }
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;

    struct El {
        tag: &'static str,
        attrs: AHashMap<&'static str, &'static str>,
        classes: Vec<&'static str>,
    }

    impl El {
        fn new(tag: &'static str) -> Self {
            Self {
                tag,
                attrs: AHashMap::new(),
                classes: Vec::new(),
            }
        }

        fn attr(mut self, k: &'static str, v: &'static str) -> Self {
            self.attrs.insert(k, v);
            self
        }

        fn class(mut self, c: &'static str) -> Self {
            self.classes.push(c);
            self
        }
    }

    impl ElementView for El {
        fn tag(&self) -> &str {
            self.tag
        }
        fn attribute(&self, name: &str) -> Option<&str> {
            self.attrs.get(name).copied()
        }
        fn has_class(&self, class: &str) -> bool {
            self.classes.contains(&class)
        }
    }

    #[test]
    fn tag_with_attribute() {
        let sel = SelectorList::parse("a[href]").unwrap();
        assert!(sel.matches(&El::new("a").attr("href", "#x")));
        assert!(!sel.matches(&El::new("a")));
        assert!(!sel.matches(&El::new("button").attr("href", "#x")));
    }

    #[test]
    fn negated_attribute_value() {
        let sel = SelectorList::parse("[tabindex]:not([tabindex='-1'])").unwrap();
        assert!(sel.matches(&El::new("div").attr("tabindex", "0")));
        assert!(!sel.matches(&El::new("div").attr("tabindex", "-1")));
        assert!(!sel.matches(&El::new("div")));
    }

    #[test]
    fn list_matches_any_entry() {
        let sel = SelectorList::parse("button:not([disabled]), .primary").unwrap();
        assert_eq!(sel.len(), 2);
        assert!(sel.matches(&El::new("button")));
        assert!(!sel.matches(&El::new("button").attr("disabled", "")));
        assert!(sel.matches(&El::new("span").class("primary")));
    }

    #[test]
    fn id_and_class_compound() {
        let sel = SelectorList::parse("div#ok.btn").unwrap();
        assert!(sel.matches(&El::new("div").attr("id", "ok").class("btn")));
        assert!(!sel.matches(&El::new("div").attr("id", "ok")));
    }

    #[test]
    fn universal_matches_everything() {
        let sel = SelectorList::parse("*").unwrap();
        assert!(sel.matches(&El::new("p")));
    }

    #[test]
    fn rejects_combinators_and_junk() {
        assert_eq!(
            SelectorList::parse("div p"),
            Err(SelectorError::UnsupportedCombinator { pos: 3 })
        );
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("a,,b"), Err(SelectorError::Empty));
        assert!(matches!(
            SelectorList::parse("[href"),
            Err(SelectorError::Unterminated { .. })
        ));
        assert_eq!(
            SelectorList::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudo("hover".into()))
        );
    }

    #[test]
    fn error_display() {
        let err = SelectorList::parse("a:focus").unwrap_err();
        assert_eq!(err.to_string(), "unsupported pseudo-class ':focus'");
    }

    proptest::proptest! {
        #[test]
        fn parse_never_panics(input in ".{0,40}") {
            let _ = SelectorList::parse(&input);
        }

        #[test]
        fn class_selector_matches_its_class(name in "[a-z][a-z0-9_-]{0,12}") {
            let sel = SelectorList::parse(&format!(".{name}")).unwrap();
            let class: &'static str = Box::leak(name.into_boxed_str());
            proptest::prop_assert!(sel.matches(&El::new("div").class(class)));
            proptest::prop_assert!(!sel.matches(&El::new("div")));
        }
    }
}
