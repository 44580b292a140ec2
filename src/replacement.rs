//! Perl-style match patterns and substitution rules.
//!
//! Mapping rules carry their regular expressions in the delimited notation
//! used by cataloguing preference files:
//!
//! - a match pattern is `/regex/flags`, `m#regex#flags`, or a bare regex
//! - a replacement rule is `s/pattern/template/flags`, where the character
//!   following `s` is the delimiter and a backslash escapes it
//!
//! Both are compiled once, when the owning mapping is built. A rule that does
//! not split into exactly pattern and template is rejected at that point
//! instead of on every value.
//!
//! # Examples
//!
//! ```
//! use marcmap::replacement::{MatchPattern, Replacement};
//!
//! let strip_prefix = Replacement::parse(r"s/^\(DE-588\)//").unwrap();
//! assert_eq!(strip_prefix.apply("(DE-588)115747876X"), "115747876X");
//!
//! let gnd = MatchPattern::parse("/DE-588/").unwrap();
//! assert!(gnd.is_match("(DE-588)115747876X"));
//! ```

use crate::error::{MarcError, Result};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// A compiled match pattern with "contains" semantics.
#[derive(Clone)]
pub struct MatchPattern {
    source: String,
    regex: Regex,
}

/// A compiled global substitution.
#[derive(Clone)]
pub struct Replacement {
    source: String,
    regex: Regex,
    template: String,
}

/// Regex flags carried after the closing delimiter.
#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
    ignore_whitespace: bool,
}

impl Flags {
    /// Parse a flag suffix. `g` and `o` are accepted and ignored.
    fn parse(raw: &str) -> std::result::Result<Self, String> {
        let mut flags = Flags::default();
        for c in raw.chars() {
            match c {
                'i' => flags.case_insensitive = true,
                'm' => flags.multi_line = true,
                's' => flags.dot_matches_new_line = true,
                'x' => flags.ignore_whitespace = true,
                'g' | 'o' => {},
                other => return Err(format!("unsupported flag '{other}'")),
            }
        }
        Ok(flags)
    }

    fn compile(self, pattern: &str) -> std::result::Result<Regex, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
            .build()
    }
}

/// Characters that may open a delimited expression.
fn is_delimiter(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && c != '\\'
}

/// Split `body` on unescaped `delimiter` characters.
///
/// An escaped delimiter is unescaped, unless the delimiter is itself a regex
/// metacharacter, in which case the escape is kept so the regex still reads
/// it literally. Every other escape sequence passes through untouched.
fn split_delimited(body: &str, delimiter: char) -> Vec<String> {
    let keep_escape = regex::escape(&delimiter.to_string()).len() > delimiter.len_utf8();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if next == delimiter => {
                    if keep_escape {
                        current.push('\\');
                    }
                    current.push(next);
                },
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                },
                None => current.push('\\'),
            }
        } else if c == delimiter {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Rewrite a Perl substitution template into `regex` replacement syntax.
///
/// `$1` and `\1` become `${1}`, `$&` becomes `${0}`, and a `$` that does not
/// start a group reference is made literal.
fn convert_template(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                },
                Some('$') => out.push_str("$$"),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '$' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    while let Some(&d) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        out.push(d);
                        chars.next();
                    }
                    out.push('}');
                },
                Some('{') => out.push('$'),
                Some('&') => {
                    chars.next();
                    out.push_str("${0}");
                },
                _ => out.push_str("$$"),
            },
            other => out.push(other),
        }
    }
    out
}

impl MatchPattern {
    /// Parse and compile a match pattern.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidPattern`] if the delimiters are unbalanced,
    /// a flag is unknown, or the regex does not compile.
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        let invalid = |reason: String| MarcError::InvalidPattern {
            pattern: spec.to_string(),
            reason,
        };

        let (pattern, flags) = match delimited_match(trimmed) {
            Some((delimiter, body)) => {
                let parts = split_delimited(body, delimiter);
                match parts.as_slice() {
                    [pattern, flags] => (pattern.clone(), Flags::parse(flags).map_err(invalid)?),
                    // `m` followed by punctuation can also be an ordinary regex
                    _ if delimiter != '/' => (trimmed.to_string(), Flags::default()),
                    _ => {
                        return Err(invalid(format!(
                            "expected exactly one closing '{delimiter}'"
                        )))
                    },
                }
            },
            None => (trimmed.to_string(), Flags::default()),
        };

        let regex = flags
            .compile(&pattern)
            .map_err(|e| invalid(e.to_string()))?;
        Ok(MatchPattern {
            source: spec.to_string(),
            regex,
        })
    }

    /// Returns `true` if the pattern occurs anywhere in `value`.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The pattern as it was configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Recognise `/body` and `m<d>body` forms, returning the delimiter and the
/// text following the opening delimiter.
fn delimited_match(spec: &str) -> Option<(char, &str)> {
    let mut chars = spec.chars();
    match chars.next()? {
        '/' if spec.len() > 1 => Some(('/', &spec[1..])),
        'm' => {
            let delimiter = chars.next()?;
            if is_delimiter(delimiter) {
                Some((delimiter, &spec[1 + delimiter.len_utf8()..]))
            } else {
                None
            }
        },
        _ => None,
    }
}

impl Replacement {
    /// Parse and compile a `s/pattern/template/flags` rule.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidReplacement`] if the rule does not encode
    /// exactly a pattern and a template, carries an unknown flag, or the
    /// pattern does not compile.
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        let invalid = |reason: String| MarcError::InvalidReplacement {
            rule: spec.to_string(),
            reason,
        };

        let mut chars = trimmed.chars();
        if chars.next() != Some('s') {
            return Err(invalid("must start with 's'".to_string()));
        }
        let delimiter = chars
            .next()
            .filter(|c| is_delimiter(*c))
            .ok_or_else(|| invalid("missing delimiter after 's'".to_string()))?;

        let body = &trimmed[1 + delimiter.len_utf8()..];
        let parts = split_delimited(body, delimiter);
        if parts.len() != 3 {
            return Err(invalid(format!(
                "expected pattern and template separated by '{delimiter}', found {} part(s)",
                parts.len()
            )));
        }

        let flags = Flags::parse(&parts[2]).map_err(invalid)?;
        let regex = flags
            .compile(&parts[0])
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Replacement {
            source: spec.to_string(),
            regex,
            template: convert_template(&parts[1]),
        })
    }

    /// Parse an optional rule; a blank spec means "no replacement".
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidReplacement`] for a non-blank malformed rule.
    pub fn parse_optional(spec: Option<&str>) -> Result<Option<Self>> {
        match spec.map(str::trim) {
            None | Some("") => Ok(None),
            Some(rule) => Replacement::parse(rule).map(Some),
        }
    }

    /// Substitute every match of the pattern in `input`.
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        self.regex
            .replace_all(input, self.template.as_str())
            .into_owned()
    }

    /// The rule as it was configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Apply an optional replacement, returning the input unchanged when absent.
#[must_use]
pub fn apply(rule: Option<&Replacement>, input: &str) -> String {
    rule.map_or_else(|| input.to_string(), |r| r.apply(input))
}

impl fmt::Debug for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MatchPattern").field(&self.source).finish()
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Replacement").field(&self.source).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_authority_prefix() {
        let rule = Replacement::parse(r"s/\(DE-588\)//g").unwrap();
        assert_eq!(rule.apply("(DE-588)115747876X"), "115747876X");
        assert_eq!(rule.apply("115747876X"), "115747876X");
    }

    #[test]
    fn test_substitution_is_global() {
        let rule = Replacement::parse("s/-//").unwrap();
        assert_eq!(rule.apply("978-3-16-148410-0"), "9783161484100");
    }

    #[test]
    fn test_group_references() {
        let rule = Replacement::parse(r"s/^(\w+), (\w+)$/$2 $1/").unwrap();
        assert_eq!(rule.apply("Kutschmann, Theodor"), "Theodor Kutschmann");

        let rule = Replacement::parse(r"s/^(\d{4}).*/\1/").unwrap();
        assert_eq!(rule.apply("1999-2001"), "1999");

        let rule = Replacement::parse(r"s/(\d+)/[$1x]/").unwrap();
        assert_eq!(rule.apply("page 12"), "page [12x]");
    }

    #[test]
    fn test_alternative_delimiter_and_escapes() {
        let rule = Replacement::parse(r"s#http://d-nb.info/gnd/##").unwrap();
        assert_eq!(rule.apply("http://d-nb.info/gnd/118540238"), "118540238");

        let rule = Replacement::parse(r"s/a\/b/a-b/").unwrap();
        assert_eq!(rule.apply("a/b"), "a-b");

        let rule = Replacement::parse(r"s|a\|b|x|").unwrap();
        assert_eq!(rule.apply("a|b"), "x");
    }

    #[test]
    fn test_literal_dollar_in_template() {
        let rule = Replacement::parse("s/USD/$/").unwrap();
        assert_eq!(rule.apply("10 USD"), "10 $");
    }

    #[test]
    fn test_case_insensitive_flag() {
        let rule = Replacement::parse("s/^the //gi").unwrap();
        assert_eq!(rule.apply("The Hobbit"), "Hobbit");
    }

    #[test]
    fn test_malformed_replacements_are_rejected() {
        for spec in ["", "x/a/b/", "s", "s/a", "s/a/b", "s/a/b/c/d", "s/(/x/", "s/a/b/q"] {
            assert!(
                matches!(
                    Replacement::parse(spec),
                    Err(MarcError::InvalidReplacement { .. })
                ),
                "expected {spec:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_optional_replacement() {
        assert!(Replacement::parse_optional(None).unwrap().is_none());
        assert!(Replacement::parse_optional(Some("  ")).unwrap().is_none());
        assert!(Replacement::parse_optional(Some("s/a/b/")).unwrap().is_some());
        assert!(Replacement::parse_optional(Some("s/a")).is_err());
        assert_eq!(apply(None, "unchanged"), "unchanged");
    }

    #[test]
    fn test_match_pattern_forms() {
        let slashed = MatchPattern::parse("/aut/").unwrap();
        assert!(slashed.is_match("aut"));
        assert!(slashed.is_match("xaut"));
        assert!(!slashed.is_match("edt"));

        let bare = MatchPattern::parse("^DE-588").unwrap();
        assert!(bare.is_match("DE-588"));
        assert!(!bare.is_match("(DE-588)"));

        let with_m = MatchPattern::parse("m#^\\(DE-588\\)#").unwrap();
        assert!(with_m.is_match("(DE-588)1234"));

        let insensitive = MatchPattern::parse("/gnd/i").unwrap();
        assert!(insensitive.is_match("GND"));
    }

    #[test]
    fn test_match_pattern_rejects_bad_input() {
        assert!(MatchPattern::parse("/a/b/").is_err());
        assert!(MatchPattern::parse("/(/").is_err());
        assert!(MatchPattern::parse("/a/q").is_err());
    }
}
