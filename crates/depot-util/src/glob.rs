//! Simple wildcard matching used by resolution rules and module specifications.
//!
//! Supported syntax:
//! - `*` matches any run of characters, including the empty run
//! - `?` matches exactly one character
//! - `\*` and `\?` match a literal `*` or `?`
//!
//! Matching is anchored to the whole string and case-sensitive. An empty
//! pattern and the lone `*` match everything.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
}

/// A pre-tokenized wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    pattern: String,
    tokens: Vec<Token>,
}

impl Glob {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            tokens: tokenize(pattern),
        }
    }

    /// The pattern text this glob was built from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern matches every input.
    pub fn is_match_all(&self) -> bool {
        self.tokens.is_empty() || self.tokens == [Token::AnyRun]
    }

    /// Whether the pattern contains any unescaped wildcard.
    pub fn has_wildcards(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, Token::AnyOne | Token::AnyRun))
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.is_match_all() {
            return true;
        }
        let text: Vec<char> = text.chars().collect();
        match_tokens(&self.tokens, &text)
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Match `text` against `pattern`. `None` behaves like an empty pattern.
pub fn matches(text: &str, pattern: Option<&str>) -> bool {
    match pattern {
        None => true,
        Some(p) => Glob::new(p).matches(text),
    }
}

/// Whether a string contains unescaped `*` or `?`.
pub fn has_wildcards(pattern: &str) -> bool {
    Glob::new(pattern).has_wildcards()
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&next @ ('*' | '?')) => {
                    chars.next();
                    tokens.push(Token::Literal(next));
                }
                _ => tokens.push(Token::Literal('\\')),
            },
            '*' => {
                // Consecutive stars are equivalent to one
                if tokens.last() != Some(&Token::AnyRun) {
                    tokens.push(Token::AnyRun);
                }
            }
            '?' => tokens.push(Token::AnyOne),
            c => tokens.push(Token::Literal(c)),
        }
    }
    tokens
}

/// Iterative matcher with single-star backtracking.
fn match_tokens(tokens: &[Token], text: &[char]) -> bool {
    let mut t = 0;
    let mut s = 0;
    let mut star: Option<(usize, usize)> = None;

    while s < text.len() {
        match tokens.get(t) {
            Some(Token::Literal(c)) if *c == text[s] => {
                t += 1;
                s += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                s += 1;
            }
            Some(Token::AnyRun) => {
                star = Some((t, s));
                t += 1;
            }
            _ => match star {
                Some((star_t, star_s)) => {
                    t = star_t + 1;
                    s = star_s + 1;
                    star = Some((star_t, star_s + 1));
                }
                None => return false,
            },
        }
    }

    tokens[t..].iter().all(|tok| *tok == Token::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "This is the ? text";

    #[test]
    fn empty_and_star_match_anything() {
        assert!(matches(TEXT, Some("")));
        assert!(matches(TEXT, Some("*")));
        assert!(matches(TEXT, None));
        assert!(matches("", Some("*")));
    }

    #[test]
    fn prefix_star() {
        assert!(matches(TEXT, Some("This*")));
        assert!(!matches(TEXT, Some("That*")));
    }

    #[test]
    fn question_mark_matches_any_single_char() {
        assert!(matches(TEXT, Some("*the ? text*")));
        assert!(matches("This is the ! text", Some("*the ? text*")));
    }

    #[test]
    fn escaped_question_mark_is_literal() {
        assert!(matches(TEXT, Some("*the \\? text*")));
        assert!(!matches("This is the ! text", Some("*the \\? text*")));
    }

    #[test]
    fn escaped_star_is_literal() {
        assert!(matches("a*b", Some("a\\*b")));
        assert!(!matches("axb", Some("a\\*b")));
    }

    #[test]
    fn anchored_and_case_sensitive() {
        assert!(!matches("commons-annotations", Some("annotations")));
        assert!(matches("commons-annotations", Some("*annotations*")));
        assert!(!matches("This", Some("this")));
    }

    #[test]
    fn backtracking_across_multiple_stars() {
        assert!(matches("jcommander", Some("*c?mmand*")));
        assert!(matches("aXbYc", Some("a*b*c")));
        assert!(!matches("aXbY", Some("a*b*c")));
        assert!(matches("abcbc", Some("*bc")));
    }

    #[test]
    fn brackets_and_braces_are_literal() {
        assert!(matches("lib[1]", Some("lib[1]")));
        assert!(!matches("lib1", Some("lib[1]")));
        assert!(matches("a{b,c}", Some("a{b,c}")));
        assert!(!matches("ab", Some("a{b,c}")));
        assert!(matches("org/example.lib", Some("org*lib")));
    }

    #[test]
    fn lone_backslash_is_literal() {
        assert!(matches("a\\b", Some("a\\b")));
        assert!(matches("a\\", Some("a\\")));
    }

    #[test]
    fn wildcard_detection() {
        assert!(has_wildcards("*annotations*"));
        assert!(has_wildcards("c?mmand"));
        assert!(!has_wildcards("jsoup"));
        assert!(!has_wildcards("what\\?"));
        assert!(Glob::new("").is_match_all());
        assert!(Glob::new("**").is_match_all());
    }
}
