//! Glob Pattern Matching for Key Lookup
//!
//! Supported syntax (shell style):
//!
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from the class; `[!a]` / `[^a]` negate it
//! - `\x` matches `x` literally
//!
//! An unterminated `[` is matched as a literal bracket.
//!
//! Matching works on `char`s, so `?` consumes one Unicode scalar value rather
//! than one byte. Patterns are compiled once and matched with a single
//! backtracking point per `*`, so matching is O(pattern * key) in the worst case.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyOne => true,
            Token::AnyRun => false,
            Token::Class { negated, ranges } => {
                let hit = ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
                hit != *negated
            }
        }
    }
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    tokens: Vec<Token>,
}

impl GlobPattern {
    /// Compiles `pattern`. Compilation never fails.
    pub fn new(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::with_capacity(chars.len());
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    // Consecutive stars collapse into one
                    if tokens.last() != Some(&Token::AnyRun) {
                        tokens.push(Token::AnyRun);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::AnyOne);
                    i += 1;
                }
                '\\' if i + 1 < chars.len() => {
                    tokens.push(Token::Literal(chars[i + 1]));
                    i += 2;
                }
                '[' => match parse_class(&chars, i) {
                    Some((token, next)) => {
                        tokens.push(token);
                        i = next;
                    }
                    None => {
                        tokens.push(Token::Literal('['));
                        i += 1;
                    }
                },
                c => {
                    tokens.push(Token::Literal(c));
                    i += 1;
                }
            }
        }

        Self { tokens }
    }

    /// Returns true if the whole of `text` matches the pattern.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let (mut p, mut t) = (0usize, 0usize);
        // Position of the last `*` seen and the text index it is currently absorbing up to
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            if let Some(token) = self.tokens.get(p) {
                if *token == Token::AnyRun {
                    backtrack = Some((p, t));
                    p += 1;
                    continue;
                }
                if token.matches(text[t]) {
                    p += 1;
                    t += 1;
                    continue;
                }
            }

            match backtrack {
                Some((star, absorbed)) => {
                    p = star + 1;
                    t = absorbed + 1;
                    backtrack = Some((star, absorbed + 1));
                }
                None => return false,
            }
        }

        self.tokens[p..].iter().all(|tok| *tok == Token::AnyRun)
    }
}

/// Parses a `[...]` class starting at `start`. Returns the token and the index
/// just past the closing bracket, or `None` if the class is unterminated.
fn parse_class(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start + 1;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;

    while i < chars.len() {
        let c = chars[i];
        // A `]` right after the opening bracket is a member, not the terminator
        if c == ']' && !first {
            return Some((Token::Class { negated, ranges }, i + 1));
        }
        first = false;

        let lo = if c == '\\' && i + 1 < chars.len() {
            i += 1;
            chars[i]
        } else {
            c
        };

        if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i + 2] != ']' {
            let hi = chars[i + 2];
            ranges.push((lo.min(hi), lo.max(hi)));
            i += 3;
        } else {
            ranges.push((lo, lo));
            i += 1;
        }
    }

    None
}
