//! Wildcard pattern matching with numbered captures.
//!
//! Grammar:
//! - `?` one non-slash character.
//! - `*` zero-or-more non-slash characters.
//! - `**` zero-or-more any characters, including `/`.
//! - `{a,b,c}` alternation; alternatives may themselves contain wildcards.
//! - Character ranges `[...]` are rejected at compile time.
//!
//! A pattern is anchored to the start of the candidate if its source
//! contains a `/`; otherwise it matches any single path component.

use crate::Error;
use crate::Result;

/// One segment of a compiled pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `?`
    AnyChar,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `{alt1,alt2,...}`, each alternative itself a list of segments.
    Alternation(Vec<Vec<Segment>>),
}

/// A compiled wildcard pattern. Immutable after compilation.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
    /// Number of captures this pattern produces, in source order.
    capture_count: usize,
    anchored: bool,
    /// The source ended in `/`: restrict matches to directory-like targets.
    dir_only: bool,
}

impl Pattern {
    /// Compile a single wildcard expression.
    pub fn compile(source: &str) -> Result<Self> {
        if source.contains('[') || source.contains(']') {
            return Err(Error::Config(format!(
                "unsupported pattern syntax (character ranges): {}",
                source
            )));
        }
        let dir_only = source.ends_with('/') && source.len() > 1;
        let body = if dir_only {
            &source[..source.len() - 1]
        } else {
            source
        };
        let anchored = body.contains('/');
        let (segments, capture_count) = parse_segments(body, 0)?;
        Ok(Pattern {
            source: source.to_string(),
            segments,
            capture_count,
            anchored,
            dir_only,
        })
    }

    /// Original source text this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of captures produced by a successful match.
    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    /// Attempt to match `candidate`. Returns the ordered capture list on
    /// success.
    pub fn matches(&self, candidate: &str) -> Option<Vec<String>> {
        if self.dir_only && candidate.is_empty() {
            return None;
        }
        let mut captures = Vec::with_capacity(self.capture_count);
        if self.anchored {
            let ok = match_cps(&self.segments, candidate, &mut captures, &mut |rest, _| {
                rest.is_empty()
            });
            if ok {
                Some(captures)
            } else {
                None
            }
        } else {
            // Unanchored: try matching any single path component.
            for component in candidate.split('/') {
                captures.clear();
                let ok = match_cps(&self.segments, component, &mut captures, &mut |rest, _| {
                    rest.is_empty()
                });
                if ok {
                    return Some(captures);
                }
            }
            None
        }
    }
}

/// Parse a bracket-free pattern body into segments, returning the segments
/// and the number of capturing constructs found (in source order).
fn parse_segments(body: &str, mut capture_index: usize) -> Result<(Vec<Segment>, usize)> {
    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                flush_literal(&mut segments, &mut literal);
                if i + 1 < chars.len() && chars[i + 1] == '*' {
                    segments.push(Segment::DoubleStar);
                    i += 2;
                } else {
                    segments.push(Segment::Star);
                    i += 1;
                }
                capture_index += 1;
            }
            '?' => {
                flush_literal(&mut segments, &mut literal);
                segments.push(Segment::AnyChar);
                i += 1;
                capture_index += 1;
            }
            '{' => {
                flush_literal(&mut segments, &mut literal);
                let end = find_matching_brace(&chars, i)?;
                let inner: String = chars[i + 1..end].iter().collect();
                let alt_strs = split_top_level_commas(&inner);
                let mut alts = Vec::with_capacity(alt_strs.len());
                for alt in alt_strs {
                    // Wildcards nested inside an alternative do not get
                    // their own positional captures: only the alternative's
                    // full matched text is captured, as a single slot.
                    let (alt_segments, _) = parse_segments(&alt, 0)?;
                    alts.push(alt_segments);
                }
                segments.push(Segment::Alternation(alts));
                // The alternation itself is one positional capture.
                capture_index += 1;
                i = end + 1;
            }
            '}' => {
                return Err(Error::Config(format!(
                    "unmatched '}}' in pattern: {}",
                    body
                )));
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    flush_literal(&mut segments, &mut literal);
    Ok((segments, capture_index))
}

fn flush_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn find_matching_brace(chars: &[char], open: usize) -> Result<usize> {
    let mut depth = 0;
    for (offset, &c) in chars[open..].iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset);
                }
            }
            _ => {}
        }
    }
    Err(Error::Config(format!(
        "unmatched '{{' in pattern starting at index {}",
        open
    )))
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Continuation-passing backtracking matcher. Tries to match `segments`
/// against a prefix of `text`; for every way it can do so, invokes `cont`
/// with the unconsumed remainder and the captures gathered so far (which
/// includes captures appended by this call). Returns whether any attempt
/// made `cont` succeed; captures are left populated for that successful
/// attempt (and popped back out on backtracking).
fn match_cps(
    segments: &[Segment],
    text: &str,
    captures: &mut Vec<String>,
    cont: &mut dyn FnMut(&str, &mut Vec<String>) -> bool,
) -> bool {
    match segments.split_first() {
        None => cont(text, captures),
        Some((Segment::Literal(lit), rest)) => match text.strip_prefix(lit.as_str()) {
            Some(remainder) => match_cps(rest, remainder, captures, cont),
            None => false,
        },
        Some((Segment::AnyChar, rest)) => {
            let mut chars = text.chars();
            match chars.next() {
                Some(c) if c != '/' => {
                    let remainder = &text[c.len_utf8()..];
                    captures.push(c.to_string());
                    let ok = match_cps(rest, remainder, captures, cont);
                    if !ok {
                        captures.pop();
                    }
                    ok
                }
                _ => false,
            }
        }
        Some((Segment::Star, rest)) => match_greedy(rest, text, captures, cont, false),
        Some((Segment::DoubleStar, rest)) => match_greedy(rest, text, captures, cont, true),
        Some((Segment::Alternation(alts), rest)) => {
            for alt in alts {
                let mut scratch = Vec::new();
                let found = match_cps(alt, text, &mut scratch, &mut |after_alt, _| {
                    let consumed = text.len() - after_alt.len();
                    captures.push(text[..consumed].to_string());
                    let ok = match_cps(rest, after_alt, captures, cont);
                    if !ok {
                        captures.pop();
                    }
                    ok
                });
                if found {
                    return true;
                }
            }
            false
        }
    }
}

/// Greedy matching for `*`/`**`: try the longest consumable run first, then
/// backtrack to shorter runs until the continuation succeeds.
fn match_greedy(
    rest: &[Segment],
    text: &str,
    captures: &mut Vec<String>,
    cont: &mut dyn FnMut(&str, &mut Vec<String>) -> bool,
    any_char: bool,
) -> bool {
    let limit = if any_char {
        text.len()
    } else {
        text.find('/').unwrap_or(text.len())
    };
    // `limit` may split a multi-byte char; step back to a char boundary.
    let mut boundaries: Vec<usize> = (0..=limit).filter(|&i| text.is_char_boundary(i)).collect();
    boundaries.reverse();
    for take in boundaries {
        let (consumed, remainder) = text.split_at(take);
        captures.push(consumed.to_string());
        let ok = match_cps(rest, remainder, captures, cont);
        if ok {
            return true;
        }
        captures.pop();
    }
    false
}

/// One entry of a [`PatternSequence`]: a pattern plus its polarity.
#[derive(Clone, Debug)]
struct SequenceEntry {
    pattern: Pattern,
    negative: bool,
}

/// An ordered, semicolon-separated sequence of patterns, each optionally
/// negated with a leading `!`.
#[derive(Clone, Debug)]
pub struct PatternSequence {
    entries: Vec<SequenceEntry>,
}

/// Outcome of evaluating a [`PatternSequence`] against a candidate string.
pub struct SequenceMatch {
    /// Captures of the first positive entry that matched, or empty if the
    /// sequence matched only because it was all-negative-and-none-matched.
    pub captures: Vec<String>,
}

impl PatternSequence {
    /// Compile a semicolon-separated sequence such as `main;!main-stale`.
    pub fn compile(source: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for raw in source.split(';') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let (negative, text) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            entries.push(SequenceEntry {
                pattern: Pattern::compile(text)?,
                negative,
            });
        }
        Ok(PatternSequence { entries })
    }

    /// Evaluate the sequence against `candidate`.
    ///
    /// Scans left to right. If any negative entry matches, the whole
    /// sequence is a no-match. Otherwise the first positive match wins. A
    /// sequence with only negative entries, none of which matched, is
    /// treated as an implicit match against a trailing `**` (empty
    /// captures) — this also covers the empty sequence.
    pub fn eval(&self, candidate: &str) -> Option<SequenceMatch> {
        let mut first_positive: Option<Vec<String>> = None;
        let mut any_negative = false;
        let mut all_negative = true;
        for entry in &self.entries {
            if !entry.negative {
                all_negative = false;
            }
            if let Some(captures) = entry.pattern.matches(candidate) {
                if entry.negative {
                    any_negative = true;
                } else if first_positive.is_none() {
                    first_positive = Some(captures);
                }
            }
        }
        if any_negative {
            return None;
        }
        if let Some(captures) = first_positive {
            return Some(SequenceMatch { captures });
        }
        if all_negative {
            return Some(SequenceMatch {
                captures: Vec::new(),
            });
        }
        None
    }
}
