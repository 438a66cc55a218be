//! Variable environment: named string values with lazy, cycle-checked
//! substitution.

use crate::Error;
use crate::Result;
use std::collections::HashMap;

/// A named string value that may itself reference other variables.
#[derive(Clone, Debug)]
pub struct Environment {
    raw: HashMap<String, String>,
    /// Insertion order, preserved so later `define` calls of the same
    /// layering step can shadow earlier ones predictably.
    order: Vec<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            raw: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl Environment {
    /// Define (or redefine) a variable's raw value.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.raw.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.raw.insert(name, value.into());
    }

    /// Whether a variable is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.raw.contains_key(name)
    }

    /// Fully resolve every variable's raw value (recursively substituting
    /// other variable references), detecting cycles. Call this once after
    /// all layers have been merged, to fail fast on a cyclic configuration.
    pub fn check_cycles(&self) -> Result<()> {
        for name in &self.order {
            let mut in_progress = Vec::new();
            self.resolve_raw(name, &mut in_progress)?;
        }
        Ok(())
    }

    /// Recursively resolve `name`'s raw value, substituting nested variable
    /// references. Numeric references are not meaningful outside of a match
    /// context and resolve to an empty string here.
    fn resolve_raw(&self, name: &str, in_progress: &mut Vec<String>) -> Result<String> {
        if in_progress.iter().any(|n| n == name) {
            in_progress.push(name.to_string());
            return Err(Error::Config(format!(
                "variable reference cycle: {}",
                in_progress.join(" -> ")
            )));
        }
        let value = match self.raw.get(name) {
            Some(v) => v.clone(),
            None => {
                return Err(Error::Pattern(format!(
                    "reference to undefined variable: {}",
                    name
                )))
            }
        };
        in_progress.push(name.to_string());
        let resolved = self.substitute_refs(&value, &[], &[], in_progress, false)?;
        in_progress.pop();
        Ok(resolved)
    }

    /// Substitute a template in a pattern-compilation context: variables
    /// whose resolved value contains semicolons expand to a brace
    /// alternation (`x;y` -> `{x,y}`).
    pub fn substitute_in_pattern_context(
        &self,
        template: &str,
        captures: &[String],
    ) -> Result<String> {
        let mut in_progress = Vec::new();
        self.substitute_refs(template, captures, &[], &mut in_progress, true)
    }

    /// Substitute a template in a refname context: semicolons in resolved
    /// variable values are left as literal characters.
    pub fn substitute_in_refname_context(
        &self,
        template: &str,
        captures: &[String],
    ) -> Result<String> {
        let mut in_progress = Vec::new();
        self.substitute_refs(template, captures, &[], &mut in_progress, false)
    }

    /// Like [`substitute_in_refname_context`], with additional ad hoc name
    /// bindings (e.g. `rev`, bound per-commit to the HG revision number for
    /// `RevisionRef` templates) that are substituted literally, ahead of
    /// the regular variable environment.
    pub fn substitute_in_refname_context_with_extra(
        &self,
        template: &str,
        captures: &[String],
        extra: &[(&str, &str)],
    ) -> Result<String> {
        let mut in_progress = Vec::new();
        self.substitute_refs(template, captures, extra, &mut in_progress, false)
    }

    /// Core substitution: scans `template` for `$NAME`, `${NAME}`, `$(NAME)`,
    /// and numeric `$n`/`${n}`/`$(n)` references.
    fn substitute_refs(
        &self,
        template: &str,
        captures: &[String],
        extra: &[(&str, &str)],
        in_progress: &mut Vec<String>,
        pattern_context: bool,
    ) -> Result<String> {
        let chars: Vec<char> = template.chars().collect();
        let mut out = String::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] != '$' || i + 1 >= chars.len() {
                out.push(chars[i]);
                i += 1;
                continue;
            }
            let (reference, consumed) = match chars[i + 1] {
                '{' => read_delimited(&chars, i + 2, '}'),
                '(' => read_delimited(&chars, i + 2, ')'),
                c if c.is_ascii_digit() => read_bare_numeric(&chars, i + 1),
                c if is_ident_start(c) => read_bare_ident(&chars, i + 1),
                _ => {
                    out.push('$');
                    i += 1;
                    continue;
                }
            };
            i += consumed;
            if reference.chars().all(|c| c.is_ascii_digit()) && !reference.is_empty() {
                let index: usize = reference.parse().unwrap_or(0);
                if index >= 1 && index <= captures.len() {
                    out.push_str(&captures[index - 1]);
                }
                // Out-of-range captures contribute an empty string.
            } else if let Some((_, value)) = extra.iter().find(|(name, _)| *name == reference) {
                out.push_str(value);
            } else {
                let resolved = self.resolve_with_alternation(&reference, in_progress, pattern_context)?;
                out.push_str(&resolved);
            }
        }
        Ok(out)
    }

    fn resolve_with_alternation(
        &self,
        name: &str,
        in_progress: &mut Vec<String>,
        pattern_context: bool,
    ) -> Result<String> {
        let raw = self.resolve_raw(name, in_progress)?;
        if pattern_context && raw.contains(';') {
            let parts: Vec<&str> = raw.split(';').collect();
            Ok(format!("{{{}}}", parts.join(",")))
        } else {
            Ok(raw)
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Read an identifier (alphabetic reference without braces/parens),
/// terminating at the first non-identifier character.
fn read_bare_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_ident_continue(chars[end]) {
        end += 1;
    }
    let s: String = chars[start..end].iter().collect();
    (s, 1 + (end - start))
}

/// Read a bare numeric reference (`$1`, `$12`, ...).
fn read_bare_numeric(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    let s: String = chars[start..end].iter().collect();
    (s, 1 + (end - start))
}

/// Read up to (and including) the closing delimiter starting right after
/// `${` or `$(`. Returns the inner text and the number of characters
/// consumed counting from (and including) the leading `$`.
fn read_delimited(chars: &[char], start: usize, close: char) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && chars[end] != close {
        end += 1;
    }
    let s: String = chars[start..end].iter().collect();
    let consumed_from_dollar = if end < chars.len() {
        (end + 1) - (start - 2)
    } else {
        end - (start - 2)
    };
    (s, consumed_from_dollar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_captures_substitute_positionally() {
        let env = Environment::default();
        let out = env
            .substitute_in_refname_context("rel-$1/$2", &["2.0".to_string(), "abc".to_string()])
            .unwrap();
        assert_eq!(out, "rel-2.0/abc");
    }

    #[test]
    fn out_of_range_capture_is_empty() {
        let env = Environment::default();
        let out = env.substitute_in_refname_context("x-$5", &[]).unwrap();
        assert_eq!(out, "x-");
    }

    #[test]
    fn pattern_context_expands_semicolons_to_alternation() {
        let mut env = Environment::default();
        env.define("A", "x;y");
        env.define("B", "${A}/z");
        let out = env.substitute_in_pattern_context("$B", &[]).unwrap();
        assert_eq!(out, "{x,y}/z");
    }

    #[test]
    fn refname_context_keeps_semicolons_literal() {
        let mut env = Environment::default();
        env.define("A", "x;y");
        env.define("B", "${A}/z");
        let out = env.substitute_in_refname_context("$B", &[]).unwrap();
        assert_eq!(out, "x;y/z");
    }

    #[test]
    fn cycle_is_detected() {
        let mut env = Environment::default();
        env.define("A", "$B");
        env.define("B", "$A");
        assert!(env.check_cycles().is_err());
    }

    #[test]
    fn identifier_reference_stops_at_non_identifier_char() {
        let mut env = Environment::default();
        env.define("Branches", "refs/heads/");
        let out = env
            .substitute_in_refname_context("$Branches/rel", &[])
            .unwrap();
        assert_eq!(out, "refs/heads//rel");
    }

    #[test]
    fn undefined_variable_reference_is_a_pattern_error() {
        let env = Environment::default();
        let err = env.substitute_in_refname_context("$Typo", &[]).unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }
}
