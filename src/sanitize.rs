//! Refname sanitization: character-replacement rules plus the
//! normalization needed to guarantee a valid Git refname.

use crate::Error;
use crate::Result;

/// A single character-replacement rule: `chars` occurrences are replaced by
/// `with`.
#[derive(Clone, Debug)]
pub struct ReplaceRule {
    /// The substring to replace.
    pub chars: String,
    /// Its replacement.
    pub with: String,
}

/// Applies an ordered list of [`ReplaceRule`]s, then normalizes and
/// validates the result as a Git refname.
#[derive(Clone, Debug, Default)]
pub struct Sanitizer {
    rules: Vec<ReplaceRule>,
}

impl Sanitizer {
    /// Build a sanitizer from rules already ordered hardcoded-defaults,
    /// then Default-section, then Project-section.
    pub fn new(rules: Vec<ReplaceRule>) -> Self {
        Sanitizer { rules }
    }

    /// Apply the rules, prepend `refs/` if missing, collapse redundant
    /// slashes, and validate against Git's refname grammar.
    pub fn apply(&self, candidate: &str) -> Result<String> {
        let mut s = candidate.to_string();
        for rule in &self.rules {
            if !rule.chars.is_empty() {
                s = s.replace(rule.chars.as_str(), rule.with.as_str());
            }
        }
        if !s.starts_with("refs/") {
            s = format!("refs/{}", s.trim_start_matches('/'));
        }
        s = collapse_slashes(&s);
        s = s.trim_end_matches('/').to_string();
        validate_refname(&s)?;
        Ok(s)
    }
}

fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_slash = false;
    for c in s.chars() {
        if c == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        out.push(c);
    }
    out
}

/// Approximation of `git check-ref-format --normalize`'s rules, enough to
/// catch refnames a Git writer would otherwise refuse.
fn validate_refname(name: &str) -> Result<()> {
    if name == "refs" || name == "refs/" {
        return Err(Error::Config(format!("refname has no name component: {}", name)));
    }
    if name.contains("..") {
        return Err(Error::Config(format!("refname contains '..': {}", name)));
    }
    if name.contains("@{") {
        return Err(Error::Config(format!("refname contains '@{{': {}", name)));
    }
    if name.ends_with(".lock") {
        return Err(Error::Config(format!("refname ends with '.lock': {}", name)));
    }
    if name.ends_with('.') || name.starts_with('.') || name.contains("/.") {
        return Err(Error::Config(format!(
            "refname component starts or ends with '.': {}",
            name
        )));
    }
    const FORBIDDEN: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
        return Err(Error::Config(format!(
            "refname contains forbidden character {:?}: {}",
            c, name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_refs_prefix() {
        let s = Sanitizer::new(vec![]);
        assert_eq!(s.apply("heads/main").unwrap(), "refs/heads/main");
    }

    #[test]
    fn collapses_double_slash_from_prefix_concatenation() {
        let s = Sanitizer::new(vec![]);
        assert_eq!(
            s.apply("refs/heads//rel-2.0/hotfix-abc").unwrap(),
            "refs/heads/rel-2.0/hotfix-abc"
        );
    }

    #[test]
    fn replace_rules_apply_before_validation() {
        let s = Sanitizer::new(vec![ReplaceRule {
            chars: "A".to_string(),
            with: "a".to_string(),
        }]);
        assert_eq!(
            s.apply("refs/heads/feature/A").unwrap(),
            "refs/heads/feature/a"
        );
    }

    #[test]
    fn rejects_double_dot() {
        let s = Sanitizer::new(vec![]);
        assert!(s.apply("refs/heads/../escape").is_err());
    }
}
