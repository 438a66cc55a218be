//! Commit Builder: normalizes author/committer identity and
//! synthesizes commit messages.

use crate::source::FileOp;

/// A parsed `Name <email>` identity, ready to hand to the Git writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Display name, e.g. `Alice Example`.
    pub name: String,
    /// Email address, real or synthesized (`<user>@localhost`).
    pub email: String,
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Parse an HG username string into a Git identity.
///
/// Accepted forms: `Name <email>`, `Name (email)`, `"Name" <email>`, a bare
/// email, or a bare name. Quotes and excess whitespace are stripped. When no
/// email can be isolated, `<user>@localhost` is synthesized from whatever
/// name was extracted (or the original string).
pub fn parse_author(raw: &str) -> Identity {
    let raw = raw.trim();

    if let Some((name, email)) = split_bracketed(raw, '<', '>') {
        return Identity {
            name: unquote(&name),
            email,
        };
    }
    if let Some((name, email)) = split_bracketed(raw, '(', ')') {
        return Identity {
            name: unquote(&name),
            email,
        };
    }
    if looks_like_bare_email(raw) {
        let user = raw.split('@').next().unwrap_or(raw).to_string();
        return Identity {
            name: user,
            email: raw.to_string(),
        };
    }
    let name = unquote(raw);
    let user = name.split_whitespace().next().unwrap_or(&name).to_string();
    Identity {
        email: format!("{}@localhost", user),
        name,
    }
}

fn split_bracketed(raw: &str, open: char, close: char) -> Option<(String, String)> {
    let open_idx = raw.find(open)?;
    let close_idx = raw.rfind(close)?;
    if close_idx <= open_idx {
        return None;
    }
    let name = raw[..open_idx].trim().to_string();
    let inner = raw[open_idx + 1..close_idx].trim().to_string();
    if inner.is_empty() {
        return None;
    }
    let name = if name.is_empty() {
        inner.split('@').next().unwrap_or(&inner).to_string()
    } else {
        name
    };
    Some((name, inner))
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].trim().to_string()
    } else {
        s.to_string()
    }
}

fn looks_like_bare_email(s: &str) -> bool {
    !s.contains(char::is_whitespace) && s.contains('@') && !s.contains('<') && !s.contains('(')
}

/// Compose the commit message, synthesizing one from the file operations
/// when the HG message is empty.
pub fn compose_message(hg_message: &str, file_ops: &[FileOp], decorate_revision: Option<&str>) -> String {
    let mut message = if hg_message.is_empty() {
        synthesize_message(file_ops)
    } else {
        hg_message.to_string()
    };
    if let Some(rev) = decorate_revision {
        message.push_str("\n\nHG-revision: ");
        message.push_str(rev);
    }
    message
}

fn synthesize_message(file_ops: &[FileOp]) -> String {
    let mut added: Vec<&str> = Vec::new();
    let mut modified: Vec<&str> = Vec::new();
    let mut deleted: Vec<&str> = Vec::new();
    let mut renamed: Vec<(&str, &str)> = Vec::new();

    for op in file_ops {
        match op {
            FileOp::Add { path, .. } => added.push(path),
            FileOp::Modify { path, .. } => modified.push(path),
            FileOp::Delete { path } => deleted.push(path),
            FileOp::Rename { from, to, .. } => renamed.push((from, to)),
        }
    }
    added.sort_unstable();
    modified.sort_unstable();
    deleted.sort_unstable();
    renamed.sort_unstable();

    let mut lines = Vec::new();
    for path in added {
        lines.push(format!("Added: {}", path));
    }
    for path in modified {
        lines.push(format!("Modified: {}", path));
    }
    for path in deleted {
        lines.push(format!("Deleted: {}", path));
    }
    for (from, to) in renamed {
        lines.push(format!("Renamed: {} \u{2192} {}", from, to));
    }
    lines.join("\n")
}
