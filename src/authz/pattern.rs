use serde::{Deserialize, Serialize};

/// How an authority's url pattern is compared with a request path.
///
/// `AnchoredPrefix` is the long-standing behavior: after `*` expansion the
/// pattern only has to match a prefix of the path, so a literal `/users`
/// also admits `/usersXYZ`. `FullString` requires the expansion to cover
/// the whole path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    #[default]
    AnchoredPrefix,
    FullString,
}

impl MatchMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prefix" | "anchored_prefix" => Some(MatchMode::AnchoredPrefix),
            "exact" | "full" | "full_string" => Some(MatchMode::FullString),
            _ => None,
        }
    }
}

/// Match `path` against `pattern`, where `*` stands for any (possibly
/// empty) run of characters and the match is anchored at position 0
pub fn wildcard_match(pattern: &str, path: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::FullString => glob_full(pattern.as_bytes(), path.as_bytes()),
        // A prefix match is a full match with an implicit trailing `*`
        MatchMode::AnchoredPrefix => {
            let mut widened = Vec::with_capacity(pattern.len() + 1);
            widened.extend_from_slice(pattern.as_bytes());
            widened.push(b'*');
            glob_full(&widened, path.as_bytes())
        }
    }
}

/// A wildcard-free pattern that only matched because of prefix semantics
pub fn is_literal_prefix_widening(pattern: &str, path: &str) -> bool {
    !pattern.contains('*') && path.len() > pattern.len() && path.starts_with(pattern)
}

fn glob_full(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut resume = 0usize;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            p += 1;
            resume = t;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some(s) = star {
            // backtrack: let the last star swallow one more byte
            p = s + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
