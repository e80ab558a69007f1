use regex::RegexBuilder;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: false,
        }
    }

    fn hit(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: true,
        }
    }
}

/// Splits `text` into plain and matched runs for a case-insensitive literal `term`.
///
/// Concatenating the segments always reproduces `text`. Matched runs keep the
/// casing found in `text`.
pub fn highlight(text: &str, term: &str) -> Vec<Segment> {
    if term.trim().is_empty() {
        return vec![Segment::plain(text)];
    }

    let pattern = match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern,
        Err(_) => return vec![Segment::plain(text)],
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in pattern.find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment::plain(&text[cursor..found.start()]));
        }
        segments.push(Segment::hit(found.as_str()));
        cursor = found.end();
    }

    if cursor < text.len() || segments.is_empty() {
        segments.push(Segment::plain(&text[cursor..]));
    }

    segments
}
