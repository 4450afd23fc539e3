//! Template tokenizer

use regex::Regex;
use std::sync::OnceLock;

/// How a substituted argument is escaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// `[tag]`
    Param,
    /// `{tag}`
    Identifier,
    /// `{{tag}}`
    SoftIdentifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKey {
    Index(usize),
    Name(String),
}

impl TagKey {
    pub fn label(&self) -> String {
        match self {
            TagKey::Index(i) => i.to_string(),
            TagKey::Name(name) => name.clone(),
        }
    }
}

/// A piece of a tokenized template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Tag { key: TagKey, escape: Escape },
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        // Quoted spans come first so that tags inside literals are consumed
        // as plain text.
        Regex::new(concat!(
            r"'(?:[^'\\]|\\.|'')*'",
            r#"|"(?:[^"\\]|\\.|"")*""#,
            r"|`(?:[^`\\]|\\.|``)*`",
            r"|\{\{(\w*)\}\}",
            r"|\{(\w*)\}",
            r"|\[(\w*)\]",
        ))
        .expect("template token pattern is valid")
    })
}

/// Split a template into text and tag segments in a single regex pass
pub fn tokenize(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    let mut next_index = 0;

    for caps in token_regex().captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let tag = [
            (1, Escape::SoftIdentifier),
            (2, Escape::Identifier),
            (3, Escape::Param),
        ]
        .into_iter()
        .find_map(|(group, escape)| caps.get(group).map(|m| (m.as_str(), escape)));

        // Quoted literal: keep scanning, it stays part of the text
        let Some((name, escape)) = tag else {
            continue;
        };

        if whole.start() > last {
            segments.push(Segment::Text(&template[last..whole.start()]));
        }
        let key = if name.is_empty() {
            next_index += 1;
            TagKey::Index(next_index - 1)
        } else {
            TagKey::Name(name.to_string())
        };
        segments.push(Segment::Tag { key, escape });
        last = whole.end();
    }

    if last < template.len() {
        segments.push(Segment::Text(&template[last..]));
    }
    segments
}
