//! Template tokenizer
//!
//! Grammar:
//! - `{{field}}` / `{{{field}}}` - field reference, interpolated verbatim
//! - `{{media url=field}}` - media reference
//! - `{{#if field}} ... {{/if}}` - conditional block, one level deep
//!
//! A block tag alone on its line is standalone: the whole line is dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use super::TemplateError;

/// Regex to match tags: `{{{...}}}` or `{{...}}`
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\{\s*([^{}]*?)\s*\}\}\}|\{\{\s*([^{}]*?)\s*\}\}").unwrap()
});

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Parsed template node
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Field(String),
    Media(String),
    Block { field: String, body: Vec<Node> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tag {
    Field(String),
    Media(String),
    Open(String),
    Close,
}

impl Tag {
    fn is_block(&self) -> bool {
        matches!(self, Tag::Open(_) | Tag::Close)
    }
}

#[derive(Debug)]
enum Token {
    Text(String),
    Tag(Tag),
}

/// Parse template source into nodes
pub(crate) fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    build_tree(tokenize(source)?)
}

fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for cap in TAG_PATTERN.captures_iter(source) {
        let Some(whole) = cap.get(0) else {
            continue;
        };
        let inner = cap
            .get(1)
            .or_else(|| cap.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let tag = parse_tag(inner)?;

        let (cut_start, resume) = if tag.is_block() {
            standalone_bounds(source, whole.start(), whole.end())
                .unwrap_or((whole.start(), whole.end()))
        } else {
            (whole.start(), whole.end())
        };

        if cut_start > cursor {
            tokens.push(Token::Text(source[cursor..cut_start].to_string()));
        }
        tokens.push(Token::Tag(tag));
        cursor = resume;
    }

    if cursor < source.len() {
        tokens.push(Token::Text(source[cursor..].to_string()));
    }

    Ok(tokens)
}

/// Line bounds of a tag that is the only non-whitespace content on its line
fn standalone_bounds(source: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = source[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(source.len());

    let before_blank = source[line_start..start].trim().is_empty();
    let after_blank = source[end..line_end].trim().is_empty();

    (before_blank && after_blank).then_some((line_start, line_end))
}

fn parse_tag(inner: &str) -> Result<Tag, TemplateError> {
    if let Some(rest) = keyword_args(inner, "#if") {
        let field = rest.trim();
        return identifier(field, inner).map(Tag::Open);
    }

    if inner == "/if" {
        return Ok(Tag::Close);
    }

    if let Some(rest) = keyword_args(inner, "media") {
        let field = rest
            .trim()
            .strip_prefix("url=")
            .ok_or_else(|| {
                TemplateError::parse(format!("Expected 'url=' in '{{{{{}}}}}'", inner))
            })?;
        return identifier(field.trim(), inner).map(Tag::Media);
    }

    identifier(inner, inner).map(Tag::Field)
}

/// Arguments following `keyword` when the tag starts with it as a whole word
fn keyword_args<'a>(inner: &'a str, keyword: &str) -> Option<&'a str> {
    inner
        .strip_prefix(keyword)
        .filter(|rest| rest.starts_with(char::is_whitespace))
}

fn identifier(name: &str, tag: &str) -> Result<String, TemplateError> {
    if IDENTIFIER_PATTERN.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(TemplateError::parse(format!(
            "Unsupported tag '{{{{{}}}}}'",
            tag
        )))
    }
}

fn build_tree(tokens: Vec<Token>) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut open: Option<(String, Vec<Node>)> = None;

    for token in tokens {
        let node = match token {
            Token::Text(text) => Node::Text(text),
            Token::Tag(Tag::Field(name)) => Node::Field(name),
            Token::Tag(Tag::Media(name)) => Node::Media(name),
            Token::Tag(Tag::Open(field)) => {
                if let Some((outer, _)) = &open {
                    return Err(TemplateError::NestedBlock {
                        outer: outer.clone(),
                        inner: field,
                    });
                }
                open = Some((field, Vec::new()));
                continue;
            }
            Token::Tag(Tag::Close) => {
                let (field, body) = open.take().ok_or(TemplateError::UnbalancedBlock)?;
                root.push(Node::Block { field, body });
                continue;
            }
        };

        match open.as_mut() {
            Some((_, body)) => body.push(node),
            None => root.push(node),
        }
    }

    if let Some((field, _)) = open {
        return Err(TemplateError::UnclosedBlock { field });
    }

    Ok(root)
}
