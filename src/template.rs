//! Template parsing and rendering.
//!
//! Templates are plain text with actions in double braces, resolved against the
//! namespace of per-operation generate results (one top-level key per operation).
//!
//! # Actions
//!
//! - `{{ .git.branch }}` - value at a dotted path; `{{ . }}` is the whole namespace
//! - `{{ if .in_tmux }}...{{ else }}...{{ end }}` - conditional; `else` is optional
//!
//! A value is false when it is `null`, `false`, `0`, the empty string, or an empty
//! array or object. Strings render verbatim, `null` renders as nothing, and arrays
//! and objects render as compact JSON.
//!
//! # Whitespace
//!
//! `{{- ` trims all whitespace before the action and ` -}}` trims all whitespace
//! after it.
//!
//! # Example
//!
//! ```
//! use paneline::template::Template;
//! use serde_json::json;
//!
//! let template = Template::parse("{{ .git.branch }}{{ if .git.dirty }}*{{ end }}").unwrap();
//! let data = json!({"git": {"branch": "main", "dirty": true}});
//! assert_eq!(template.render(&data).unwrap(), "main*");
//! ```

use crate::error::TemplateError;
use serde_json::Value;
use std::fmt;

/// A dotted field path. Empty means the namespace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    fn parse(text: &str) -> Result<Self, TemplateError> {
        if text == "." {
            return Ok(FieldPath(Vec::new()));
        }
        let Some(rest) = text.strip_prefix('.') else {
            return Err(TemplateError::Malformed(text.to_string()));
        };
        let mut segments = Vec::new();
        for segment in rest.split('.') {
            let valid = !segment.is_empty()
                && segment.chars().all(|c| c.is_alphanumeric() || c == '_');
            if !valid {
                return Err(TemplateError::Malformed(text.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(FieldPath(segments))
    }

    /// First segment, i.e. the operation the path reads from.
    pub fn root(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    fn resolve<'a>(&self, data: &'a Value) -> Result<&'a Value, TemplateError> {
        let mut current = data;
        for segment in &self.0 {
            current = current
                .get(segment)
                .ok_or_else(|| TemplateError::UnresolvedField(self.to_string()))?;
        }
        Ok(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for segment in &self.0 {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Field(FieldPath),
    If {
        condition: FieldPath,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// Lexed pieces before block structure is applied.
#[derive(Debug)]
enum Token {
    Text(String),
    Field(FieldPath),
    If(FieldPath),
    Else,
    End,
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let tokens = lex(source)?;
        let nodes = build(tokens)?;
        Ok(Self { nodes })
    }

    /// Render against a namespace object.
    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        render_nodes(&self.nodes, data, &mut out)?;
        Ok(out)
    }

    /// Every field path the template reads, in source order.
    pub fn fields(&self) -> Vec<&FieldPath> {
        let mut fields = Vec::new();
        collect_fields(&self.nodes, &mut fields);
        fields
    }
}

fn collect_fields<'a>(nodes: &'a [Node], out: &mut Vec<&'a FieldPath>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Field(path) => out.push(path),
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                out.push(condition);
                collect_fields(then, out);
                collect_fields(otherwise, out);
            }
        }
    }
}

fn lex(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut offset = 0;
    let mut trim_next_text = false;

    while let Some(open) = rest.find("{{") {
        let mut text = &rest[..open];
        if trim_next_text {
            text = text.trim_start();
        }

        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + open))?;
        let mut inner = &after_open[..close];

        // Trim markers need surrounding whitespace so `{{-3}}` stays malformed
        // instead of silently trimming.
        let trim_before = inner.starts_with("- ") || inner.starts_with("-\t") || inner == "-";
        if trim_before {
            inner = &inner[1..];
            text = text.trim_end();
        }
        trim_next_text = inner.ends_with(" -") || inner.ends_with("\t-");
        if trim_next_text {
            inner = &inner[..inner.len() - 1];
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }
        tokens.push(lex_action(inner.trim())?);

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    let tail = if trim_next_text { rest.trim_start() } else { rest };
    if !tail.is_empty() {
        tokens.push(Token::Text(tail.to_string()));
    }
    Ok(tokens)
}

fn lex_action(action: &str) -> Result<Token, TemplateError> {
    let mut words = action.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("else"), None, _) => Ok(Token::Else),
        (Some("end"), None, _) => Ok(Token::End),
        (Some("if"), Some(path), None) => Ok(Token::If(FieldPath::parse(path)?)),
        (Some(path), None, _) if path.starts_with('.') => Ok(Token::Field(FieldPath::parse(path)?)),
        _ => Err(TemplateError::Malformed(action.to_string())),
    }
}

struct OpenBlock {
    condition: FieldPath,
    then: Vec<Node>,
    in_else: bool,
}

fn build(tokens: Vec<Token>) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<(OpenBlock, Vec<Node>)> = Vec::new();

    for token in tokens {
        let node = match token {
            Token::Text(text) => Node::Text(text),
            Token::Field(path) => Node::Field(path),
            Token::If(condition) => {
                stack.push((
                    OpenBlock {
                        condition,
                        then: Vec::new(),
                        in_else: false,
                    },
                    Vec::new(),
                ));
                continue;
            }
            Token::Else => {
                let (block, current) = stack
                    .last_mut()
                    .ok_or_else(|| TemplateError::UnexpectedEnd("else".to_string()))?;
                if block.in_else {
                    return Err(TemplateError::Malformed("else".to_string()));
                }
                block.then = std::mem::take(current);
                block.in_else = true;
                continue;
            }
            Token::End => {
                let (block, current) = stack
                    .pop()
                    .ok_or_else(|| TemplateError::UnexpectedEnd("end".to_string()))?;
                let (then, otherwise) = if block.in_else {
                    (block.then, current)
                } else {
                    (current, Vec::new())
                };
                Node::If {
                    condition: block.condition,
                    then,
                    otherwise,
                }
            }
        };

        match stack.last_mut() {
            Some((_, current)) => current.push(node),
            None => root.push(node),
        }
    }

    if let Some((block, _)) = stack.pop() {
        return Err(TemplateError::UnterminatedBlock(block.condition.to_string()));
    }
    Ok(root)
}

fn render_nodes(nodes: &[Node], data: &Value, out: &mut String) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(path) => write_value(path.resolve(data)?, out),
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if is_truthy(condition.resolve(data)?) {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, data, out)?;
            }
        }
    }
    Ok(())
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(_) | Value::Object(_) => out.push_str(&value.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
