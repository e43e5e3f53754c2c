//! Line formatting for handlers.
//!
//! A [`TextFormatter`] is compiled once from a template string; placeholders
//! are `{time}`, `{level}`, `{file}`, `{line}`, `{module}`, `{message}`,
//! `{attrs}` (all attributes as sorted `k=v` pairs) and `{attr:KEY}`
//! (a single attribute, `-` when absent). `{{` and `}}` escape braces.

use super::event::Event;

/// Renders an event into a single output line (without trailing newline).
pub trait Formatter: Send + Sync {
    fn format(&self, event: &Event) -> String;
}

pub const DEFAULT_TEMPLATE: &str = "{time} [{level}] {file}:{line} {message} {attrs}";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Time,
    Level,
    File,
    Line,
    Module,
    Message,
    Attrs,
    Attr(String),
}

#[derive(Debug, Clone)]
pub struct TextFormatter {
    segments: Vec<Segment>,
}

impl TextFormatter {
    pub fn new(template: &str) -> Self {
        Self {
            segments: parse_template(template),
        }
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl Formatter for TextFormatter {
    fn format(&self, event: &Event) -> String {
        let mut out = String::with_capacity(128);
        // Start of the most recent literal, while it is still the tail of `out`
        let mut literal_start = None;

        for segment in &self.segments {
            let start = out.len();
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Time => out.push_str(&event.timestamp().format(TIME_FORMAT).to_string()),
                Segment::Level => out.push_str(&event.level().as_str().to_ascii_uppercase()),
                Segment::File => out.push_str(event.call_site().file),
                Segment::Line => out.push_str(&event.call_site().line.to_string()),
                Segment::Module => out.push_str(event.call_site().module.unwrap_or("-")),
                Segment::Message => out.push_str(event.message()),
                Segment::Attrs => match event.attrs().filter(|attrs| !attrs.is_empty()) {
                    Some(attrs) => {
                        let mut pairs: Vec<_> = attrs.iter().collect();
                        pairs.sort();
                        let joined: Vec<String> =
                            pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                        out.push_str(&joined.join(" "));
                    }
                    // No attributes: drop the whitespace separating them from
                    // the previous placeholder
                    None => {
                        if let Some(lit) = literal_start {
                            let keep = lit + out[lit..].trim_end().len();
                            out.truncate(keep);
                        }
                    }
                },
                Segment::Attr(key) => out.push_str(event.attr(key).unwrap_or("-")),
            }
            literal_start = match segment {
                Segment::Literal(_) => Some(start),
                _ if out.len() == start => literal_start,
                _ => None,
            };
        }

        out
    }
}

fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }

                match (closed, placeholder(&name)) {
                    (true, Some(segment)) => {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(segment);
                    }
                    // Unknown or unterminated placeholders are kept verbatim
                    (true, None) => {
                        literal.push('{');
                        literal.push_str(&name);
                        literal.push('}');
                    }
                    (false, _) => {
                        literal.push('{');
                        literal.push_str(&name);
                    }
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

fn placeholder(name: &str) -> Option<Segment> {
    let segment = match name {
        "time" => Segment::Time,
        "level" => Segment::Level,
        "file" => Segment::File,
        "line" => Segment::Line,
        "module" => Segment::Module,
        "message" => Segment::Message,
        "attrs" => Segment::Attrs,
        _ => {
            let key = name.strip_prefix("attr:")?;
            if key.is_empty() {
                return None;
            }
            Segment::Attr(key.to_string())
        }
    };
    Some(segment)
}
