//! Output URL templates
//!
//! A template is literal text with `{{Field}}` placeholders. The Go-style
//! `{{ .Field }}` spelling is accepted too, since existing rule files use it.
//! Templates are compiled once at load time into a list of segments; rendering
//! a compiled template cannot fail.

use std::collections::HashMap;

/// Error type for template compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
    #[error("unsupported placeholder '{{{{{0}}}}}'")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A compiled output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Compile a template string.
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;
        let mut offset = 0;

        // A `}}` outside a placeholder is literal text.
        while !rest.is_empty() {
            match rest.find("{{") {
                None => {
                    literal.push_str(rest);
                    break;
                }
                Some(o) => {
                    literal.push_str(&rest[..o]);
                    let inner_start = o + 2;
                    let inner_len = rest[inner_start..]
                        .find("}}")
                        .ok_or(TemplateError::Unclosed(offset + o))?;
                    let inner = &rest[inner_start..inner_start + inner_len];
                    let name = parse_placeholder(inner, offset + o)?;

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_string()));

                    let consumed = inner_start + inner_len + 2;
                    rest = &rest[consumed..];
                    offset += consumed;
                }
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Render with the given fields. Missing fields render as empty strings.
    pub fn render(&self, fields: &HashMap<String, String>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    if let Some(value) = fields.get(name) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }

    /// Field names referenced by this template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The template as written.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compile and render in one step, for templates that were not validated
/// at load time.
pub fn render(source: &str, fields: &HashMap<String, String>) -> Result<String, TemplateError> {
    Ok(Template::compile(source)?.render(fields))
}

fn parse_placeholder(inner: &str, pos: usize) -> Result<&str, TemplateError> {
    let trimmed = inner.trim();
    let name = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if name.is_empty() {
        return Err(TemplateError::EmptyPlaceholder(pos));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(TemplateError::Unsupported(inner.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_plain_placeholders() {
        let t = Template::compile("https://www.iltalehti.fi/{{Section}}/a/{{ArticleID}}").unwrap();
        let out = t.render(&fields(&[("Section", "politiikka"), ("ArticleID", "42")]));
        assert_eq!(out, "https://www.iltalehti.fi/politiikka/a/42");
    }

    #[test]
    fn test_render_dot_placeholders() {
        let t = Template::compile("https://example.com/{{ .ArticleID }}?x=1").unwrap();
        assert_eq!(t.render(&fields(&[("ArticleID", "abc")])), "https://example.com/abc?x=1");
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let t = Template::compile("https://example.com/{{Section}}/{{ID}}").unwrap();
        assert_eq!(t.render(&fields(&[("ID", "7")])), "https://example.com//7");
    }

    #[test]
    fn test_literal_only() {
        let t = Template::compile("https://example.com/").unwrap();
        assert_eq!(t.render(&HashMap::new()), "https://example.com/");
        assert_eq!(t.fields().count(), 0);
    }

    #[test]
    fn test_fields_in_order() {
        let t = Template::compile("{{A}}-{{ .B }}-{{A}}").unwrap();
        assert_eq!(t.fields().collect::<Vec<_>>(), vec!["A", "B", "A"]);
        assert_eq!(t.render(&fields(&[("A", "1"), ("B", "2")])), "1-2-1");
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(Template::compile("x/{{ID"), Err(TemplateError::Unclosed(2)));
        assert_eq!(Template::compile("{{ }}"), Err(TemplateError::EmptyPlaceholder(0)));
        assert_eq!(Template::compile("{{.}}"), Err(TemplateError::EmptyPlaceholder(0)));
        assert!(matches!(
            Template::compile("{{ .ID | printf }}"),
            Err(TemplateError::Unsupported(_))
        ));
        assert!(matches!(
            Template::compile("{{ .Section .ID }}"),
            Err(TemplateError::Unsupported(_))
        ));
    }

    #[test]
    fn test_stray_close_is_literal() {
        let t = Template::compile("https://example.com/x}}").unwrap();
        assert_eq!(t.fields().count(), 0);
        assert_eq!(t.render(&HashMap::new()), "https://example.com/x}}");

        let t = Template::compile("a}}/{{ID}}/b}}").unwrap();
        assert_eq!(t.render(&fields(&[("ID", "7")])), "a}}/7/b}}");
    }

    #[test]
    fn test_render_uncompiled() {
        assert_eq!(render("/{{ID}}", &fields(&[("ID", "9")])).unwrap(), "/9");
        assert!(render("/{{ID", &HashMap::new()).is_err());
    }
}
