// URI templates with named placeholders, e.g. `greeting://{name}`

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unclosed placeholder in template '{0}'")]
    Unclosed(String),

    #[error("Empty placeholder name in template '{0}'")]
    EmptyName(String),

    #[error("Adjacent placeholders are ambiguous in template '{0}'")]
    AdjacentPlaceholders(String),

    #[error("Duplicate placeholder '{name}' in template '{template}'")]
    DuplicateName { template: String, name: String },

    #[error("Template '{0}' has no placeholders")]
    NoPlaceholders(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed URI pattern.
///
/// A placeholder binds one or more characters up to an occurrence of the next literal
/// segment and never spans a `/`. Matching is anchored at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            match rest.find('{') {
                Some(0) => {
                    let end = rest
                        .find('}')
                        .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
                    let name = rest[1..end].trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyName(template.to_string()));
                    }
                    if matches!(segments.last(), Some(Segment::Placeholder(_))) {
                        return Err(TemplateError::AdjacentPlaceholders(template.to_string()));
                    }
                    if segments
                        .iter()
                        .any(|s| matches!(s, Segment::Placeholder(n) if n == name))
                    {
                        return Err(TemplateError::DuplicateName {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                    rest = &rest[end + 1..];
                }
                Some(start) => {
                    segments.push(Segment::Literal(rest[..start].to_string()));
                    rest = &rest[start..];
                }
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        if !segments.iter().any(|s| matches!(s, Segment::Placeholder(_))) {
            return Err(TemplateError::NoPlaceholders(template.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a full URI, returning the placeholder bindings.
    ///
    /// A placeholder followed by a literal may end at any later occurrence
    /// of that literal; the shortest binding that lets the rest match wins.
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut bindings = HashMap::new();
        match_segments(&self.segments, uri, &mut bindings).then_some(bindings)
    }
}

fn match_segments(segments: &[Segment], rest: &str, bindings: &mut HashMap<String, String>) -> bool {
    let Some((first, tail)) = segments.split_first() else {
        return rest.is_empty();
    };

    match first {
        Segment::Literal(literal) => rest
            .strip_prefix(literal.as_str())
            .is_some_and(|rest| match_segments(tail, rest, bindings)),
        Segment::Placeholder(name) => {
            // parse() rejects adjacent placeholders, so the next segment is a literal or nothing
            let Some(Segment::Literal(next)) = tail.first() else {
                if rest.is_empty() || rest.contains('/') {
                    return false;
                }
                bindings.insert(name.clone(), rest.to_string());
                return true;
            };

            for (end, _) in rest.char_indices().skip(1) {
                let value = &rest[..end];
                if value.contains('/') {
                    break;
                }
                if rest[end..].starts_with(next.as_str()) && match_segments(tail, &rest[end..], bindings) {
                    bindings.insert(name.clone(), value.to_string());
                    return true;
                }
            }
            false
        }
    }
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for UriTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_match_single_placeholder() {
        let template = UriTemplate::parse("sse-greeting://{name}").unwrap();
        let bindings = template.matches("sse-greeting://Lucy").unwrap();
        assert_eq!(bindings.get("name").map(String::as_str), Some("Lucy"));
    }

    #[test]
    fn test_match_unicode_binding() {
        let template = UriTemplate::parse("greeting://{name}").unwrap();
        let bindings = template.matches("greeting://小明").unwrap();
        assert_eq!(bindings["name"], "小明");
    }

    #[test]
    fn test_never_partially_matches() {
        let template = UriTemplate::parse("greeting://{name}").unwrap();
        assert!(template.matches("greeting://").is_none());
        assert!(template.matches("greeting://Lucy/extra").is_none());
        assert!(template.matches("sse-greeting://Lucy").is_none());
        assert!(template.matches("xgreeting://Lucy").is_none());
        assert!(template.matches("greeting:/Lucy").is_none());
    }

    #[test]
    fn test_binding_may_contain_the_next_literal() {
        let template = UriTemplate::parse("docs://{name}.md").unwrap();
        let bindings = template.matches("docs://v1.md.md").unwrap();
        assert_eq!(bindings["name"], "v1.md");

        let bindings = template.matches("docs://a.md").unwrap();
        assert_eq!(bindings["name"], "a");
        assert!(template.matches("docs://.md").is_none());
        assert!(template.matches("docs://v1.md.txt").is_none());
        assert!(template.matches("docs://v1/x.md").is_none());
    }

    #[test]
    fn test_backtracks_across_placeholders() {
        let template = UriTemplate::parse("pairs://{left}-{right}.json").unwrap();
        let bindings = template.matches("pairs://a-b-c.d.json").unwrap();
        assert_eq!(bindings["left"], "a");
        assert_eq!(bindings["right"], "b-c.d");
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn test_multiple_placeholders_with_trailing_literal() {
        let template = UriTemplate::parse("users://{org}/{user}/profile").unwrap();
        let bindings = template.matches("users://acme/alice/profile").unwrap();
        assert_eq!(bindings["org"], "acme");
        assert_eq!(bindings["user"], "alice");
        assert!(template.matches("users://acme/alice/settings").is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            UriTemplate::parse("greeting://{name"),
            Err(TemplateError::Unclosed(_))
        ));
        assert!(matches!(
            UriTemplate::parse("greeting://{}"),
            Err(TemplateError::EmptyName(_))
        ));
        assert!(matches!(
            UriTemplate::parse("x://{a}{b}"),
            Err(TemplateError::AdjacentPlaceholders(_))
        ));
        assert!(matches!(
            UriTemplate::parse("x://{a}/{a}"),
            Err(TemplateError::DuplicateName { .. })
        ));
        assert!(matches!(
            UriTemplate::parse("static://thing"),
            Err(TemplateError::NoPlaceholders(_))
        ));
    }
}
