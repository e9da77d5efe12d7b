//! Path pattern compilation and matching
//!
//! Supported syntax:
//! - Literal segments: `/users`
//! - Named parameters: `/users/:id`
//! - Constrained parameters: `/users/:id<\d+>` (anchored regular expression)
//! - Wildcards capturing the remainder: `/files/*path`
//!
//! A compiled [`PathPattern`] answers three questions: does a pathname match
//! exactly ([`PathPattern::test`]), does it start with the pattern
//! ([`PathPattern::partial_test`]), and what pathname does a set of params
//! produce ([`PathPattern::build`]).

use crate::error::{RouterError, RouterResult};
use crate::params::RouteParams;
use crate::trace_log;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::collections::HashSet;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

/// A single segment in a route pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Static text that must match exactly
    Static(String),
    /// Parameter that captures one segment
    Param {
        name: String,
        constraint: Option<Constraint>,
    },
    /// Captures every remaining segment
    Wildcard { name: String },
}

/// Regular expression a parameter value must satisfy
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    fn compile(source: &str) -> Result<Self, String> {
        let regex = Regex::new(&format!("^(?:{})$", source))
            .map_err(|e| format!("invalid constraint '{}': {}", source, e))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The expression as written in the pattern
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Validate a decoded value against this constraint
    pub fn validate(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Segment {
    /// Parse one segment of a pattern
    ///
    /// Examples:
    /// - "users" -> Static("users")
    /// - ":id" -> Param { name: "id", constraint: None }
    /// - ":id<\\d+>" -> Param { name: "id", constraint: Some(..) }
    /// - "*rest" -> Wildcard { name: "rest" }
    pub fn parse(s: &str) -> Result<Self, String> {
        if let Some(name) = s.strip_prefix('*') {
            validate_name(name, "wildcard")?;
            return Ok(Segment::Wildcard {
                name: name.to_string(),
            });
        }

        let Some(rest) = s.strip_prefix(':') else {
            if let Some(c) = s.chars().find(|c| matches!(c, '?' | '#')) {
                return Err(format!("static segment '{}' cannot contain '{}'", s, c));
            }
            return Ok(Segment::Static(s.to_string()));
        };

        match rest.find('<') {
            Some(pos) => {
                let name = &rest[..pos];
                let Some(constraint) = rest[pos + 1..].strip_suffix('>') else {
                    return Err(format!("unterminated constraint for parameter '{}'", name));
                };
                validate_name(name, "parameter")?;
                Ok(Segment::Param {
                    name: name.to_string(),
                    constraint: Some(Constraint::compile(constraint)?),
                })
            }
            None => {
                validate_name(rest, "parameter")?;
                Ok(Segment::Param {
                    name: rest.to_string(),
                    constraint: None,
                })
            }
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param { name, .. } | Segment::Wildcard { name } => Some(name.as_str()),
        }
    }
}

fn validate_name(name: &str, kind: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{} name cannot be empty", kind));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!(
            "{} '{}' must contain only alphanumeric characters and underscores",
            kind, name
        ));
    }
    Ok(())
}

impl PathPattern {
    /// Compile a pattern string
    ///
    /// # Validation Rules
    ///
    /// - Pattern must start with '/'
    /// - No consecutive slashes ('//')
    /// - A single trailing slash is allowed
    /// - Parameter and wildcard names are alphanumeric (or '_') and unique
    /// - A wildcard must be the last segment
    pub fn parse(pattern: &str) -> RouterResult<Self> {
        let invalid = |reason: String| RouterError::invalid_pattern(pattern, reason);

        let Some(body) = pattern.strip_prefix('/') else {
            return Err(invalid("pattern must start with '/'".to_string()));
        };
        let trailing_slash = !body.is_empty() && body.ends_with('/');
        let body = body.strip_suffix('/').unwrap_or(body);

        let mut segments: Vec<Segment> = Vec::new();
        let mut names = HashSet::new();
        if !body.is_empty() {
            for raw in body.split('/') {
                if raw.is_empty() {
                    return Err(invalid("pattern cannot contain consecutive slashes".to_string()));
                }
                if matches!(segments.last(), Some(Segment::Wildcard { .. })) {
                    return Err(invalid("wildcard must be the last segment".to_string()));
                }
                let segment = Segment::parse(raw).map_err(invalid)?;
                if let Some(name) = segment.name() {
                    if !names.insert(name.to_string()) {
                        return Err(invalid(format!("duplicate parameter '{}'", name)));
                    }
                }
                segments.push(segment);
            }
        }

        trace_log!("Compiled pattern '{}' ({} segments)", pattern, segments.len());

        Ok(Self {
            source: pattern.to_string(),
            segments,
            trailing_slash,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of all placeholders, in pattern order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::name)
    }

    /// Exact match against a pathname
    ///
    /// One trailing slash on the pathname is tolerated.
    pub fn test(&self, pathname: &str) -> Option<RouteParams> {
        self.match_path(pathname, false)
    }

    /// Prefix match: every pattern segment must match a leading run of
    /// pathname segments; any remainder is ignored.
    pub fn partial_test(&self, pathname: &str) -> Option<RouteParams> {
        self.match_path(pathname, true)
    }

    fn match_path(&self, pathname: &str, partial: bool) -> Option<RouteParams> {
        let body = pathname.strip_prefix('/').unwrap_or(pathname);
        let body = body.strip_suffix('/').unwrap_or(body);
        let path_segments: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('/').collect()
        };

        let mut params = RouteParams::new();
        let mut path_idx = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if path_segments.get(path_idx) != Some(&expected.as_str()) {
                        return None;
                    }
                    path_idx += 1;
                }
                Segment::Param { name, constraint } => {
                    let raw = path_segments.get(path_idx).filter(|s| !s.is_empty())?;
                    let value = decode(raw);
                    if let Some(constraint) = constraint {
                        if !constraint.validate(&value) {
                            return None;
                        }
                    }
                    params.insert(name.clone(), value);
                    path_idx += 1;
                }
                Segment::Wildcard { name } => {
                    let rest: Vec<String> = path_segments[path_idx..]
                        .iter()
                        .copied()
                        .map(decode)
                        .collect();
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
            }
        }

        if partial || path_idx == path_segments.len() {
            Some(params)
        } else {
            None
        }
    }

    /// Build a concrete pathname from params
    ///
    /// Keys that are not placeholders of this pattern are ignored.
    pub fn build(&self, params: &RouteParams) -> RouterResult<String> {
        let mut path = String::new();

        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(text) => path.push_str(text),
                Segment::Param { name, constraint } => {
                    let value = self.required(params, name)?;
                    let satisfied = constraint
                        .as_ref()
                        .map_or(true, |constraint| constraint.validate(value));
                    if value.is_empty() || !satisfied {
                        return Err(RouterError::InvalidParam {
                            pattern: self.source.clone(),
                            param: name.clone(),
                            value: value.to_string(),
                        });
                    }
                    path.extend(utf8_percent_encode(value, SEGMENT));
                }
                Segment::Wildcard { name } => {
                    // Trailing slashes would be dropped again by matching
                    let value = self.required(params, name)?.trim_end_matches('/');
                    let encoded: Vec<String> = value
                        .split('/')
                        .map(|part| utf8_percent_encode(part, SEGMENT).to_string())
                        .collect();
                    path.push_str(&encoded.join("/"));
                }
            }
        }

        if path.is_empty() || self.trailing_slash {
            path.push('/');
        }
        Ok(path)
    }

    fn required<'p>(&self, params: &'p RouteParams, name: &str) -> RouterResult<&'p str> {
        params.get(name).ok_or_else(|| RouterError::MissingParam {
            pattern: self.source.clone(),
            param: name.to_string(),
        })
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(p: &str) -> PathPattern {
        PathPattern::parse(p).unwrap()
    }

    #[test]
    fn test_segment_parsing() {
        assert_eq!(
            Segment::parse("users"),
            Ok(Segment::Static("users".to_string()))
        );
        assert_eq!(
            Segment::parse(":id"),
            Ok(Segment::Param {
                name: "id".to_string(),
                constraint: None
            })
        );
        assert_eq!(
            Segment::parse("*rest"),
            Ok(Segment::Wildcard {
                name: "rest".to_string()
            })
        );
    }

    #[test]
    fn test_segment_parsing_with_constraint() {
        match Segment::parse(":id<\\d+>").unwrap() {
            Segment::Param { name, constraint } => {
                assert_eq!(name, "id");
                assert_eq!(constraint.unwrap().as_str(), "\\d+");
            }
            other => panic!("Expected Param segment, got {:?}", other),
        }
    }

    #[test]
    fn test_static_route_matching() {
        let p = pattern("/users");

        assert!(p.test("/users").is_some());
        assert!(p.test("/users/").is_some());
        assert!(p.test("/posts").is_none());
        assert!(p.test("/users/123").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let p = pattern("/");

        assert!(p.test("/").is_some());
        assert!(p.test("").is_some());
        assert!(p.test("/users").is_none());
        // Every pathname starts with the root
        assert!(p.partial_test("/users").is_some());
    }

    #[test]
    fn test_dynamic_route_matching() {
        let p = pattern("/users/:id");

        let params = p.test("/users/123").unwrap();
        assert_eq!(params.get("id"), Some("123"));

        assert!(p.test("/users").is_none());
        assert!(p.test("/users//").is_none());
        assert!(p.test("/users/123/posts").is_none());
    }

    #[test]
    fn test_params_are_decoded() {
        let params = pattern("/search/:term").test("/search/hello%20world").unwrap();
        assert_eq!(params.get("term"), Some("hello world"));
    }

    #[test]
    fn test_wildcard_matching() {
        let p = pattern("/files/*path");

        let params = p.test("/files/docs/report.pdf").unwrap();
        assert_eq!(params.get("path"), Some("docs/report.pdf"));

        let params = p.test("/files").unwrap();
        assert_eq!(params.get("path"), Some(""));

        assert!(p.test("/other").is_none());
    }

    #[test]
    fn test_constrained_param_matching() {
        let p = pattern("/users/:id<\\d+>");

        assert!(p.test("/users/123").is_some());
        assert!(p.test("/users/abc").is_none());
        assert!(p.test("/users/12a").is_none());
    }

    #[test]
    fn test_partial_matching() {
        let p = pattern("/settings/:section");

        let params = p.partial_test("/settings/profile/edit").unwrap();
        assert_eq!(params.get("section"), Some("profile"));

        assert!(p.partial_test("/settings").is_none());
        // Prefixes are segment-delimited
        assert!(pattern("/set").partial_test("/settings").is_none());
    }

    #[test]
    fn test_complex_pattern() {
        let p = pattern("/api/users/:userId/posts/:postId");

        let params = p.test("/api/users/42/posts/7").unwrap();
        assert_eq!(params.get("userId"), Some("42"));
        assert_eq!(params.get("postId"), Some("7"));
        assert_eq!(p.param_names().collect::<Vec<_>>(), ["userId", "postId"]);
    }

    #[test]
    fn test_build() {
        let p = pattern("/posts/:postId/comments/:commentId");
        let params = RouteParams::new()
            .with("postId", "42")
            .with("commentId", "99")
            .with("unused", "x");

        assert_eq!(p.build(&params).unwrap(), "/posts/42/comments/99");
        assert_eq!(pattern("/").build(&RouteParams::new()).unwrap(), "/");
        assert_eq!(pattern("/about/").build(&RouteParams::new()).unwrap(), "/about/");
    }

    #[test]
    fn test_build_encodes_values() {
        let p = pattern("/search/:term");
        let params = RouteParams::new().with("term", "a b/c");

        let path = p.build(&params).unwrap();
        assert_eq!(path, "/search/a%20b%2Fc");
        assert_eq!(p.test(&path).unwrap().get("term"), Some("a b/c"));
    }

    #[test]
    fn test_build_wildcard_keeps_slashes() {
        let p = pattern("/files/*path");
        let params = RouteParams::new().with("path", "docs/my report.pdf");

        assert_eq!(p.build(&params).unwrap(), "/files/docs/my%20report.pdf");
    }

    #[test]
    fn test_build_missing_param() {
        let err = pattern("/users/:id").build(&RouteParams::new()).unwrap_err();
        assert_eq!(
            err,
            RouterError::MissingParam {
                pattern: "/users/:id".to_string(),
                param: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_build_rejects_constraint_violation() {
        let params = RouteParams::new().with("id", "abc");
        let err = pattern("/users/:id<\\d+>").build(&params).unwrap_err();
        assert!(matches!(err, RouterError::InvalidParam { .. }));
    }

    #[test]
    fn test_build_rejects_empty_param() {
        let p = pattern("/users/:id");
        let err = p.build(&RouteParams::new().with("id", "")).unwrap_err();
        assert_eq!(
            err,
            RouterError::InvalidParam {
                pattern: "/users/:id".to_string(),
                param: "id".to_string(),
                value: String::new(),
            }
        );
        assert!(p.test("/users/").is_none());
    }

    #[test]
    fn test_build_wildcard_trailing_slash_is_trimmed() {
        let p = pattern("/files/*path");
        let path = p.build(&RouteParams::new().with("path", "docs/")).unwrap();

        assert_eq!(path, "/files/docs");
        assert_eq!(p.test(&path).unwrap().get("path"), Some("docs"));
    }

    // Validation tests

    #[test]
    fn test_validate_valid_patterns() {
        assert!(PathPattern::parse("/").is_ok());
        assert!(PathPattern::parse("/users").is_ok());
        assert!(PathPattern::parse("/users/:id").is_ok());
        assert!(PathPattern::parse("/posts/:postId/comments/:commentId").is_ok());
        assert!(PathPattern::parse("/users/:id<[0-9a-f]+>").is_ok());
        assert!(PathPattern::parse("/files/*rest").is_ok());
        assert!(PathPattern::parse("/users/").is_ok());
    }

    #[test]
    fn test_validate_errors() {
        let cases = [
            ("users", "must start with '/'"),
            ("", "must start with '/'"),
            ("/users//profile", "consecutive slashes"),
            ("/users/:", "name cannot be empty"),
            ("/files/*", "name cannot be empty"),
            ("/users/:user-id", "alphanumeric"),
            ("/users/:id/posts/:id", "duplicate parameter"),
            ("/files/*rest/more", "wildcard must be the last segment"),
            ("/users/:id<\\d+", "unterminated constraint"),
            ("/users/:id<(>", "invalid constraint"),
            ("/a?b", "cannot contain '?'"),
            ("/docs/#top", "cannot contain '#'"),
        ];

        for (input, expected) in cases {
            match PathPattern::parse(input) {
                Err(RouterError::InvalidPattern { pattern, reason }) => {
                    assert_eq!(pattern, input);
                    assert!(
                        reason.contains(expected),
                        "{:?}: '{}' does not mention '{}'",
                        input,
                        reason,
                        expected
                    );
                }
                other => panic!("{:?}: expected InvalidPattern, got {:?}", input, other),
            }
        }
    }
}
