//! Route table construction
//!
//! A [`RouteTable`] is built once from a name → pattern configuration and is
//! immutable afterwards. Declaration order is preserved: it is the tie-break
//! for first-match resolution.

use crate::error::{RouterError, RouterResult};
use crate::matcher::PathPattern;
use crate::params::RouteParams;
use crate::{info_log, warn_log};

/// Normalize a base path prefix
///
/// `""` and `"/"` mean no prefix; otherwise the result starts with `/` and
/// has no trailing `/`.
///
/// ```
/// use route_registry::normalize_base;
///
/// assert_eq!(normalize_base("/"), "");
/// assert_eq!(normalize_base("app"), "/app");
/// assert_eq!(normalize_base("/app/"), "/app");
/// ```
pub fn normalize_base(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// One named route and its compiled pattern
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    name: String,
    pattern: String,
    matcher: PathPattern,
}

impl RouteDescriptor {
    /// Compile `pattern` prefixed by an already normalized `base`
    fn compile(name: String, pattern: String, base: &str) -> RouterResult<Self> {
        let matcher = PathPattern::parse(&format!("{}{}", base, pattern))?;
        Ok(Self {
            name,
            pattern,
            matcher,
        })
    }

    /// Route name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pattern as configured, without the base prefix
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled pattern, base prefix included
    pub fn matcher(&self) -> &PathPattern {
        &self.matcher
    }

    /// The configured pattern is the root (`/`)
    ///
    /// Every pathname starts with the root, so prefix matching never applies
    /// to it.
    pub fn is_root(&self) -> bool {
        self.pattern.len() <= 1
    }

    /// Build a concrete pathname from params
    pub fn build(&self, params: &RouteParams) -> RouterResult<String> {
        self.matcher.build(params)
    }
}

/// Ordered, immutable set of named routes
///
/// # Example
///
/// ```
/// use route_registry::{RouteParams, RouteTable};
///
/// let table = RouteTable::new([("home", "/"), ("user", "/users/:id")], Some("app")).unwrap();
///
/// let params = RouteParams::new().with("id", "7");
/// assert_eq!(table.url("user", &params).unwrap(), "/app/users/7");
/// assert!(table.get("missing").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    base: String,
}

impl RouteTable {
    /// Build from `(name, pattern)` pairs in declaration order
    ///
    /// A name declared twice keeps its first position and takes the last
    /// pattern. Fails on the first pattern that does not compile.
    pub fn new<I, K, V>(config: I, base: Option<&str>) -> RouterResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let base = base.map(normalize_base).unwrap_or_default();

        let mut declared: Vec<(String, String)> = Vec::new();
        for (name, pattern) in config {
            let (name, pattern) = (name.into(), pattern.into());
            match declared.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = pattern,
                None => declared.push((name, pattern)),
            }
        }

        let routes = declared
            .into_iter()
            .map(|(name, pattern)| RouteDescriptor::compile(name, pattern, &base))
            .collect::<RouterResult<Vec<_>>>()?;

        info_log!("Route table built: {} routes, base '{}'", routes.len(), base);

        Ok(Self { routes, base })
    }

    /// Normalized base prefix (empty when none)
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Look up a route by name
    pub fn get(&self, name: &str) -> RouterResult<&RouteDescriptor> {
        self.routes
            .iter()
            .find(|route| route.name == name)
            .ok_or_else(|| {
                warn_log!("Can not find route for '{}'", name);
                RouterError::route_not_found(name)
            })
    }

    /// Check if a route name exists
    pub fn contains(&self, name: &str) -> bool {
        self.routes.iter().any(|route| route.name == name)
    }

    /// Build the pathname of a named route
    pub fn url(&self, name: &str, params: &RouteParams) -> RouterResult<String> {
        self.get(name)?.build(params)
    }

    /// Pathname with the base prefix removed
    ///
    /// Pathnames outside the base are returned unchanged.
    pub fn strip_base<'a>(&self, pathname: &'a str) -> &'a str {
        if self.base.is_empty() {
            return pathname;
        }
        match pathname.strip_prefix(self.base.as_str()) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => pathname,
        }
    }

    /// Routes in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, RouteDescriptor> {
        self.routes.iter()
    }

    /// Get number of routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteDescriptor;
    type IntoIter = std::slice::Iter<'a, RouteDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
