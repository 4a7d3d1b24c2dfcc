//! Static route table and path normalization.
//!
//! DESIGN
//! ======
//! Routes are declared as a tree of [`RouteRecord`]s and flattened once into
//! [`Route`] descriptors. A child inherits `requires_auth` from any ancestor
//! and overrides the ancestor's permission when it declares its own.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

pub const LANDING: &str = "landing";
pub const LOGIN: &str = "login";
pub const REGISTER: &str = "register";
pub const DASHBOARD: &str = "dashboard";
pub const UNAUTHORIZED: &str = "unauthorized";

pub const LANDING_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const APP_PATH: &str = "/app";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Query parameter carrying the originally requested path through login.
pub const RETURN_PARAM: &str = "redirect";

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// A flattened, matchable route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub name: Option<String>,
    pub path: String,
    pub requires_auth: bool,
    pub permission: Option<String>,
}

impl Route {
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// Declarative route node; `path` is relative to the parent.
#[derive(Clone, Debug, Default)]
pub struct RouteRecord {
    path: String,
    name: Option<String>,
    requires_auth: bool,
    permission: Option<String>,
    children: Vec<RouteRecord>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self { path: path.to_owned(), ..Self::default() }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    #[must_use]
    pub fn permission(mut self, permission: &str) -> Self {
        self.permission = Some(permission.to_owned());
        self
    }

    #[must_use]
    pub fn children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

// =============================================================================
// TABLE
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(records: Vec<RouteRecord>) -> Self {
        let mut routes = Vec::new();
        for record in records {
            flatten(&record, "", false, None, &mut routes);
        }
        Self { routes }
    }

    /// The marketing platform's public pages and permission-gated app area.
    #[must_use]
    pub fn constellation() -> Self {
        Self::new(vec![
            RouteRecord::new(LANDING_PATH).named(LANDING),
            RouteRecord::new(LOGIN_PATH).named(LOGIN),
            RouteRecord::new("/register").named(REGISTER),
            RouteRecord::new(APP_PATH).requires_auth().children(vec![
                RouteRecord::new("").named(DASHBOARD),
                RouteRecord::new("journeys").named("journeys").permission("journeys.build"),
                RouteRecord::new("campaigns").named("campaigns").permission("campaigns.manage"),
                RouteRecord::new("contacts").named("contacts").permission("journeys.build"),
                RouteRecord::new("deliverability").named("deliverability").permission("deliverability.view"),
                RouteRecord::new("compliance").named("compliance").permission("compliance.manage"),
                RouteRecord::new("templates").named("templates").permission("templates.manage"),
            ]),
            RouteRecord::new(UNAUTHORIZED_PATH).named(UNAUTHORIZED),
        ])
    }

    /// Match a normalized path (no query or fragment) exactly.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.path == path)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.is_named(name))
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn flatten(
    record: &RouteRecord,
    parent_path: &str,
    parent_auth: bool,
    parent_permission: Option<&str>,
    out: &mut Vec<Route>,
) {
    let path = join_path(parent_path, &record.path);
    let requires_auth = parent_auth || record.requires_auth;
    let permission = record.permission.as_deref().or(parent_permission);

    if record.children.is_empty() || record.name.is_some() {
        out.push(Route {
            name: record.name.clone(),
            path: path.clone(),
            requires_auth,
            permission: permission.map(ToOwned::to_owned),
        });
    }
    for child in &record.children {
        flatten(child, &path, requires_auth, permission, out);
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_path(child);
    }
    let joined = format!("{}/{}", parent.trim_end_matches('/'), child);
    normalize_path(&joined)
}

// =============================================================================
// LOCATIONS
// =============================================================================

/// A navigation target split into its matchable path and its full form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// Normalized path used for matching.
    pub path: String,
    /// Path plus any query and fragment, as requested.
    pub full_path: String,
    pub query: String,
}

impl Location {
    #[must_use]
    pub fn parse(target: &str) -> Self {
        let (rest, fragment) = match target.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (target, None),
        };
        let (raw_path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = normalize_path(raw_path);

        let mut full_path = path.clone();
        if !query.is_empty() {
            full_path.push('?');
            full_path.push_str(query);
        }
        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            full_path.push('#');
            full_path.push_str(fragment);
        }
        Self { path, full_path, query: query.to_owned() }
    }

    /// Decoded value of the first `name=` query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| decode_component(value))
    }
}

/// Leading slash, no trailing slash (except root), no empty segments.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// `/login?redirect=<full path>` for an anonymous visitor to `full_path`.
#[must_use]
pub fn login_redirect(full_path: &str) -> String {
    format!("{LOGIN_PATH}?{RETURN_PARAM}={}", urlencoding::encode(full_path))
}
