//! Route matching logic.
//!
//! # Responsibilities
//! - Strip the query string and segment the request path
//! - Find the first registered route (same method, declaration order) whose
//!   literal key equals some prefix of the path and whose variable count
//!   equals the number of remaining segments
//! - Bind trailing segments to variable names and build the handler
//!
//! # Design Decisions
//! - First match wins; declaration order, not specificity, breaks ties
//! - Truncation runs from the full segment count down to 1, so `/` never matches
//! - Segment contents past the literal prefix are never inspected, only counted
//! - No trie or prefix index: O(routes × segments) comparisons per lookup

use crate::routing::error::RouteError;
use crate::routing::handler::HttpRoute;
use crate::routing::params::Parameters;
use crate::routing::registry::{RegisteredRoute, RoutePath, RouteRegistry};
use crate::routing::segments::{decoded_query, segments, split_query, QueryParams};

/// Outcome of a successful lookup. The caller owns the handler and runs it once.
#[derive(Debug)]
pub struct MatchResult<C> {
    pub handler: HttpRoute<C>,
    /// Variable bindings from the path.
    pub parameters: Parameters,
    /// Query-string pairs, kept apart from path variables.
    pub query: QueryParams,
    /// The matched `(method, literal key)`.
    pub route: RoutePath,
}

impl<C: Clone> RouteRegistry<C> {
    /// Resolve a request method and raw target to a handler and its bindings.
    pub fn match_route(&self, request: &RoutePath) -> Result<MatchResult<C>, RouteError> {
        let (path, query) = split_query(&request.path);
        if let Some(decoded) = decoded_query(&request.path) {
            tracing::debug!(query = %decoded, "Decoded query string");
        }

        let parts = segments(path);
        let prefixes = truncation_prefixes(&parts);

        let Some((route, k)) = self
            .routes
            .iter()
            .filter(|r| r.method == request.method)
            .find_map(|r| accepts(r, &prefixes).map(|k| (r, k)))
        else {
            tracing::debug!(method = %request.method, path = %path, "No route matched");
            return Err(RouteError::NotFound {
                method: request.method.clone(),
                path: path.to_string(),
            });
        };

        let parameters: Parameters = route
            .variables
            .iter()
            .zip(&parts[k..])
            .map(|(name, value)| (name.as_str(), *value))
            .collect();

        let key = RoutePath::new(request.method.clone(), route.literal_key.clone());
        let Some(binding) = self.bindings.get(&key) else {
            // Only reachable if the two structures diverged.
            tracing::error!(route = %key, "Matched route has no handler binding");
            return Err(RouteError::NotFound {
                method: request.method.clone(),
                path: path.to_string(),
            });
        };

        tracing::debug!(
            method = %key.method,
            route = %key.path,
            parameters = ?parameters,
            "Matched route"
        );

        Ok(MatchResult {
            handler: binding.materialize(),
            parameters,
            query,
            route: key,
        })
    }
}

/// `/`-joined prefixes of the path; index `k - 1` holds the first `k` segments.
fn truncation_prefixes(parts: &[&str]) -> Vec<String> {
    let mut prefixes = Vec::with_capacity(parts.len());
    let mut current = String::new();
    for part in parts {
        current.push('/');
        current.push_str(part);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Truncation length at which `route` accepts the path, if any.
fn accepts(route: &RegisteredRoute, prefixes: &[String]) -> Option<usize> {
    let n = prefixes.len();
    (1..=n).rev().find(|&k| {
        prefixes[k - 1] == route.literal_key && route.variables.len() == n - k
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn get(path: &str) -> RoutePath {
        RoutePath::new(Method::GET, path)
    }

    #[test]
    fn test_binds_trailing_variable() {
        let mut registry = RouteRegistry::new();
        registry.get("/api/v1/liveposts/user/fetchbyid/{id}", "fetch").unwrap();

        let m = registry.match_route(&get("/api/v1/liveposts/user/fetchbyid/42")).unwrap();
        assert_eq!(&m.parameters["id"], "42");
        assert_eq!(m.parameters.len(), 1);
        assert_eq!(m.route, get("/api/v1/liveposts/user/fetchbyid"));
        assert_eq!(m.handler.callback(), Some(&"fetch"));
    }

    #[test]
    fn test_multiple_variables_bind_in_order() {
        let mut registry = RouteRegistry::new();
        registry.get("/games/{game}/{player}", 1).unwrap();

        let m = registry.match_route(&get("/games/g7/alice")).unwrap();
        assert_eq!(&m.parameters["game"], "g7");
        assert_eq!(&m.parameters["player"], "alice");
    }

    #[test]
    fn test_tail_count_must_equal_variable_count() {
        let mut registry = RouteRegistry::new();
        registry.get("/health", 1).unwrap();
        registry.get("/users/{id}", 2).unwrap();

        assert!(registry.match_route(&get("/health")).unwrap().parameters.is_empty());
        assert!(registry.match_route(&get("/health/extra")).unwrap_err().is_not_found());
        assert!(registry.match_route(&get("/users")).unwrap_err().is_not_found());
        assert!(registry.match_route(&get("/users/1/2")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_method_is_part_of_the_key() {
        let mut registry = RouteRegistry::new();
        registry.put("/api/v1/liveposts/posts", "put").unwrap();
        registry.get("/api/v1/liveposts/posts", "get").unwrap();

        let m = registry
            .match_route(&RoutePath::new(Method::PUT, "/api/v1/liveposts/posts"))
            .unwrap();
        assert_eq!(m.handler.callback(), Some(&"put"));

        let err = registry
            .match_route(&RoutePath::new(Method::DELETE, "/api/v1/liveposts/posts"))
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::NotFound {
                method: Method::DELETE,
                path: "/api/v1/liveposts/posts".into()
            }
        );
    }

    #[test]
    fn test_first_declared_wins_over_more_specific() {
        let mut registry = RouteRegistry::new();
        registry.get("/a/{x}/{y}", "generic").unwrap();
        registry.get("/a/b/{y}", "specific").unwrap();

        // Both could serve /a/b/c; declaration order decides.
        let m = registry.match_route(&get("/a/b/c")).unwrap();
        assert_eq!(m.handler.callback(), Some(&"generic"));
        assert_eq!(&m.parameters["x"], "b");
        assert_eq!(&m.parameters["y"], "c");
    }

    #[test]
    fn test_later_route_reached_when_earlier_rejects() {
        let mut registry = RouteRegistry::new();
        registry.get("/a/{x}", "one").unwrap();
        registry.get("/a/b/{x}/{y}", "three").unwrap();

        let m = registry.match_route(&get("/a/b/c/d")).unwrap();
        assert_eq!(m.handler.callback(), Some(&"three"));
        assert_eq!(&m.parameters["x"], "c");
    }

    #[test]
    fn test_query_string_is_ignored_for_matching() {
        let mut registry = RouteRegistry::new();
        registry.get("/api/v1/users", 1).unwrap();

        let plain = registry.match_route(&get("/api/v1/users")).unwrap();
        let with_query = registry.match_route(&get("/api/v1/users?x=1")).unwrap();
        assert_eq!(plain.route, with_query.route);
        assert_eq!(plain.parameters, with_query.parameters);
        assert!(plain.query.is_empty());
        assert_eq!(with_query.query["x"], "1");
    }

    #[test]
    fn test_root_never_matches() {
        let mut registry = RouteRegistry::new();
        registry.get("/", 1).unwrap();
        registry.get("/{any}", 2).unwrap_err();

        assert!(registry.match_route(&get("/")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_zero_literal_template_never_matches() {
        let mut registry = RouteRegistry::new();
        registry.get("/{id}", 1).unwrap();
        assert!(registry.match_route(&get("/42")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_trailing_slash_and_raw_segments() {
        let mut registry = RouteRegistry::new();
        registry.get("/files/{name}", 1).unwrap();

        let m = registry.match_route(&get("/files/a%20b/")).unwrap();
        assert_eq!(&m.parameters["name"], "a%20b");

        // An empty segment still fills a variable slot.
        let m = registry.match_route(&get("/files//")).unwrap();
        assert_eq!(m.parameters.get("name"), Some(""));
    }

    #[test]
    fn test_unregistered_route_no_longer_matches() {
        let mut registry = RouteRegistry::new();
        registry.get("/users/{id}", 1).unwrap();
        assert!(registry.unregister(&get("/users/{id}")));
        assert!(registry.match_route(&get("/users/1")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_each_match_builds_fresh_handler() {
        let mut registry = RouteRegistry::new();
        registry.get("/users/{id}", 5u32).unwrap();

        let mut first = registry.match_route(&get("/users/1")).unwrap();
        first.handler.register_callback(0);
        let second = registry.match_route(&get("/users/2")).unwrap();
        assert_eq!(second.handler.callback(), Some(&5));
        assert_eq!(&second.parameters["id"], "2");
    }

    #[test]
    fn test_truncation_prefixes() {
        assert_eq!(truncation_prefixes(&["a", "b"]), vec!["/a", "/a/b"]);
        assert!(truncation_prefixes(&[]).is_empty());
    }
}
