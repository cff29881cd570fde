//! Client role router.
//!
//! Maps a resolved role to the client's landing page and decides, for a client-side
//! path, whether the visitor may render it or must be redirected. The frontend consumes
//! the same table through the `redirectTo` hint in auth responses.

use crate::models::Role;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";
pub const SELLER_DASHBOARD_ROUTE: &str = "/seller/dashboard";
pub const ADMIN_DASHBOARD_ROUTE: &str = "/admin/dashboard";

/// resolve_landing_route
///
/// Where a freshly signed-in client goes first.
pub fn resolve_landing_route(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Seller) => SELLER_DASHBOARD_ROUTE,
        Some(Role::Admin) => ADMIN_DASHBOARD_ROUTE,
        Some(Role::Customer) | None => HOME_ROUTE,
    }
}

/// What a client route tree demands of the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    Public,
    SignedIn,
    Role(Role),
}

/// Outcome of guarding a client path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    RedirectToLogin,
    Redirect(&'static str),
}

const SIGNED_IN_ROUTES: [&str; 5] = ["/checkout", "/orders", "/dashboard", "/profile", "/profile/edit"];

/// True when `path` is `tree` itself or lies beneath it.
fn within(path: &str, tree: &str) -> bool {
    path == tree
        || path
            .strip_prefix(tree)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// route_requirement
///
/// The client route table. Anything not listed is public.
pub fn route_requirement(path: &str) -> RouteRequirement {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if within(path, "/admin") {
        RouteRequirement::Role(Role::Admin)
    } else if within(path, "/seller") {
        RouteRequirement::Role(Role::Seller)
    } else if SIGNED_IN_ROUTES.contains(&path) {
        RouteRequirement::SignedIn
    } else {
        RouteRequirement::Public
    }
}

/// guard
///
/// Anonymous visitors on a protected path go to the login entry point; a signed-in
/// visitor holding the wrong role is sent to their own landing route.
pub fn guard(path: &str, role: Option<Role>) -> RouteDecision {
    match (route_requirement(path), role) {
        (RouteRequirement::Public, _) => RouteDecision::Render,
        (RouteRequirement::SignedIn | RouteRequirement::Role(_), None) => {
            RouteDecision::RedirectToLogin
        }
        (RouteRequirement::SignedIn, Some(_)) => RouteDecision::Render,
        (RouteRequirement::Role(required), Some(held)) if held == required => RouteDecision::Render,
        (RouteRequirement::Role(_), Some(held)) => {
            RouteDecision::Redirect(resolve_landing_route(Some(held)))
        }
    }
}
