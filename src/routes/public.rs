use super::NavLink;
use crate::resource::{ListScope, ResourceKind};

/// Public Navigation
///
/// Pages any visitor can open without signing in. The projects page lists through the
/// same panel machinery as the dashboard, with its own page size.
pub const LINKS: &[NavLink] = &[
    NavLink::page("Home", "/"),
    NavLink::page("About", "/about"),
    NavLink::panel("Projects", "/projects", ResourceKind::Project, ListScope::All),
    NavLink::panel("Blogs", "/blogs", ResourceKind::Blog, ListScope::All),
    NavLink::page("Contact", "/contact"),
];

/// Page size of the public projects grid.
pub const PROJECTS_PAGE_LIMIT: u32 = 6;

pub const LOGIN: NavLink = NavLink::page("Login", "/login");
pub const REGISTER: NavLink = NavLink::page("Register", "/register");

/// is_public
///
/// True for paths that never pass through the route guard.
pub fn is_public(path: &str) -> bool {
    path == LOGIN.path || path == REGISTER.path || LINKS.iter().any(|link| link.path == path)
}
