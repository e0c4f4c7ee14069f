use super::NavLink;
use crate::resource::{ListScope, ResourceKind};

/// Administrator sidebar. Every managed collection is reachable from here.
pub const LINKS: &[NavLink] = &[
    NavLink::page("Home", "/dashboard/admin"),
    NavLink::panel("Users", "/dashboard/admin/users", ResourceKind::User, ListScope::All),
    NavLink::page("Update Profile", "/dashboard/admin/profile"),
    NavLink::panel("Blogs", "/dashboard/admin/blog", ResourceKind::Blog, ListScope::All),
    NavLink::panel(
        "Projects",
        "/dashboard/admin/project",
        ResourceKind::Project,
        ListScope::All,
    ),
    NavLink::panel(
        "Messages",
        "/dashboard/admin/message",
        ResourceKind::Message,
        ListScope::All,
    ),
];
