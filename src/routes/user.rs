use super::NavLink;
use crate::resource::{ListScope, ResourceKind};

/// Standard user sidebar: their own blog posts and their profile.
pub const LINKS: &[NavLink] = &[
    NavLink::page("Home", "/dashboard/user"),
    NavLink::panel("My Blogs", "/dashboard/user/blog", ResourceKind::Blog, ListScope::Mine),
    NavLink::page("Update Profile", "/dashboard/user/profile"),
];
