/// Route Catalogue
///
/// The site's navigation split by audience. The guard decides *whether* a visitor may
/// enter the dashboard; this module decides *what* they see once inside.
///
/// Public pages are open to everyone.
pub mod public;

/// Links presented inside the administrator shell.
pub mod admin;

/// Links presented inside the standard user shell.
pub mod user;

use crate::models::Role;
use crate::resource::{ListScope, ResourceKind};

/// PanelRoute
///
/// The resource panel a page instantiates, and how it lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRoute {
    pub kind: ResourceKind,
    pub scope: ListScope,
}

/// NavLink
///
/// One sidebar or navbar entry. `panel` is set for pages that host a resource panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub name: &'static str,
    pub path: &'static str,
    pub panel: Option<PanelRoute>,
}

impl NavLink {
    pub const fn page(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            panel: None,
        }
    }

    pub const fn panel(
        name: &'static str,
        path: &'static str,
        kind: ResourceKind,
        scope: ListScope,
    ) -> Self {
        Self {
            name,
            path,
            panel: Some(PanelRoute { kind, scope }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Admin,
    Standard,
}

/// Layout
///
/// The navigational shell and sidebar for a signed-in role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub shell: Shell,
    pub links: &'static [NavLink],
}

impl Layout {
    /// for_role
    ///
    /// Pure mapping from role to shell and link set. Callers obtain layouts through the
    /// route guard, which only invokes this once access is granted.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self {
                shell: Shell::Admin,
                links: admin::LINKS,
            },
            Role::User => Self {
                shell: Shell::Standard,
                links: user::LINKS,
            },
        }
    }

    /// The landing page of this shell (its first link).
    pub fn home(&self) -> &'static str {
        self.links.first().map(|link| link.path).unwrap_or("/dashboard")
    }

    pub fn find(&self, path: &str) -> Option<&'static NavLink> {
        self.links.iter().find(|link| link.path == path)
    }

    /// Every panel reachable from this shell, in sidebar order.
    pub fn panels(&self) -> impl Iterator<Item = PanelRoute> + '_ {
        self.links.iter().filter_map(|link| link.panel)
    }

    pub fn reaches(&self, kind: ResourceKind) -> bool {
        self.panels().any(|panel| panel.kind == kind)
    }
}
