//! Role-based access rules consumed by the routing layer.
//!
//! Denials never produce an error page: an unauthenticated caller is sent
//! to the login view and an authenticated caller without the required
//! role is sent back to the dashboard.

use serde::{Deserialize, Serialize};

use crate::models::identity::{Identity, Role};

const ALL_ROLES: &[Role] = &Role::ALL;
const SUPERVISOR: &[Role] = &[Role::Supervisor];
const TECHNICIAN: &[Role] = &[Role::Technician];
const HOD: &[Role] = &[Role::Hod];
const OVERSIGHT: &[Role] = &[Role::Hod, Role::SuperAdmin];
const ADMIN: &[Role] = &[Role::SuperAdmin];

/// A routable screen of the application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    SignUp,
    Dashboard,
    SubmitTicket,
    MyTickets,
    History,
    AvailableTasks,
    MyTasks,
    Calendar,
    AllTickets,
    Reports,
    Analytics,
    Alerts,
    UserManagement,
    SystemSettings,
}

impl View {
    pub const ALL: [View; 15] = [
        View::Login,
        View::SignUp,
        View::Dashboard,
        View::SubmitTicket,
        View::MyTickets,
        View::History,
        View::AvailableTasks,
        View::MyTasks,
        View::Calendar,
        View::AllTickets,
        View::Reports,
        View::Analytics,
        View::Alerts,
        View::UserManagement,
        View::SystemSettings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            View::Login => "/login",
            View::SignUp => "/signup",
            View::Dashboard => "/dashboard",
            View::SubmitTicket => "/submit-ticket",
            View::MyTickets => "/my-tickets",
            View::History => "/history",
            View::AvailableTasks => "/available-tasks",
            View::MyTasks => "/my-tasks",
            View::Calendar => "/calendar",
            View::AllTickets => "/all-tickets",
            View::Reports => "/reports",
            View::Analytics => "/analytics",
            View::Alerts => "/alerts",
            View::UserManagement => "/users",
            View::SystemSettings => "/settings",
        }
    }

    /// Resolve a request path. The root path lands on the dashboard.
    pub fn from_path(path: &str) -> Option<View> {
        if path == "/" {
            return Some(View::Dashboard);
        }
        View::ALL.into_iter().find(|v| v.path() == path)
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Login => "Login",
            View::SignUp => "Sign Up",
            View::Dashboard => "Dashboard",
            View::SubmitTicket => "Submit Ticket",
            View::MyTickets => "My Tickets",
            View::History => "History",
            View::AvailableTasks => "Available Tasks",
            View::MyTasks => "My Tasks",
            View::Calendar => "Calendar",
            View::AllTickets => "All Tickets",
            View::Reports => "Reports",
            View::Analytics => "Analytics",
            View::Alerts => "Alerts",
            View::UserManagement => "User Management",
            View::SystemSettings => "System Settings",
        }
    }

    /// Views reachable without signing in.
    pub fn is_public(&self) -> bool {
        matches!(self, View::Login | View::SignUp)
    }

    /// Roles allowed into a protected view. Empty for public views.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            View::Login | View::SignUp => &[],
            View::Dashboard => ALL_ROLES,
            View::SubmitTicket | View::MyTickets | View::History => SUPERVISOR,
            View::AvailableTasks | View::MyTasks | View::Calendar => TECHNICIAN,
            View::AllTickets | View::Reports | View::Analytics => OVERSIGHT,
            View::Alerts => HOD,
            View::UserManagement | View::SystemSettings => ADMIN,
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    RedirectToLogin,
    RedirectToDashboard,
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }

    /// Where the router should send the caller instead, if anywhere.
    pub fn redirect(&self) -> Option<View> {
        match self {
            AccessDecision::Granted => None,
            AccessDecision::RedirectToLogin => Some(View::Login),
            AccessDecision::RedirectToDashboard => Some(View::Dashboard),
        }
    }
}

/// Core predicate: is the session's identity allowed into something that
/// requires one of `allowed`?
///
/// Pass the identity freshly resolved from the session; a missing or
/// non-active identity is treated as signed out.
pub fn can_access(identity: Option<&Identity>, allowed: &[Role]) -> AccessDecision {
    match identity {
        Some(identity) if identity.is_active() => {
            if allowed.contains(&identity.role) {
                AccessDecision::Granted
            } else {
                AccessDecision::RedirectToDashboard
            }
        }
        _ => AccessDecision::RedirectToLogin,
    }
}

/// Route-level check. Signed-in identities are bounced off the login and
/// sign-up screens.
pub fn authorize_view(identity: Option<&Identity>, view: View) -> AccessDecision {
    if view.is_public() {
        return match identity {
            Some(identity) if identity.is_active() => AccessDecision::RedirectToDashboard,
            _ => AccessDecision::Granted,
        };
    }
    can_access(identity, view.allowed_roles())
}

/// Sidebar entries offered to a role, dashboard first.
pub fn navigation(role: Role) -> Vec<View> {
    let mut views = vec![View::Dashboard];
    views.extend_from_slice(match role {
        Role::Supervisor => &[View::SubmitTicket, View::MyTickets, View::History][..],
        Role::Technician => &[View::AvailableTasks, View::MyTasks, View::Calendar][..],
        Role::Hod => &[
            View::AllTickets,
            View::Reports,
            View::Analytics,
            View::Alerts,
        ][..],
        Role::SuperAdmin => &[
            View::AllTickets,
            View::UserManagement,
            View::SystemSettings,
            View::Reports,
            View::Analytics,
        ][..],
    });
    views
}
