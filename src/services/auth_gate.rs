use serde::Serialize;

use crate::models::{User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Login,
    Subscribe,
    Dashboard,
}

impl View {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "login" => Some(View::Login),
            "subscribe" => Some(View::Subscribe),
            "dashboard" => Some(View::Dashboard),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            View::Login => "/login",
            View::Subscribe => "/subscribe",
            View::Dashboard => "/dashboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    Allow,
    Redirect { location: &'static str },
}

impl GateDecision {
    fn redirect(to: View) -> Self {
        GateDecision::Redirect { location: to.path() }
    }
}

/// The view a caller belongs on, given who they are.
fn home_for(user: Option<&User>) -> View {
    match user {
        None => View::Login,
        // Members are covered by their organization's plan.
        Some(u) if u.role == UserRole::Member => View::Dashboard,
        Some(u) if u.subscription_status.is_paying() => View::Dashboard,
        Some(_) => View::Subscribe,
    }
}

pub fn evaluate(user: Option<&User>, requested: View) -> GateDecision {
    let home = home_for(user);
    if requested == home {
        GateDecision::Allow
    } else {
        GateDecision::redirect(home)
    }
}
