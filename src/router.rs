use crate::models::Role;
use crate::session::{Session, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Login,
    About,
    DecisionDashboard,
    PhysicianPanel,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Splash => "Splash",
            Screen::Login => "Login",
            Screen::About => "About",
            Screen::DecisionDashboard => "Decision Dashboard",
            Screen::PhysicianPanel => "Physician Panel",
        }
    }
}

pub fn route(session: &Session) -> Screen {
    match session.stage {
        Stage::Unentered => Screen::Splash,
        Stage::Unauthenticated => Screen::Login,
        Stage::FirstView => Screen::About,
        Stage::Routed => match session.auth.role {
            Some(Role::DecisionMaker) => Screen::DecisionDashboard,
            _ => Screen::PhysicianPanel,
        },
    }
}
