use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CredentialVerifier;
use crate::error::{AuthError, SessionError};
use crate::models::{PatientInput, ReportArtifact, RiskAssessment, Role};
use crate::risk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Splash screen, nothing entered yet.
    Unentered,
    /// Past the splash, waiting for credentials.
    Unauthenticated,
    /// Signed in, landing page not yet rendered.
    FirstView,
    /// Signed in, role dashboards from here on.
    Routed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthState {
    pub role: Option<Role>,
    pub authenticated: bool,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub stage: Stage,
    pub auth: AuthState,
    pub about_shown: bool,
    /// Current physician form values.
    pub form: PatientInput,
    /// Inputs of the last prediction; the probability is always rederived from these.
    pub prediction: Option<PatientInput>,
    pub artifact: Option<ReportArtifact>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            stage: Stage::Unentered,
            auth: AuthState::default(),
            about_shown: false,
            form: PatientInput::default(),
            prediction: None,
            artifact: None,
        }
    }

    pub fn assessment(&self) -> RiskAssessment {
        risk::assess_prediction(self.prediction.as_ref())
    }

    pub fn enter(&mut self) -> Result<(), SessionError> {
        self.require(Stage::Unentered == self.stage, "enter")?;
        self.stage = Stage::Unauthenticated;
        Ok(())
    }

    /// Failed attempts leave the session untouched; there is no lockout.
    pub fn login(
        &mut self,
        verifier: &dyn CredentialVerifier,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        self.require(self.stage == Stage::Unauthenticated, "login")?;
        if !verifier.verify(role, username, password) {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.auth = AuthState {
            role: Some(role),
            authenticated: true,
            username: username.to_string(),
        };
        self.stage = if self.about_shown {
            Stage::Routed
        } else {
            Stage::FirstView
        };
        Ok(())
    }

    /// Overwrites the active role without asking for credentials again.
    pub fn switch_role(&mut self, role: Role) -> Result<(), SessionError> {
        self.require(self.auth.authenticated, "goto")?;
        self.auth.role = Some(role);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.require(self.auth.authenticated, "logout")?;
        self.auth = AuthState::default();
        self.stage = Stage::Unentered;
        self.prediction = None;
        self.artifact = None;
        self.form = PatientInput::default();
        Ok(())
    }

    pub fn predict(&mut self, input: PatientInput) -> Result<RiskAssessment, SessionError> {
        self.require(self.on_physician_panel(), "predict")?;
        self.form = input;
        self.prediction = Some(input);
        Ok(self.assessment())
    }

    pub fn attach_artifact(&mut self, artifact: ReportArtifact) -> Result<(), SessionError> {
        self.require(self.on_physician_panel(), "export")?;
        self.artifact = Some(artifact);
        Ok(())
    }

    /// Called after every render; the landing page is only shown once.
    pub fn rendered(&mut self) {
        if self.stage == Stage::FirstView {
            self.stage = Stage::Routed;
            self.about_shown = true;
        }
    }

    pub fn on_physician_panel(&self) -> bool {
        self.stage == Stage::Routed && self.auth.role == Some(Role::Physician)
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), SessionError> {
        if allowed {
            Ok(())
        } else {
            Err(SessionError::NotAvailable {
                action,
                screen: crate::router::route(self).title(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DemoCredentials;
    use crate::models::{Mutation, TreatmentResponse};
    use crate::router::{route, Screen};

    fn signed_in(role: Role, user: &str, pass: &str) -> Session {
        let mut session = Session::default();
        session.enter().unwrap();
        session.login(&DemoCredentials, role, user, pass).unwrap();
        session
    }

    #[test]
    fn decision_maker_walkthrough() {
        let mut session = Session::default();
        assert_eq!(session.stage, Stage::Unentered);
        assert_eq!(route(&session), Screen::Splash);

        session.enter().unwrap();
        assert_eq!(session.stage, Stage::Unauthenticated);
        assert_eq!(route(&session), Screen::Login);

        session
            .login(&DemoCredentials, Role::DecisionMaker, "admin", "admin123")
            .unwrap();
        assert_eq!(session.stage, Stage::FirstView);
        assert_eq!(route(&session), Screen::About);
        session.rendered();

        assert_eq!(session.stage, Stage::Routed);
        assert_eq!(route(&session), Screen::DecisionDashboard);
        session.rendered();
        assert_eq!(route(&session), Screen::DecisionDashboard);

        session.logout().unwrap();
        assert_eq!(session.stage, Stage::Unentered);
        assert_eq!(session.auth, AuthState::default());
        assert_eq!(route(&session), Screen::Splash);
    }

    #[test]
    fn wrong_password_changes_nothing() {
        let mut session = Session::default();
        session.enter().unwrap();
        let before = session.clone();

        let err = session
            .login(&DemoCredentials, Role::Physician, "doc", "wrongpass")
            .unwrap_err();

        assert_eq!(err, SessionError::Auth(AuthError::InvalidCredentials));
        assert_eq!(session, before);
        assert_eq!(session.stage, Stage::Unauthenticated);
        assert_eq!(session.auth.role, None);
    }

    #[test]
    fn retries_are_unlimited() {
        let mut session = Session::default();
        session.enter().unwrap();
        for _ in 0..10 {
            assert!(session
                .login(&DemoCredentials, Role::Physician, "doc", "nope")
                .is_err());
        }
        session
            .login(&DemoCredentials, Role::Physician, "doc", "doc123")
            .unwrap();
        assert!(session.auth.authenticated);
    }

    #[test]
    fn about_is_not_shown_again_after_relogin() {
        let mut session = signed_in(Role::Physician, "doc", "doc123");
        session.rendered();
        session.logout().unwrap();
        assert!(session.about_shown);

        session.enter().unwrap();
        session
            .login(&DemoCredentials, Role::Physician, "doc", "doc123")
            .unwrap();
        assert_eq!(session.stage, Stage::Routed);
        assert_eq!(route(&session), Screen::PhysicianPanel);
    }

    #[test]
    fn role_switch_skips_reauthentication() {
        let mut session = signed_in(Role::DecisionMaker, "admin", "admin123");
        session.rendered();
        session.switch_role(Role::Physician).unwrap();
        assert_eq!(route(&session), Screen::PhysicianPanel);
        assert_eq!(session.auth.username, "admin");
    }

    #[test]
    fn actions_outside_their_screen_are_rejected() {
        let mut session = Session::default();
        let input = PatientInput::default();
        assert!(matches!(
            session.predict(input),
            Err(SessionError::NotAvailable { action: "predict", screen: "Splash" })
        ));
        assert!(session.logout().is_err());
        assert!(session.switch_role(Role::Physician).is_err());
        assert!(session
            .login(&DemoCredentials, Role::Physician, "doc", "doc123")
            .is_err());

        session.enter().unwrap();
        assert!(session.enter().is_err());
    }

    #[test]
    fn prediction_drives_assessment() {
        let mut session = signed_in(Role::Physician, "doc", "doc123");
        session.rendered();
        assert_eq!(session.assessment().probability, risk::DEFAULT_PROBABILITY);

        let input =
            PatientInput::new(80, Mutation::Flt3Itd, TreatmentResponse::Progression, 1500.0)
                .unwrap();
        let assessment = session.predict(input).unwrap();
        assert_eq!(assessment.probability, risk::score(&input));
        assert_eq!(assessment.level, risk::classify(assessment.probability));
        assert_eq!(session.form, input);

        session.logout().unwrap();
        assert_eq!(session.prediction, None);
        assert_eq!(session.assessment().probability, risk::DEFAULT_PROBABILITY);
    }

    #[test]
    fn decision_maker_cannot_predict() {
        let mut session = signed_in(Role::DecisionMaker, "admin", "admin123");
        session.rendered();
        assert!(session.predict(PatientInput::default()).is_err());
    }
}
