use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("age {0} is outside 18..=89")]
    AgeOutOfRange(u32),

    #[error("LDH {0} U/L is outside 80..=2000")]
    LdhOutOfRange(f64),

    #[error("unknown mutation '{0}' (expected None, FLT3-ITD, NPM1, IDH1 or IDH2)")]
    UnknownMutation(String),

    #[error("unknown treatment response '{0}' (expected Complete, Partial, Stable or Progression)")]
    UnknownResponse(String),

    #[error("unknown role '{0}' (expected Decision-Maker or Physician)")]
    UnknownRole(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("'{action}' is not available on the {screen} screen")]
    NotAvailable {
        action: &'static str,
        screen: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render report: {0}")]
    Render(String),
}
