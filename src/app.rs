use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::assets::Assets;
use crate::auth::CredentialVerifier;
use crate::db::SessionStore;
use crate::error::SessionError;
use crate::models::{Mutation, PatientInput, ReportArtifact, Role, TreatmentResponse};
use crate::report::{self, ReportExporter};
use crate::risk;
use crate::router;
use crate::session::Session;
use crate::views::{self, Notice, ViewContext};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Enter,
    Login {
        role: Role,
        username: String,
        password: String,
    },
    Goto(Role),
    Predict(PatientInput),
    Export,
    Download(PathBuf),
    Logout,
    Show,
    Help,
    Quit,
}

const HELP: &str = "actions: enter | login <role> <user> <pass> | goto <role> | \
predict <age> <mutation> <response> <ldh> | export | download <dir> | logout | show | help | quit";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = match parts.as_slice() {
            [] | ["show"] => Command::Show,
            ["enter"] => Command::Enter,
            ["login", role, username, password] => Command::Login {
                role: role.parse()?,
                username: username.to_string(),
                password: password.to_string(),
            },
            ["goto", role] => Command::Goto(role.parse()?),
            ["predict", age, mutation, response, ldh] => {
                let age: u32 = age
                    .parse()
                    .with_context(|| format!("age '{age}' is not a whole number"))?;
                let ldh: f64 = ldh
                    .parse()
                    .with_context(|| format!("LDH '{ldh}' is not a number"))?;
                let mutation: Mutation = mutation.parse()?;
                let response: TreatmentResponse = response.parse()?;
                Command::Predict(PatientInput::new(age, mutation, response, ldh)?)
            }
            ["export"] => Command::Export,
            ["download", dir] => Command::Download(PathBuf::from(dir)),
            ["logout"] => Command::Logout,
            ["help"] => Command::Help,
            ["quit"] | ["exit"] => Command::Quit,
            _ => anyhow::bail!("unrecognised action '{}'", line.trim()),
        };
        Ok(command)
    }
}

pub struct Dashboard<V> {
    pub verifier: V,
    pub assets: Assets,
    pub reports_dir: PathBuf,
    pub seed: u64,
}

impl<V: CredentialVerifier> Dashboard<V> {
    /// Applies one action and returns the next session together with any
    /// notice to show above the re-rendered screen.
    pub fn handle(&self, mut session: Session, command: Command) -> (Session, Option<Notice>) {
        let result = match command {
            Command::Enter => session.enter().map(|_| None),
            Command::Login {
                role,
                username,
                password,
            } => match session.login(&self.verifier, role, &username, &password) {
                Ok(()) => {
                    tracing::info!(session = %session.id, %role, user = %username, "signed in");
                    Ok(None)
                }
                Err(err) => {
                    tracing::warn!(session = %session.id, %role, user = %username, "rejected sign-in");
                    Err(err)
                }
            },
            Command::Goto(role) => session.switch_role(role).map(|_| None),
            Command::Predict(input) => session.predict(input).map(|assessment| {
                Some(Notice::Info(format!(
                    "Predicted {} ({})",
                    risk::format_percent(assessment.probability),
                    assessment.level
                )))
            }),
            Command::Export => return self.export(session),
            Command::Download(dir) => return download(session, &dir),
            Command::Logout => {
                let id = session.id;
                session.logout().map(|_| {
                    tracing::info!(session = %id, "signed out");
                    None
                })
            }
            Command::Show | Command::Quit => Ok(None),
            Command::Help => Ok(Some(Notice::Info(HELP.to_string()))),
        };

        match result {
            Ok(notice) => (session, notice),
            Err(err) => (session, Some(Notice::Error(err.to_string()))),
        }
    }

    pub fn exporter_for(&self, session: &Session) -> ReportExporter {
        ReportExporter::new(
            self.reports_dir.join(session.id.to_string()),
            self.assets.logo.clone(),
        )
    }

    fn export(&self, mut session: Session) -> (Session, Option<Notice>) {
        if !session.on_physician_panel() {
            let err = SessionError::NotAvailable {
                action: "export",
                screen: router::route(&session).title(),
            };
            return (session, Some(Notice::Error(err.to_string())));
        }

        let generated_at = Local::now().naive_local();
        let snapshot = session.form;
        let probability = session.assessment().probability;
        let exported = self.exporter_for(&session).export(
            &snapshot.report_attributes(),
            probability,
            generated_at,
        );

        match exported {
            Ok(path) => {
                let artifact = ReportArtifact {
                    path,
                    download_name: report::download_name(generated_at),
                    patient: snapshot,
                    probability,
                    generated_at,
                };
                let notice = Notice::Info(format!("Report generated: {}", artifact.download_name));
                match session.attach_artifact(artifact) {
                    Ok(()) => (session, Some(notice)),
                    Err(err) => (session, Some(Notice::Error(err.to_string()))),
                }
            }
            Err(err) => {
                tracing::error!(session = %session.id, error = %err, "report export failed");
                (
                    session,
                    Some(Notice::Error(
                        "Report export failed; please try again.".to_string(),
                    )),
                )
            }
        }
    }

    pub fn render(&self, session: &Session, notice: Option<&Notice>) -> String {
        let ctx = ViewContext {
            assets: &self.assets,
            seed: self.seed,
        };
        views::render(router::route(session), session, &ctx, notice)
    }
}

fn download(session: Session, dir: &Path) -> (Session, Option<Notice>) {
    let Some(artifact) = session.artifact.as_ref() else {
        return (
            session,
            Some(Notice::Error("No report has been exported yet.".to_string())),
        );
    };

    let target = dir.join(&artifact.download_name);
    let copied = std::fs::create_dir_all(dir).and_then(|_| std::fs::copy(&artifact.path, &target));
    let notice = match copied {
        Ok(_) => {
            tracing::info!(session = %session.id, path = %target.display(), "report downloaded");
            Notice::Info(format!("Saved {}", target.display()))
        }
        Err(err) => {
            tracing::error!(session = %session.id, error = %err, "report download failed");
            Notice::Error(format!("Could not save report: {err}"))
        }
    };
    (session, Some(notice))
}

/// Drives one session from line-oriented input: each line is one action
/// followed by one full render. The session is saved after every action.
pub async fn run<V, R, W>(
    dashboard: &Dashboard<V>,
    store: &SessionStore,
    mut session: Session,
    input: R,
    mut output: W,
) -> anyhow::Result<Session>
where
    V: CredentialVerifier,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!(session = %session.id, "session started");
    emit(dashboard, &mut session, None, &mut output).await?;
    store.save(&session).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                let notice = Notice::Error(format!("{err:#}"));
                emit(dashboard, &mut session, Some(&notice), &mut output).await?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        let (next, notice) = dashboard.handle(session, command);
        session = next;
        emit(dashboard, &mut session, notice.as_ref(), &mut output).await?;
        store.save(&session).await?;
    }

    tracing::info!(session = %session.id, "session closed");
    Ok(session)
}

async fn emit<V, W>(
    dashboard: &Dashboard<V>,
    session: &mut Session,
    notice: Option<&Notice>,
    output: &mut W,
) -> anyhow::Result<()>
where
    V: CredentialVerifier,
    W: AsyncWrite + Unpin,
{
    let screen = dashboard.render(session, notice);
    session.rendered();
    output.write_all(screen.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DemoCredentials;
    use crate::session::Stage;

    fn dashboard(reports_dir: PathBuf) -> Dashboard<DemoCredentials> {
        Dashboard {
            verifier: DemoCredentials,
            assets: Assets::default(),
            reports_dir,
            seed: crate::metrics::DEFAULT_SEED,
        }
    }

    async fn drive(dashboard: &Dashboard<DemoCredentials>, script: &str) -> (Session, String) {
        let store = SessionStore::memory();
        let mut out = Vec::new();
        let session = run(dashboard, &store, Session::default(), script.as_bytes(), &mut out)
            .await
            .unwrap();
        (session, String::from_utf8(out).unwrap())
    }

    fn screens(output: &str) -> Vec<&str> {
        output
            .lines()
            .filter_map(|line| line.strip_prefix("==== "))
            .filter_map(|line| line.strip_suffix(" ===="))
            .collect()
    }

    #[test]
    fn parses_actions() {
        assert_eq!("enter".parse::<Command>().unwrap(), Command::Enter);
        assert_eq!("".parse::<Command>().unwrap(), Command::Show);
        assert_eq!(
            "login Decision-Maker admin admin123".parse::<Command>().unwrap(),
            Command::Login {
                role: Role::DecisionMaker,
                username: "admin".to_string(),
                password: "admin123".to_string(),
            }
        );
        assert_eq!(
            "goto physician".parse::<Command>().unwrap(),
            Command::Goto(Role::Physician)
        );
        let predict = "predict 45 FLT3-ITD Partial 520".parse::<Command>().unwrap();
        assert_eq!(
            predict,
            Command::Predict(
                PatientInput::new(45, Mutation::Flt3Itd, TreatmentResponse::Partial, 520.0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn rejects_malformed_actions() {
        assert!("predict 12 None Stable 300".parse::<Command>().is_err());
        assert!("predict 40 KRAS Stable 300".parse::<Command>().is_err());
        assert!("login nurse x y".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn decision_maker_sees_about_once_then_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = dashboard(dir.path().to_path_buf());
        let script = "enter\nlogin Decision-Maker admin admin123\nshow\nlogout\n";
        let (session, output) = drive(&dashboard, script).await;

        assert_eq!(
            screens(&output),
            vec!["Splash", "Login", "About", "Decision Dashboard", "Splash"]
        );
        assert_eq!(session.stage, Stage::Unentered);
        assert_eq!(session.auth.role, None);
    }

    #[tokio::test]
    async fn bad_password_shows_notice_and_stays_on_login() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = dashboard(dir.path().to_path_buf());
        let (session, output) = drive(&dashboard, "enter\nlogin Physician doc wrongpass\n").await;

        assert_eq!(screens(&output), vec!["Splash", "Login", "Login"]);
        assert!(output.contains("(!) Invalid credentials"));
        assert_eq!(session.stage, Stage::Unauthenticated);
        assert_eq!(session.auth.role, None);
    }

    #[tokio::test]
    async fn physician_exports_and_downloads_report() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");
        let dashboard = dashboard(dir.path().join("reports"));
        let script = format!(
            "enter\nlogin Physician doc doc123\nshow\npredict 45 FLT3-ITD Partial 520\nexport\ndownload {}\n",
            downloads.display()
        );
        let (session, output) = drive(&dashboard, &script).await;

        let artifact = session.artifact.expect("artifact");
        assert!(artifact.path.starts_with(dir.path().join("reports").join(session.id.to_string())));
        assert!(artifact.download_name.starts_with("Report_"));
        assert!(downloads.join(&artifact.download_name).exists());
        assert!(output.contains("Report generated: Report_"));
        assert!(output.contains("Estimated 1-year mortality probability: 74.5%"));
    }

    #[tokio::test]
    async fn export_failure_is_shown_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let dashboard = dashboard(blocker);
        let (session, output) =
            drive(&dashboard, "enter\nlogin Physician doc doc123\nshow\nexport\n").await;

        assert!(output.contains("(!) Report export failed"));
        assert!(session.artifact.is_none());
    }

    #[tokio::test]
    async fn about_page_can_switch_role() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = dashboard(dir.path().to_path_buf());
        let (session, output) =
            drive(&dashboard, "enter\nlogin Decision-Maker admin admin123\ngoto physician\n").await;

        assert_eq!(
            screens(&output),
            vec!["Splash", "Login", "About", "Physician Panel"]
        );
        assert_eq!(session.auth.role, Some(Role::Physician));
    }

    #[tokio::test]
    async fn unknown_action_keeps_screen() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = dashboard(dir.path().to_path_buf());
        let (_, output) = drive(&dashboard, "dance\n").await;
        assert_eq!(screens(&output), vec!["Splash", "Splash"]);
        assert!(output.contains("unrecognised action 'dance'"));
    }
}
