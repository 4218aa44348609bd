use std::fmt::Write;

use crate::assets::Assets;
use crate::metrics;
use crate::models::{DemoMetrics, Mutation, TreatmentResponse};
use crate::risk;
use crate::router::Screen;
use crate::session::Session;

pub const APP_NAME: &str = "BAQĀ – Big-data Analytics for Quality of Life & Assurance";
const TAGLINE: &str =
    "Connecting every specialty. Unifying every dataset. Predicting outcomes. Enhancing life.";
const FOOTER: &str =
    "Trusted references: WHO · IARC GLOBOCAN · NCCN · ClinicalTrials.gov. Demo only — not for clinical use.";

const BAR_WIDTH: usize = 40;
const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct ViewContext<'a> {
    pub assets: &'a Assets,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub fn render(
    screen: Screen,
    session: &Session,
    ctx: &ViewContext<'_>,
    notice: Option<&Notice>,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "==== {} ====", screen.title());

    match notice {
        Some(Notice::Info(message)) => {
            let _ = writeln!(output, "(i) {message}");
        }
        Some(Notice::Error(message)) => {
            let _ = writeln!(output, "(!) {message}");
        }
        None => {}
    }

    match screen {
        Screen::Splash => splash(&mut output, ctx),
        Screen::Login => login(&mut output),
        Screen::About => about(&mut output),
        Screen::DecisionDashboard => {
            topbar(&mut output, session, ctx);
            decision_dashboard(&mut output, &metrics::generate(ctx.seed));
        }
        Screen::PhysicianPanel => {
            topbar(&mut output, session, ctx);
            physician_panel(&mut output, session);
        }
    }

    let _ = writeln!(output, "---");
    let _ = writeln!(output, "{FOOTER}");
    if let Some(accent) = ctx.assets.accent() {
        let _ = writeln!(output, "theme accent {accent}");
    }
    output
}

fn topbar(output: &mut String, session: &Session, ctx: &ViewContext<'_>) {
    let role = session
        .auth
        .role
        .map(|role| role.label())
        .unwrap_or("Guest");
    let _ = writeln!(
        output,
        "{} | BAQĀ – Decision Intelligence [{}]    (logout)",
        ctx.assets.brand(),
        role
    );
    let _ = writeln!(output);
}

fn splash(output: &mut String, ctx: &ViewContext<'_>) {
    let _ = writeln!(output, "{}", ctx.assets.brand());
    let _ = writeln!(output, "{APP_NAME}");
    let _ = writeln!(output, "{TAGLINE}");
    let _ = writeln!(output);
    let _ = writeln!(output, "> enter    Enter BAQĀ");
}

fn login(output: &mut String) {
    let _ = writeln!(output, "Welcome to BAQĀ");
    let _ = writeln!(output, "Sign in to access the dashboards.");
    let _ = writeln!(output);
    let _ = writeln!(output, "Roles: Decision-Maker, Physician");
    let _ = writeln!(output, "> login <role> <username> <password>");
    let _ = writeln!(
        output,
        "Demo – Decision-Maker: admin/admin123 · Physician: doc/doc123"
    );
}

fn about(output: &mut String) {
    let _ = writeln!(output, "Welcome to BAQĀ");
    let _ = writeln!(
        output,
        "BAQĀ is an intelligent data-driven platform that integrates multi-source medical data \
         to assist healthcare professionals and decision-makers in predicting cancer outcomes, \
         optimizing interventions, and improving patients' quality of life."
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "> goto decision     Go to Decision Dashboard");
    let _ = writeln!(output, "> goto physician    Go to Physician Panel");
}

fn decision_dashboard(output: &mut String, metrics: &DemoMetrics) {
    let _ = writeln!(output, "Decision-Makers Dashboard");
    let _ = writeln!(
        output,
        "Demo data — replace with governed sources (registries/EMR/BI)."
    );
    let _ = writeln!(output);

    let kpis = [
        ("Cases Included", group_thousands(metrics.cases)),
        ("Deaths Included", group_thousands(metrics.deaths)),
        ("Overall Risk Level", metrics.overall_level.to_string()),
        ("Five-year Mortality", format!("{:.1}%", metrics.five_year_mortality)),
    ];
    for (label, value) in kpis {
        let _ = writeln!(output, "  {label:<20} {value}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Mortality Risk by Region (demo) — Risk Index");
    let regions: Vec<(&str, u32)> = metrics
        .regions
        .iter()
        .map(|r| (r.region.as_str(), r.index))
        .collect();
    bar_chart(output, &regions, 100);

    let _ = writeln!(output);
    let _ = writeln!(output, "High-Risk Factors — Contribution (%)");
    let factors: Vec<(&str, u32)> = metrics
        .factors
        .iter()
        .map(|f| (f.factor.as_str(), f.percent))
        .collect();
    bar_chart(output, &factors, 26);
}

fn physician_panel(output: &mut String, session: &Session) {
    let form = &session.form;
    let assessment = session.assessment();

    let _ = writeln!(output, "Patient Assessment");
    let _ = writeln!(
        output,
        "Leukemia mortality risk — demo model (not for clinical use)."
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "> predict <age 18-89> <mutation: {}> <response: {}> <ldh 80-2000>",
        join_labels(Mutation::ALL.iter().map(|m| m.label())),
        join_labels(TreatmentResponse::ALL.iter().map(|r| r.label())),
    );
    let _ = writeln!(
        output,
        "Demo only — replace with validated, peer-reviewed model and governed thresholds."
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "LEUKEMIA MORTALITY RISK");
    let _ = writeln!(output, "  {}", gauge(assessment.probability));
    let _ = writeln!(output, "  Risk Level: {}", assessment.level);
    let _ = writeln!(
        output,
        "  Estimated 1-year mortality probability: {}",
        risk::format_percent(assessment.probability)
    );
    let _ = writeln!(output, "> export    Export PDF Report");

    let _ = writeln!(output);
    let _ = writeln!(output, "Risk Factors");
    for (label, value) in form.report_attributes() {
        let _ = writeln!(output, "  - {label}: {value}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Survival Probability (demo curve)");
    let curve = risk::survival_curve(assessment.probability);
    let spark: String = curve
        .iter()
        .map(|point| {
            let idx = (point.probability * (SPARK.len() - 1) as f64).round() as usize;
            SPARK[idx.min(SPARK.len() - 1)]
        })
        .collect();
    let _ = writeln!(output, "  {spark}");
    let yearly: Vec<String> = (0..=5)
        .map(|year| {
            format!(
                "{year}y {:.2}",
                risk::survival_at(assessment.probability, f64::from(year))
            )
        })
        .collect();
    let _ = writeln!(output, "  {}", yearly.join("  "));

    if let Some(artifact) = &session.artifact {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Report ready: {} ({})",
            artifact.download_name,
            risk::format_percent(artifact.probability)
        );
        let _ = writeln!(output, "> download <dir>    Download PDF");
    }
}

fn gauge(probability: f64) -> String {
    let filled = ((probability * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!(
        "[{}{}] needle {:+.1}°",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        risk::gauge_angle(probability)
    )
}

fn bar_chart(output: &mut String, series: &[(&str, u32)], scale_max: u32) {
    let label_width = series.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in series {
        let len = (*value as usize * BAR_WIDTH) / scale_max.max(1) as usize;
        let _ = writeln!(
            output,
            "  {label:<label_width$} |{} {value}",
            "█".repeat(len.min(BAR_WIDTH))
        );
    }
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join("|")
}

pub fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
