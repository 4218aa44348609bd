use crate::models::{
    Mutation, PatientInput, RiskAssessment, RiskLevel, SurvivalPoint, TreatmentResponse,
};

pub const LOW_CUTOFF: f64 = 0.33;
pub const MODERATE_CUTOFF: f64 = 0.66;

/// Probability shown before the first prediction of a session.
pub const DEFAULT_PROBABILITY: f64 = 0.45;

const SURVIVAL_POINTS: usize = 60;
const SURVIVAL_HORIZON_YEARS: f64 = 5.0;

pub fn mutation_weight(mutation: Mutation) -> f64 {
    match mutation {
        Mutation::Flt3Itd => 0.6,
        Mutation::Idh1 | Mutation::Idh2 => 0.25,
        Mutation::Npm1 => 0.15,
        Mutation::None => 0.0,
    }
}

pub fn response_weight(response: TreatmentResponse) -> f64 {
    match response {
        TreatmentResponse::Partial => 0.3,
        TreatmentResponse::Progression => 0.7,
        TreatmentResponse::Complete => -0.25,
        TreatmentResponse::Stable => 0.1,
    }
}

/// LDH only contributes above 250 U/L.
pub fn ldh_term(ldh: f64) -> f64 {
    ((ldh - 250.0) / 500.0).max(0.0) * 0.5
}

pub fn linear_score(input: &PatientInput) -> f64 {
    (f64::from(input.age()) - 50.0) * 0.02
        + mutation_weight(input.mutation())
        + response_weight(input.response())
        + ldh_term(input.ldh())
}

pub fn score(input: &PatientInput) -> f64 {
    1.0 / (1.0 + (-linear_score(input)).exp())
}

pub fn classify(probability: f64) -> RiskLevel {
    if probability < LOW_CUTOFF {
        RiskLevel::Low
    } else if probability < MODERATE_CUTOFF {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

pub fn assess(probability: f64) -> RiskAssessment {
    RiskAssessment {
        probability,
        level: classify(probability),
    }
}

/// Assessment for the last predicted inputs, or the default before any prediction.
pub fn assess_prediction(prediction: Option<&PatientInput>) -> RiskAssessment {
    assess(prediction.map(score).unwrap_or(DEFAULT_PROBABILITY))
}

/// Needle angle in degrees, -90 at 0% and +90 at 100%.
pub fn gauge_angle(probability: f64) -> f64 {
    -90.0 + probability * 180.0
}

pub fn survival_at(probability: f64, years: f64) -> f64 {
    let baseline = 0.95 * (-0.2 * years).exp();
    baseline * (1.0 - probability * 0.7).clamp(0.2, 1.0)
}

pub fn survival_curve(probability: f64) -> Vec<SurvivalPoint> {
    let step = SURVIVAL_HORIZON_YEARS / (SURVIVAL_POINTS - 1) as f64;
    (0..SURVIVAL_POINTS)
        .map(|i| {
            let years = i as f64 * step;
            SurvivalPoint {
                years,
                probability: survival_at(probability, years),
            }
        })
        .collect()
}

pub fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}
