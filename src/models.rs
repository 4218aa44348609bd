use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

pub const MIN_AGE: u8 = 18;
pub const MAX_AGE: u8 = 89;
pub const MIN_LDH: f64 = 80.0;
pub const MAX_LDH: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Decision-Maker")]
    DecisionMaker,
    Physician,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::DecisionMaker => "Decision-Maker",
            Role::Physician => "Physician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "decision-maker" | "decision" | "dm" => Ok(Role::DecisionMaker),
            "physician" | "doc" => Ok(Role::Physician),
            _ => Err(InputError::UnknownRole(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    None,
    #[serde(rename = "FLT3-ITD")]
    Flt3Itd,
    #[serde(rename = "NPM1")]
    Npm1,
    #[serde(rename = "IDH1")]
    Idh1,
    #[serde(rename = "IDH2")]
    Idh2,
}

impl Mutation {
    pub const ALL: [Mutation; 5] = [
        Mutation::None,
        Mutation::Flt3Itd,
        Mutation::Npm1,
        Mutation::Idh1,
        Mutation::Idh2,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Mutation::None => "None",
            Mutation::Flt3Itd => "FLT3-ITD",
            Mutation::Npm1 => "NPM1",
            Mutation::Idh1 => "IDH1",
            Mutation::Idh2 => "IDH2",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mutation {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Mutation::ALL
            .into_iter()
            .find(|mutation| mutation.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| InputError::UnknownMutation(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreatmentResponse {
    Complete,
    Partial,
    Stable,
    Progression,
}

impl TreatmentResponse {
    pub const ALL: [TreatmentResponse; 4] = [
        TreatmentResponse::Complete,
        TreatmentResponse::Partial,
        TreatmentResponse::Stable,
        TreatmentResponse::Progression,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TreatmentResponse::Complete => "Complete",
            TreatmentResponse::Partial => "Partial",
            TreatmentResponse::Stable => "Stable",
            TreatmentResponse::Progression => "Progression",
        }
    }
}

impl fmt::Display for TreatmentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TreatmentResponse {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TreatmentResponse::ALL
            .into_iter()
            .find(|response| response.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| InputError::UnknownResponse(value.to_string()))
    }
}

/// Inputs of one prediction request. Only constructible inside the
/// age and LDH domains the physician form allows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPatientInput")]
pub struct PatientInput {
    age: u8,
    mutation: Mutation,
    response: TreatmentResponse,
    ldh: f64,
}

#[derive(Deserialize)]
struct RawPatientInput {
    age: u32,
    mutation: Mutation,
    response: TreatmentResponse,
    ldh: f64,
}

impl TryFrom<RawPatientInput> for PatientInput {
    type Error = InputError;

    fn try_from(raw: RawPatientInput) -> Result<Self, Self::Error> {
        PatientInput::new(raw.age, raw.mutation, raw.response, raw.ldh)
    }
}

impl PatientInput {
    pub fn new(
        age: u32,
        mutation: Mutation,
        response: TreatmentResponse,
        ldh: f64,
    ) -> Result<Self, InputError> {
        if !(u32::from(MIN_AGE)..=u32::from(MAX_AGE)).contains(&age) {
            return Err(InputError::AgeOutOfRange(age));
        }
        if !(MIN_LDH..=MAX_LDH).contains(&ldh) {
            return Err(InputError::LdhOutOfRange(ldh));
        }

        Ok(Self {
            age: age as u8,
            mutation,
            response,
            ldh,
        })
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn mutation(&self) -> Mutation {
        self.mutation
    }

    pub fn response(&self) -> TreatmentResponse {
        self.response
    }

    pub fn ldh(&self) -> f64 {
        self.ldh
    }

    /// Label/value pairs in the order the report lists them.
    pub fn report_attributes(&self) -> Vec<(String, String)> {
        vec![
            ("Age".to_string(), self.age.to_string()),
            ("Mutation".to_string(), self.mutation.to_string()),
            ("Response".to_string(), self.response.to_string()),
            ("LDH".to_string(), format!("{} U/L", self.ldh)),
        ]
    }
}

impl Default for PatientInput {
    fn default() -> Self {
        Self {
            age: 68,
            mutation: Mutation::Flt3Itd,
            response: TreatmentResponse::Partial,
            ldh: 520.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub probability: f64,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivalPoint {
    pub years: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRisk {
    pub region: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: String,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoMetrics {
    pub seed: u64,
    pub cases: u32,
    pub deaths: u32,
    pub overall_level: RiskLevel,
    pub five_year_mortality: f64,
    pub regions: Vec<RegionRisk>,
    pub factors: Vec<FactorContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub path: PathBuf,
    pub download_name: String,
    pub patient: PatientInput,
    pub probability: f64,
    pub generated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inputs_outside_form_domain() {
        assert_eq!(
            PatientInput::new(17, Mutation::None, TreatmentResponse::Stable, 300.0),
            Err(InputError::AgeOutOfRange(17))
        );
        assert_eq!(
            PatientInput::new(90, Mutation::None, TreatmentResponse::Stable, 300.0),
            Err(InputError::AgeOutOfRange(90))
        );
        assert_eq!(
            PatientInput::new(40, Mutation::None, TreatmentResponse::Stable, 2000.5),
            Err(InputError::LdhOutOfRange(2000.5))
        );
        assert!(PatientInput::new(18, Mutation::None, TreatmentResponse::Stable, 80.0).is_ok());
        assert!(PatientInput::new(89, Mutation::Idh2, TreatmentResponse::Stable, 2000.0).is_ok());
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("flt3-itd".parse::<Mutation>(), Ok(Mutation::Flt3Itd));
        assert_eq!("None".parse::<Mutation>(), Ok(Mutation::None));
        assert_eq!("progression".parse::<TreatmentResponse>(), Ok(TreatmentResponse::Progression));
        assert_eq!("Decision-Maker".parse::<Role>(), Ok(Role::DecisionMaker));
        assert_eq!("physician".parse::<Role>(), Ok(Role::Physician));
        assert!("KRAS".parse::<Mutation>().is_err());
    }

    #[test]
    fn report_attributes_keep_form_order() {
        let input =
            PatientInput::new(45, Mutation::Flt3Itd, TreatmentResponse::Partial, 520.0).unwrap();
        let labels: Vec<String> = input
            .report_attributes()
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect();
        assert_eq!(
            labels,
            vec!["Age: 45", "Mutation: FLT3-ITD", "Response: Partial", "LDH: 520 U/L"]
        );
    }

    #[test]
    fn deserialization_enforces_domain() {
        let ok: PatientInput = serde_json::from_str(
            r#"{"age":45,"mutation":"FLT3-ITD","response":"Partial","ldh":520.0}"#,
        )
        .unwrap();
        assert_eq!(ok.age(), 45);

        let bad = serde_json::from_str::<PatientInput>(
            r#"{"age":12,"mutation":"None","response":"Stable","ldh":520.0}"#,
        );
        assert!(bad.is_err());
    }
}
