use std::io::{Read, Write};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::{Mutation, PatientInput, RiskLevel, TreatmentResponse};
use crate::risk;

#[derive(Debug, Deserialize)]
struct PatientRow {
    patient_id: Option<String>,
    age: u32,
    mutation: Mutation,
    response: TreatmentResponse,
    ldh: f64,
}

#[derive(Debug, Serialize)]
pub struct ScoredRow {
    pub patient_id: String,
    pub age: u8,
    pub mutation: Mutation,
    pub response: TreatmentResponse,
    pub ldh: f64,
    pub probability: f64,
    pub level: RiskLevel,
}

/// Scores every row of a patient CSV (`patient_id,age,mutation,response,ldh`).
/// Rows outside the form domain abort the whole batch.
pub fn score_csv<R: Read>(input: R) -> anyhow::Result<Vec<ScoredRow>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut scored = Vec::new();

    for (index, result) in reader.deserialize::<PatientRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("invalid patient row on line {line}"))?;
        let patient = PatientInput::new(row.age, row.mutation, row.response, row.ldh)
            .with_context(|| format!("patient on line {line} is outside the form domain"))?;
        let probability = risk::score(&patient);

        scored.push(ScoredRow {
            patient_id: row.patient_id.unwrap_or_else(|| format!("row-{}", index + 1)),
            age: patient.age(),
            mutation: patient.mutation(),
            response: patient.response(),
            ldh: patient.ldh(),
            probability,
            level: risk::classify(probability),
        });
    }

    Ok(scored)
}

pub fn write_scores<W: Write>(output: W, rows: &[ScoredRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
