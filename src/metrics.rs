use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{DemoMetrics, FactorContribution, RegionRisk, RiskLevel};

pub const DEFAULT_SEED: u64 = 2025;

pub const REGIONS: [&str; 7] = [
    "Makkah", "Riyadh", "Eastern", "Madinah", "Qassim", "Asir", "Tabuk",
];

pub const RISK_FACTORS: [&str; 7] = [
    "Cardiovascular Disease",
    "Diabetes",
    "Older Age",
    "CKD",
    "Leukemia",
    "Liver Disease",
    "Hypertension",
];

const LEVEL_WEIGHTS: [(RiskLevel, f64); 3] = [
    (RiskLevel::Low, 0.25),
    (RiskLevel::Moderate, 0.55),
    (RiskLevel::High, 0.20),
];

/// Builds the decision-maker dashboard figures. The generator lives only for
/// this call, so the same seed always yields the same figures in the same order.
pub fn generate(seed: u64) -> DemoMetrics {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let cases = rng.gen_range(20_000..36_000);
    let deaths = rng.gen_range(11_000..18_000);
    let overall_level = weighted_level(&mut rng);
    let mortality: f64 = rng.gen_range(0.10..0.18);
    let five_year_mortality = (mortality * 100.0 * 10.0).round() / 10.0;

    let regions = REGIONS
        .iter()
        .map(|region| RegionRisk {
            region: region.to_string(),
            index: rng.gen_range(10..100),
        })
        .collect();

    let factors = RISK_FACTORS
        .iter()
        .map(|factor| FactorContribution {
            factor: factor.to_string(),
            percent: rng.gen_range(6..26),
        })
        .collect();

    DemoMetrics {
        seed,
        cases,
        deaths,
        overall_level,
        five_year_mortality,
        regions,
        factors,
    }
}

fn weighted_level(rng: &mut ChaCha8Rng) -> RiskLevel {
    // The weights are constant and positive, so construction cannot fail.
    WeightedIndex::new(LEVEL_WEIGHTS.iter().map(|(_, weight)| *weight))
        .map(|dist| LEVEL_WEIGHTS[dist.sample(rng)].0)
        .unwrap_or(RiskLevel::Moderate)
}
