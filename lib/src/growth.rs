// lib/src/growth.rs
//! Approximate growth percentiles.
//!
//! The estimate takes the median of the nearest reference age and maps the
//! ratio `value / median` linearly onto the percentile scale, clamped to
//! `[1, 99]`. It is a screening aid only: it ignores the skew of the real
//! reference distributions and is not a substitute for LMS-based charts.

use std::fmt;

use serde::{Deserialize, Serialize};

use models::validation::validate_measurement;
use models::{Gender, MedicalRecord};

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Weight,
    Height,
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementKind::Weight => write!(f, "weight"),
            MeasurementKind::Height => write!(f, "height"),
        }
    }
}

/// Percentile bands used when presenting an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileCategory {
    BelowFifth,
    FifthToTenth,
    TenthToTwentyFifth,
    TwentyFifthToFiftieth,
    FiftiethToSeventyFifth,
    SeventyFifthToNinetieth,
    NinetiethToNinetyFifth,
    AboveNinetyFifth,
}

impl PercentileCategory {
    pub fn from_percentile(percentile: f64) -> Self {
        match percentile {
            p if p < 5.0 => PercentileCategory::BelowFifth,
            p if p < 10.0 => PercentileCategory::FifthToTenth,
            p if p < 25.0 => PercentileCategory::TenthToTwentyFifth,
            p if p < 50.0 => PercentileCategory::TwentyFifthToFiftieth,
            p if p < 75.0 => PercentileCategory::FiftiethToSeventyFifth,
            p if p < 90.0 => PercentileCategory::SeventyFifthToNinetieth,
            p if p <= 95.0 => PercentileCategory::NinetiethToNinetyFifth,
            _ => PercentileCategory::AboveNinetyFifth,
        }
    }
}

/// (age in months, median) pairs, ascending by age.
type ReferenceTable = [(u32, f64); 11];

const MALE_WEIGHT_KG: ReferenceTable = [
    (0, 3.3), (1, 4.5), (3, 5.8), (6, 7.9), (9, 8.9), (12, 9.6),
    (18, 10.9), (24, 12.2), (36, 14.3), (48, 16.3), (60, 18.3),
];
const FEMALE_WEIGHT_KG: ReferenceTable = [
    (0, 3.2), (1, 4.2), (3, 5.5), (6, 7.3), (9, 8.2), (12, 8.9),
    (18, 10.2), (24, 11.5), (36, 13.9), (48, 16.1), (60, 18.2),
];
const MALE_HEIGHT_CM: ReferenceTable = [
    (0, 49.9), (1, 54.7), (3, 61.4), (6, 67.6), (9, 72.0), (12, 75.7),
    (18, 82.3), (24, 87.8), (36, 96.1), (48, 103.3), (60, 110.0),
];
const FEMALE_HEIGHT_CM: ReferenceTable = [
    (0, 49.1), (1, 53.7), (3, 59.8), (6, 65.7), (9, 70.1), (12, 74.0),
    (18, 80.7), (24, 86.4), (36, 95.1), (48, 102.7), (60, 109.4),
];

fn table(kind: MeasurementKind, gender: Gender) -> &'static ReferenceTable {
    match (kind, gender) {
        (MeasurementKind::Weight, Gender::Male) => &MALE_WEIGHT_KG,
        (MeasurementKind::Weight, Gender::Female) => &FEMALE_WEIGHT_KG,
        (MeasurementKind::Height, Gender::Male) => &MALE_HEIGHT_CM,
        (MeasurementKind::Height, Gender::Female) => &FEMALE_HEIGHT_CM,
    }
}

/// Median at the reference age closest to `age_months`; ties go to the younger age.
pub fn reference_median(kind: MeasurementKind, gender: Gender, age_months: u32) -> (u32, f64) {
    let reference = table(kind, gender);
    reference
        .iter()
        .copied()
        .min_by_key(|(age, _)| age.abs_diff(age_months))
        .unwrap_or(reference[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileEstimate {
    pub kind: MeasurementKind,
    pub value: f64,
    pub age_months: u32,
    pub reference_age_months: u32,
    pub reference_median: f64,
    pub percentile: f64,
    pub category: PercentileCategory,
}

/// Estimates the percentile of one measurement. Non-finite or non-positive
/// values are rejected.
pub fn estimate_percentile(
    kind: MeasurementKind,
    value: f64,
    age_months: u32,
    gender: Gender,
) -> Result<PercentileEstimate> {
    let value = validate_measurement(if kind == MeasurementKind::Weight { "weight_kg" } else { "height_cm" }, value)?;
    let (reference_age_months, median) = reference_median(kind, gender, age_months);
    let raw = ((value / median) - 1.0) * 50.0 + 50.0;
    let percentile = (raw.clamp(1.0, 99.0) * 10.0).round() / 10.0;
    Ok(PercentileEstimate {
        kind,
        value,
        age_months,
        reference_age_months,
        reference_median: median,
        percentile,
        category: PercentileCategory::from_percentile(percentile),
    })
}

/// Body mass index rounded to one decimal.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Result<f64> {
    let weight = validate_measurement("weight_kg", weight_kg)?;
    let height_m = validate_measurement("height_cm", height_cm)? / 100.0;
    Ok(((weight / (height_m * height_m)) * 10.0).round() / 10.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub visit_date: chrono::NaiveDate,
    pub age_months: u32,
    pub weight_kg: Option<f64>,
    pub weight_percentile: Option<f64>,
    pub height_cm: Option<f64>,
    pub height_percentile: Option<f64>,
    pub bmi: Option<f64>,
}

/// One point per visit, in visit order. Missing measurements stay empty.
pub fn growth_chart(records: &[MedicalRecord], gender: Gender) -> Vec<GrowthPoint> {
    let mut points: Vec<GrowthPoint> = records
        .iter()
        .map(|record| GrowthPoint {
            visit_date: record.visit_date,
            age_months: record.age_months,
            weight_kg: record.weight_kg,
            weight_percentile: record
                .weight_kg
                .and_then(|w| estimate_percentile(MeasurementKind::Weight, w, record.age_months, gender).ok())
                .map(|e| e.percentile),
            height_cm: record.height_cm,
            height_percentile: record
                .height_cm
                .and_then(|h| estimate_percentile(MeasurementKind::Height, h, record.age_months, gender).ok())
                .map(|e| e.percentile),
            bmi: record.bmi(),
        })
        .collect();
    points.sort_by_key(|p| p.visit_date);
    points
}
