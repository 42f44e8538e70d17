//! Demographic and clinical statistics over a patient list.

use serde::{Deserialize, Serialize};

use crate::models::{Patient, Sex};

/// Leading-integer parse of an age field. Blank or non-numeric text is 0.
pub fn parse_age(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .parse::<i64>()
        .map(|value| sign * value)
        .unwrap_or(0)
}

/// Fixed age ranges, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBucket {
    UpTo18,
    From19To35,
    From36To50,
    From51To65,
    Over65,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 5] = [
        AgeBucket::UpTo18,
        AgeBucket::From19To35,
        AgeBucket::From36To50,
        AgeBucket::From51To65,
        AgeBucket::Over65,
    ];

    /// Bucket for a parsed age. Anything at or below 18 (including the 0
    /// used for unparsable ages) lands in the first bucket.
    pub fn for_age(age: i64) -> Self {
        match age {
            i64::MIN..=18 => AgeBucket::UpTo18,
            19..=35 => AgeBucket::From19To35,
            36..=50 => AgeBucket::From36To50,
            51..=65 => AgeBucket::From51To65,
            _ => AgeBucket::Over65,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::UpTo18 => "0-18",
            AgeBucket::From19To35 => "19-35",
            AgeBucket::From36To50 => "36-50",
            AgeBucket::From51To65 => "51-65",
            AgeBucket::Over65 => "65+",
        }
    }
}

/// Patient counts per age bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeDistribution {
    #[serde(rename = "0-18")]
    pub up_to_18: usize,
    #[serde(rename = "19-35")]
    pub from_19_to_35: usize,
    #[serde(rename = "36-50")]
    pub from_36_to_50: usize,
    #[serde(rename = "51-65")]
    pub from_51_to_65: usize,
    #[serde(rename = "65+")]
    pub over_65: usize,
}

impl AgeDistribution {
    /// Bucket a list of raw age fields.
    pub fn from_ages<'a>(ages: impl IntoIterator<Item = &'a str>) -> Self {
        let mut distribution = Self::default();
        for age in ages {
            *distribution.slot(AgeBucket::for_age(parse_age(age))) += 1;
        }
        distribution
    }

    pub fn count(&self, bucket: AgeBucket) -> usize {
        match bucket {
            AgeBucket::UpTo18 => self.up_to_18,
            AgeBucket::From19To35 => self.from_19_to_35,
            AgeBucket::From36To50 => self.from_36_to_50,
            AgeBucket::From51To65 => self.from_51_to_65,
            AgeBucket::Over65 => self.over_65,
        }
    }

    fn slot(&mut self, bucket: AgeBucket) -> &mut usize {
        match bucket {
            AgeBucket::UpTo18 => &mut self.up_to_18,
            AgeBucket::From19To35 => &mut self.from_19_to_35,
            AgeBucket::From36To50 => &mut self.from_36_to_50,
            AgeBucket::From51To65 => &mut self.from_51_to_65,
            AgeBucket::Over65 => &mut self.over_65,
        }
    }
}

/// Rounded mean of parsed ages; 0 for an empty list.
pub fn average_age(patients: &[Patient]) -> i64 {
    if patients.is_empty() {
        return 0;
    }
    // Ages are free text; widen so extreme values cannot overflow the sum.
    let sum: i128 = patients.iter().map(|p| i128::from(parse_age(&p.age))).sum();
    round_half_up(sum as f64 / patients.len() as f64)
}

/// Whole-number share of `count` in `total`; 0 when `total` is 0.
pub fn percentage(count: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    round_half_up(count as f64 * 100.0 / total as f64)
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Right sphere recorded.
pub fn has_refractive_error(patient: &Patient) -> bool {
    !patient.od.sphere.is_empty()
}

/// Right cylinder recorded and not the literal "0".
pub fn has_astigmatism(patient: &Patient) -> bool {
    recorded_nonzero(&patient.od.cylinder)
}

/// Right addition recorded and not the literal "0".
pub fn has_addition(patient: &Patient) -> bool {
    recorded_nonzero(&patient.od.add)
}

fn recorded_nonzero(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// Everything shown on the reports page and written to the CSV export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total_patients: usize,
    pub male_patients: usize,
    pub female_patients: usize,
    pub other_patients: usize,
    pub average_age: i64,
    pub with_refractive_error: usize,
    pub with_astigmatism: usize,
    pub with_addition: usize,
    pub age_distribution: AgeDistribution,
}

impl ReportStats {
    pub fn from_patients(patients: &[Patient]) -> Self {
        let count = |pred: fn(&Patient) -> bool| patients.iter().filter(|&p| pred(p)).count();
        let count_sex = |sex: Sex| patients.iter().filter(|p| p.sex == sex).count();

        Self {
            total_patients: patients.len(),
            male_patients: count_sex(Sex::Male),
            female_patients: count_sex(Sex::Female),
            other_patients: count_sex(Sex::Other),
            average_age: average_age(patients),
            with_refractive_error: count(has_refractive_error),
            with_astigmatism: count(has_astigmatism),
            with_addition: count(has_addition),
            age_distribution: AgeDistribution::from_ages(patients.iter().map(|p| p.age.as_str())),
        }
    }

    /// `(label, count, percentage)` rows for the gender breakdown.
    pub fn gender_rows(&self) -> [(&'static str, usize, i64); 3] {
        let total = self.total_patients;
        [
            ("Male", self.male_patients, percentage(self.male_patients, total)),
            ("Female", self.female_patients, percentage(self.female_patients, total)),
            ("Other", self.other_patients, percentage(self.other_patients, total)),
        ]
    }
}
