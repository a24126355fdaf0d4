//! Clinical feature types for frailty risk prediction.
//!
//! Seven attributes collected at the bedside for elderly patients with
//! diabetes. Every field has a closed domain, so the typed record cannot hold
//! an out-of-range value; raw integer codes are validated on the way in.

use serde::{Deserialize, Serialize};

/// Canonical column names, in the order the form builds the record.
pub const CONSTRUCTION_COLUMNS: [&str; 7] = [
    COGNITION_IMPAIRED,
    PHYSICAL_ACTIVITY,
    CHRONIC_PAIN,
    NUTRITIONAL_STATUS,
    SARCOPENIA,
    CHARLSON_INDEX,
    DIABETIC_NEPHROPATHY,
];

/// Column order the classifier was trained on.
///
/// Tree models split on column positions, so feeding them any other order
/// yields a wrong probability without raising an error. Update this in
/// lockstep with the model artifact.
pub const TRAINING_COLUMNS: [&str; 7] = [
    COGNITION_IMPAIRED,
    PHYSICAL_ACTIVITY,
    CHRONIC_PAIN,
    NUTRITIONAL_STATUS,
    DIABETIC_NEPHROPATHY,
    CHARLSON_INDEX,
    SARCOPENIA,
];

pub const COGNITION_IMPAIRED: &str = "Cognition impaired";
pub const PHYSICAL_ACTIVITY: &str = "Physical activity";
pub const CHRONIC_PAIN: &str = "Chronic pain";
pub const NUTRITIONAL_STATUS: &str = "Nutritional status";
pub const SARCOPENIA: &str = "Sarcopenia";
pub const CHARLSON_INDEX: &str = "Charlson Comorbidity Index";
pub const DIABETIC_NEPHROPATHY: &str = "Diabetic nephropathy";

/// Upper bound of the Charlson Comorbidity Index accepted by the form.
pub const CHARLSON_MAX: u8 = 30;

/// Error raised when raw codes fall outside a field's domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("{field}: value {value} not in {allowed}")]
    OutOfDomain {
        field: &'static str,
        value: i64,
        allowed: &'static str,
    },
}

/// Binary clinical finding (0 = absent, 1 = present).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Presence {
    #[default]
    Absent,
    Present,
}

impl Presence {
    pub const ALL: [Self; 2] = [Self::Absent, Self::Present];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Present => 1,
        }
    }

    /// Parse a raw code.
    ///
    /// # Errors
    /// Returns `FeatureError::OutOfDomain` unless `code` is 0 or 1.
    pub fn from_code(field: &'static str, code: i64) -> Result<Self, FeatureError> {
        match code {
            0 => Ok(Self::Absent),
            1 => Ok(Self::Present),
            _ => Err(FeatureError::OutOfDomain {
                field,
                value: code,
                allowed: "{0, 1}",
            }),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Absent => "No",
            Self::Present => "Yes",
        }
    }
}

/// Self-reported physical activity level (1 = low, 2 = medium, 3 = high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActivityLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// # Errors
    /// Returns `FeatureError::OutOfDomain` unless `code` is 1, 2 or 3.
    pub fn from_code(code: i64) -> Result<Self, FeatureError> {
        match code {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            _ => Err(FeatureError::OutOfDomain {
                field: PHYSICAL_ACTIVITY,
                value: code,
                allowed: "{1, 2, 3}",
            }),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Nutritional screening outcome (0 = well nourished, 1 = at risk, 2 = malnourished).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NutritionalStatus {
    #[default]
    WellNourished,
    AtRisk,
    Malnourished,
}

impl NutritionalStatus {
    pub const ALL: [Self; 3] = [Self::WellNourished, Self::AtRisk, Self::Malnourished];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::WellNourished => 0,
            Self::AtRisk => 1,
            Self::Malnourished => 2,
        }
    }

    /// # Errors
    /// Returns `FeatureError::OutOfDomain` unless `code` is 0, 1 or 2.
    pub fn from_code(code: i64) -> Result<Self, FeatureError> {
        match code {
            0 => Ok(Self::WellNourished),
            1 => Ok(Self::AtRisk),
            2 => Ok(Self::Malnourished),
            _ => Err(FeatureError::OutOfDomain {
                field: NUTRITIONAL_STATUS,
                value: code,
                allowed: "{0, 1, 2}",
            }),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WellNourished => "Well nourished",
            Self::AtRisk => "At risk of malnutrition",
            Self::Malnourished => "Malnourished",
        }
    }
}

/// Charlson Comorbidity Index, bounded to `0..=CHARLSON_MAX`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct CharlsonIndex(u8);

impl CharlsonIndex {
    /// # Errors
    /// Returns `FeatureError::OutOfDomain` outside `[0, 30]`.
    pub fn new(score: i64) -> Result<Self, FeatureError> {
        if (0..=i64::from(CHARLSON_MAX)).contains(&score) {
            Ok(Self(score as u8))
        } else {
            Err(FeatureError::OutOfDomain {
                field: CHARLSON_INDEX,
                value: score,
                allowed: "[0, 30]",
            })
        }
    }

    /// Clamp any integer into the valid range.
    #[must_use]
    pub fn saturating(score: i64) -> Self {
        Self(score.clamp(0, i64::from(CHARLSON_MAX)) as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for CharlsonIndex {
    type Error = FeatureError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<CharlsonIndex> for u8 {
    fn from(c: CharlsonIndex) -> Self {
        c.0
    }
}

/// The seven inputs of one form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub cognition_impaired: Presence,
    pub physical_activity: ActivityLevel,
    pub chronic_pain: Presence,
    pub nutritional_status: NutritionalStatus,
    pub sarcopenia: Presence,
    pub charlson_index: CharlsonIndex,
    pub diabetic_nephropathy: Presence,
}

impl Default for FeatureRecord {
    /// Values preselected on a fresh form.
    fn default() -> Self {
        Self {
            cognition_impaired: Presence::Absent,
            physical_activity: ActivityLevel::Low,
            chronic_pain: Presence::Absent,
            nutritional_status: NutritionalStatus::AtRisk,
            sarcopenia: Presence::Absent,
            charlson_index: CharlsonIndex(2),
            diabetic_nephropathy: Presence::Absent,
        }
    }
}

impl FeatureRecord {
    /// Build a record from raw integer codes given in construction order.
    ///
    /// # Errors
    /// Returns every out-of-domain field, not just the first.
    pub fn from_codes(codes: [i64; 7]) -> Result<Self, Vec<FeatureError>> {
        let [cog, act, pain, nutr, sarc, cci, neph] = codes;
        let mut errors = Vec::new();

        let cognition_impaired = Presence::from_code(COGNITION_IMPAIRED, cog)
            .map_err(|e| errors.push(e))
            .ok();
        let physical_activity = ActivityLevel::from_code(act).map_err(|e| errors.push(e)).ok();
        let chronic_pain = Presence::from_code(CHRONIC_PAIN, pain)
            .map_err(|e| errors.push(e))
            .ok();
        let nutritional_status = NutritionalStatus::from_code(nutr)
            .map_err(|e| errors.push(e))
            .ok();
        let sarcopenia = Presence::from_code(SARCOPENIA, sarc)
            .map_err(|e| errors.push(e))
            .ok();
        let charlson_index = CharlsonIndex::new(cci).map_err(|e| errors.push(e)).ok();
        let diabetic_nephropathy = Presence::from_code(DIABETIC_NEPHROPATHY, neph)
            .map_err(|e| errors.push(e))
            .ok();

        match (
            cognition_impaired,
            physical_activity,
            chronic_pain,
            nutritional_status,
            sarcopenia,
            charlson_index,
            diabetic_nephropathy,
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f), Some(g))
                if errors.is_empty() =>
            {
                Ok(Self {
                    cognition_impaired: a,
                    physical_activity: b,
                    chronic_pain: c,
                    nutritional_status: d,
                    sarcopenia: e,
                    charlson_index: f,
                    diabetic_nephropathy: g,
                })
            }
            _ => Err(errors),
        }
    }

    /// Named values in construction order.
    #[must_use]
    pub fn named_values(&self) -> [(&'static str, f64); 7] {
        [
            (COGNITION_IMPAIRED, f64::from(self.cognition_impaired.code())),
            (PHYSICAL_ACTIVITY, f64::from(self.physical_activity.code())),
            (CHRONIC_PAIN, f64::from(self.chronic_pain.code())),
            (NUTRITIONAL_STATUS, f64::from(self.nutritional_status.code())),
            (SARCOPENIA, f64::from(self.sarcopenia.code())),
            (CHARLSON_INDEX, f64::from(self.charlson_index.value())),
            (DIABETIC_NEPHROPATHY, f64::from(self.diabetic_nephropathy.code())),
        ]
    }

    /// Every record in the input domain (2·3·2·3·2·31·2 combinations).
    pub fn domain() -> impl Iterator<Item = Self> {
        Presence::ALL.into_iter().flat_map(|cog| {
            ActivityLevel::ALL.into_iter().flat_map(move |act| {
                Presence::ALL.into_iter().flat_map(move |pain| {
                    NutritionalStatus::ALL.into_iter().flat_map(move |nutr| {
                        Presence::ALL.into_iter().flat_map(move |sarc| {
                            (0..=CHARLSON_MAX).flat_map(move |cci| {
                                Presence::ALL.into_iter().map(move |neph| Self {
                                    cognition_impaired: cog,
                                    physical_activity: act,
                                    chronic_pain: pain,
                                    nutritional_status: nutr,
                                    sarcopenia: sarc,
                                    charlson_index: CharlsonIndex(cci),
                                    diabetic_nephropathy: neph,
                                })
                            })
                        })
                    })
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_form_preselection() {
        let r = FeatureRecord::default();
        let codes: Vec<f64> = r.named_values().iter().map(|(_, v)| *v).collect();
        assert_eq!(codes, vec![0.0, 1.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_from_codes_valid() {
        let r = FeatureRecord::from_codes([1, 3, 1, 2, 1, 30, 1]).expect("Should parse");
        assert_eq!(r.physical_activity, ActivityLevel::High);
        assert_eq!(r.nutritional_status, NutritionalStatus::Malnourished);
        assert_eq!(r.charlson_index.value(), 30);
    }

    #[test]
    fn test_from_codes_reports_all_violations() {
        let errors = FeatureRecord::from_codes([2, 0, 0, 3, 0, 31, 0]).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&FeatureError::OutOfDomain {
            field: CHARLSON_INDEX,
            value: 31,
            allowed: "[0, 30]",
        }));
    }

    #[test]
    fn test_charlson_saturating() {
        assert_eq!(CharlsonIndex::saturating(-4).value(), 0);
        assert_eq!(CharlsonIndex::saturating(99).value(), CHARLSON_MAX);
    }

    #[test]
    fn test_domain_size() {
        assert_eq!(FeatureRecord::domain().count(), 2 * 3 * 2 * 3 * 2 * 31 * 2);
    }

    #[test]
    fn test_training_order_is_permutation_of_construction_order() {
        let mut a = CONSTRUCTION_COLUMNS.to_vec();
        let mut b = TRAINING_COLUMNS.to_vec();
        assert_ne!(a, b);
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }
}
