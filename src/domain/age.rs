//! Age band vocabulary.
//!
//! Mortality and population tables are broken down into 5-year age bands plus
//! two open-ended boundary bands. Every band has two spellings:
//!
//! - a query code, e.g. `Y35-39`, `Y_LT5`, `Y_GE90`
//! - a data label, e.g. `From 35 to 39 years`, `Less than 5 years`
//!
//! Parsing accepts either spelling (case-insensitive). Anything else is an
//! `UnknownAgeBand` error.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MortalityError;

const BAND_WIDTH: u8 = 5;
const OPEN_LOWER: u8 = 90;
const BAND_COUNT: usize = (OPEN_LOWER / BAND_WIDTH) as usize + 1;

/// A 5-year age band identified by its lower bound (0, 5, ..., 90).
///
/// `0` is the "under 5" band and `90` is "90 and over".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeBand {
    lower: u8,
}

impl AgeBand {
    /// All bands, youngest first.
    pub const ALL: [AgeBand; BAND_COUNT] = {
        let mut out = [AgeBand { lower: 0 }; BAND_COUNT];
        let mut i = 0;
        while i < BAND_COUNT {
            out[i] = AgeBand {
                lower: i as u8 * BAND_WIDTH,
            };
            i += 1;
        }
        out
    };

    pub fn from_lower(lower: u8) -> Option<Self> {
        (lower % BAND_WIDTH == 0 && lower <= OPEN_LOWER).then_some(Self { lower })
    }

    pub fn lower(self) -> u8 {
        self.lower
    }

    /// Inclusive upper bound, `None` for the open-ended top band.
    pub fn upper(self) -> Option<u8> {
        (self.lower < OPEN_LOWER).then(|| self.lower + BAND_WIDTH - 1)
    }

    pub fn query_code(self) -> String {
        match (self.lower, self.upper()) {
            (0, _) => "Y_LT5".to_string(),
            (_, None) => "Y_GE90".to_string(),
            (lower, Some(upper)) => format!("Y{lower}-{upper}"),
        }
    }

    pub fn data_label(self) -> String {
        match (self.lower, self.upper()) {
            (0, _) => "Less than 5 years".to_string(),
            (_, None) => "90 years or over".to_string(),
            (lower, Some(upper)) => format!("From {lower} to {upper} years"),
        }
    }

    /// Parse a query code or a data label.
    pub fn parse(label: &str) -> Result<Self, MortalityError> {
        let wanted = label.trim();
        AgeBand::ALL
            .into_iter()
            .find(|band| {
                band.query_code().eq_ignore_ascii_case(wanted) || band.data_label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| MortalityError::UnknownAgeBand {
                label: label.to_string(),
            })
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_code())
    }
}

impl Serialize for AgeBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.query_code())
    }
}

impl<'de> Deserialize<'de> for AgeBand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        AgeBand::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Named shortcuts for common age selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    All,
    Under65,
    Over65,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [AgeGroup::All, AgeGroup::Under65, AgeGroup::Over65];

    pub fn name(self) -> &'static str {
        match self {
            AgeGroup::All => "all",
            AgeGroup::Under65 => "under65",
            AgeGroup::Over65 => "65plus",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        AgeGroup::ALL.into_iter().find(|g| g.name().eq_ignore_ascii_case(name))
    }

    pub fn bands(self) -> Vec<AgeBand> {
        AgeBand::ALL
            .into_iter()
            .filter(|band| match self {
                AgeGroup::All => true,
                AgeGroup::Under65 => band.lower() < 65,
                AgeGroup::Over65 => band.lower() >= 65,
            })
            .collect()
    }
}

/// Resolve user-supplied labels (codes, data labels or group names) to a set of bands.
pub fn resolve_age_labels<S: AsRef<str>>(labels: &[S]) -> Result<BTreeSet<AgeBand>, MortalityError> {
    if labels.is_empty() {
        return Err(MortalityError::NoAgeBands);
    }

    let mut out = BTreeSet::new();
    for label in labels {
        let label = label.as_ref();
        match AgeGroup::from_name(label) {
            Some(group) => out.extend(group.bands()),
            None => {
                out.insert(AgeBand::parse(label)?);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_has_nineteen_bands() {
        assert_eq!(AgeBand::ALL.len(), 19);
        assert_eq!(AgeBand::ALL[0].query_code(), "Y_LT5");
        assert_eq!(AgeBand::ALL[7].query_code(), "Y35-39");
        assert_eq!(AgeBand::ALL[7].data_label(), "From 35 to 39 years");
        assert_eq!(AgeBand::ALL[18].data_label(), "90 years or over");
    }

    #[test]
    fn parses_codes_and_labels() {
        let band = AgeBand::from_lower(35).unwrap();
        assert_eq!(AgeBand::parse("Y35-39").unwrap(), band);
        assert_eq!(AgeBand::parse("from 35 to 39 years").unwrap(), band);
        assert_eq!(AgeBand::parse(" Y_GE90 ").unwrap().lower(), 90);
    }

    #[test]
    fn unknown_label_is_an_error() {
        let err = AgeBand::parse("Y_GE85").unwrap_err();
        assert!(matches!(err, MortalityError::UnknownAgeBand { label } if label == "Y_GE85"));
    }

    #[test]
    fn groups_partition_the_vocabulary() {
        let under = AgeGroup::Under65.bands();
        let over = AgeGroup::Over65.bands();
        assert_eq!(under.len() + over.len(), AgeBand::ALL.len());
        assert_eq!(under.last().unwrap().query_code(), "Y60-64");
        assert_eq!(over.first().unwrap().query_code(), "Y65-69");
    }

    #[test]
    fn resolve_mixes_groups_and_codes() {
        let set = resolve_age_labels(&["65plus", "Y_LT5"]).unwrap();
        assert_eq!(set.len(), 6 + 1);
        assert!(matches!(
            resolve_age_labels::<&str>(&[]),
            Err(MortalityError::NoAgeBands)
        ));
        assert!(resolve_age_labels(&["Y35-39", "nope"]).is_err());
    }
}
