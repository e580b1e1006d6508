use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The fixed set of keys the filter endpoint understands.
///
/// Variant order is significant: it is the order fields are laid out in the
/// form and the order query parameters are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    StateName,
    DistrictName,
    Sector,
    Religion,
    SocialGroup,
    HouseholdSize,
    Panel,
    Quarter,
    Visit,
}

impl FilterField {
    pub const ALL: [FilterField; 9] = [
        FilterField::StateName,
        FilterField::DistrictName,
        FilterField::Sector,
        FilterField::Religion,
        FilterField::SocialGroup,
        FilterField::HouseholdSize,
        FilterField::Panel,
        FilterField::Quarter,
        FilterField::Visit,
    ];

    /// Query parameter name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::StateName => "state_name",
            FilterField::DistrictName => "district_name",
            FilterField::Sector => "sector",
            FilterField::Religion => "religion",
            FilterField::SocialGroup => "social_group",
            FilterField::HouseholdSize => "household_size",
            FilterField::Panel => "panel",
            FilterField::Quarter => "quarter",
            FilterField::Visit => "visit",
        }
    }

    /// Human-readable form label.
    pub fn label(&self) -> &'static str {
        match self {
            FilterField::StateName => "State Name",
            FilterField::DistrictName => "District Name",
            FilterField::Sector => "Sector",
            FilterField::Religion => "Religion",
            FilterField::SocialGroup => "Social Group",
            FilterField::HouseholdSize => "Household Size",
            FilterField::Panel => "Panel",
            FilterField::Quarter => "Quarter",
            FilterField::Visit => "Visit",
        }
    }

    /// Fixed choices for select-style fields. `None` means free text.
    pub fn options(&self) -> Option<&'static [&'static str]> {
        match self {
            FilterField::StateName | FilterField::DistrictName => None,
            FilterField::Sector => Some(&["Rural", "Urban"]),
            FilterField::Religion => Some(&[
                "Hindu", "Muslim", "Christian", "Sikh", "Buddhist", "Jain", "Other",
            ]),
            FilterField::SocialGroup => Some(&["SC", "ST", "OBC", "General"]),
            FilterField::HouseholdSize => Some(&["1-2", "3-4", "5-6", "7+"]),
            FilterField::Panel => Some(&["Panel 1", "Panel 2", "Panel 3"]),
            FilterField::Quarter => Some(&["Q1", "Q2", "Q3", "Q4"]),
            FilterField::Visit => Some(&["Visit 1", "Visit 2", "Visit 3"]),
        }
    }

    /// Hint shown in an empty input.
    pub fn placeholder(&self) -> &'static str {
        match self {
            FilterField::StateName => "e.g., Maharashtra, Andhra Pradesh",
            FilterField::DistrictName => "e.g., Mumbai, Pune",
            FilterField::Sector => "Select Sector",
            FilterField::Religion => "Select Religion",
            FilterField::SocialGroup => "Select Social Group",
            FilterField::HouseholdSize => "Select Household Size",
            FilterField::Panel => "Select Panel",
            FilterField::Quarter => "Select Quarter",
            FilterField::Visit => "Select Visit",
        }
    }

    pub fn is_free_text(&self) -> bool {
        self.options().is_none()
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterField {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownField(s.to_string()))
    }
}

/// Optional search constraints submitted to the filter endpoint.
///
/// Only non-empty values are stored; setting a field to `""` unsets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCriteria {
    values: BTreeMap<FilterField, String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a field. Returns the previous value.
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&field)
        } else {
            self.values.insert(field, value)
        }
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn is_set(&self, field: FilterField) -> bool {
        self.values.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.values.iter().map(|(field, value)| (*field, value.as_str()))
    }

    /// Key/value pairs for the outgoing query string, in field order.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        self.iter().map(|(field, value)| (field.as_str(), value)).collect()
    }

    /// Step a select-style field through `unset -> options... -> unset`.
    ///
    /// Returns `false` for free-text fields, which are left untouched.
    pub fn cycle_option(&mut self, field: FilterField, forward: bool) -> bool {
        let Some(options) = field.options() else {
            return false;
        };
        let current = self
            .get(field)
            .and_then(|value| options.iter().position(|opt| *opt == value));

        let next = match (current, forward) {
            (None, true) => Some(0),
            (None, false) => Some(options.len() - 1),
            (Some(i), true) if i + 1 < options.len() => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            (Some(_), _) => None,
        };

        match next {
            Some(i) => self.set(field, options[i]),
            None => self.set(field, ""),
        };
        true
    }
}
