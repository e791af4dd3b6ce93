use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel meaning "no restriction" for any filter field.
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Year,
    Region,
    Category,
}

impl FilterField {
    /// Query order used when composing requests.
    pub const ORDERED: [Self; 3] = [Self::Year, Self::Region, Self::Category];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Region => "region",
            Self::Category => "category",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Region => "Region",
            Self::Category => "Category",
        }
    }
}

/// The year/region/category selection scoping every statistics query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterState {
    year: String,
    region: String,
    category: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            year: ALL.to_string(),
            region: ALL.to_string(),
            category: ALL.to_string(),
        }
    }
}

impl FilterState {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::Year => &self.year,
            FilterField::Region => &self.region,
            FilterField::Category => &self.category,
        }
    }

    /// Single mutation point. Blank values collapse to the sentinel.
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        let value = if value.trim().is_empty() {
            ALL.to_string()
        } else {
            value.trim().to_string()
        };

        match field {
            FilterField::Year => self.year = value,
            FilterField::Region => self.region = value,
            FilterField::Category => self.category = value,
        }
    }

    /// Builder-style variant of [`FilterState::set`].
    #[must_use]
    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn is_active(&self, field: FilterField) -> bool {
        self.get(field) != ALL
    }

    pub fn is_unfiltered(&self) -> bool {
        FilterField::ORDERED
            .iter()
            .all(|field| !self.is_active(*field))
    }

    /// Active `(key, value)` pairs in query order.
    pub fn active_pairs(&self) -> Vec<(&'static str, &str)> {
        FilterField::ORDERED
            .iter()
            .filter(|field| self.is_active(**field))
            .map(|field| (field.as_str(), self.get(*field)))
            .collect()
    }

    pub fn describe(&self) -> String {
        if self.is_unfiltered() {
            return "all data".to_string();
        }

        self.active_pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Values offered by the filter selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub years: Vec<i32>,
    #[serde(default)]
    pub regions: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl FilterOptions {
    /// Degraded options used while the service cannot provide real ones.
    pub fn fallback(years: &[i32]) -> Self {
        Self {
            years: years.to_vec(),
            regions: BTreeSet::new(),
            categories: BTreeSet::new(),
        }
    }

    /// Selector entries for one field, sentinel first.
    pub fn choices(&self, field: FilterField) -> Vec<String> {
        let mut choices = vec![ALL.to_string()];
        match field {
            FilterField::Year => {
                let mut years = self.years.clone();
                years.sort_unstable();
                years.dedup();
                choices.extend(years.into_iter().map(|year| year.to_string()));
            }
            FilterField::Region => choices.extend(self.regions.iter().cloned()),
            FilterField::Category => choices.extend(self.categories.iter().cloned()),
        }
        choices
    }
}
