use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::ChildRecord;

pub const ALL_DISTRICTS: &str = "All Districts";
pub const ALL_AGES: &str = "All Ages";
pub const ALL_GENDERS: &str = "All Genders";
pub const ALL_EDUCATION_LEVELS: &str = "All Education Levels";

/// Bounds used when an age-group label is not one of the known brackets.
pub const PASS_THROUGH_AGE_BOUNDS: (u32, u32) = (0, 100);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    UpToFive,
    SixToTen,
    ElevenToFifteen,
    SixteenToEighteen,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 4] = [
        AgeBracket::UpToFive,
        AgeBracket::SixToTen,
        AgeBracket::ElevenToFifteen,
        AgeBracket::SixteenToEighteen,
    ];

    pub fn bounds(&self) -> (u32, u32) {
        match self {
            Self::UpToFive => (0, 5),
            Self::SixToTen => (6, 10),
            Self::ElevenToFifteen => (11, 15),
            Self::SixteenToEighteen => (16, 18),
        }
    }

    /// Short key used for chart buckets, e.g. `"0-5"`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::UpToFive => "0-5",
            Self::SixToTen => "6-10",
            Self::ElevenToFifteen => "11-15",
            Self::SixteenToEighteen => "16-18",
        }
    }

    /// Filter label, e.g. `"0-5 years"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::UpToFive => "0-5 years",
            Self::SixToTen => "6-10 years",
            Self::ElevenToFifteen => "11-15 years",
            Self::SixteenToEighteen => "16-18 years",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bracket| bracket.label() == label)
    }

    /// Chart assignment. Anything above 15 lands in the last bracket, including ages over 18.
    pub fn for_age(age: u32) -> Self {
        if age <= 5 {
            Self::UpToFive
        } else if age <= 10 {
            Self::SixToTen
        } else if age <= 15 {
            Self::ElevenToFifteen
        } else {
            Self::SixteenToEighteen
        }
    }
}

impl Display for AgeBracket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub fn age_bounds_for(label: &str) -> (u32, u32) {
    AgeBracket::from_label(label)
        .map(|bracket| bracket.bounds())
        .unwrap_or(PASS_THROUGH_AGE_BOUNDS)
}

/// Dashboard filter selection. Each dimension holds either a concrete value or its
/// "All ..." sentinel; empty strings are treated like the sentinel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterSpec {
    pub district: String,
    pub age_group: String,
    pub gender: String,
    pub education_status: String,
    pub search: String,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            district: ALL_DISTRICTS.to_string(),
            age_group: ALL_AGES.to_string(),
            gender: ALL_GENDERS.to_string(),
            education_status: ALL_EDUCATION_LEVELS.to_string(),
            search: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    District,
    AgeGroup,
    Gender,
    EducationStatus,
    Search,
}

#[derive(Debug, Error)]
#[error("unknown filter dimension: {0}")]
pub struct FilterDimensionError(pub String);

impl FromStr for FilterDimension {
    type Err = FilterDimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "district" => Ok(Self::District),
            "ageGroup" | "age_group" | "age" => Ok(Self::AgeGroup),
            "gender" => Ok(Self::Gender),
            "educationStatus" | "education_status" | "education" => Ok(Self::EducationStatus),
            "search" => Ok(Self::Search),
            _ => Err(FilterDimensionError(s.to_string())),
        }
    }
}

impl FilterSpec {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn with(mut self, dimension: FilterDimension, value: impl Into<String>) -> Self {
        self.set(dimension, value);
        self
    }

    pub fn set(&mut self, dimension: FilterDimension, value: impl Into<String>) {
        let value = value.into();
        match dimension {
            FilterDimension::District => self.district = value,
            FilterDimension::AgeGroup => self.age_group = value,
            FilterDimension::Gender => self.gender = value,
            FilterDimension::EducationStatus => self.education_status = value,
            FilterDimension::Search => self.search = value,
        }
    }

    pub fn is_match_all(&self) -> bool {
        self.search.is_empty()
            && is_sentinel(&self.district, ALL_DISTRICTS)
            && is_sentinel(&self.age_group, ALL_AGES)
            && is_sentinel(&self.gender, ALL_GENDERS)
            && is_sentinel(&self.education_status, ALL_EDUCATION_LEVELS)
    }

    pub fn matches(&self, child: &ChildRecord) -> bool {
        self.matches_search(child)
            && self.matches_district(child)
            && self.matches_gender(child)
            && self.matches_education(child)
            && self.matches_age(child)
    }

    fn matches_search(&self, child: &ChildRecord) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        child.name.to_lowercase().contains(&needle)
            || child.location.to_lowercase().contains(&needle)
    }

    fn matches_district(&self, child: &ChildRecord) -> bool {
        is_sentinel(&self.district, ALL_DISTRICTS) || child.district == self.district
    }

    fn matches_gender(&self, child: &ChildRecord) -> bool {
        is_sentinel(&self.gender, ALL_GENDERS)
            || child.gender.as_str() == self.gender.to_lowercase()
    }

    fn matches_education(&self, child: &ChildRecord) -> bool {
        if is_sentinel(&self.education_status, ALL_EDUCATION_LEVELS) {
            return true;
        }
        let wanted = self.education_status.to_lowercase().replace(' ', "_");
        child.education_status.as_str() == wanted
    }

    fn matches_age(&self, child: &ChildRecord) -> bool {
        if is_sentinel(&self.age_group, ALL_AGES) {
            return true;
        }
        let (min, max) = age_bounds_for(&self.age_group);
        (min..=max).contains(&child.age)
    }
}

fn is_sentinel(value: &str, sentinel: &str) -> bool {
    value.is_empty() || value == sentinel
}

/// Stable filter: keeps input order, never mutates the input.
pub fn filter_children(records: &[ChildRecord], spec: &FilterSpec) -> Vec<ChildRecord> {
    records
        .iter()
        .filter(|child| spec.matches(child))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{age_bounds_for, filter_children, AgeBracket, FilterDimension, FilterSpec};
    use crate::engine::tests::child;
    use crate::records::{EducationStatus, Gender};

    fn sample() -> Vec<crate::records::ChildRecord> {
        let mut asha = child("1", "Asha", 4);
        asha.location = "Pune".to_string();
        asha.gender = Gender::Female;
        asha.district = "Pune West".to_string();
        let mut ravi = child("2", "Ravi", 12);
        ravi.location = "Delhi".to_string();
        ravi.education_status = EducationStatus::HigherSecondary;
        ravi.district = "Delhi North".to_string();
        let mut meena = child("3", "Meena", 17);
        meena.location = "Ashapur".to_string();
        meena.gender = Gender::Female;
        vec![asha, ravi, meena]
    }

    #[test]
    fn search_is_case_insensitive_on_name_or_location() {
        let records = vec![sample()[0].clone(), sample()[1].clone()];
        let spec = FilterSpec::match_all().with(FilterDimension::Search, "asha");
        let filtered = filter_children(&records, &spec);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Asha");

        let by_location = filter_children(&sample(), &spec);
        assert_eq!(by_location.len(), 2, "Meena lives in Ashapur");
    }

    #[test]
    fn match_all_returns_input_unchanged() {
        let records = sample();
        let spec = FilterSpec::match_all();
        assert!(spec.is_match_all());
        assert_eq!(filter_children(&records, &spec), records);
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample();
        let spec = FilterSpec::match_all()
            .with(FilterDimension::Gender, "Female")
            .with(FilterDimension::AgeGroup, "16-18 years");
        let once = filter_children(&records, &spec);
        let twice = filter_children(&once, &spec);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
        assert_eq!(once[0].name, "Meena");
    }

    #[test]
    fn district_is_exact_and_case_sensitive() {
        let records = sample();
        let exact = FilterSpec::match_all().with(FilterDimension::District, "Delhi North");
        assert_eq!(filter_children(&records, &exact).len(), 1);
        let lower = FilterSpec::match_all().with(FilterDimension::District, "delhi north");
        assert!(filter_children(&records, &lower).is_empty());
    }

    #[test]
    fn education_label_maps_to_snake_case() {
        let spec = FilterSpec::match_all().with(FilterDimension::EducationStatus, "Higher Secondary");
        let filtered = filter_children(&sample(), &spec);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Ravi");
    }

    #[test]
    fn unknown_age_group_passes_through() {
        assert_eq!(age_bounds_for("teenagers"), (0, 100));
        let spec = FilterSpec::match_all().with(FilterDimension::AgeGroup, "teenagers");
        assert_eq!(filter_children(&sample(), &spec).len(), 3);
    }

    #[test]
    fn age_brackets_use_inclusive_bounds() {
        assert_eq!(AgeBracket::for_age(5), AgeBracket::UpToFive);
        assert_eq!(AgeBracket::for_age(6), AgeBracket::SixToTen);
        assert_eq!(AgeBracket::for_age(19), AgeBracket::SixteenToEighteen);
        let spec = FilterSpec::match_all().with(FilterDimension::AgeGroup, "0-5 years");
        let filtered = filter_children(&sample(), &spec);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].age, 4);
    }

    #[test]
    fn oldest_bracket_filter_stops_at_eighteen() {
        let records = vec![
            child("a", "Eighteen", 18),
            child("b", "Nineteen", 19),
            child("c", "Sixteen", 16),
        ];
        let spec = FilterSpec::match_all().with(FilterDimension::AgeGroup, "16-18 years");
        let names = filter_children(&records, &spec)
            .into_iter()
            .map(|c| c.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Eighteen", "Sixteen"]);

        let counts = crate::engine::aggregate(&records).by_age_bracket;
        let oldest = counts.iter().find(|b| b.key == "16-18").expect("16-18 bucket");
        assert_eq!(oldest.count, 3, "aggregation still counts 19 in the last bracket");
    }

    #[test]
    fn parses_dimension_names_from_ui_and_api() {
        assert_eq!("ageGroup".parse::<FilterDimension>().expect("dimension"), FilterDimension::AgeGroup);
        assert_eq!(
            "education_status".parse::<FilterDimension>().expect("dimension"),
            FilterDimension::EducationStatus
        );
        assert!("colour".parse::<FilterDimension>().is_err());
    }
}
