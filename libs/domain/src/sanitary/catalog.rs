//! Versioned sanitary plan catalog
//!
//! Each plan year ships as an embedded JSON document under `plans/`. The
//! documents are parsed once and shared immutably for the rest of the
//! process lifetime.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::models::SanitaryCategory;

string_enum! {
    /// Kind of veterinary activity in a plan calendar
    pub enum ActivityType {
        Vaccine => "vaccine",
        Deworming => "deworming",
        Analysis => "analysis",
    }
}

/// One plan year, as published by the club's sanitary resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub year: i32,
    pub resolution: String,
    pub categories: BTreeMap<SanitaryCategory, CategoryPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPlan {
    pub name: String,
    pub description: String,
    pub monthly_cost: i64,
    /// Required doses per year, keyed by disease or treatment
    pub annual_doses: BTreeMap<String, u32>,
    /// Sparse, ordered by month
    pub calendar: Vec<CalendarMonth>,
}

impl CategoryPlan {
    pub fn annual_cost(&self) -> i64 {
        self.monthly_cost * 12
    }

    pub fn activity_count(&self) -> usize {
        self.calendar.iter().map(|m| m.activities.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub month: u32,
    pub month_name: String,
    pub activities: Vec<PlannedActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub name: String,
    pub description: String,
}

const EMBEDDED: &[&str] = &[include_str!("plans/2026.json")];

/// All shipped versions, oldest first
pub fn versions() -> &'static [CatalogVersion] {
    static VERSIONS: OnceLock<Vec<CatalogVersion>> = OnceLock::new();
    VERSIONS.get_or_init(|| {
        let mut versions: Vec<CatalogVersion> = EMBEDDED
            .iter()
            .map(|doc| serde_json::from_str(doc).expect("Embedded sanitary plan is invalid"))
            .collect();
        versions.sort_by_key(|v| v.year);
        versions
    })
}

/// Version in force for `year`: the newest one not newer than `year`,
/// falling back to the oldest for years before the first plan.
pub fn resolve(year: i32) -> &'static CatalogVersion {
    let versions = versions();
    versions
        .iter()
        .rev()
        .find(|v| v.year <= year)
        .unwrap_or(&versions[0])
}

pub fn plan_for(year: i32, category: SanitaryCategory) -> Option<&'static CategoryPlan> {
    resolve(year).categories.get(&category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_plan() {
        for version in versions() {
            for category in SanitaryCategory::ALL {
                assert!(
                    version.categories.contains_key(category),
                    "{} lacks category {}",
                    version.year,
                    category
                );
            }
        }
    }

    #[test]
    fn test_calendars_are_sorted_and_valid() {
        for version in versions() {
            for plan in version.categories.values() {
                let months: Vec<u32> = plan.calendar.iter().map(|m| m.month).collect();
                assert!(months.windows(2).all(|w| w[0] < w[1]), "{:?}", months);
                assert!(months.iter().all(|m| (1..=12).contains(m)));
                assert!(plan.calendar.iter().all(|m| !m.activities.is_empty()));
            }
        }
    }

    #[test]
    fn test_2026_plan_contents() {
        let a = plan_for(2026, SanitaryCategory::A).unwrap();
        assert_eq!(a.monthly_cost, 45000);
        assert_eq!(a.annual_cost(), 540000);
        assert_eq!(a.annual_doses["aie"], 5);
        assert_eq!(a.activity_count(), 13);

        let january = &a.calendar[0];
        assert_eq!(january.month, 1);
        assert_eq!(january.activities.len(), 1);
        assert_eq!(january.activities[0].activity_type, ActivityType::Vaccine);
        assert_eq!(january.activities[0].name, "Vacuna Antirrábica");

        let b = plan_for(2026, SanitaryCategory::B).unwrap();
        assert_eq!(b.monthly_cost, 35000);
        assert_eq!(b.activity_count(), 10);
    }

    #[test]
    fn test_resolution_by_year() {
        assert_eq!(resolve(2026).year, 2026);
        assert_eq!(resolve(2031).year, 2026);
        // Years before the first plan fall back to the oldest version.
        assert_eq!(resolve(2019).year, 2026);
    }
}
