//! Plan reconciliation
//!
//! Crosses a category's plan calendar with the vaccination and deworming
//! records logged for a horse during one year. Vaccines and analyses are
//! looked up among vaccination records by disease name; deworming activities
//! are fulfilled by any deworming record dated in the same month.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::catalog::{self, ActivityType, CategoryPlan, PlannedActivity};
use super::matching::matches;
use crate::error::{DomainError, DomainResult};
use crate::models::{DewormingRecord, Horse, SanitaryCategory, VaccinationRecord};
use crate::store::HorseStore;

/// Upcoming activities kept in the stats view
const UPCOMING_LIMIT: usize = 5;
/// Stand-in due day for an unrealized activity of a past month
const APPROXIMATE_DUE_DAY: u32 = 15;

const NO_CATEGORY_NOTICE: &str =
    "This horse has no sanitary category yet. Assign category A or B to enable its plan.";

#[derive(Debug, Clone, Serialize)]
pub struct ReconciledActivity {
    pub activity_type: ActivityType,
    pub name: String,
    pub description: String,
    pub realized: bool,
    pub realized_on: Option<NaiveDate>,
    pub next_due: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciledMonth {
    pub month: u32,
    pub month_name: String,
    pub activities: Vec<ReconciledActivity>,
}

/// A horse's plan for one year, annotated with what was actually done
#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    pub horse_id: Uuid,
    pub year: i32,
    pub category: Option<SanitaryCategory>,
    pub category_name: Option<String>,
    pub description: String,
    pub monthly_cost: Option<i64>,
    pub annual_doses: Option<BTreeMap<String, u32>>,
    pub months: Vec<ReconciledMonth>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingActivity {
    pub month: u32,
    pub month_name: String,
    pub activity_type: ActivityType,
    pub name: String,
    pub description: String,
    pub days_overdue: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceStats {
    pub horse_id: Uuid,
    pub year: i32,
    pub category: Option<SanitaryCategory>,
    pub has_plan: bool,
    pub monthly_cost: Option<i64>,
    pub annual_cost: Option<i64>,
    pub total_activities: usize,
    pub realized_activities: usize,
    pub pending_activities: usize,
    pub completion_percentage: f64,
    pub upcoming: Vec<PendingActivity>,
    pub overdue: Vec<PendingActivity>,
}

/// First and last day of `month` in `year`.
pub fn month_range(year: i32, month: u32) -> DomainResult<(NaiveDate, NaiveDate)> {
    let invalid = || DomainError::Validation(format!("invalid plan month {}-{:02}", year, month));

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next_first.pred_opt().ok_or_else(invalid)?;

    Ok((first, last))
}

fn year_range(year: i32) -> DomainResult<(NaiveDate, NaiveDate)> {
    Ok((month_range(year, 1)?.0, month_range(year, 12)?.1))
}

fn reconcile_activity(
    activity: &PlannedActivity,
    (first, last): (NaiveDate, NaiveDate),
    vaccinations: &[VaccinationRecord],
    dewormings: &[DewormingRecord],
) -> ReconciledActivity {
    let in_month = |date: NaiveDate| date >= first && date <= last;

    // First match in iteration order wins.
    let hit = match activity.activity_type {
        ActivityType::Vaccine | ActivityType::Analysis => vaccinations
            .iter()
            .find(|r| in_month(r.date) && matches(&activity.name, &r.vaccine_type))
            .map(|r| (r.date, r.next_due)),
        ActivityType::Deworming => dewormings
            .iter()
            .find(|r| in_month(r.date))
            .map(|r| (r.date, r.next_due)),
    };

    ReconciledActivity {
        activity_type: activity.activity_type,
        name: activity.name.clone(),
        description: activity.description.clone(),
        realized: hit.is_some(),
        realized_on: hit.map(|(date, _)| date),
        next_due: hit.and_then(|(_, next)| next),
    }
}

/// Annotate every planned activity of `plan` for `year`.
pub fn reconcile(
    plan: &CategoryPlan,
    year: i32,
    vaccinations: &[VaccinationRecord],
    dewormings: &[DewormingRecord],
) -> DomainResult<Vec<ReconciledMonth>> {
    plan.calendar
        .iter()
        .map(|month| {
            let range = month_range(year, month.month)?;
            Ok(ReconciledMonth {
                month: month.month,
                month_name: month.month_name.clone(),
                activities: month
                    .activities
                    .iter()
                    .map(|activity| reconcile_activity(activity, range, vaccinations, dewormings))
                    .collect(),
            })
        })
        .collect()
}

/// Calendar view for a horse. Horses without a category get an empty view.
pub fn build_calendar(
    horse: &Horse,
    year: i32,
    vaccinations: &[VaccinationRecord],
    dewormings: &[DewormingRecord],
) -> DomainResult<CalendarView> {
    let Some(category) = horse.sanitary_category else {
        return Ok(CalendarView {
            horse_id: horse.id,
            year,
            category: None,
            category_name: None,
            description: NO_CATEGORY_NOTICE.to_string(),
            monthly_cost: None,
            annual_doses: None,
            months: Vec::new(),
        });
    };

    let plan = catalog::plan_for(year, category).ok_or_else(|| {
        DomainError::Validation(format!("no sanitary plan for category {}", category))
    })?;

    Ok(CalendarView {
        horse_id: horse.id,
        year,
        category: Some(category),
        category_name: Some(plan.name.clone()),
        description: plan.description.clone(),
        monthly_cost: Some(plan.monthly_cost),
        annual_doses: Some(plan.annual_doses.clone()),
        months: reconcile(plan, year, vaccinations, dewormings)?,
    })
}

/// Compliance figures derived from a calendar view, relative to `today`.
pub fn build_stats(calendar: &CalendarView, today: NaiveDate) -> ComplianceStats {
    let Some(category) = calendar.category else {
        return ComplianceStats {
            horse_id: calendar.horse_id,
            year: calendar.year,
            category: None,
            has_plan: false,
            monthly_cost: None,
            annual_cost: None,
            total_activities: 0,
            realized_activities: 0,
            pending_activities: 0,
            completion_percentage: 0.0,
            upcoming: Vec::new(),
            overdue: Vec::new(),
        };
    };

    let mut total = 0;
    let mut realized = 0;
    let mut upcoming = Vec::new();
    let mut overdue = Vec::new();

    for month in &calendar.months {
        let is_past = calendar.year < today.year()
            || (calendar.year == today.year() && month.month < today.month());

        for activity in &month.activities {
            total += 1;
            if activity.realized {
                realized += 1;
                continue;
            }

            let days_overdue = if is_past {
                NaiveDate::from_ymd_opt(calendar.year, month.month, APPROXIMATE_DUE_DAY)
                    .map(|due| (today - due).num_days())
            } else {
                None
            };

            let pending = PendingActivity {
                month: month.month,
                month_name: month.month_name.clone(),
                activity_type: activity.activity_type,
                name: activity.name.clone(),
                description: activity.description.clone(),
                days_overdue,
            };

            if is_past {
                overdue.push(pending);
            } else {
                upcoming.push(pending);
            }
        }
    }

    upcoming.sort_by_key(|p| p.month);
    upcoming.truncate(UPCOMING_LIMIT);

    ComplianceStats {
        horse_id: calendar.horse_id,
        year: calendar.year,
        category: Some(category),
        has_plan: true,
        monthly_cost: calendar.monthly_cost,
        annual_cost: calendar.monthly_cost.map(|cost| cost * 12),
        total_activities: total,
        realized_activities: realized,
        pending_activities: total - realized,
        completion_percentage: completion_percentage(realized, total),
        upcoming,
        overdue,
    }
}

/// Share of realized activities, rounded to one decimal; zero for empty plans.
pub fn completion_percentage(realized: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = realized.min(total) as f64 / total as f64 * 100.0;
    (ratio * 10.0).round() / 10.0
}

/// Sanitary plan queries backed by a horse store
pub struct SanitaryPlanService<S> {
    store: S,
}

impl<S: HorseStore> SanitaryPlanService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Calendar for `year`, defaulting to the current year.
    pub async fn calendar(&self, horse_id: Uuid, year: Option<i32>) -> DomainResult<CalendarView> {
        let year = year.unwrap_or_else(|| Utc::now().year());
        let horse = self.load(horse_id).await?;
        info!(%horse_id, year, "Building sanitary calendar");

        if horse.sanitary_category.is_none() {
            return build_calendar(&horse, year, &[], &[]);
        }

        let (from, to) = year_range(year)?;
        let vaccinations = self.store.vaccinations_between(horse_id, from, to).await?;
        let dewormings = self.store.dewormings_between(horse_id, from, to).await?;

        build_calendar(&horse, year, &vaccinations, &dewormings)
    }

    pub async fn stats(&self, horse_id: Uuid, year: Option<i32>) -> DomainResult<ComplianceStats> {
        self.stats_on(horse_id, year, Utc::now().date_naive()).await
    }

    /// Stats relative to an explicit `today`.
    pub async fn stats_on(
        &self,
        horse_id: Uuid,
        year: Option<i32>,
        today: NaiveDate,
    ) -> DomainResult<ComplianceStats> {
        let calendar = self
            .calendar(horse_id, Some(year.unwrap_or_else(|| today.year())))
            .await?;
        Ok(build_stats(&calendar, today))
    }

    async fn load(&self, horse_id: Uuid) -> DomainResult<Horse> {
        self.store
            .find_horse(horse_id)
            .await?
            .ok_or_else(|| DomainError::not_found("horse", horse_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(store: &Arc<MemoryStore>) -> SanitaryPlanService<Arc<MemoryStore>> {
        SanitaryPlanService::new(store.clone())
    }

    fn january(calendar: &CalendarView) -> &ReconciledActivity {
        let month = calendar.months.iter().find(|m| m.month == 1).unwrap();
        &month.activities[0]
    }

    #[test]
    fn test_month_range_february() {
        assert_eq!(
            month_range(2024, 2).unwrap(),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            month_range(2026, 2).unwrap(),
            (date(2026, 2, 1), date(2026, 2, 28))
        );
    }

    #[test]
    fn test_month_range_december_and_thirty_day_months() {
        assert_eq!(
            month_range(2026, 12).unwrap(),
            (date(2026, 12, 1), date(2026, 12, 31))
        );
        assert_eq!(month_range(2026, 4).unwrap().1, date(2026, 4, 30));
        assert!(month_range(2026, 13).is_err());
        assert!(month_range(2026, 0).is_err());
    }

    #[tokio::test]
    async fn test_rabies_vaccine_realized_in_january() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Relámpago", Some(SanitaryCategory::A));
        store.add_vaccination_due(
            horse.id,
            "Vacuna antirrábica",
            date(2026, 1, 15),
            Some(date(2027, 1, 15)),
        );

        let calendar = service(&store).calendar(horse.id, Some(2026)).await.unwrap();
        let activity = january(&calendar);
        assert!(activity.realized);
        assert_eq!(activity.realized_on, Some(date(2026, 1, 15)));
        assert_eq!(activity.next_due, Some(date(2027, 1, 15)));
    }

    #[tokio::test]
    async fn test_unrelated_vaccine_does_not_realize_january() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Relámpago", Some(SanitaryCategory::A));
        store.add_vaccination(horse.id, "Influenza", date(2026, 1, 15));

        let calendar = service(&store).calendar(horse.id, Some(2026)).await.unwrap();
        let activity = january(&calendar);
        assert!(!activity.realized);
        assert_eq!(activity.realized_on, None);
        assert_eq!(activity.next_due, None);
    }

    #[tokio::test]
    async fn test_record_outside_the_month_does_not_count() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Relámpago", Some(SanitaryCategory::A));
        store.add_vaccination(horse.id, "Antirrábica", date(2026, 2, 1));
        store.add_vaccination(horse.id, "Antirrábica", date(2025, 1, 20));

        let calendar = service(&store).calendar(horse.id, Some(2026)).await.unwrap();
        assert!(!january(&calendar).realized);
    }

    #[tokio::test]
    async fn test_first_match_in_month_wins() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Relámpago", Some(SanitaryCategory::A));
        store.add_vaccination(horse.id, "Rabia", date(2026, 1, 28));
        store.add_vaccination(horse.id, "Rabia refuerzo", date(2026, 1, 3));

        let calendar = service(&store).calendar(horse.id, Some(2026)).await.unwrap();
        assert_eq!(january(&calendar).realized_on, Some(date(2026, 1, 3)));
    }

    #[tokio::test]
    async fn test_deworming_matched_by_month() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Tormenta", Some(SanitaryCategory::B));
        store.add_deworming(horse.id, date(2026, 12, 31));

        let calendar = service(&store).calendar(horse.id, Some(2026)).await.unwrap();
        let december = calendar.months.iter().find(|m| m.month == 12).unwrap();
        assert!(december.activities[0].realized);
        let february = calendar.months.iter().find(|m| m.month == 2).unwrap();
        assert!(february.activities.iter().all(|a| !a.realized));
    }

    #[tokio::test]
    async fn test_horse_without_category_has_no_plan() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Sin Papeles", None);

        let calendar = service(&store).calendar(horse.id, Some(2026)).await.unwrap();
        assert!(calendar.months.is_empty());
        assert_eq!(calendar.category, None);

        let stats = service(&store)
            .stats_on(horse.id, Some(2026), date(2026, 6, 1))
            .await
            .unwrap();
        assert!(!stats.has_plan);
        assert_eq!(stats.total_activities, 0);
        assert_eq!(stats.completion_percentage, 0.0);
        assert_eq!(stats.annual_cost, None);
    }

    #[tokio::test]
    async fn test_unknown_horse_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            service(&store).calendar(Uuid::new_v4(), Some(2026)).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stats_mid_year() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Relámpago", Some(SanitaryCategory::A));
        store.add_vaccination(horse.id, "Antirrábica", date(2026, 1, 10));
        store.add_vaccination(horse.id, "AIE", date(2026, 2, 5));
        store.add_deworming(horse.id, date(2026, 2, 20));

        let stats = service(&store)
            .stats_on(horse.id, Some(2026), date(2026, 4, 10))
            .await
            .unwrap();

        assert!(stats.has_plan);
        assert_eq!(stats.total_activities, 13);
        assert_eq!(stats.realized_activities, 3);
        assert_eq!(stats.pending_activities, 10);
        assert_eq!(stats.completion_percentage, 23.1);
        assert_eq!(stats.annual_cost, Some(540000));

        // Only March's influenza is overdue; April is the current month.
        assert_eq!(stats.overdue.len(), 1);
        let march = &stats.overdue[0];
        assert_eq!(march.month, 3);
        assert_eq!(march.days_overdue, Some(26));

        assert_eq!(stats.upcoming.len(), 5);
        assert_eq!(stats.upcoming[0].month, 4);
        assert!(stats.upcoming.windows(2).all(|w| w[0].month <= w[1].month));
        assert!(stats.upcoming.iter().all(|p| p.days_overdue.is_none()));
    }

    #[tokio::test]
    async fn test_stats_past_and_future_years() {
        let store = Arc::new(MemoryStore::new());
        let horse = store.add_horse("Tormenta", Some(SanitaryCategory::B));
        let svc = service(&store);

        let past = svc.stats_on(horse.id, Some(2026), date(2027, 3, 1)).await.unwrap();
        assert_eq!(past.overdue.len(), past.total_activities);
        assert!(past.upcoming.is_empty());
        assert!(past.overdue.iter().all(|p| p.days_overdue.unwrap() > 0));

        let future = svc.stats_on(horse.id, Some(2026), date(2025, 11, 1)).await.unwrap();
        assert!(future.overdue.is_empty());
        assert_eq!(future.upcoming.len(), 5);
        assert_eq!(future.completion_percentage, 0.0);
    }

    #[test]
    fn test_completion_percentage_bounds() {
        assert_eq!(completion_percentage(0, 0), 0.0);
        assert_eq!(completion_percentage(0, 7), 0.0);
        assert_eq!(completion_percentage(7, 7), 100.0);
        assert_eq!(completion_percentage(1, 3), 33.3);
        assert_eq!(completion_percentage(2, 3), 66.7);
        for total in 0..20 {
            for realized in 0..=total {
                let pct = completion_percentage(realized, total);
                assert!((0.0..=100.0).contains(&pct));
            }
        }
    }
}
