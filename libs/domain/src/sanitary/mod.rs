//! Sanitary plan catalog and compliance reconciliation

pub mod catalog;
pub mod matching;
pub mod reconcile;

pub use catalog::{ActivityType, CatalogVersion, CategoryPlan};
pub use reconcile::{
    CalendarView, ComplianceStats, PendingActivity, ReconciledActivity, ReconciledMonth,
    SanitaryPlanService, build_calendar, build_stats,
};
