//! Cron wiring for the alert rules

use anyhow::Result;
use chrono::{DateTime, Utc};
use domain::DomainResult;
use domain::alerts::{AlertRules, JobOutcome, RuleStore};
use domain::postgres::Database;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::settings::Settings;

/// One scheduled rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleJob {
    Vaccinations,
    Shoeing,
    Payments,
    Events,
    PaymentStatus,
}

impl RuleJob {
    pub const ALL: [RuleJob; 5] = [
        RuleJob::Vaccinations,
        RuleJob::Shoeing,
        RuleJob::Payments,
        RuleJob::Events,
        RuleJob::PaymentStatus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleJob::Vaccinations => "vaccinations_due",
            RuleJob::Shoeing => "shoeing_due",
            RuleJob::Payments => "overdue_payments",
            RuleJob::Events => "event_reminders",
            RuleJob::PaymentStatus => "payment_status_sweep",
        }
    }

    pub fn schedule(self, settings: &Settings) -> &str {
        match self {
            RuleJob::Vaccinations => &settings.vaccination_schedule,
            RuleJob::Shoeing => &settings.shoeing_schedule,
            RuleJob::Payments => &settings.payment_schedule,
            RuleJob::Events => &settings.event_schedule,
            RuleJob::PaymentStatus => &settings.payment_status_schedule,
        }
    }

    /// Run the rule as of `now`. The status sweep reports moved payments as
    /// processed items.
    pub async fn run<S: RuleStore>(
        self,
        rules: &AlertRules<S>,
        now: DateTime<Utc>,
    ) -> DomainResult<JobOutcome> {
        let today = now.date_naive();
        match self {
            RuleJob::Vaccinations => rules.vaccinations_due(today).await,
            RuleJob::Shoeing => rules.shoeing_due(today).await,
            RuleJob::Payments => rules.overdue_payments(today).await,
            RuleJob::Events => rules.event_reminders(now).await,
            RuleJob::PaymentStatus => {
                let moved = rules.sweep_overdue_payments(today).await?;
                Ok(JobOutcome {
                    processed: moved as usize,
                    ..JobOutcome::default()
                })
            }
        }
    }
}

pub struct AlertScheduler {
    rules: AlertRules<Database>,
    settings: Settings,
}

impl AlertScheduler {
    pub fn new(rules: AlertRules<Database>, settings: Settings) -> Self {
        Self { rules, settings }
    }

    /// Build every job, failing on the first invalid cron expression.
    pub fn jobs(&self) -> Result<Vec<Job>> {
        RuleJob::ALL.iter().map(|&rule| self.job(rule)).collect()
    }

    fn job(&self, rule: RuleJob) -> Result<Job> {
        let rules = self.rules.clone();
        let schedule = rule.schedule(&self.settings);

        let job = Job::new_async(schedule, move |_, _| {
            let rules = rules.clone();
            Box::pin(async move {
                info!(job = rule.name(), "Alert job executed");
                match rule.run(&rules, Utc::now()).await {
                    Ok(outcome) => info!(
                        job = rule.name(),
                        processed = outcome.processed,
                        failed = outcome.failed,
                        alerts_created = outcome.alerts_created,
                        "Alert job finished"
                    ),
                    Err(e) => error!(job = rule.name(), "Alert job failed: {}", e),
                }
            })
        })
        .map_err(|e| anyhow::anyhow!("Invalid schedule '{}' for {}: {}", schedule, rule.name(), e))?;

        Ok(job)
    }

    pub async fn start(&self) -> Result<JobScheduler> {
        let scheduler = JobScheduler::new().await?;
        for job in self.jobs()? {
            scheduler.add(job).await?;
        }
        scheduler.start().await?;

        for rule in RuleJob::ALL {
            info!(
                job = rule.name(),
                schedule = rule.schedule(&self.settings),
                "Scheduled alert job"
            );
        }
        Ok(scheduler)
    }
}
