//! Recurring journal automation and anomaly screening
//!
//! Templates are never consumed, only scheduled forward: each materialization
//! advances `next_run` by the template frequency, which is also the guard
//! that makes a same-day rerun a no-op.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EngineSettings;
use crate::ledger::JournalEngine;
use crate::traits::*;
use crate::types::*;

/// How many recent entries the classifier sees
const CLASSIFIER_WINDOW: usize = 100;

/// Schedule of a recurring template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// The run after `date`.
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Weekly => date + Duration::days(7),
            Frequency::Monthly => date + Months::new(1),
            Frequency::Quarterly => date + Months::new(3),
            Frequency::Yearly => date + Months::new(12),
        }
    }
}

/// Template lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateStatus {
    Active,
    Paused,
}

/// The journal entry a template stamps out on each run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTemplate {
    pub description: String,
    pub reference: Option<String>,
    pub lines: Vec<JournalLine>,
}

/// A recurring journal template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: String,
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Next date an entry is due; strictly advances past "today" on each
    /// processing pass
    pub next_run: NaiveDate,
    pub entry_data: EntryTemplate,
    pub status: TemplateStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for creating a recurring template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecurringTemplate {
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub entry_data: EntryTemplate,
}

/// Automation engine: recurring materialization and anomaly screening
pub struct AutomationEngine<S: EngineStorage, C: AnomalyClassifier> {
    pub(crate) storage: S,
    journal: JournalEngine<S>,
    settings: Arc<EngineSettings>,
    classifier: C,
}

impl<S: EngineStorage + Clone, C: AnomalyClassifier> AutomationEngine<S, C> {
    pub fn new(storage: S, settings: Arc<EngineSettings>, classifier: C) -> Self {
        Self {
            journal: JournalEngine::new(storage.clone(), settings.clone()),
            storage,
            settings,
            classifier,
        }
    }

    /// Create a recurring template.
    ///
    /// The template's lines get the same shape validation a journal entry
    /// would, so a template cannot sit broken until its first run.
    pub async fn create_template(
        &mut self,
        data: NewRecurringTemplate,
    ) -> EngineResult<RecurringTemplate> {
        let now = chrono::Utc::now().naive_utc();
        let probe = JournalEntry {
            id: String::new(),
            entry_number: 0,
            fiscal_year: String::new(),
            entry_date: data.start_date,
            reference: data.entry_data.reference.clone(),
            description: data.entry_data.description.clone(),
            lines: data.entry_data.lines.clone(),
            status: EntryStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        probe.validate()?;
        for line in &probe.lines {
            if self.storage.get_account(&line.account_id).await?.is_none() {
                return Err(EngineError::ReferentialIntegrity(format!(
                    "account '{}' does not exist",
                    line.account_id
                )));
            }
        }

        let template = RecurringTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            name: data.name,
            frequency: data.frequency,
            start_date: data.start_date,
            next_run: data.start_date,
            entry_data: data.entry_data,
            status: TemplateStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.storage.save_template(&template).await?;
        Ok(template)
    }

    /// Pause a template; due dates keep accruing but nothing posts.
    pub async fn pause_template(&mut self, template_id: &str) -> EngineResult<RecurringTemplate> {
        self.set_template_status(template_id, TemplateStatus::Paused)
            .await
    }

    /// Resume a paused template.
    pub async fn resume_template(&mut self, template_id: &str) -> EngineResult<RecurringTemplate> {
        self.set_template_status(template_id, TemplateStatus::Active)
            .await
    }

    async fn set_template_status(
        &mut self,
        template_id: &str,
        status: TemplateStatus,
    ) -> EngineResult<RecurringTemplate> {
        let mut template = self
            .storage
            .get_template(template_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("recurring template '{template_id}'")))?;
        template.status = status;
        template.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_template(&template).await?;
        Ok(template)
    }

    /// List all templates
    pub async fn list_templates(&self) -> EngineResult<Vec<RecurringTemplate>> {
        self.storage.list_templates().await
    }

    /// Materialize every due occurrence of every active template.
    ///
    /// Each occurrence posts an entry dated at its `next_run` and advances
    /// `next_run` by the frequency, persisting as it goes; when the loop
    /// finishes, every active template's `next_run` is strictly after
    /// `today`, which is what makes a second call on the same day post
    /// nothing. A template whose occurrence fails to post (locked period,
    /// deactivated account) is skipped with a warning and retried on the
    /// next pass.
    pub async fn process_recurring_due(&mut self, today: NaiveDate) -> EngineResult<usize> {
        let mut processed = 0;

        for mut template in self.storage.list_templates().await? {
            if template.status != TemplateStatus::Active {
                continue;
            }
            while template.next_run <= today {
                let data = NewJournalEntry {
                    entry_date: template.next_run,
                    reference: template.entry_data.reference.clone(),
                    description: template.entry_data.description.clone(),
                    lines: template.entry_data.lines.clone(),
                    status: Some(EntryStatus::Posted),
                };
                match self.journal.create_entry(data).await {
                    Ok(entry) => {
                        processed += 1;
                        template.next_run = template.frequency.advance(template.next_run);
                        template.updated_at = chrono::Utc::now().naive_utc();
                        self.storage.update_template(&template).await?;
                        tracing::debug!(
                            template = %template.name,
                            entry_number = entry.entry_number,
                            next_run = %template.next_run,
                            "recurring entry materialized"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            template = %template.name,
                            next_run = %template.next_run,
                            error = %err,
                            "recurring entry skipped"
                        );
                        break;
                    }
                }
            }
        }

        Ok(processed)
    }

    /// Screen recent posted entries through the injected classifier.
    ///
    /// Advisory only: the call is bounded by the configured timeout and any
    /// failure degrades to an empty list rather than an error, so anomaly
    /// detection can never gate posting.
    pub async fn get_anomalies(&self) -> Vec<Anomaly> {
        let mut entries = match self
            .storage
            .list_entries(&EntryFilter {
                status: Some(EntryStatus::Posted),
                ..EntryFilter::default()
            })
            .await
        {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "anomaly snapshot failed");
                return Vec::new();
            }
        };
        let skip = entries.len().saturating_sub(CLASSIFIER_WINDOW);
        let window = entries.split_off(skip);

        match tokio::time::timeout(
            self.settings.classifier_timeout,
            self.classifier.classify(&window),
        )
        .await
        {
            Ok(Ok(anomalies)) => anomalies,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "anomaly classifier failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.settings.classifier_timeout,
                    "anomaly classifier timed out"
                );
                Vec::new()
            }
        }
    }
}

/// Deterministic rule-based anomaly classifier.
///
/// Flags duplicate amounts on the same day, high-value outliers, and
/// weekend postings. An LLM-backed detector satisfies the same
/// [`AnomalyClassifier`] contract and can be swapped in at construction.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedClassifier;

#[async_trait]
impl AnomalyClassifier for RuleBasedClassifier {
    async fn classify(&self, entries: &[JournalEntry]) -> EngineResult<Vec<Anomaly>> {
        let mut anomalies = Vec::new();

        // Duplicate amount on the same day
        let mut by_day_amount: HashMap<(NaiveDate, String), Vec<&JournalEntry>> = HashMap::new();
        for entry in entries {
            by_day_amount
                .entry((entry.entry_date, entry.total_debits().normalized().to_string()))
                .or_default()
                .push(entry);
        }
        for ((date, _), group) in by_day_amount {
            if group.len() > 1 {
                let count = group.len();
                for entry in group {
                    anomalies.push(Anomaly {
                        entry_id: entry.id.clone(),
                        reason: format!(
                            "amount {} appears {count} times on {date}",
                            entry.total_debits()
                        ),
                        severity: Severity::Medium,
                    });
                }
            }
        }

        // High-value outlier: more than three standard deviations above the
        // mean, compared via squared distances to stay in exact arithmetic
        if entries.len() >= 2 {
            let totals: Vec<BigDecimal> = entries.iter().map(|e| e.total_debits()).collect();
            let n = BigDecimal::from(totals.len() as i64);
            let mean: BigDecimal = totals.iter().sum::<BigDecimal>() / &n;
            let variance: BigDecimal = totals
                .iter()
                .map(|t| {
                    let d = t - &mean;
                    &d * &d
                })
                .sum::<BigDecimal>()
                / &n;
            for (entry, total) in entries.iter().zip(&totals) {
                let d = total - &mean;
                if *total > mean && &d * &d > &variance * BigDecimal::from(9) {
                    anomalies.push(Anomaly {
                        entry_id: entry.id.clone(),
                        reason: format!("amount {total} is a high-value outlier"),
                        severity: Severity::High,
                    });
                }
            }
        }

        // Weekend postings
        for entry in entries {
            let weekday = entry.entry_date.weekday();
            if weekday == Weekday::Sat || weekday == Weekday::Sun {
                anomalies.push(Anomaly {
                    entry_id: entry.id.clone(),
                    reason: format!("posted on a weekend ({weekday})"),
                    severity: Severity::Low,
                });
            }
        }

        Ok(anomalies)
    }
}
