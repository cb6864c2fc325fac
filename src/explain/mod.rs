//! Natural-language explanation of traffic patterns.
//!
//! The core only prepares a statistical context and a prompt; producing the
//! prose is delegated to an [`Explainer`]. Nothing computed elsewhere depends
//! on what the explainer returns.

mod openai;

pub use openai::OpenAiExplainer;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::analyzers::utility::mean_count;
use crate::error::TrafficError;
use crate::model::TrafficRecord;
use crate::store::RecordStore;

pub const NO_DATA_MESSAGE: &str = "No traffic data available for the specified period.";
pub const FALLBACK_MESSAGE: &str =
    "Unable to analyze traffic patterns at this time. Please try again later.";

const SAMPLE_SIZE: usize = 5;

/// Sample timestamps always carry seconds, e.g. `2023-01-01T09:00:00`.
const SAMPLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const ANALYSIS_PROMPT: &str = "\
You are a traffic analyst. Analyze the vehicle counts recorded between {startDate} and {endDate}.

Summary:
- Records: {totalRecords}
- Total cars: {totalCars}
- Average cars per interval: {averageCarsPerInterval}

Average cars by day of week:
{dailyAverages}

Average cars by hour of day:
{hourlyAverages}

Sample data points:
{sampleData}

Describe the main traffic patterns, peak and quiet periods, and any anomalies. Keep it concise.";

/// Produces free-form text for a prompt.
#[async_trait::async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, prompt: &str) -> Result<String>;
}

/// Pre-formatted statistics handed to the prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationContext {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_records: usize,
    pub total_cars: u64,
    pub average_cars_per_interval: String,
    pub sample_data: String,
    pub daily_averages: String,
    pub hourly_averages: String,
}

impl ExplanationContext {
    /// Builds the context from the records of the period, in any order.
    pub fn from_records(records: &[TrafficRecord], start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let mut ordered = records.to_vec();
        ordered.sort_by_key(|r| r.timestamp);

        let counts = || ordered.iter().map(|r| u64::from(r.car_count));

        let sample_data = ordered
            .iter()
            .take(SAMPLE_SIZE)
            .map(|r| {
                format!(
                    "- {}: {} cars",
                    r.timestamp.format(SAMPLE_TIMESTAMP_FORMAT),
                    r.car_count
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        // Monday first
        let mut by_weekday: BTreeMap<u32, (Weekday, Vec<u64>)> = BTreeMap::new();
        let mut by_hour: BTreeMap<u32, Vec<u64>> = BTreeMap::new();
        for r in &ordered {
            let wd = r.timestamp.weekday();
            by_weekday
                .entry(wd.num_days_from_monday())
                .or_insert_with(|| (wd, Vec::new()))
                .1
                .push(u64::from(r.car_count));
            by_hour
                .entry(r.timestamp.hour())
                .or_default()
                .push(u64::from(r.car_count));
        }

        let daily_averages = by_weekday
            .values()
            .map(|(wd, c)| {
                format!(
                    "- {}: {:.1} cars",
                    weekday_name(*wd),
                    mean_count(c.iter().copied())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let hourly_averages = by_hour
            .iter()
            .map(|(h, c)| format!("- {:02}:00 - {:.1} cars", h, mean_count(c.iter().copied())))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            start_date,
            end_date,
            total_records: ordered.len(),
            total_cars: counts().sum(),
            average_cars_per_interval: format!("{:.1}", mean_count(counts())),
            sample_data,
            daily_averages,
            hourly_averages,
        }
    }
}

fn weekday_name(wd: Weekday) -> &'static str {
    match wd {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Fills the analysis prompt template with `ctx`.
pub fn render_prompt(ctx: &ExplanationContext) -> String {
    let vars: [(&str, String); 8] = [
        ("startDate", ctx.start_date.to_string()),
        ("endDate", ctx.end_date.to_string()),
        ("totalRecords", ctx.total_records.to_string()),
        ("totalCars", ctx.total_cars.to_string()),
        ("averageCarsPerInterval", ctx.average_cars_per_interval.clone()),
        ("dailyAverages", ctx.daily_averages.clone()),
        ("hourlyAverages", ctx.hourly_averages.clone()),
        ("sampleData", ctx.sample_data.clone()),
    ];

    let mut prompt = ANALYSIS_PROMPT.to_string();
    for (key, value) in vars {
        prompt = prompt.replace(&format!("{{{key}}}"), &value);
    }
    prompt
}

/// Explains the traffic recorded from `start_date` through `end_date`
/// (both inclusive).
///
/// Returns [`NO_DATA_MESSAGE`] when the period is empty and
/// [`FALLBACK_MESSAGE`] when the explainer fails. Store failures are errors.
#[tracing::instrument(skip(store, explainer))]
pub async fn analyze_patterns<S, E>(
    store: &S,
    explainer: &E,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<String, TrafficError>
where
    S: RecordStore + ?Sized,
    E: Explainer + ?Sized,
{
    let from = start_date.and_time(NaiveTime::MIN);
    let records = match end_date.succ_opt() {
        Some(next) => store.find_by_timestamp_range(from, next.and_time(NaiveTime::MIN))?,
        // last representable day: everything from `from` onwards
        None => store
            .find_all()?
            .into_iter()
            .filter(|r| r.timestamp >= from)
            .collect(),
    };

    if records.is_empty() {
        info!("No traffic data in requested period");
        return Ok(NO_DATA_MESSAGE.to_string());
    }

    let ctx = ExplanationContext::from_records(&records, start_date, end_date);
    let prompt = render_prompt(&ctx);

    match explainer.explain(&prompt).await {
        Ok(text) => Ok(text),
        Err(e) => {
            error!(error = %e, "Error analyzing traffic patterns");
            Ok(FALLBACK_MESSAGE.to_string())
        }
    }
}
