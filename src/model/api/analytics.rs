use serde::{Deserialize, Serialize};

use crate::{analytics::ChartDataset, model::mongodb::ApiId};

/// Charts for one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalytics {
    pub form_id: ApiId,
    pub total_submissions: u64,
    /// One pie chart per chartable question that has responses.
    pub datasets: Vec<ChartDataset>,
    pub trend: ChartDataset,
}

/// A form and how many submissions it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponseCount {
    pub form_id: ApiId,
    pub name: String,
    pub responses: u64,
}

/// Analytics across all forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_forms: u64,
    pub active_forms: u64,
    pub total_submissions: u64,
    /// The forms with the most submissions.
    pub top_forms: Vec<FormResponseCount>,
    pub trend: ChartDataset,
}
