use serde::{Deserialize, Serialize};

/// How a dataset is meant to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Line,
}

/// Labelled counts, ready for rendering. `labels` and `counts` are index-aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub question_id: String,
    pub question_text: String,
    pub question_type: String,
    pub chart_type: ChartKind,
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
    /// Number of submissions that contributed, which for multi-select questions
    /// can be less than the sum of `counts`.
    pub total_responses: u64,
}

impl ChartDataset {
    /// The count for a label, if it is present.
    pub fn count(&self, label: &str) -> Option<u64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.counts[i])
    }
}
