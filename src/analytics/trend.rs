use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use super::{ChartDataset, ChartKind, Response};

/// Number of most recent days kept in a trend.
pub const TREND_WINDOW: usize = 30;

pub const TREND_QUESTION_ID: &str = "submission_trends";
const TREND_QUESTION_TEXT: &str = "Submission Trends Over Time";
const TREND_QUESTION_TYPE: &str = "trend";

/// Count submissions per calendar day in the given time zone.
///
/// Days are ascending and labelled `YYYY-MM-DD`. Days without submissions are
/// absent rather than zero, and only the last [`TREND_WINDOW`] days that have
/// submissions are kept. `total_responses` counts every submission given.
pub fn trend<S: Response>(submissions: &[S], offset: FixedOffset) -> ChartDataset {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for submission in submissions {
        let day = submission.created_at().with_timezone(&offset).date_naive();
        *per_day.entry(day).or_default() += 1;
    }

    let skip = per_day.len().saturating_sub(TREND_WINDOW);
    let (labels, counts) = per_day
        .into_iter()
        .skip(skip)
        .map(|(day, count)| (day.format("%Y-%m-%d").to_string(), count))
        .unzip();

    ChartDataset {
        question_id: TREND_QUESTION_ID.to_string(),
        question_text: TREND_QUESTION_TEXT.to_string(),
        question_type: TREND_QUESTION_TYPE.to_string(),
        chart_type: ChartKind::Line,
        labels,
        counts,
        total_responses: submissions.len() as u64,
    }
}
