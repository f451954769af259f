use std::collections::HashMap;

use crate::model::common::{answer::admissible, question::Question};

use super::{decode_entities, ChartDataset, ChartKind, Response};

/// Count how often each option of a question was chosen.
///
/// Declared options come first in declared order, followed by values that match
/// no option (under their own decoded text) in the order they were first seen.
/// Labels nobody chose are left out. Only select questions get labels; other
/// types still report how many submissions answered them.
pub fn aggregate<S: Response>(question: &Question, submissions: &[S]) -> ChartDataset {
    let select = question.question_type.is_select();
    let lookup = question.label_lookup();

    let mut labels: Vec<String> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    if select {
        for option in question.options() {
            let label = decode_entities(&option.label);
            positions.entry(label.clone()).or_insert_with(|| {
                labels.push(label);
                counts.push(0);
                labels.len() - 1
            });
        }
    }

    let mut total_responses = 0;
    for submission in submissions {
        let Some(answer) = admissible(submission.answers(), &question.question_id) else {
            continue;
        };
        total_responses += 1;
        if !select {
            continue;
        }

        // Numbers and booleans never match an option value.
        for value in answer.values().iter().filter_map(|value| value.as_text()) {
            let label = lookup
                .get(value)
                .cloned()
                .unwrap_or_else(|| decode_entities(value));
            let position = *positions.entry(label.clone()).or_insert_with(|| {
                labels.push(label);
                counts.push(0);
                labels.len() - 1
            });
            counts[position] += 1;
        }
    }

    let (labels, counts) = labels
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .unzip();

    ChartDataset {
        question_id: question.question_id.clone(),
        question_text: question.question_text.clone(),
        question_type: question.question_type.as_str().to_string(),
        chart_type: ChartKind::Pie,
        labels,
        counts,
        total_responses,
    }
}
