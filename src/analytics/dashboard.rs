use crate::model::{api::analytics::FormResponseCount, common::question::Question};

use super::{aggregate, ChartDataset, Response};

/// How many forms the overview compares.
pub const FORM_COMPARISON_LIMIT: usize = 10;

/// A pie chart for every chartable question that received at least one response, in question order.
pub fn dashboard<S: Response>(questions: &[Question], submissions: &[S]) -> Vec<ChartDataset> {
    questions
        .iter()
        .filter(|question| question.is_chartable())
        .map(|question| aggregate(question, submissions))
        .filter(|dataset| dataset.total_responses > 0)
        .collect()
}

/// The forms with the most responses, most first. Ties keep their given order.
pub fn rank_forms(mut forms: Vec<FormResponseCount>) -> Vec<FormResponseCount> {
    forms.sort_by(|a, b| b.responses.cmp(&a.responses));
    forms.truncate(FORM_COMPARISON_LIMIT);
    forms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        db::{form::NewForm, submission::SubmissionCore},
        mongodb::Id,
    };

    #[test]
    fn charts_only_answered_select_questions() {
        let form = NewForm::example();
        let form_id = Id::new();
        // Nobody has picked a hobby yet.
        let submissions = vec![SubmissionCore::example3(form_id)];
        let datasets = dashboard(&form.questions, &submissions);
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].question_id, "color");
        assert_eq!(datasets[0].labels, vec!["Red"]);

        let submissions = vec![
            SubmissionCore::example1(form_id),
            SubmissionCore::example2(form_id),
            SubmissionCore::example3(form_id),
        ];
        let datasets = dashboard(&form.questions, &submissions);
        let ids: Vec<&str> = datasets.iter().map(|d| d.question_id.as_str()).collect();
        assert_eq!(ids, vec!["color", "hobbies"]);
        assert_eq!(datasets[0].counts, vec![2, 1]);
        assert_eq!(datasets[1].total_responses, 2);
        assert_eq!(datasets[1].counts, vec![1, 2]);
    }

    #[test]
    fn identity_questions_skipped() {
        let mut form = NewForm::example();
        for question in &mut form.questions {
            if question.question_id == "color" {
                question.question_id = "name".to_string();
            }
        }
        let form_id = Id::new();
        let mut submission = SubmissionCore::example1(form_id);
        let color = submission.answers.remove("color").unwrap();
        submission.answers.insert("name".to_string(), color);

        let datasets = dashboard(&form.questions, &[submission]);
        let ids: Vec<&str> = datasets.iter().map(|d| d.question_id.as_str()).collect();
        assert_eq!(ids, vec!["hobbies"]);
    }

    #[test]
    fn ranking() {
        let forms: Vec<FormResponseCount> = (0..12)
            .map(|i| FormResponseCount {
                form_id: Id::new().into(),
                name: format!("Form {i}"),
                responses: [3, 9, 3, 0, 5][i % 5],
            })
            .collect();
        let ranked = rank_forms(forms);

        assert_eq!(ranked.len(), FORM_COMPARISON_LIMIT);
        let names: Vec<&str> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Form 1", "Form 6", "Form 11", "Form 4", "Form 9", "Form 0", "Form 2", "Form 5",
                "Form 7", "Form 10"
            ]
        );
    }
}
