use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    analytics::{dashboard, rank_forms, trend},
    error::Result,
    model::{
        api::{
            analytics::{AnalyticsOverview, FormAnalytics, FormResponseCount},
            auth::AuthToken,
        },
        common::range::DateRange,
        db::{
            form::Form,
            submission::{response_counts, Submission},
        },
        mongodb::{Coll, Id},
    },
    Config,
};

use super::submissions::{find_form, find_submissions};

pub fn routes() -> Vec<Route> {
    routes![get_form_analytics, get_overview]
}

#[get("/forms/<form_id>/analytics?<range..>")]
async fn get_form_analytics(
    _token: AuthToken,
    form_id: Id,
    range: DateRange,
    forms: Coll<Form>,
    submissions: Coll<Submission>,
    config: &State<Config>,
) -> Result<Json<FormAnalytics>> {
    let form = find_form(&forms, form_id).await?;
    let found = find_submissions(&submissions, form_id, &range).await?;

    Ok(Json(FormAnalytics {
        form_id: form.id.into(),
        total_submissions: found.len() as u64,
        datasets: dashboard(&form.questions, &found),
        trend: trend(&found, config.trend_offset()),
    }))
}

#[get("/analytics/overview")]
async fn get_overview(
    _token: AuthToken,
    forms: Coll<Form>,
    submissions: Coll<Submission>,
    config: &State<Config>,
) -> Result<Json<AnalyticsOverview>> {
    let newest_first = FindOptions::builder()
        .sort(doc! { "created_at": -1, "_id": -1 })
        .build();
    let all_forms: Vec<Form> = forms.find(None, newest_first).await?.try_collect().await?;
    let counts = response_counts(&submissions).await?;

    let active_forms = all_forms.iter().filter(|form| form.is_active).count() as u64;
    let per_form: Vec<FormResponseCount> = all_forms
        .into_iter()
        .map(|form| FormResponseCount {
            form_id: form.id.into(),
            responses: counts.get(&form.id).copied().unwrap_or(0),
            name: form.form.name,
        })
        .collect();
    let total_forms = per_form.len() as u64;

    let all_submissions: Vec<Submission> =
        submissions.find(None, None).await?.try_collect().await?;

    Ok(Json(AnalyticsOverview {
        total_forms,
        active_forms,
        total_submissions: all_submissions.len() as u64,
        top_forms: rank_forms(per_form),
        trend: trend(&all_submissions, config.trend_offset()),
    }))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::Status,
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json,
    };

    use crate::{
        analytics::{ChartKind, TREND_QUESTION_ID},
        model::db::{form::NewForm, submission::NewSubmission},
    };

    use super::*;

    async fn parse<T: serde::de::DeserializeOwned>(response: LocalResponse<'_>) -> T {
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    async fn insert_form(new_forms: &Coll<NewForm>, form: NewForm) -> Id {
        new_forms
            .insert_one(form, None)
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into()
    }

    #[backend_test(admin, populated)]
    async fn form_analytics(client: Client, form_id: Id) {

        let response = client
            .get(format!("/forms/{form_id}/analytics"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let analytics: FormAnalytics = parse(response).await;

        assert_eq!(analytics.form_id.to_string(), form_id.to_string());
        assert_eq!(analytics.total_submissions, 3);
        let ids: Vec<&str> = analytics
            .datasets
            .iter()
            .map(|d| d.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["color", "hobbies"]);
        assert_eq!(analytics.datasets[0].labels, vec!["Red", "Blue"]);
        assert_eq!(analytics.datasets[0].counts, vec![2, 1]);
        assert!(analytics
            .datasets
            .iter()
            .all(|d| d.chart_type == ChartKind::Pie));

        assert_eq!(analytics.trend.question_id, TREND_QUESTION_ID);
        assert_eq!(analytics.trend.labels, vec!["2024-03-01", "2024-03-03"]);
        assert_eq!(analytics.trend.counts, vec![2, 1]);
        assert_eq!(analytics.trend.total_responses, 3);
    }

    #[backend_test(admin, populated)]
    async fn form_analytics_in_range(client: Client, form_id: Id) {

        let response = client
            .get(format!(
                "/forms/{form_id}/analytics?from=2024-03-02T00:00:00Z"
            ))
            .dispatch()
            .await;
        let analytics: FormAnalytics = parse(response).await;
        assert_eq!(analytics.total_submissions, 1);
        // Only `color` was answered by the remaining respondent.
        assert_eq!(analytics.datasets.len(), 1);
        assert_eq!(analytics.trend.labels, vec!["2024-03-03"]);

        // An empty range yields no charts at all.
        let response = client
            .get(format!("/forms/{form_id}/analytics?from=2030-01-01T00:00:00Z"))
            .dispatch()
            .await;
        let analytics: FormAnalytics = parse(response).await;
        assert_eq!(analytics.total_submissions, 0);
        assert!(analytics.datasets.is_empty());
        assert!(analytics.trend.labels.is_empty());
    }

    #[backend_test(admin)]
    async fn unknown_form(client: Client) {
        let response = client
            .get(format!("/forms/{}/analytics", Id::new()))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn overview(
        client: Client,
        new_forms: Coll<NewForm>,
        new_submissions: Coll<NewSubmission>,
    ) {
        let busy = insert_form(&new_forms, NewForm::example()).await;
        let quiet = insert_form(&new_forms, NewForm::example_inactive()).await;
        new_submissions
            .insert_many(
                [
                    NewSubmission::example1(busy),
                    NewSubmission::example2(busy),
                    NewSubmission::example3(quiet),
                ],
                None,
            )
            .await
            .unwrap();

        let response = client.get(uri!(get_overview)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let overview: AnalyticsOverview = parse(response).await;

        assert_eq!(overview.total_forms, 2);
        assert_eq!(overview.active_forms, 1);
        assert_eq!(overview.total_submissions, 3);
        let ranked: Vec<(String, u64)> = overview
            .top_forms
            .iter()
            .map(|f| (f.form_id.to_string(), f.responses))
            .collect();
        assert_eq!(
            ranked,
            vec![(busy.to_string(), 2), (quiet.to_string(), 1)]
        );
        assert_eq!(overview.trend.labels, vec!["2024-03-01", "2024-03-03"]);
        assert_eq!(overview.trend.counts, vec![2, 1]);
    }

    #[backend_test(admin)]
    async fn empty_overview(client: Client) {
        let response = client.get(uri!(get_overview)).dispatch().await;
        let overview: AnalyticsOverview = parse(response).await;
        assert_eq!(overview.total_forms, 0);
        assert_eq!(overview.total_submissions, 0);
        assert!(overview.top_forms.is_empty());
        assert!(overview.trend.labels.is_empty());
    }

    #[backend_test]
    async fn requires_login(client: Client) {
        let response = client.get(uri!(get_overview)).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
