use mongodb::{bson::doc, options::FindOptions};
use rocket::{
    futures::TryStreamExt,
    http::{ContentType, Header},
    serde::json::Json,
    Route,
};

use crate::{
    error::{Error, Result},
    export::{export, ExportFormat},
    model::{
        api::{
            auth::AuthToken,
            pagination::{Paginated, PaginationRequest},
            submission::SubmissionDescription,
        },
        common::range::{DateRange, Timestamp},
        db::{
            form::Form,
            submission::{Submission, SubmissionCore},
        },
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_submissions, delete_submission, export_submissions]
}

/// A file download.
#[derive(Responder)]
pub struct Download {
    body: (ContentType, String),
    disposition: Header<'static>,
}

/// Fetch a form, or 404.
pub(crate) async fn find_form(forms: &Coll<Form>, form_id: Id) -> Result<Form> {
    forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))
}

/// All submissions of a form within a range, newest first.
pub(crate) async fn find_submissions(
    submissions: &Coll<Submission>,
    form_id: Id,
    range: &DateRange,
) -> Result<Vec<Submission>> {
    let newest_first = FindOptions::builder()
        .sort(doc! { "created_at": -1, "_id": -1 })
        .build();
    let found = submissions
        .find(SubmissionCore::filter(form_id, range), newest_first)
        .await?
        .try_collect()
        .await?;
    Ok(found)
}

#[get("/forms/<form_id>/submissions?<from>&<to>&<pagination..>")]
async fn get_submissions(
    _token: AuthToken,
    form_id: Id,
    from: Option<Timestamp>,
    to: Option<Timestamp>,
    pagination: PaginationRequest,
    forms: Coll<Form>,
    submissions: Coll<Submission>,
) -> Result<Json<Paginated<SubmissionDescription>>> {
    find_form(&forms, form_id).await?;
    let filter = SubmissionCore::filter(form_id, &DateRange { from, to });

    let total = submissions.count_documents(filter.clone(), None).await?;
    let page_options = FindOptions::builder()
        .sort(doc! { "created_at": -1, "_id": -1 })
        .skip(pagination.skip())
        .limit(pagination.page_size as i64)
        .build();
    let page: Vec<SubmissionDescription> = submissions
        .find(filter, page_options)
        .await?
        .map_ok(SubmissionDescription::from)
        .try_collect()
        .await?;

    Ok(Json(pagination.to_paginated(total, page)))
}

#[delete("/forms/<form_id>/submissions/<submission_id>")]
async fn delete_submission(
    token: AuthToken,
    form_id: Id,
    submission_id: Id,
    submissions: Coll<Submission>,
) -> Result<()> {
    let filter = doc! {
        "_id": submission_id,
        "form_id": form_id,
    };
    let result = submissions.delete_one(filter, None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!(
            "Submission {submission_id} of form {form_id}"
        )));
    }
    info!(
        "Admin '{}' deleted submission {submission_id} of form {form_id}",
        token.username
    );
    Ok(())
}

#[get("/forms/<form_id>/submissions/export?<format>&<from>&<to>")]
async fn export_submissions(
    _token: AuthToken,
    form_id: Id,
    format: Option<&str>,
    from: Option<Timestamp>,
    to: Option<Timestamp>,
    forms: Coll<Form>,
    submissions: Coll<Submission>,
) -> Result<Download> {
    let format = match format {
        Some(format) => format.parse().map_err(Error::bad_request)?,
        None => ExportFormat::Csv,
    };
    let form = find_form(&forms, form_id).await?;
    let found = find_submissions(&submissions, form_id, &DateRange { from, to }).await?;
    let body = export(&form.questions, &found, format)?;
    debug!(
        "Exported {} submissions of form {form_id} as {}",
        found.len(),
        format.extension()
    );

    let filename = format!("responses-{form_id}.{}", format.extension());
    Ok(Download {
        body: (format.content_type(), body),
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ),
    })
}
