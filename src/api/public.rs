use chrono::{SubsecRound, Utc};
use mongodb::bson::{doc, Document};
use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{
            form::PublicForm,
            submission::{SubmissionReceipt, SubmissionRequest},
        },
        db::{form::Form, submission::NewSubmission},
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![public_form, submit]
}

/// Select an active form by its ID or custom slug.
fn active_form_filter(key: &str) -> Document {
    match key.parse::<Id>() {
        Ok(id) => doc! {
            "$or": [{ "_id": id }, { "custom_slug": key }],
            "is_active": true,
        },
        Err(_) => doc! {
            "custom_slug": key,
            "is_active": true,
        },
    }
}

async fn find_active_form(forms: &Coll<Form>, key: &str) -> Result<Form> {
    forms
        .find_one(active_form_filter(key), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Active form '{key}'")))
}

#[get("/public/forms/<key>")]
async fn public_form(key: &str, forms: Coll<Form>) -> Result<Json<PublicForm>> {
    let form = find_active_form(&forms, key).await?;
    Ok(Json(form.into()))
}

#[post("/public/forms/<key>/submissions", data = "<request>", format = "json")]
async fn submit(
    key: &str,
    request: Json<SubmissionRequest>,
    request_id: &RequestId,
    forms: Coll<Form>,
    new_submissions: Coll<NewSubmission>,
) -> Result<Json<SubmissionReceipt>> {
    let form = find_active_form(&forms, key).await?;
    let submission = request
        .0
        .into_new_submission(&form, Utc::now().trunc_subsecs(3))
        .map_err(Error::bad_request)?;

    // The unique index on (form, email) allows one submission per respondent.
    let id: Id = match new_submissions.insert_one(submission, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    "Inserted submission has no object ID".to_string(),
                )
            })?
            .into(),
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::Status(
                Status::Conflict,
                "A response has already been submitted with this email address".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    info!("req{request_id}: new submission {id} for form {}", form.id);
    Ok(Json(SubmissionReceipt { id: id.into() }))
}
