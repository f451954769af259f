use chrono::Utc;
use mongodb::{bson::doc, error::Error as DbError, options::FindOptions, Client};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            form::{FormDescription, FormSpec, FormSummary},
            transfer::{FormImport, QuestionExport},
        },
        db::{
            form::{Form, NewForm},
            submission::{response_counts, Submission},
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
        templates::{self, FormTemplate},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_forms,
        get_form,
        create_form,
        modify_form,
        delete_form,
        get_templates,
        create_from_template,
        import_form,
        export_questions,
    ]
}

/// Map a failed form write to a conflict if it was the slug index that rejected it.
fn slug_conflict(err: DbError, slug: Option<&str>) -> Error {
    if is_duplicate_key_error(&err) {
        Error::Status(
            Status::Conflict,
            format!("Custom slug already in use: {}", slug.unwrap_or_default()),
        )
    } else {
        err.into()
    }
}

/// Validate and insert a new form on behalf of the logged-in admin.
async fn insert_form(
    spec: FormSpec,
    token: &AuthToken,
    new_forms: &Coll<NewForm>,
    forms: &Coll<Form>,
) -> Result<Form> {
    let form = spec
        .into_new_form(token.username.clone(), Utc::now())
        .map_err(Error::bad_request)?;

    let new_id: Id = new_forms
        .insert_one(&form, None)
        .await
        .map_err(|err| slug_conflict(err, form.custom_slug.as_deref()))?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();
    info!("Admin '{}' created form {new_id}", token.username);

    let form = forms
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {new_id}")))?;
    Ok(form)
}

#[get("/forms")]
async fn get_forms(
    _token: AuthToken,
    forms: Coll<Form>,
    submissions: Coll<Submission>,
) -> Result<Json<Vec<FormSummary>>> {
    let newest_first = FindOptions::builder()
        .sort(doc! { "created_at": -1, "_id": -1 })
        .build();
    let form_list: Vec<Form> = forms.find(None, newest_first).await?.try_collect().await?;
    let counts = response_counts(&submissions).await?;

    let summaries = form_list
        .into_iter()
        .map(|form| {
            let count = counts.get(&form.id).copied().unwrap_or(0);
            FormSummary::new(form, count)
        })
        .collect();
    Ok(Json(summaries))
}

#[get("/forms/<form_id>")]
async fn get_form(
    _token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    let form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
    Ok(Json(form.into()))
}

#[post("/forms", data = "<spec>", format = "json")]
async fn create_form(
    token: AuthToken,
    spec: Json<FormSpec>,
    new_forms: Coll<NewForm>,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    let form = insert_form(spec.0, &token, &new_forms, &forms).await?;
    Ok(Json(form.into()))
}

#[put("/forms/<form_id>", data = "<spec>", format = "json")]
async fn modify_form(
    token: AuthToken,
    form_id: Id,
    spec: Json<FormSpec>,
    new_forms: Coll<NewForm>,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    // Get the existing form.
    let existing = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;

    // Replace with the new spec, keeping the original authorship.
    let new_form = spec
        .0
        .into_new_form(existing.form.created_by, existing.form.created_at)
        .map_err(Error::bad_request)?;
    new_forms
        .replace_one(form_id.as_doc(), &new_form, None)
        .await
        .map_err(|err| slug_conflict(err, new_form.custom_slug.as_deref()))?;
    info!("Admin '{}' modified form {form_id}", token.username);

    let form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
    Ok(Json(form.into()))
}

#[delete("/forms/<form_id>")]
async fn delete_form(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
    submissions: Coll<Submission>,
    db_client: &State<Client>,
) -> Result<()> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let result = forms
        .delete_one_with_session(form_id.as_doc(), None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        session.abort_transaction().await?;
        return Err(Error::not_found(format!("Form {form_id}")));
    }
    let deleted = submissions
        .delete_many_with_session(doc! { "form_id": form_id }, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    info!(
        "Admin '{}' deleted form {form_id} and its {} submissions",
        token.username, deleted.deleted_count
    );
    Ok(())
}

#[get("/templates")]
async fn get_templates(_token: AuthToken) -> Json<Vec<FormTemplate>> {
    Json(templates::templates())
}

#[post("/forms/templates/<template_id>")]
async fn create_from_template(
    token: AuthToken,
    template_id: &str,
    new_forms: Coll<NewForm>,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    let template = templates::template(template_id)
        .ok_or_else(|| Error::not_found(format!("Template {template_id}")))?;
    let form = insert_form(template.form, &token, &new_forms, &forms).await?;
    Ok(Json(form.into()))
}

#[post("/forms/import", data = "<import>", format = "json")]
async fn import_form(
    token: AuthToken,
    import: Json<FormImport>,
    new_forms: Coll<NewForm>,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    let form = insert_form(import.0.into(), &token, &new_forms, &forms).await?;
    Ok(Json(form.into()))
}

#[get("/forms/<form_id>/questions/export")]
async fn export_questions(
    _token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
) -> Result<Json<QuestionExport>> {
    let form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
    Ok(Json(QuestionExport::from(&form.form)))
}
