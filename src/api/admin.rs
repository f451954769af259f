use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{admin::AdminCredentials, auth::AuthToken},
        db::admin::{Admin, NewAdmin},
        mongodb::{is_duplicate_key_error, Coll},
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_admins, create_admin, delete_admin]
}

/// Usernames of every admin, in alphabetical order.
#[get("/admins")]
async fn get_admins(_token: AuthToken, admins: Coll<Admin>) -> Result<Json<Vec<String>>> {
    let by_name = FindOptions::builder().sort(doc! {"username": 1}).build();
    let usernames: Vec<String> = admins
        .find(None, by_name)
        .await?
        .map_ok(|admin| admin.admin.username)
        .try_collect()
        .await?;
    Ok(Json(usernames))
}

#[post("/admins", data = "<credentials>", format = "json")]
async fn create_admin(
    token: AuthToken,
    credentials: Json<AdminCredentials>,
    admins: Coll<NewAdmin>,
) -> Result<()> {
    let credentials = credentials.into_inner();
    let username = credentials.username.clone();
    let admin = NewAdmin::try_from(credentials).map_err(Error::bad_request)?;

    if let Err(err) = admins.insert_one(admin, None).await {
        return Err(if is_duplicate_key_error(&err) {
            Error::bad_request(format!("Username '{username}' is taken"))
        } else {
            err.into()
        });
    }
    info!("{} added admin '{username}'", token.username);
    Ok(())
}

/// Remove the admin whose username is the request body.
#[delete("/admins", data = "<username>", format = "json")]
async fn delete_admin(token: AuthToken, username: String, admins: Coll<Admin>) -> Result<()> {
    let username = username.trim();
    if admins.count_documents(None, None).await? <= 1 {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            "At least one admin must remain".to_string(),
        ));
    }

    let deleted = admins
        .delete_one(doc! {"username": username}, None)
        .await?
        .deleted_count;
    if deleted == 0 {
        return Err(Error::not_found(format!("Admin '{username}'")));
    }
    info!("{} removed admin '{username}'", token.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::model::db::admin::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

    use super::*;

    async fn create(client: &Client, credentials: &AdminCredentials) -> Status {
        client
            .post(uri!(create_admin))
            .header(ContentType::JSON)
            .body(serde_json::to_string(credentials).unwrap())
            .dispatch()
            .await
            .status()
    }

    async fn delete(client: &Client, username: &str) -> Status {
        client
            .delete(uri!(delete_admin))
            .header(ContentType::JSON)
            .body(username.to_string())
            .dispatch()
            .await
            .status()
    }

    async fn usernames(client: &Client) -> Vec<String> {
        let response = client.get(uri!(get_admins)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.unwrap()
    }

    #[backend_test(admin)]
    async fn add_and_remove(client: Client, admins: Coll<Admin>) {
        let bob = AdminCredentials::example2();
        assert_eq!(create(&client, &bob).await, Status::Ok);

        let stored = admins
            .find_one(doc! {"username": &bob.username}, None)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.verify_password(&bob.password));
        assert_ne!(stored.password_hash, bob.password);

        assert_eq!(delete(&client, &bob.username).await, Status::Ok);
        assert_eq!(
            usernames(&client).await,
            [DEFAULT_ADMIN_USERNAME, "alice112"]
        );

        // Already gone.
        assert_eq!(delete(&client, &bob.username).await, Status::NotFound);
    }

    #[backend_test(admin)]
    async fn rejected_credentials(client: Client, admins: Coll<Admin>) {
        let blank_name = AdminCredentials {
            username: "   ".to_string(),
            password: "longenoughpassword".to_string(),
        };
        let short_password = AdminCredentials {
            username: "carol".to_string(),
            password: "abc".to_string(),
        };
        for credentials in [
            blank_name,
            short_password,
            AdminCredentials::empty(),
            // Taken by the logged-in admin.
            AdminCredentials::example1(),
        ] {
            assert_eq!(create(&client, &credentials).await, Status::BadRequest);
        }

        assert_eq!(admins.count_documents(None, None).await.unwrap(), 2);
    }

    #[backend_test(admin)]
    async fn listed_alphabetically(client: Client) {
        assert_eq!(create(&client, &AdminCredentials::example3()).await, Status::Ok);
        assert_eq!(create(&client, &AdminCredentials::example2()).await, Status::Ok);

        assert_eq!(
            usernames(&client).await,
            [
                DEFAULT_ADMIN_USERNAME,
                "alice112",
                "bobtheorganiser",
                "monsieur-foo"
            ]
        );
    }

    #[backend_test]
    async fn last_admin_stays(client: Client, admins: Coll<Admin>) {
        let default_admin = AdminCredentials {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        };
        let response = client
            .post(uri!(crate::api::auth::authenticate))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&default_admin).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        assert_eq!(
            delete(&client, DEFAULT_ADMIN_USERNAME).await,
            Status::UnprocessableEntity
        );
        assert_eq!(admins.count_documents(None, None).await.unwrap(), 1);
    }

    #[backend_test]
    async fn requires_login(client: Client) {
        let response = client.get(uri!(get_admins)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        let status = create(&client, &AdminCredentials::example2()).await;
        assert_eq!(status, Status::NotFound);
    }
}
