use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::AdminCredentials,
            auth::{AuthToken, AUTH_TOKEN_COOKIE},
        },
        db::admin::Admin,
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, logout]
}

/// Log in as an admin, storing a signed token in the auth cookie.
#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    let AdminCredentials { username, password } = credentials.into_inner();

    let Some(admin) = admins.find_one(doc! {"username": &username}, None).await? else {
        warn!("Login attempt for unknown admin '{username}'");
        return Err(bad_login());
    };
    if !admin.verify_password(&password) {
        warn!("Wrong password for admin '{username}'");
        return Err(bad_login());
    }

    cookies.add(AuthToken::new(&admin).into_cookie(config)?);
    info!("{username} logged in");
    Ok(())
}

/// Unknown usernames and wrong passwords get the same answer.
fn bad_login() -> Error {
    Error::Status(
        Status::Unauthorized,
        "Incorrect username or password".to_string(),
    )
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::ContentType,
        local::asynchronous::Client,
        serde::json::serde_json::{json, Value},
    };

    use crate::model::db::admin::{NewAdmin, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

    use super::*;

    async fn login(client: &Client, body: Value) -> Status {
        client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await
            .status()
    }

    fn has_cookie(client: &Client) -> bool {
        client.cookies().get(AUTH_TOKEN_COOKIE).is_some()
    }

    #[backend_test]
    async fn valid_login(client: Client, admins: Coll<NewAdmin>) {
        admins.insert_one(NewAdmin::example(), None).await.unwrap();

        let status = login(&client, json!(AdminCredentials::example1())).await;
        assert_eq!(status, Status::Ok);
        assert!(has_cookie(&client));
    }

    #[backend_test]
    async fn default_admin_login(client: Client) {
        let body = json!({
            "username": DEFAULT_ADMIN_USERNAME,
            "password": DEFAULT_ADMIN_PASSWORD,
        });
        assert_eq!(login(&client, body).await, Status::Ok);
        assert!(has_cookie(&client));
    }

    #[backend_test]
    async fn invalid_login(client: Client, admins: Coll<NewAdmin>) {
        admins.insert_one(NewAdmin::example(), None).await.unwrap();
        let username = AdminCredentials::example1().username;

        for body in [
            json!(AdminCredentials::empty()),
            json!({"username": "nobody", "password": "surveys4lyfe"}),
            json!({"username": &username, "password": ""}),
            json!({"username": &username, "password": "surveys4lyf"}),
        ] {
            assert_eq!(login(&client, body).await, Status::Unauthorized);
            assert!(!has_cookie(&client));
        }

        // Not valid credentials at all.
        let status = login(&client, json!({"username": &username})).await;
        assert_eq!(status, Status::UnprocessableEntity);
    }

    #[backend_test(admin)]
    async fn logout_clears_cookie(client: Client) {
        assert!(has_cookie(&client));

        let response = client.delete(uri!(logout)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert!(!has_cookie(&client));

        // Admin-only routes are no longer reachable.
        let response = client.get("/forms").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
