use rocket::Route;

mod admin;
mod analytics;
mod auth;
mod forms;
mod public;
mod submissions;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(analytics::routes());
    routes.extend(auth::routes());
    routes.extend(forms::routes());
    routes.extend(public::routes());
    routes.extend(submissions::routes());
    routes
}
