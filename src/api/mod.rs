use rocket::Route;

mod auth;
mod coordinator;
mod public;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(coordinator::routes());
    routes.extend(public::routes());
    routes.extend(auth::routes());
    routes
}
