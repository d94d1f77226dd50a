#[macro_use]
extern crate rocket;

pub mod api;
pub mod app_state;
pub mod config;
pub mod engine;
pub mod error;
pub mod ml;
pub mod prompts;
pub mod telemetry;
pub mod types;

use rocket::fs::FileServer;
use rocket::{Build, Rocket};

use api::{alert_system, chatbot, default_catcher, health, index, planner, predict_stroke, StaticDir};
use app_state::AppState;
use config::ServiceConfig;

/// Mounts every route and catcher on `base` and hands it the shared state.
pub fn build_rocket(base: Rocket<Build>, config: &ServiceConfig, state: AppState) -> Rocket<Build> {
    let mut rocket = base
        .manage(state)
        .manage(StaticDir(config.static_dir.clone()))
        .mount(
            "/",
            routes![
                index,
                health,
                predict_stroke,
                chatbot,
                alert_system,
                planner,
            ],
        )
        .register("/", catchers![default_catcher]);

    if config.static_dir.is_dir() {
        rocket = rocket.mount("/static", FileServer::from(&config.static_dir));
    }
    rocket
}
