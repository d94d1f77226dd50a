#[macro_use]
extern crate rocket;

use stroke_risk_service::app_state::AppState;
use stroke_risk_service::config::ServiceConfig;
use stroke_risk_service::{build_rocket, telemetry};

#[launch]
fn rocket() -> _ {
    telemetry::init();

    let base = rocket::build();
    let config = ServiceConfig::from_figment(base.figment());
    let state = AppState::initialize(&config);

    build_rocket(base, &config, state)
}
