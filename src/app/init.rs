use crate::app::errors::json_error_handler;
use crate::app::routes::setup_routes;
use actix_web::web;

/// Initialize the application
pub fn initialize(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler));
    setup_routes(cfg);
}
