//! Boosterdex: a Pokémon card/collection game REST API.
//!
//! This crate implements the full Boosterdex web application: a pokemon catalog with
//! CRUD endpoints, user registration/login with JWT bearer tokens, and a weighted
//! booster draw that unlocks cards for a user. The binary crate (`main.rs`) simply
//! builds the app through [`boosterdex_app!`] and serves it over HTTP.
//!
//! For more information, see `README.md`.

#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod booster;
pub mod db;
pub mod error;
pub mod helpers;
pub mod models;
pub mod rarity;
pub mod schema;
pub mod service_env;
pub mod services;

use std::env;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web;
use actix_web::web::ServiceConfig;

use crate::db::Pool;
pub use crate::error::{Error, Result};

/// Allows registration of all the Boosterdex API endpoints, including the OpenAPI docs.
///
/// Used by the [`boosterdex_app!`] macro; can also be passed manually to
/// [`App::configure`](actix_web::App::configure).
pub fn configure_api(pool: &Pool) -> impl FnOnce(&mut ServiceConfig) + '_ {
    |config| {
        config.service(web::scope("/api").configure(api::configure(pool)));
        api::doc::configure(config);
    }
}

/// Builds the CORS middleware for the Boosterdex app.
///
/// The allowed origin is read from the `FRONTEND_URL` environment variable; without
/// it, any origin is accepted (useful for local development).
pub fn get_cors() -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600);

    match env::var("FRONTEND_URL") {
        Ok(origin) => cors.allowed_origin(&origin),
        Err(_) => cors.allow_any_origin(),
    }
}

/// Macro that creates the Boosterdex [`App`](actix_web::App), with all API endpoints
/// and app data registered.
///
/// Needs to be a macro because the concrete type of [`App`](actix_web::App) cannot
/// be named in a function signature.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpServer;
/// use boosterdex_rs::boosterdex_app;
/// use boosterdex_rs::db::get_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let pool = get_pool()?;
/// let server = HttpServer::new(move || boosterdex_app!(pool))
///     .bind(("127.0.0.1", 8080))?
///     .run();
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! boosterdex_app {
    ($pool:expr) => {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap($crate::get_cors())
            .app_data(
                actix_web_validator::JsonConfig::default()
                    .error_handler($crate::api::errors::actix_error_handler),
            )
            .app_data(
                actix_web_validator::PathConfig::default()
                    .error_handler($crate::api::errors::actix_error_handler),
            )
            .app_data(
                actix_web_validator::QueryConfig::default()
                    .error_handler($crate::api::errors::actix_error_handler),
            )
            .configure($crate::configure_api(&$pool))
    };
}
