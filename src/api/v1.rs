//! Current version (`v1`) of the Boosterdex REST API.

pub mod auth;
pub mod pokemons;

use actix_web::web;
use actix_web::web::ServiceConfig;
use actix_web::HttpResponse;
use log::trace;

use crate::db::Pool;

/// [`Result`](crate::Result) definition used to return [`HttpResponse`]s from API endpoints.
///
/// If an [`Error`](crate::Error) is returned, it is converted to an appropriate [`HttpResponse`]
/// by the error handling code (see [`ErrorResponse::from`](crate::api::errors::ErrorResponse::from) for details).
pub type HttpResult = crate::Result<HttpResponse>;

/// Allows registration of the Boosterdex API routes under the `/pokemons` and `/auth` scopes.
///
/// This includes all endpoints to create, update, etc. pokemons, to open boosters and
/// to register/log in users. Called automatically from [`api::configure`](crate::api::configure).
pub fn configure(pool: &Pool) -> impl FnOnce(&mut ServiceConfig) + '_ {
    |config| {
        trace!("Adding API endpoints for /api/v1");
        config
            .service(web::scope("/pokemons").configure(pokemons::configure(pool)))
            .service(web::scope("/auth").configure(auth::configure(pool)));
    }
}
