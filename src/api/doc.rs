//! OpenAPI documentation support.

use actix_web::web::ServiceConfig;
use log::trace;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::api::errors::ErrorResponse;
use crate::booster::DrawnCard;
use crate::models::pokemon::{Base, Name, Pokemon};
use crate::models::user::{Role, User};
use crate::rarity::Rarity;
use crate::services::pokemon::PokemonsPage;
use crate::services::user::{LoginSession, SessionUser};

/// Registers the various OpenAPI-related endpoints, like swagger UI.
///
/// Called automatically from [`configure_api`](crate::configure_api).
pub fn configure(config: &mut ServiceConfig) {
    trace!("Adding OpenAPI doc endpoints");

    let openapi = ApiDoc::openapi();
    config
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
        )
        .service(Redoc::with_url("/redoc", openapi.clone()))
        .service(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"));
}

/// API documentation in OpenAPI format.
///
/// Generated automatically by the [`utoipa`] crate. To use, simply call [`ApiDoc::openapi`]
/// to create an instance, then pass it to the various helpers that allow the API doc to be
/// published, like [`SwaggerUi`].
#[derive(OpenApi)]
#[openapi(
    paths(
        api::v1::pokemons::list,
        api::v1::pokemons::search,
        api::v1::pokemons::open_booster,
        api::v1::pokemons::get,
        api::v1::pokemons::get_by_name,
        api::v1::pokemons::get_by_type,
        api::v1::pokemons::create,
        api::v1::pokemons::update,
        api::v1::pokemons::patch,
        api::v1::pokemons::delete,
        api::v1::auth::register,
        api::v1::auth::login,
        api::v1::auth::refresh,
    ),
    components(
        schemas(Pokemon, Name, Base, Rarity, DrawnCard, User, Role, SessionUser),
        responses(PokemonsPage, Pokemon, User, LoginSession, ErrorResponse),
    ),
    modifiers(&BearerSecurityAddon),
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` security scheme used by the authenticated endpoints.
struct BearerSecurityAddon;

impl Modify for BearerSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
    }
}
