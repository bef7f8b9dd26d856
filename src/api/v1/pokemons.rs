//! Implementation of the Boosterdex REST API endpoints for pokemons.
//!
//! # Endpoints
//!
//! | HTTP method | Endpoint                         | Usage                                                          | See                       |
//! |-------------|----------------------------------|----------------------------------------------------------------|---------------------------|
//! | `GET`       | `/api/v1/pokemons`               | Lists pokemons in the DB, paginated                            | [`list`]                  |
//! | `GET`       | `/api/v1/pokemons/search`        | Searches pokemons by name substring and/or type tags           | [`search`]                |
//! | `GET`       | `/api/v1/pokemons/booster`       | Opens a booster pack for the authenticated user                | [`open_booster`]          |
//! | `GET`       | `/api/v1/pokemons/{id}`          | Returns one pokemon stored in DB, using its catalog ID         | [`get`](struct@get)       |
//! | `GET`       | `/api/v1/pokemons/name/{name}`   | Returns one pokemon, matching its english or french name       | [`get_by_name`]           |
//! | `GET`       | `/api/v1/pokemons/type/{type}`   | Lists pokemons carrying the given type tag                     | [`get_by_type`]           |
//! | `POST`      | `/api/v1/pokemons`               | Adds a new pokemon in the DB (admin)                           | [`create`]                |
//! | `PUT`       | `/api/v1/pokemons/{id}`          | Updates the pokemon with the given ID in the DB (admin)        | [`update`]                |
//! | `PATCH`     | `/api/v1/pokemons/{id}`          | Updates some fields of the pokemon with the given ID (admin)   | [`patch`](struct@patch)   |
//! | `DELETE`    | `/api/v1/pokemons/{id}`          | Deletes the pokemon with the given ID from the DB (admin)      | [`delete`](struct@delete) |
//!
//! Literal routes (`/search`, `/booster`, `/name/...`, `/type/...`) are registered
//! before `/{id}` so they are matched first.

pub mod doc;

use std::ops::Deref;

use actix_web::web::{Data, ServiceConfig};
use actix_web::{delete, get, patch, post, put, HttpResponse};
use actix_web_validator::{Json, Path, Query};
use log::trace;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

use crate::api::v1::pokemons::doc::{
    ForbiddenResponse, IdNotFoundResponse, InvalidIdParamOrPokemonBodyResponse,
    InvalidIdParamResponse, InvalidPokemonBodyResponse, NameNotFoundResponse, ServerErrorResponse,
    UnauthorizedResponse,
};
use crate::api::v1::HttpResult;
use crate::auth::{AdminUser, AuthenticatedUser};
use crate::booster::DrawnCard;
use crate::db::Pool;
use crate::models::pokemon::{CreatePokemon, PatchPokemon, Pokemon, UpdatePokemon};
use crate::services::pokemon::PokemonsPage;
use crate::services::{booster, pokemon};

/// Allows registration of all pokemon REST API endpoints.
///
/// See [module documentation](self) for the entire list of supported endpoints.
/// Called automatically from [`api::v1::configure`](crate::api::v1::configure).
pub fn configure(pool: &Pool) -> impl FnOnce(&mut ServiceConfig) + '_ {
    |config| {
        trace!("Registering Pokemon and Booster service app data");
        config.app_data(Data::new(pokemon::Service::new(pool.clone())));
        config.app_data(Data::new(booster::Service::new(pool.clone())));

        trace!("Adding API CRUD endpoints for /api/v1/pokemons");
        config
            .service(list)
            .service(search)
            .service(open_booster)
            .service(get_by_name)
            .service(get_by_type)
            .service(get)
            .service(create)
            .service(update)
            .service(patch)
            .service(delete);
    }
}

/// Default value of the [`page_size`](ListParams::page_size) query parameter used when [listing pokemons](list).
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Provides default value of the [`page_size`](ListParams::page_size) query parameter used when [listing pokemons](list).
///
/// Provided because [`IntoParams`] needs a function to fetch a computed value; a constant does not work.
///
/// # See also
///
/// [`DEFAULT_PAGE_SIZE`]
pub fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Path parameter used for endpoints with a Pokemon catalog id ([`get`](struct@get), [`update`], [`patch`](struct@patch) and [`delete`](struct@delete)).
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Validate, IntoParams)]
pub struct Id {
    /// Catalog id of Pokemon in database
    #[validate(range(min = 0))]
    #[param(minimum = 0)]
    pub id: i64,
}

/// Path parameter used for the [name lookup endpoint](get_by_name).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
pub struct NamePath {
    /// English or french name to match, case-insensitively
    #[validate(length(min = 1))]
    pub name: String,
}

/// Path parameter used for the [type filter endpoint](get_by_type).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
pub struct TypePath {
    /// Type tag to filter by; lowercased before matching
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub type_tag: String,
}

/// Query parameters for [list endpoint](list). Includes optional paging information.
///
/// See [`ListParams::default`] for the default values.
///
/// # Notes
///
/// Setting [`page_size`](ListParams::page_size) to a value greater than the [maximum](crate::services::pokemon::Service::MAX_PAGE_SIZE)
/// will have no effect (the maximum value will be used instead).
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[serde(default, deny_unknown_fields)]
pub struct ListParams {
    /// Index of the page to fetch (1-based)
    #[validate(range(min = 1))]
    #[param(minimum = 1, default = 1)]
    pub page: i64,

    /// Number of Pokemons to return in each page
    #[validate(range(min = 1))]
    #[param(minimum = 1, maximum = 100, default = default_page_size)]
    pub page_size: i64,
}

/// Query parameters for the [search endpoint](search).
///
/// Both filters are optional; with neither, the whole catalog is returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParams {
    /// Substring to match case-insensitively against english and french names
    #[serde(rename = "searchTerm", skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,

    /// Comma-separated list of type tags; matched entries carry ALL listed tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
}

impl Deref for Id {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.id
    }
}

impl Default for ListParams {
    /// Returns the default values of the query parameters passed to the API endpoint that [lists pokemons](list).
    ///
    /// | Query parameter | Default value         |
    /// |-----------------|-----------------------|
    /// | `page`          | 1                     |
    /// | `page_size`     | [`DEFAULT_PAGE_SIZE`] |
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to list pokemons in a paginated way.

        Registered as `GET /api/v1/pokemons`.

        # Input

        | Query parameter | Usage                                      |
        |-----------------|--------------------------------------------|
        | `page`          | Index of page to fetch (1-based)           |
        | `page_size`     | Number of pokemons to include in each page |

        See [`ListParams::default`] for default values.

        # Output

        The endpoint returns a [`PokemonsPage`], serialized as JSON. This struct includes the list of
        [`Pokemon`]s in the page, as well as a [`total_pages`](PokemonsPage::total_pages) field that
        contains the total number of pages that could theoretically be returned. Note that if pokemons
        are inserted in the DB while paginated list calls are performed, this may change between calls.
    "
)]
#[cfg_attr(not(doc), doc = "Lists Pokemons in the catalog in a paginated way")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(ListParams),
    responses(
        (status = OK, response = PokemonsPage),
        ServerErrorResponse,
    ),
)]
#[get("", name = "/")]
pub async fn list(params: Query<ListParams>, service: Data<pokemon::Service>) -> HttpResult {
    let pokemons_page = service
        .get_ref()
        .get_pokemons(params.page, params.page_size)
        .await?;

    Ok(HttpResponse::Ok().json(pokemons_page))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to search pokemons by name and/or type tags.

        Registered as `GET /api/v1/pokemons/search`.

        # Input

        | Query parameter | Usage                                                  |
        |-----------------|--------------------------------------------------------|
        | `searchTerm`    | Name substring, matched case-insensitively             |
        | `types`         | Comma-separated type tags; entries must carry them all |

        # Output

        The matching [`Pokemon`]s, serialized as a JSON array.
    "
)]
#[cfg_attr(not(doc), doc = "Searches Pokemons by name substring and/or type tags")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(SearchParams),
    responses(
        (status = OK, body = Vec<Pokemon>, description = "Matching pokemons"),
        ServerErrorResponse,
    ),
)]
#[get("/search", name = "/search")]
pub async fn search(params: Query<SearchParams>, service: Data<pokemon::Service>) -> HttpResult {
    let type_tags = params.types.as_ref().map(|tags| {
        tags.split(',')
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
    });

    let found = service
        .get_ref()
        .search_pokemons(params.search_term.as_deref(), type_tags)
        .await?;

    Ok(HttpResponse::Ok().json(found))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to open a booster pack for the authenticated user.

        Registered as `GET /api/v1/pokemons/booster`. Requires a bearer token.

        # Output

        The drawn cards, serialized as a JSON array of [`DrawnCard`]s: each entry is a
        [`Pokemon`] plus an `isNew` flag. Cards flagged new are added to the caller's
        unlock set before the response is returned. The pack may hold fewer than five
        cards when a drawn rarity tier has no catalog entries.
    "
)]
#[cfg_attr(not(doc), doc = "Opens a booster pack of 5 random cards for the authenticated user")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    responses(
        (status = OK, body = Vec<DrawnCard>, description = "The drawn cards, flagged with isNew"),
        UnauthorizedResponse,
        ServerErrorResponse,
    ),
    security(("bearer_auth" = [])),
)]
#[get("/booster", name = "/booster")]
pub async fn open_booster(user: AuthenticatedUser, service: Data<booster::Service>) -> HttpResult {
    let cards = service.get_ref().open_booster(user.id()).await?;

    Ok(HttpResponse::Ok().json(cards))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to fetch one pokemon from the DB.

        Registered as `GET /api/v1/pokemons/{id}`.

        # Input

        - `{id}`: catalog ID of pokemon to fetch.

        # Output

        A [`Pokemon`], serialized as JSON.
    "
)]
#[cfg_attr(not(doc), doc = "Returns information about a Pokemon")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(Id),
    responses(
        (status = OK, response = Pokemon),
        InvalidIdParamResponse,
        IdNotFoundResponse,
        ServerErrorResponse,
    ),
)]
#[get("/{id}", name = "/{id}")]
pub async fn get(id: Path<Id>, service: Data<pokemon::Service>) -> HttpResult {
    let pokemon = service.get_ref().get_pokemon(*id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(pokemon))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to fetch one pokemon by name.

        Registered as `GET /api/v1/pokemons/name/{name}`. The name is matched
        case-insensitively against the english and french names.

        # Input

        - `{name}`: name of pokemon to fetch.

        # Output

        A [`Pokemon`], serialized as JSON.
    "
)]
#[cfg_attr(not(doc), doc = "Returns information about a Pokemon, looked up by name")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(NamePath),
    responses(
        (status = OK, response = Pokemon),
        NameNotFoundResponse,
        ServerErrorResponse,
    ),
)]
#[get("/name/{name}", name = "/name/{name}")]
pub async fn get_by_name(name: Path<NamePath>, service: Data<pokemon::Service>) -> HttpResult {
    let pokemon = service
        .get_ref()
        .get_pokemon_by_name(&name.into_inner().name)
        .await?;

    Ok(HttpResponse::Ok().json(pokemon))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to list pokemons carrying a type tag.

        Registered as `GET /api/v1/pokemons/type/{type}`. The tag is lowercased before
        matching; an unknown tag simply yields an empty list.

        # Input

        - `{type}`: type tag to filter by.

        # Output

        The matching [`Pokemon`]s, serialized as a JSON array.
    "
)]
#[cfg_attr(not(doc), doc = "Lists Pokemons carrying the given type tag")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(TypePath),
    responses(
        (status = OK, body = Vec<Pokemon>, description = "Pokemons carrying the type tag"),
        ServerErrorResponse,
    ),
)]
#[get("/type/{type}", name = "/type/{type}")]
pub async fn get_by_type(path: Path<TypePath>, service: Data<pokemon::Service>) -> HttpResult {
    let found = service
        .get_ref()
        .get_pokemons_by_type(&path.into_inner().type_tag)
        .await?;

    Ok(HttpResponse::Ok().json(found))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to add a new pokemon to the DB.

        Registered as `POST /api/v1/pokemons`. Restricted to administrators.

        # Input

        - Request body: the pokemon data, as a JSON-serialized [`CreatePokemon`]. The
          entry's rarity is not part of the payload; it is derived from the base stats.

        # Output

        The newly-inserted [`Pokemon`], serialized as JSON.
    "
)]
#[cfg_attr(not(doc), doc = "Creates a new Pokemon (admin only)")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    request_body(
        content = inline(CreatePokemon),
        description = "New Pokemon information",
    ),
    responses(
        (status = CREATED, response = Pokemon),
        InvalidPokemonBodyResponse,
        UnauthorizedResponse,
        ForbiddenResponse,
        ServerErrorResponse,
    ),
    security(("bearer_auth" = [])),
)]
#[post("", name = "/")]
pub async fn create(
    _admin: AdminUser,
    new_pokemon: Json<CreatePokemon>,
    service: Data<pokemon::Service>,
) -> HttpResult {
    let pokemon = service.get_ref().create_pokemon(&new_pokemon).await?;

    Ok(HttpResponse::Created().json(pokemon))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to update a pokemon in the DB.

        Updates all fields of the pokemon in one go, re-deriving its rarity from the
        new base stats. Registered as `PUT /api/v1/pokemons/{id}`. Restricted to
        administrators.

        # Input

        - `{id}`: catalog ID of pokemon to update.
        - Request body: the updated pokemon data, as a JSON-serialized [`UpdatePokemon`]. Must include
                        all fields or the request will be rejected.

        # Output

        The updated [`Pokemon`], serialized as JSON.
    "
)]
#[cfg_attr(not(doc), doc = "Updates a Pokemon (admin only)")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(Id),
    request_body(
        content = inline(UpdatePokemon),
        description = "Updated Pokemon information",
    ),
    responses(
        (status = OK, response = Pokemon),
        InvalidIdParamOrPokemonBodyResponse,
        UnauthorizedResponse,
        ForbiddenResponse,
        IdNotFoundResponse,
        ServerErrorResponse,
    ),
    security(("bearer_auth" = [])),
)]
#[put("/{id}", name = "/{id}")]
pub async fn update(
    _admin: AdminUser,
    id: Path<Id>,
    updated_pokemon: Json<UpdatePokemon>,
    service: Data<pokemon::Service>,
) -> HttpResult {
    let pokemon = service
        .get_ref()
        .update_pokemon(*id.into_inner(), &updated_pokemon)
        .await?;

    Ok(HttpResponse::Ok().json(pokemon))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to update some fields of a pokemon in the DB.

        Any field not specified will not be updated. Registered as
        `PATCH /api/v1/pokemons/{id}`. Restricted to administrators.

        # Input

        - `{id}`: catalog ID of pokemon to update.
        - Request body: the fields to update in the pokemon, as a JSON-serialized [`PatchPokemon`][^1].

        # Output

        The updated [`Pokemon`], serialized as JSON.

        [^1]: Any nullable field in the pokemon (like for example `image`) can be set to `NULL` in the
              DB by specifying them in the input data as a JSON `null` value. If the field is omitted
              in the input data, its value will not be updated. (For more details, see for example
              [`PatchPokemon::image`].)
    "
)]
#[cfg_attr(not(doc), doc = "Updates specific fields of a Pokemon (admin only)")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(Id),
    request_body(
        content = inline(PatchPokemon),
        description = "Specific Pokemon fields to update",
    ),
    responses(
        (status = OK, response = Pokemon),
        InvalidIdParamOrPokemonBodyResponse,
        UnauthorizedResponse,
        ForbiddenResponse,
        IdNotFoundResponse,
        ServerErrorResponse,
    ),
    security(("bearer_auth" = [])),
)]
#[patch("/{id}", name = "/{id}")]
pub async fn patch(
    _admin: AdminUser,
    id: Path<Id>,
    pokemon_patch: Json<PatchPokemon>,
    service: Data<pokemon::Service>,
) -> HttpResult {
    let pokemon = service
        .get_ref()
        .patch_pokemon(*id.into_inner(), &pokemon_patch)
        .await?;

    Ok(HttpResponse::Ok().json(pokemon))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to delete a pokemon from the DB.

        Registered as `DELETE /api/v1/pokemons/{id}`. Restricted to administrators.
        Unlock sets referencing the deleted entry are left untouched; evolution and
        unlock references are weak.

        # Input

        - `{id}`: catalog ID of pokemon to delete.

        # Output

        This endpoint simply returns `HTTP 204 No Content` upon success.
    "
)]
#[cfg_attr(not(doc), doc = "Deletes a Pokemon (admin only)")]
#[utoipa::path(
    context_path = "/api/v1/pokemons",
    params(Id),
    responses(
        (status = NO_CONTENT, description = "Pokemon deleted from the catalog"),
        InvalidIdParamResponse,
        UnauthorizedResponse,
        ForbiddenResponse,
        IdNotFoundResponse,
        ServerErrorResponse,
    ),
    security(("bearer_auth" = [])),
)]
#[delete("/{id}", name = "/{id}")]
pub async fn delete(
    _admin: AdminUser,
    id: Path<Id>,
    service: Data<pokemon::Service>,
) -> HttpResult {
    service.get_ref().delete_pokemon(*id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
