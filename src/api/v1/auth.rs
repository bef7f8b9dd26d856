//! Implementation of the Boosterdex REST API endpoints for user accounts.
//!
//! # Endpoints
//!
//! | HTTP method | Endpoint                | Usage                                          | See          |
//! |-------------|-------------------------|------------------------------------------------|--------------|
//! | `POST`      | `/api/v1/auth/register` | Registers a new user account                   | [`register`] |
//! | `POST`      | `/api/v1/auth/login`    | Logs a user in, returning a bearer token       | [`login`]    |
//! | `POST`      | `/api/v1/auth/refresh`  | Re-issues a fresh token for the current caller | [`refresh`]  |

pub mod doc;

use actix_web::web::{Data, ServiceConfig};
use actix_web::{post, HttpResponse};
use actix_web_validator::Json;
use log::trace;

use crate::api::v1::auth::doc::{
    InvalidCredentialsResponse, InvalidUserBodyResponse, ServerErrorResponse, UnauthorizedResponse,
};
use crate::api::v1::HttpResult;
use crate::auth::AuthenticatedUser;
use crate::db::Pool;
use crate::models::user::{LoginUser, RegisterUser, User};
use crate::services::user;
use crate::services::user::LoginSession;

/// Allows registration of all auth REST API endpoints.
///
/// See [module documentation](self) for the entire list of supported endpoints.
/// Called automatically from [`api::v1::configure`](crate::api::v1::configure).
pub fn configure(pool: &Pool) -> impl FnOnce(&mut ServiceConfig) + '_ {
    |config| {
        trace!("Registering User service app data");
        config.app_data(Data::new(user::Service::new(pool.clone())));

        trace!("Adding API endpoints for /api/v1/auth");
        config.service(register).service(login).service(refresh);
    }
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to register a new user account.

        Registered as `POST /api/v1/auth/register`. The new account always gets the
        `user` role; its password is hashed before storage. Registering a mail address
        that is already taken yields a `400` (unique violation).

        # Input

        - Request body: the account data, as a JSON-serialized [`RegisterUser`].

        # Output

        The newly-created [`User`] (without the password hash), serialized as JSON.
    "
)]
#[cfg_attr(not(doc), doc = "Registers a new user account")]
#[utoipa::path(
    context_path = "/api/v1/auth",
    request_body(
        content = inline(RegisterUser),
        description = "New account information",
    ),
    responses(
        (status = CREATED, response = User),
        InvalidUserBodyResponse,
        ServerErrorResponse,
    ),
)]
#[post("/register", name = "/register")]
pub async fn register(new_user: Json<RegisterUser>, service: Data<user::Service>) -> HttpResult {
    let user = service.get_ref().register(&new_user).await?;

    Ok(HttpResponse::Created().json(user))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to log into an existing user account.

        Registered as `POST /api/v1/auth/login`. An unknown mail and a wrong password
        are both reported as the same `401` so that account existence cannot be probed.

        # Input

        - Request body: the credentials, as a JSON-serialized [`LoginUser`].

        # Output

        A [`LoginSession`], serialized as JSON: the bearer token (valid for one hour)
        plus display information about the account.
    "
)]
#[cfg_attr(not(doc), doc = "Logs into a user account, returning a bearer token")]
#[utoipa::path(
    context_path = "/api/v1/auth",
    request_body(
        content = inline(LoginUser),
        description = "Account credentials",
    ),
    responses(
        (status = OK, response = LoginSession),
        InvalidCredentialsResponse,
        ServerErrorResponse,
    ),
)]
#[post("/login", name = "/login")]
pub async fn login(credentials: Json<LoginUser>, service: Data<user::Service>) -> HttpResult {
    let session = service.get_ref().login(&credentials).await?;

    Ok(HttpResponse::Ok().json(session))
}

#[cfg_attr(
    doc,
    doc = r"
        API endpoint to re-issue a fresh token for the authenticated caller.

        Registered as `POST /api/v1/auth/refresh`. The account is re-read, so a token
        can no longer be refreshed once the account is deleted.

        # Output

        A fresh [`LoginSession`], serialized as JSON.
    "
)]
#[cfg_attr(not(doc), doc = "Re-issues a fresh bearer token for the authenticated caller")]
#[utoipa::path(
    context_path = "/api/v1/auth",
    responses(
        (status = OK, response = LoginSession),
        UnauthorizedResponse,
        ServerErrorResponse,
    ),
    security(("bearer_auth" = [])),
)]
#[post("/refresh", name = "/refresh")]
pub async fn refresh(user: AuthenticatedUser, service: Data<user::Service>) -> HttpResult {
    let session = service.get_ref().refresh(user.id()).await?;

    Ok(HttpResponse::Ok().json(session))
}
