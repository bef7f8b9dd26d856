//! [`IntoResponses`] wrappers for Boosterdex REST API endpoints.
//!
//! These helper types are used to document the possible API responses using [`utoipa::path`].

use utoipa::IntoResponses;

use crate::api::errors::ErrorResponse;

/// [`IntoResponses`] wrapper for bad `id` path parameter errors.
///
/// Can be used to document 400 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = BAD_REQUEST, description = "Invalid value for id path parameter")]
pub struct InvalidIdParamResponse;

/// [`IntoResponses`] wrapper for bad Pokemon request body error.
///
/// Can be used to document 400 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = BAD_REQUEST, description = "Invalid Pokemon information in request body")]
pub struct InvalidPokemonBodyResponse;

/// [`IntoResponses`] wrapper for bad `id` path parameter OR bad Pokemon request body error.
///
/// Can be used to document 400 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(
    status = BAD_REQUEST,
    description = "Invalid value for id path parameter OR invalid Pokemon information in request body",
)]
pub struct InvalidIdParamOrPokemonBodyResponse;

/// [`IntoResponses`] wrapper for `Pokemon not found` errors on id lookups.
///
/// Can be used to document 404 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = NOT_FOUND, description = "Requested Pokemon not found in database")]
pub struct IdNotFoundResponse;

/// [`IntoResponses`] wrapper for `Pokemon not found` errors on name lookups.
///
/// Can be used to document 404 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = NOT_FOUND, description = "No Pokemon with the requested name in database")]
pub struct NameNotFoundResponse;

/// [`IntoResponses`] wrapper for missing/invalid bearer token errors.
///
/// Can be used to document 401 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = UNAUTHORIZED, description = "Missing or invalid bearer token")]
pub struct UnauthorizedResponse;

/// [`IntoResponses`] wrapper for missing admin role errors.
///
/// Can be used to document 403 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = FORBIDDEN, description = "Authenticated user does not have the admin role")]
pub struct ForbiddenResponse;

/// [`IntoResponses`] wrapper for internal server errors.
///
/// Can be used to document 5XX API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = "5XX")]
pub struct ServerErrorResponse(#[to_response] ErrorResponse);
