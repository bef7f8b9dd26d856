//! [`IntoResponses`] wrappers for the auth REST API endpoints.
//!
//! These helper types are used to document the possible API responses using [`utoipa::path`].

use utoipa::IntoResponses;

use crate::api::errors::ErrorResponse;

/// [`IntoResponses`] wrapper for bad registration/login body errors.
///
/// Also covers registration with an already-taken mail address (unique violation).
/// Can be used to document 400 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(
    status = BAD_REQUEST,
    description = "Invalid account information in request body, or mail address already taken",
)]
pub struct InvalidUserBodyResponse;

/// [`IntoResponses`] wrapper for rejected login credentials.
///
/// Can be used to document 401 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = UNAUTHORIZED, description = "Unknown mail address or wrong password")]
pub struct InvalidCredentialsResponse;

/// [`IntoResponses`] wrapper for missing/invalid bearer token errors.
///
/// Can be used to document 401 API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = UNAUTHORIZED, description = "Missing or invalid bearer token")]
pub struct UnauthorizedResponse;

/// [`IntoResponses`] wrapper for internal server errors.
///
/// Can be used to document 5XX API error responses using [`utoipa::path`].
#[derive(Debug, IntoResponses)]
#[response(status = "5XX")]
pub struct ServerErrorResponse(#[to_response] ErrorResponse);
