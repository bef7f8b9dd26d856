//! Types and functions to implement proper error handling in the Boosterdex API.

use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TryFromInto};
use utoipa::{ToResponse, ToSchema};

use crate::error::AuthError;
use crate::helpers::error::recursive_error_message;
use crate::service_env::ServiceEnv;
use crate::Error;

impl ResponseError for Error {
    /// Returns the [`StatusCode`] to use for this [`Error`].
    ///
    /// This function does the actual mapping between our internal errors and the resulting
    /// external HTTP [`StatusCode`].
    fn status_code(&self) -> StatusCode {
        let status_code = match self {
            Error::Input { .. } => Some(StatusCode::BAD_REQUEST),
            Error::Auth { source, .. } => Some(status_code_for_auth_error(source)),
            Error::Query { source, .. } => status_code_for_query_error(source),
            _ => None,
        };

        status_code.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns an appropriate [`HttpResponse`] to return when a REST API error occurs.
    ///
    /// Uses the context of this [`Error`] to craft the response (see [`ErrorResponse::from`]).
    fn error_response(&self) -> HttpResponse<BoxBody> {
        let error_response: ErrorResponse = self.into();
        HttpResponse::build(error_response.status_code).json(error_response)
    }
}

/// Helper function to get a [`StatusCode`] for a [query error](diesel::result::Error).
///
/// If the error is due to faulty user input (like [`NotFound`](diesel::result::Error::NotFound)),
/// this method will return `Some` with an appropriate HTTP status code (like [`NOT_FOUND`](StatusCode::NOT_FOUND)).
/// Otherwise, it will return `None` and the caller can decide what status code to use.
pub fn status_code_for_query_error(error: &diesel::result::Error) -> Option<StatusCode> {
    match error {
        diesel::result::Error::NotFound => Some(StatusCode::NOT_FOUND),
        diesel::result::Error::DatabaseError(kind, ..) => match kind {
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::CheckViolation => {
                Some(StatusCode::BAD_REQUEST)
            },
            _ => None,
        },
        _ => None,
    }
}

/// Helper function to get the [`StatusCode`] for an [authentication error](AuthError).
///
/// Missing/invalid tokens and bad credentials are `401`s; a missing admin role is a
/// `403`; a server-side failure to issue a token is a `500`.
pub fn status_code_for_auth_error(error: &AuthError) -> StatusCode {
    match error {
        AuthError::AdminRequired => StatusCode::FORBIDDEN,
        AuthError::TokenCreation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::MissingToken
        | AuthError::InvalidToken { .. }
        | AuthError::InvalidCredentials
        | AuthError::UnknownUser => StatusCode::UNAUTHORIZED,
    }
}

#[cfg_attr(
    doc,
    doc = r"
        Struct used to return error information as JSON in [`HttpResponse`]s.

        # Notes

        The [`internal_error`](ErrorResponse::internal_error) field will only
        be populated when running in a [`Development`] environment (see [`ErrorResponse::from`]).

        [`Development`]: ServiceEnv::Development
    "
)]
#[cfg_attr(not(doc), doc = "Boosterdex API error information")]
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, ToResponse)]
#[response(
    description = "Server error",
    example = json!({
        "status_code": 500,
        "error": "Internal Server Error"
    }),
)]
pub struct ErrorResponse {
    /// HTTP status code
    #[serde_as(as = "TryFromInto<u16>")]
    #[schema(
        value_type = u16,
        minimum = 100,
        maximum = 999,
    )]
    pub status_code: StatusCode,

    /// Error message
    pub error: String,

    /// More details, when appropriate (like for deserialization or validation errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[cfg_attr(
        doc,
        doc = r"
            Description of the internal error

            Only present when server is running in a [`Development`] environment.

            [`Development`]: ServiceEnv::Development
        "
    )]
    #[cfg_attr(
        not(doc),
        doc = "Description of the internal error (when server is running in development)"
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_error: Option<String>,
}

impl From<&Error> for ErrorResponse {
    /// Creates an [`ErrorResponse`] for an internal [`Error`].
    ///
    /// This will be used to create the body of the [`HttpResponse`] returned when an error occurs
    /// during a REST API call.
    ///
    /// # Service environment
    ///
    /// Unless we run in a [`Development`] environment, this function will not include any actual
    /// information about the cause of the internal error, to maintain security. In [`Development`],
    /// the [`internal_error`](ErrorResponse#structfield.internal_error) field will include more information.
    ///
    /// [`Development`]: ServiceEnv::Development
    fn from(value: &Error) -> Self {
        let status_code = value.status_code();

        Self {
            status_code,
            error: status_code
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .into(),
            details: Self::generate_details(value),
            internal_error: Self::generate_internal_error(value),
        }
    }
}

impl ErrorResponse {
    /// Returns the value to use for the [`details`](ErrorResponse::details) field.
    ///
    /// This will return a value for some types of errors, like deserialization/validation
    /// errors or rejected authentication, so that user can have more information.
    fn generate_details(error: &Error) -> Option<String> {
        match error {
            Error::Input { source, .. } => Some(format!("{}", source)),
            Error::Auth { source, .. } => Some(format!("{}", source)),
            _ => None,
        }
    }

    /// Returns the value to use for the [`internal_error`](ErrorResponse::internal_error) field.
    ///
    /// This will return `None` except when running in [`Development`](ServiceEnv::Development)
    /// environment (see [`from`](ErrorResponse::from)).
    fn generate_internal_error(error: &Error) -> Option<String> {
        if ServiceEnv::current().is_development() {
            Some(recursive_error_message(error))
        } else {
            None
        }
    }
}

/// Generic error handler for `actix_web`'s various configs.
///
/// This handler accepts any type of error that can be turned into our [`Error`] type, then turns
/// that into an [`actix_web::error::Error`]. This is possible because we implemented [`ResponseError`]
/// for our [`Error`] type - thus, `actix_web` will use our implementation to generate an appropriate
/// HTTP response for the type of error encountered. This makes it possible to handle pre-request handler
/// errors (like for example [`DeserializeErrors`]s) using the same error handling code as in-request
/// handler errors.
///
/// # Examples
///
/// ```no_run
/// use actix_web_validator::{JsonConfig, PathConfig};
/// use boosterdex_rs::api::errors::actix_error_handler;
///
/// let json_config = JsonConfig::default().error_handler(actix_error_handler);
/// let path_config = PathConfig::default().error_handler(actix_error_handler);
/// ```
///
/// [`DeserializeErrors`]: actix_web_validator::error::DeserializeErrors
pub fn actix_error_handler<E, R>(err: E, _req: &R) -> actix_web::error::Error
where
    E: Into<Error>,
{
    Into::<Error>::into(err).into()
}
