//! Bearer-token authentication for the Boosterdex REST API.
//!
//! Tokens are JWTs signed with the HS256 secret from the `JWT_SECRET` environment
//! variable. Handlers opt into authentication through the [`AuthenticatedUser`] and
//! [`AdminUser`] extractors; a missing/invalid token turns into a `401` response and
//! a missing admin role into a `403`, both through the crate's regular error
//! handling (see [`crate::api::errors`]).

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest};
use jsonwebtoken::{
    decode, encode, get_current_timestamp, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, EnvVarContext};
use crate::models::user::Role;

/// Lifetime of issued tokens, in seconds.
pub const TOKEN_LIFETIME_SECS: u64 = 3600;

/// Claims carried by a Boosterdex bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the authenticated user account.
    pub sub: i64,

    /// Mail address of the account at token issue time.
    pub mail: String,

    /// Role of the account at token issue time.
    pub role: Role,

    /// Expiration timestamp (seconds since the Unix epoch).
    pub exp: u64,
}

/// Returns the secret used to sign and verify tokens.
///
/// The secret should be specified through the `JWT_SECRET` environment variable.
pub fn get_jwt_secret() -> crate::Result<String> {
    std::env::var("JWT_SECRET")
        .with_env_var_context(|| "JWT_SECRET environment variable must be set")
}

/// Issues a token for the given account, valid for [`TOKEN_LIFETIME_SECS`].
pub fn generate_token(user_id: i64, mail: &str, role: Role) -> crate::Result<String> {
    let claims = Claims {
        sub: user_id,
        mail: mail.into(),
        role,
        exp: get_current_timestamp() + TOKEN_LIFETIME_SECS,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(get_jwt_secret()?.as_bytes()))
        .map_err(|err| AuthError::TokenCreation { source: err }.into())
}

/// Decodes and validates a bearer token, returning its claims.
///
/// Expired or tampered tokens are rejected with [`AuthError::InvalidToken`].
pub fn decode_token(token: &str) -> crate::Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret()?.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| crate::Error::from(AuthError::from(err)))
}

/// Extracts the claims from a request's `Authorization: Bearer` header.
fn claims_from_request(req: &HttpRequest) -> crate::Result<Claims> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?;

    decode_token(token)
}

#[cfg_attr(
    doc,
    doc = r"
        Extractor for endpoints that require an authenticated caller.

        Usable with any role. Handlers taking this extractor reject requests without
        a valid bearer token with a `401` response.
    "
)]
#[cfg_attr(not(doc), doc = "An authenticated API caller")]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(Claims);

impl AuthenticatedUser {
    /// Returns the id of the authenticated user account.
    pub fn id(&self) -> i64 {
        self.0.sub
    }

    /// Returns the claims carried by the caller's token.
    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<core::result::Result<Self, Self::Error>>;

    /// Authenticates the caller from the request's bearer token.
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req).map(Self).map_err(Into::into))
    }
}

#[cfg_attr(
    doc,
    doc = r"
        Extractor for endpoints restricted to administrators.

        Same as [`AuthenticatedUser`], but additionally rejects callers whose token
        does not carry the [`Admin`](Role::Admin) role with a `403` response.
    "
)]
#[cfg_attr(not(doc), doc = "An authenticated API caller with the admin role")]
#[derive(Debug, Clone)]
pub struct AdminUser(Claims);

impl AdminUser {
    /// Returns the id of the authenticated admin account.
    pub fn id(&self) -> i64 {
        self.0.sub
    }

    /// Returns the claims carried by the caller's token.
    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = Ready<core::result::Result<Self, Self::Error>>;

    /// Authenticates the caller and checks for the admin role.
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let admin = claims_from_request(req).and_then(|claims| match claims.role {
            Role::Admin => Ok(Self(claims)),
            Role::User => Err(AuthError::AdminRequired.into()),
        });

        ready(admin.map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};
    use assert_matches::assert_matches;
    use serial_test::file_serial;

    use super::*;
    use crate::error::Error;

    fn set_test_secret() {
        env::set_var("JWT_SECRET", "a-secret-only-tests-know");
    }

    mod tokens {
        // Bring in the standard `#[test]` attribute explicitly so it takes
        // precedence over `actix_web::test` pulled in by the glob below.
        use core::prelude::v1::test;

        use super::*;

        #[test]
        #[file_serial(jwt_secret_env)]
        fn test_round_trip() {
            set_test_secret();

            let token = generate_token(42, "ash@pallet.town", Role::User).unwrap();
            let claims = decode_token(&token).unwrap();

            assert_eq!(42, claims.sub);
            assert_eq!("ash@pallet.town", claims.mail);
            assert_eq!(Role::User, claims.role);
            assert!(claims.exp > get_current_timestamp());
        }

        #[test]
        #[file_serial(jwt_secret_env)]
        fn test_missing_secret() {
            env::remove_var("JWT_SECRET");

            assert_matches!(
                generate_token(42, "ash@pallet.town", Role::User),
                Err(Error::EnvVar { .. })
            );
        }

        #[test]
        #[file_serial(jwt_secret_env)]
        fn test_tampered_token_rejected() {
            set_test_secret();

            let mut token = generate_token(42, "ash@pallet.town", Role::User).unwrap();
            token.pop();

            assert_matches!(
                decode_token(&token),
                Err(Error::Auth { source: AuthError::InvalidToken { .. }, .. })
            );
        }

        #[test]
        #[file_serial(jwt_secret_env)]
        fn test_expired_token_rejected() {
            set_test_secret();

            // Hand-craft a token whose expiration is in the past.
            let claims = Claims {
                sub: 42,
                mail: "ash@pallet.town".into(),
                role: Role::User,
                exp: get_current_timestamp() - 2 * TOKEN_LIFETIME_SECS,
            };
            let token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(get_jwt_secret().unwrap().as_bytes()),
            )
            .unwrap();

            assert_matches!(
                decode_token(&token),
                Err(Error::Auth { source: AuthError::InvalidToken { .. }, .. })
            );
        }
    }

    mod extractors {
        use super::*;

        async fn user_endpoint(user: AuthenticatedUser) -> HttpResponse {
            HttpResponse::Ok().json(user.claims())
        }

        async fn admin_endpoint(admin: AdminUser) -> HttpResponse {
            HttpResponse::Ok().json(admin.claims())
        }

        macro_rules! init_auth_test_service {
            ($service_var:ident) => {
                let $service_var = test::init_service(
                    App::new()
                        .route("/me", web::get().to(user_endpoint))
                        .route("/admin", web::get().to(admin_endpoint)),
                )
                .await;
            };
        }

        #[actix_web::test]
        #[file_serial(jwt_secret_env)]
        async fn test_valid_token_accepted() {
            set_test_secret();
            init_auth_test_service!(service);

            let token = generate_token(42, "ash@pallet.town", Role::User).unwrap();
            let req = test::TestRequest::with_uri("/me")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .to_request();
            let claims: Claims = test::call_and_read_body_json(&service, req).await;

            assert_eq!(42, claims.sub);
        }

        #[actix_web::test]
        #[file_serial(jwt_secret_env)]
        async fn test_missing_header_unauthorized() {
            set_test_secret();
            init_auth_test_service!(service);

            let req = test::TestRequest::with_uri("/me").to_request();
            let result = test::call_service(&service, req).await;

            assert_eq!(StatusCode::UNAUTHORIZED, result.status());
        }

        #[actix_web::test]
        #[file_serial(jwt_secret_env)]
        async fn test_non_bearer_header_unauthorized() {
            set_test_secret();
            init_auth_test_service!(service);

            let req = test::TestRequest::with_uri("/me")
                .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
                .to_request();
            let result = test::call_service(&service, req).await;

            assert_eq!(StatusCode::UNAUTHORIZED, result.status());
        }

        #[actix_web::test]
        #[file_serial(jwt_secret_env)]
        async fn test_garbage_token_unauthorized() {
            set_test_secret();
            init_auth_test_service!(service);

            let req = test::TestRequest::with_uri("/me")
                .insert_header((header::AUTHORIZATION, "Bearer not.a.token"))
                .to_request();
            let result = test::call_service(&service, req).await;

            assert_eq!(StatusCode::UNAUTHORIZED, result.status());
        }

        #[actix_web::test]
        #[file_serial(jwt_secret_env)]
        async fn test_user_role_forbidden_on_admin_endpoint() {
            set_test_secret();
            init_auth_test_service!(service);

            let token = generate_token(42, "ash@pallet.town", Role::User).unwrap();
            let req = test::TestRequest::with_uri("/admin")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .to_request();
            let result = test::call_service(&service, req).await;

            assert_eq!(StatusCode::FORBIDDEN, result.status());
        }

        #[actix_web::test]
        #[file_serial(jwt_secret_env)]
        async fn test_admin_role_accepted_on_admin_endpoint() {
            set_test_secret();
            init_auth_test_service!(service);

            let token = generate_token(1, "oak@pallet.town", Role::Admin).unwrap();
            let req = test::TestRequest::with_uri("/admin")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .to_request();
            let claims: Claims = test::call_and_read_body_json(&service, req).await;

            assert_eq!(Role::Admin, claims.role);
        }
    }
}
