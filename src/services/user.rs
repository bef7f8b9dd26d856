//! Service used to register, authenticate and load user accounts.

use std::collections::HashSet;

use diesel::dsl::sql;
use diesel::sql_types::{Array, BigInt};
use diesel::{insert_into, update, ExpressionMethods, NotFound, OptionalExtension, QueryDsl};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{ToResponse, ToSchema};

use crate::auth;
use crate::db::{Pool, PooledConnection};
use crate::error::{AuthError, QueryContext};
use crate::models::user::{LoginUser, NewUserRecord, RegisterUser, Role, User, UserRecord};

/// Service implementation for [`User`] accounts.
///
/// Used by the [auth REST API endpoints](crate::api::v1::auth) for registration and
/// login, and by the [booster service](crate::services::booster::Service) to read and
/// grow a user's unlock set.
#[derive(Clone)]
pub struct Service {
    pool: Pool,
}

impl Service {
    /// Creates a new user service using the provided database connection [`Pool`].
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Registers a new user account.
    ///
    /// The password is hashed with bcrypt before it reaches the database; the role is
    /// always [`User`](Role::User) — admin accounts are provisioned out of band.
    /// A duplicate mail address is rejected by the table's unique constraint
    /// (reported as a unique violation).
    pub async fn register(&self, new_user: &RegisterUser) -> crate::Result<User> {
        use crate::schema::users::dsl::*;

        let password_hash = bcrypt::hash(&new_user.password, bcrypt::DEFAULT_COST)?;
        let new_record = NewUserRecord {
            firstname: new_user.firstname.clone(),
            lastname: new_user.lastname.clone(),
            mail: new_user.mail.clone(),
            password: password_hash,
            role: Role::User,
            unlocked_pokemons: vec![],
        };

        let mut connection = self.get_pooled_connection().await?;

        insert_into(users)
            .values(&new_record)
            .get_result::<UserRecord>(&mut connection)
            .await
            .map(User::from)
            .with_query_context(|| "failed to insert new user")
    }

    /// Authenticates a user from their mail/password credentials.
    ///
    /// On success, returns a [`LoginSession`] holding a fresh bearer token. An unknown
    /// mail and a wrong password are deliberately reported as the same
    /// [`InvalidCredentials`](AuthError::InvalidCredentials) error.
    pub async fn login(&self, credentials: &LoginUser) -> crate::Result<LoginSession> {
        use crate::schema::users::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        let record: Option<UserRecord> = users
            .filter(mail.eq(&credentials.mail))
            .first(&mut connection)
            .await
            .optional()
            .with_query_context(|| "failed to fetch user for login")?;
        let record = record.ok_or(AuthError::InvalidCredentials)?;

        if !bcrypt::verify(&credentials.password, &record.password)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Self::open_session(record)
    }

    /// Re-issues a fresh token for an already-authenticated user.
    ///
    /// The account is re-read so that a token can no longer be refreshed once the
    /// account is gone.
    pub async fn refresh(&self, user_id: i64) -> crate::Result<LoginSession> {
        use crate::schema::users::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        let record: Option<UserRecord> = users
            .find(user_id)
            .first(&mut connection)
            .await
            .optional()
            .with_query_context(|| format!("failed to fetch user {} for token refresh", user_id))?;
        let record = record.ok_or(AuthError::UnknownUser)?;

        Self::open_session(record)
    }

    /// Returns the unlock set of the user with the given ID.
    pub async fn get_unlocked_set(&self, user_id: i64) -> crate::Result<HashSet<i64>> {
        use crate::schema::users::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        let unlocked: Vec<i64> = users
            .find(user_id)
            .select(unlocked_pokemons)
            .first(&mut connection)
            .await
            .with_query_context(|| format!("failed to fetch unlock set of user {}", user_id))?;

        Ok(unlocked.into_iter().collect())
    }

    /// Unions the given catalog ids into the user's unlock set.
    ///
    /// The union happens in a single UPDATE on the database side, so concurrent
    /// booster draws for the same user cannot lose each other's unlocks.
    pub async fn add_unlocked(&self, user_id: i64, new_ids: Vec<i64>) -> crate::Result<()> {
        use crate::schema::users::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        update(users.find(user_id))
            .set(unlocked_pokemons.eq(sql::<Array<BigInt>>(
                "ARRAY(SELECT DISTINCT UNNEST(unlocked_pokemons || ",
            )
            .bind::<Array<BigInt>, _>(new_ids)
            .sql("))")))
            .execute(&mut connection)
            .await
            .and_then(|updated_count| if updated_count > 0 { Ok(()) } else { Err(NotFound) })
            .with_query_context(|| format!("failed to grow unlock set of user {}", user_id))
    }

    /// Builds a [`LoginSession`] for the given account record.
    fn open_session(record: UserRecord) -> crate::Result<LoginSession> {
        let token = auth::generate_token(record.id, &record.mail, record.role)?;

        Ok(LoginSession {
            token,
            user: SessionUser { firstname: record.firstname, role: record.role },
        })
    }

    /// Returns a [`PooledConnection`] from our internal database connection pool.
    async fn get_pooled_connection(&self) -> crate::Result<PooledConnection> {
        Ok(self.pool.get().await?)
    }
}

#[cfg_attr(
    doc,
    doc = r"
        An opened session, as returned by [`Service::login`] and [`Service::refresh`].

        Contains the bearer token to present on subsequent requests plus a small
        excerpt of the account for display purposes.
    "
)]
#[cfg_attr(not(doc), doc = "An opened session with its bearer token")]
#[derive(Debug, Serialize, Deserialize, ToResponse)]
#[response(example = json!({
    "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
    "user": { "firstname": "Ash", "role": "user" }
}))]
pub struct LoginSession {
    /// Bearer token for the session, valid for one hour
    pub token: String,

    /// Display information about the logged-in account
    pub user: SessionUser,
}

/// Display excerpt of a logged-in account (see [`LoginSession`]).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    /// First name of the account holder
    pub firstname: String,

    /// Role of the account
    pub role: Role,
}
