//! [`Error`] type definition for our app.

use std::env;
use std::ffi::OsString;
use std::num::ParseIntError;

use diesel_async::pooled_connection::deadpool::PoolError;

use crate::forward_from;

/// [`Result`](core::result::Result) type for our crate.
///
/// Uses our crate's [`Error`] type automatically.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type used throughout this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error that occurred when loading data from an environment variable.
    #[error("error related to environment variable: {context}")]
    EnvVar {
        /// Environment variable error context.
        ///
        /// Used by the code (via [`EnvVarContext::with_env_var_context`]) to provide context for the error.
        context: String,

        /// Source of the environment error.
        source: EnvVarError,

        /// [`Backtrace`](std::backtrace::Backtrace) indicating where the error occurred.
        ///
        /// Will only contain useful information if backtrace is enabled (see
        /// [`Backtrace::capture`](std::backtrace::Backtrace::capture)).
        #[cfg(backtrace_support)]
        backtrace: std::backtrace::Backtrace,
    },

    /// Error caused by invalid user input.
    #[error("input parsing error")]
    Input {
        /// Source of the input error.
        #[from]
        source: actix_web_validator::error::Error,

        /// [`Backtrace`](std::backtrace::Backtrace) indicating where the error occurred.
        ///
        /// Will only contain useful information if backtrace is enabled (see
        /// [`Backtrace::capture`](std::backtrace::Backtrace::capture)).
        #[cfg(backtrace_support)]
        backtrace: std::backtrace::Backtrace,
    },

    /// Error related to bearer-token authentication or role checks.
    ///
    /// See [`AuthError`] for the possible failure modes and the HTTP status codes
    /// they map to.
    #[error("authentication error")]
    Auth {
        /// Source of the authentication error.
        #[from]
        source: AuthError,

        /// [`Backtrace`](std::backtrace::Backtrace) indicating where the error occurred.
        ///
        /// Will only contain useful information if backtrace is enabled (see
        /// [`Backtrace::capture`](std::backtrace::Backtrace::capture)).
        #[cfg(backtrace_support)]
        backtrace: std::backtrace::Backtrace,
    },

    /// Error that occurred while hashing or verifying a password.
    ///
    /// Never reported in detail to API callers; the route layer maps this to a
    /// generic server error.
    #[error("password hashing error")]
    PasswordHash {
        /// Source of the hashing error.
        #[from]
        source: bcrypt::BcryptError,

        /// [`Backtrace`](std::backtrace::Backtrace) indicating where the error occurred.
        ///
        /// Will only contain useful information if backtrace is enabled (see
        /// [`Backtrace::capture`](std::backtrace::Backtrace::capture)).
        #[cfg(backtrace_support)]
        backtrace: std::backtrace::Backtrace,
    },

    /// Error related to the database connection pool.
    ///
    /// See [`PoolError`](deadpool::managed::PoolError) (and the inner [`diesel_async::pooled_connection::PoolError`])
    /// for more information.
    #[error("database connection error")]
    Pool {
        /// Source of the pool error.
        #[from]
        source: PoolError,

        /// [`Backtrace`](std::backtrace::Backtrace) indicating where the error occurred.
        ///
        /// Will only contain useful information if backtrace is enabled (see
        /// [`Backtrace::capture`](std::backtrace::Backtrace::capture)).
        #[cfg(backtrace_support)]
        backtrace: std::backtrace::Backtrace,
    },

    /// Error that occurred while performing a database query using [`diesel`].
    #[error("query error: {context}")]
    Query {
        /// Query error context.
        ///
        /// Used by the code (via [`QueryContext::with_query_context`]) to provide some context
        /// as to the type of query that caused the error.
        context: String,

        /// Source of the query error.
        source: diesel::result::Error,

        /// [`Backtrace`](std::backtrace::Backtrace) indicating where the error occurred.
        ///
        /// Will only contain useful information if backtrace is enabled (see
        /// [`Backtrace::capture`](std::backtrace::Backtrace::capture)).
        #[cfg(backtrace_support)]
        backtrace: std::backtrace::Backtrace,
    },
}

/// Error type used for errors related to environment variables.
///
/// This is our variant of [`VarError`], with additional variants for our specific use cases.
/// In particular, a [`From`] `impl` is provided to be able to convert a [`VarError`] to this type.
///
/// [`VarError`]: env::VarError
#[derive(Debug, thiserror::Error)]
pub enum EnvVarError {
    /// The environment variable did not exist.
    ///
    /// This is our equivalent for [`VarError::NotPresent`](env::VarError::NotPresent).
    #[error("variable not found in environment")]
    NotFound,

    /// The environment variable could not be parsed to a Rust string because it contains
    /// invalid Unicode characters.
    ///
    /// This is our equivalent for [`VarError::NotUnicode`](env::VarError::NotUnicode).
    #[error("variable contained invalid, non-Unicode characters")]
    NotUnicode(OsString),

    /// The environment variable was expected to contain an int value, but didn't.
    #[error("expected int value, found {value}")]
    IntExpected {
        /// The actual value found in the environment variable.
        value: String,

        /// The parsing error that occurred when we tried to parse the value as an int.
        source: ParseIntError,
    },
}

/// Error type used for authentication failures.
///
/// Wrapped in [`Error::Auth`]; the REST API error handling code maps each variant to
/// an appropriate HTTP status code (see [`crate::api::errors`]).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header was present on the request.
    #[error("missing or malformed Authorization header")]
    MissingToken,

    /// A bearer token was present but could not be decoded or validated
    /// (bad signature, expired, malformed...).
    #[error("invalid bearer token")]
    InvalidToken {
        /// The decoding error reported by [`jsonwebtoken`].
        #[from]
        source: jsonwebtoken::errors::Error,
    },

    /// Login was attempted with an unknown mail or a wrong password.
    ///
    /// The two cases are deliberately indistinguishable to callers.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A valid token references an account that no longer exists.
    #[error("account no longer exists")]
    UnknownUser,

    /// Signing a new token failed. This is a server-side error, not a caller mistake.
    #[error("failed to issue token")]
    TokenCreation {
        /// The encoding error reported by [`jsonwebtoken`].
        source: jsonwebtoken::errors::Error,
    },

    /// The authenticated account does not have the admin role.
    #[error("administrator role required")]
    AdminRequired,
}

impl From<env::VarError> for EnvVarError {
    /// Converts an `std` [`VarError`] to our intermediate [`EnvVarError`] type.
    ///
    /// Each variant of [`VarError`] has a corresponding variant in our [`EnvVarError`] type,
    /// so the mapping is straightforward.
    ///
    /// [`VarError`]: env::VarError
    fn from(value: env::VarError) -> Self {
        match value {
            env::VarError::NotPresent => Self::NotFound,
            env::VarError::NotUnicode(os_str) => Self::NotUnicode(os_str),
        }
    }
}

/// Helper trait to provide context for [`EnvVar`](Error::EnvVar) errors.
pub trait EnvVarContext {
    /// Type of output returned by [`with_env_var_context`](EnvVarContext::with_env_var_context).
    type Output;

    /// Provides context about the error that occurred.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::env;
    ///
    /// use boosterdex_rs::error::EnvVarContext;
    ///
    /// # fn example() -> boosterdex_rs::Result<()> {
    /// let db_url = env::var("DATABASE_URL")
    ///     .with_env_var_context(|| "DATABASE_URL environment variable should be set")?;
    /// #
    /// # Ok(())
    /// # }
    /// ```
    fn with_env_var_context<C, F>(self, context: F) -> Self::Output
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<E> EnvVarContext for E
where
    E: Into<EnvVarError>,
{
    type Output = Error;

    fn with_env_var_context<C, F>(self, context: F) -> Self::Output
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        Error::EnvVar {
            context: (context)().into(),
            source: self.into(),
            #[cfg(backtrace_support)]
            backtrace: std::backtrace::Backtrace::capture(),
        }
    }
}

impl<T, E> EnvVarContext for core::result::Result<T, E>
where
    E: EnvVarContext<Output = Error>,
{
    type Output = Result<T>;

    fn with_env_var_context<C, F>(self, context: F) -> Self::Output
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|err| err.with_env_var_context(context))
    }
}

forward_from!(diesel_async::pooled_connection::PoolError => PoolError => Error);

impl From<deadpool::managed::BuildError> for Error {
    /// Converts a [`BuildError`](deadpool::managed::BuildError) into our [`Error`] type.
    ///
    /// This makes it possible to use `?` when building a connection pool.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use boosterdex_rs::db::{get_db_url, Pool};
    /// use diesel_async::pooled_connection::AsyncDieselConnectionManager;
    ///
    /// fn get_pool() -> boosterdex_rs::Result<Pool> {
    ///     let manager = AsyncDieselConnectionManager::new(get_db_url()?);
    ///     Ok(Pool::builder(manager).build()?)
    /// }
    /// ```
    fn from(value: deadpool::managed::BuildError) -> Self {
        match value {
            deadpool::managed::BuildError::NoRuntimeSpecified => {
                panic!("Runtime should be specified in Cargo.toml");
            },
        }
    }
}

/// Helper trait to provide context for [`Query`](Error::Query) errors.
pub trait QueryContext {
    /// Type of output returned by [`with_query_context`](QueryContext::with_query_context).
    type Output;

    /// Provides context about the query performed when the error occurred.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use boosterdex_rs::error::QueryContext;
    /// use boosterdex_rs::models::pokemon::PokemonRecord;
    /// use boosterdex_rs::schema::pokemons::dsl::*;
    /// use diesel::QueryDsl;
    /// use diesel_async::RunQueryDsl;
    /// # use boosterdex_rs::db::{get_pool, PooledConnection};
    ///
    /// # async fn example(pokemon_id: i64) -> boosterdex_rs::Result<()> {
    /// # let pool = get_pool()?;
    /// # let mut connection = pool.get().await?;
    /// #
    /// let pokemon: PokemonRecord = pokemons
    ///     .find(pokemon_id)
    ///     .first(&mut connection)
    ///     .await
    ///     .with_query_context(|| format!("Failed to fetch pokemon with id {}", pokemon_id))?;
    /// #
    /// # Ok(())
    /// # }
    /// ```
    fn with_query_context<C, F>(self, context: F) -> Self::Output
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl QueryContext for diesel::result::Error {
    type Output = Error;

    fn with_query_context<C, F>(self, context: F) -> Self::Output
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        Error::Query {
            context: (context)().into(),
            source: self,
            #[cfg(backtrace_support)]
            backtrace: std::backtrace::Backtrace::capture(),
        }
    }
}

impl<T, E> QueryContext for core::result::Result<T, E>
where
    E: QueryContext<Output = Error>,
{
    type Output = Result<T>;

    fn with_query_context<C, F>(self, context: F) -> Self::Output
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|err| err.with_query_context(context))
    }
}
