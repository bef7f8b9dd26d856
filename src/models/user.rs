//! Models used to register/load user accounts from the database.

use std::io::Write;

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel_derives::{AsExpression, FromSqlRow, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use utoipa::{ToResponse, ToSchema};
use validator::Validate;

use crate::schema::users;

/// Role of a user account.
///
/// Stored in the database as its lowercase name. Admins may mutate the catalog;
/// regular users may only read it and open boosters.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    AsExpression,
    FromSqlRow,
    Serialize,
    Deserialize,
    strum_macros::AsRefStr,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Regular player account. Assigned to every new registration.
    #[default]
    User,

    /// Administrator account; may create, update and delete catalog entries.
    Admin,
}

impl ToSql<Text, Pg> for Role {
    /// Serializes this role to its lowercase name for storage.
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_ref().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Role {
    /// Parses a role back from its stored lowercase name.
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = std::str::from_utf8(bytes.as_bytes())?;
        value
            .parse()
            .map_err(|_| format!("unrecognized role: {}", value).into())
    }
}

#[cfg_attr(
    doc,
    doc = r"
        User account, as exposed by the REST API.

        Never carries the password hash; that field stays inside [`UserRecord`].
    "
)]
#[cfg_attr(not(doc), doc = "Information about a user account")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, ToResponse)]
#[serde(deny_unknown_fields)]
#[response(
    description = "User account information",
    example = json!({
        "id": 1,
        "firstname": "Ash",
        "lastname": "Ketchum",
        "mail": "ash@pallet.town",
        "role": "user",
        "unlockedPokemons": [1, 4, 7]
    }),
)]
pub struct User {
    /// Unique id of this account
    pub id: i64,

    /// First name
    pub firstname: String,

    /// Last name
    pub lastname: String,

    /// Mail address; unique across accounts
    pub mail: String,

    /// Account role
    pub role: Role,

    /// Catalog ids of the pokemons this account has unlocked
    ///
    /// Grows through booster draws only; never shrinks.
    #[serde(rename = "unlockedPokemons")]
    pub unlocked_pokemons: Vec<i64>,
}

/// Database record for a user account, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = users, check_for_backend(diesel::pg::Pg))]
pub struct UserRecord {
    /// Unique id of this account (primary key, assigned by the database)
    pub id: i64,

    /// First name
    pub firstname: String,

    /// Last name
    pub lastname: String,

    /// Mail address; unique across accounts
    pub mail: String,

    /// bcrypt hash of the account password
    pub password: String,

    /// Account role
    pub role: Role,

    /// Catalog ids of the pokemons this account has unlocked
    pub unlocked_pokemons: Vec<i64>,
}

impl From<UserRecord> for User {
    /// Strips the password hash off a database record.
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id,
            firstname: value.firstname,
            lastname: value.lastname,
            mail: value.mail,
            role: value.role,
            unlocked_pokemons: value.unlocked_pokemons,
        }
    }
}

/// Model used to insert a new user account in the database.
///
/// The `password` field holds the bcrypt hash, never the clear-text password;
/// see [`Service::register`](crate::services::user::Service::register).
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRecord {
    /// First name
    pub firstname: String,

    /// Last name
    pub lastname: String,

    /// Mail address
    pub mail: String,

    /// bcrypt hash of the account password
    pub password: String,

    /// Account role
    pub role: Role,

    /// Initial unlock set; empty for new registrations
    pub unlocked_pokemons: Vec<i64>,
}

#[cfg_attr(doc, doc = "Payload to register a new user account.")]
#[cfg_attr(not(doc), doc = "Information to register a new user account")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({
    "firstname": "Ash",
    "lastname": "Ketchum",
    "mail": "ash@pallet.town",
    "password": "pikachu-i-choose-you"
}))]
pub struct RegisterUser {
    /// First name
    #[validate(length(min = 1))]
    #[schema(example = "Ash")]
    pub firstname: String,

    /// Last name
    #[validate(length(min = 1))]
    #[schema(example = "Ketchum")]
    pub lastname: String,

    /// Mail address; must be unique across accounts
    #[validate(email)]
    #[schema(example = "ash@pallet.town")]
    pub mail: String,

    /// Clear-text password; hashed before storage, never persisted as-is
    #[validate(length(min = 8))]
    pub password: String,
}

#[cfg_attr(doc, doc = "Payload to log into an existing user account.")]
#[cfg_attr(not(doc), doc = "Credentials to log into a user account")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({
    "mail": "ash@pallet.town",
    "password": "pikachu-i-choose-you"
}))]
pub struct LoginUser {
    /// Mail address of the account
    #[validate(email)]
    #[schema(example = "ash@pallet.town")]
    pub mail: String,

    /// Clear-text password to verify
    #[validate(length(min = 1))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> UserRecord {
        UserRecord {
            id: 1,
            firstname: "Ash".into(),
            lastname: "Ketchum".into(),
            mail: "ash@pallet.town".into(),
            password: "$2b$12$not.a.real.hash".into(),
            role: Role::User,
            unlocked_pokemons: vec![1, 4, 7],
        }
    }

    mod role {
        use std::str::FromStr;

        use super::*;

        #[test]
        fn test_string_round_trip() {
            assert_eq!("user", Role::User.to_string());
            assert_eq!("admin", Role::Admin.to_string());
            assert_eq!(Role::Admin, Role::from_str("admin").unwrap());
            assert!(Role::from_str("overlord").is_err());
        }

        #[test]
        fn test_serde_lowercase() {
            assert_eq!(r#""admin""#, serde_json::to_string(&Role::Admin).unwrap());
            assert_eq!(Role::User, serde_json::from_str::<Role>(r#""user""#).unwrap());
        }

        #[test]
        fn test_default_is_user() {
            assert_eq!(Role::User, Role::default());
        }
    }

    mod user_from_record {
        use super::*;

        #[test]
        fn test_drops_password_hash() {
            let user: User = sample_record().into();

            assert_eq!(1, user.id);
            assert_eq!("ash@pallet.town", user.mail);
            assert_eq!(vec![1, 4, 7], user.unlocked_pokemons);

            let value = serde_json::to_value(&user).unwrap();
            assert!(value.get("password").is_none());
            assert_eq!(serde_json::json!([1, 4, 7]), value["unlockedPokemons"]);
        }
    }

    mod validation {
        use validator::Validate;

        use super::*;

        #[test]
        fn test_valid_registration() {
            let payload = RegisterUser {
                firstname: "Ash".into(),
                lastname: "Ketchum".into(),
                mail: "ash@pallet.town".into(),
                password: "pikachu-i-choose-you".into(),
            };

            assert!(payload.validate().is_ok());
        }

        #[test]
        fn test_invalid_mail_rejected() {
            let payload = RegisterUser {
                firstname: "Ash".into(),
                lastname: "Ketchum".into(),
                mail: "not-a-mail-address".into(),
                password: "pikachu-i-choose-you".into(),
            };

            assert!(payload.validate().is_err());
        }

        #[test]
        fn test_short_password_rejected() {
            let payload = RegisterUser {
                firstname: "Ash".into(),
                lastname: "Ketchum".into(),
                mail: "ash@pallet.town".into(),
                password: "pika".into(),
            };

            assert!(payload.validate().is_err());
        }
    }
}
