//! Rarity tiers and the classification rule deriving them from base stats.

use std::io::Write;

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel_derives::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::models::pokemon::Base;

/// Rarity tier of a pokemon card.
///
/// Derived from the pokemon's base stats when the entry is created or imported
/// (see [`Rarity::classify`]) and persisted with the entry; it is never supplied
/// by API callers and never recomputed on reads.
///
/// Stored in the database as its display string (e.g. `Ultra Rare`).
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    ToSchema,
)]
#[diesel(sql_type = Text)]
pub enum Rarity {
    /// Stat total below 400.
    Common,

    /// Stat total of 400 or more.
    Rare,

    /// Stat total of 475 or more.
    #[strum(serialize = "Ultra Rare")]
    #[serde(rename = "Ultra Rare")]
    UltraRare,

    /// Stat total of 525 or more.
    Legendary,

    /// Stat total of 600 or more.
    Mythic,
}

impl Rarity {
    /// Derives the rarity tier for the given base stats.
    ///
    /// The tier is a pure function of the sum of the six stats; descending threshold
    /// bands are checked in order and the first match wins:
    ///
    /// | total (inclusive lower bound) | rarity     |
    /// |-------------------------------|------------|
    /// | 600                           | Mythic     |
    /// | 525                           | Legendary  |
    /// | 475                           | Ultra Rare |
    /// | 400                           | Rare       |
    /// | otherwise                     | Common     |
    ///
    /// Always succeeds: every total is classifiable.
    ///
    /// # Examples
    ///
    /// ```
    /// use boosterdex_rs::models::pokemon::Base;
    /// use boosterdex_rs::rarity::Rarity;
    ///
    /// let base = Base { hp: 45, attack: 49, defense: 49, special_attack: 65, special_defense: 65, speed: 45 };
    /// assert_eq!(Rarity::Common, Rarity::classify(&base));
    /// ```
    pub fn classify(base: &Base) -> Self {
        match base.total() {
            total if total >= 600 => Self::Mythic,
            total if total >= 525 => Self::Legendary,
            total if total >= 475 => Self::UltraRare,
            total if total >= 400 => Self::Rare,
            _ => Self::Common,
        }
    }
}

impl ToSql<Text, Pg> for Rarity {
    /// Serializes this rarity tier to its display string for storage.
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_ref().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Rarity {
    /// Parses a rarity tier back from its stored display string.
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = std::str::from_utf8(bytes.as_bytes())?;
        value
            .parse()
            .map_err(|_| format!("unrecognized rarity tier: {}", value).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_with_total(total: i32) -> Base {
        // Dump the remainder in hp; the classification only looks at the sum.
        Base {
            hp: total - 5,
            attack: 1,
            defense: 1,
            special_attack: 1,
            special_defense: 1,
            speed: 1,
        }
    }

    mod classify {
        use super::*;

        #[test]
        fn test_band_boundaries() {
            assert_eq!(Rarity::Common, Rarity::classify(&base_with_total(399)));
            assert_eq!(Rarity::Rare, Rarity::classify(&base_with_total(400)));
            assert_eq!(Rarity::Rare, Rarity::classify(&base_with_total(474)));
            assert_eq!(Rarity::UltraRare, Rarity::classify(&base_with_total(475)));
            assert_eq!(Rarity::UltraRare, Rarity::classify(&base_with_total(524)));
            assert_eq!(Rarity::Legendary, Rarity::classify(&base_with_total(525)));
            assert_eq!(Rarity::Legendary, Rarity::classify(&base_with_total(599)));
            assert_eq!(Rarity::Mythic, Rarity::classify(&base_with_total(600)));
        }

        #[test]
        fn test_zero_total() {
            let base =
                Base { hp: 0, attack: 0, defense: 0, special_attack: 0, special_defense: 0, speed: 0 };
            assert_eq!(Rarity::Common, Rarity::classify(&base));
        }

        #[test]
        fn test_mythic_mewtwo_like_stats() {
            let base = Base {
                hp: 106,
                attack: 130,
                defense: 90,
                special_attack: 90,
                special_defense: 154,
                speed: 130,
            };
            assert_eq!(700, base.total());
            assert_eq!(Rarity::Mythic, Rarity::classify(&base));
        }

        #[test]
        fn test_common_bulbasaur_like_stats() {
            let base = Base {
                hp: 45,
                attack: 49,
                defense: 49,
                special_attack: 65,
                special_defense: 65,
                speed: 45,
            };
            assert_eq!(318, base.total());
            assert_eq!(Rarity::Common, Rarity::classify(&base));
        }

        #[test]
        fn test_deterministic() {
            let base = Base {
                hp: 80,
                attack: 82,
                defense: 83,
                special_attack: 100,
                special_defense: 100,
                speed: 80,
            };

            let first = Rarity::classify(&base);
            for _ in 0..10 {
                assert_eq!(first, Rarity::classify(&base));
            }
        }
    }

    mod string_representation {
        use std::str::FromStr;

        use strum::IntoEnumIterator;

        use super::*;

        #[test]
        fn test_display_round_trip() {
            for rarity in Rarity::iter() {
                let displayed = rarity.to_string();
                assert_eq!(rarity, Rarity::from_str(&displayed).unwrap());
            }
        }

        #[test]
        fn test_expected_tier_names() {
            let names: Vec<String> = Rarity::iter().map(|rarity| rarity.to_string()).collect();
            assert_eq!(vec!["Common", "Rare", "Ultra Rare", "Legendary", "Mythic"], names);
        }

        #[test]
        fn test_serde_uses_display_names() {
            let serialized = serde_json::to_string(&Rarity::UltraRare).unwrap();
            assert_eq!(r#""Ultra Rare""#, serialized);

            let deserialized: Rarity = serde_json::from_str(r#""Mythic""#).unwrap();
            assert_eq!(Rarity::Mythic, deserialized);
        }
    }
}
