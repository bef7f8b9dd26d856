//! Models used to create/update/load pokemons from the database.
//!
//! # Notes
//!
//! The API models ([`Pokemon`] and the create/update/patch payloads) keep the nested
//! JSON shape of the catalog (multilingual `name` object, `base` stats object), while
//! [`PokemonRecord`] flattens everything to table columns for [`diesel`]. This file
//! therefore includes a fair amount of field-by-field repetition; the conversions are
//! kept together in one place on purpose.

pub mod validations;

use diesel_derives::{AsChangeset, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use utoipa::{ToResponse, ToSchema};
use validator::Validate;

use crate::rarity::Rarity;
use crate::schema::pokemons;

/// Multilingual name of a pokemon.
///
/// French and english names are required; japanese and chinese are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Name {
    /// French name
    #[validate(length(min = 1))]
    #[schema(example = "Bulbizarre")]
    pub french: String,

    /// English name
    #[validate(length(min = 1))]
    #[schema(example = "Bulbasaur")]
    pub english: String,

    /// Japanese name (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(nullable, example = "フシギダネ")]
    pub japanese: Option<String>,

    /// Chinese name (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(nullable, example = "妙蛙种子")]
    pub chinese: Option<String>,
}

/// The six base stats of a pokemon.
///
/// All stats are non-negative; their sum drives the rarity classification
/// (see [`Rarity::classify`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Base {
    /// Hit points
    #[validate(range(min = 0))]
    #[schema(example = 45)]
    pub hp: i32,

    /// Attack stat
    #[validate(range(min = 0))]
    #[schema(example = 49)]
    pub attack: i32,

    /// Defense stat
    #[validate(range(min = 0))]
    #[schema(example = 49)]
    pub defense: i32,

    /// Special attack stat
    #[validate(range(min = 0))]
    #[schema(example = 65)]
    pub special_attack: i32,

    /// Special defense stat
    #[validate(range(min = 0))]
    #[schema(example = 65)]
    pub special_defense: i32,

    /// Speed stat
    #[validate(range(min = 0))]
    #[schema(example = 45)]
    pub speed: i32,
}

impl Base {
    /// Returns the sum of the six stats.
    pub fn total(&self) -> i32 {
        self.hp + self.attack + self.defense + self.special_attack + self.special_defense + self.speed
    }
}

#[cfg_attr(
    doc,
    doc = r"
        Catalog entry for a pokemon, as exposed by the REST API.

        The `rarity` field is derived from the base stats at write time and persisted;
        it is never accepted from callers (see [`CreatePokemon`]).
    "
)]
#[cfg_attr(not(doc), doc = "Information about a Pokemon in the catalog")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, ToResponse)]
#[serde(deny_unknown_fields)]
#[response(
    description = "Pokemon information",
    example = json!({
        "id": 1,
        "name": {
            "french": "Bulbizarre",
            "english": "Bulbasaur",
            "japanese": "フシギダネ",
            "chinese": "妙蛙种子"
        },
        "type": ["grass", "poison"],
        "base": {
            "hp": 45,
            "attack": 49,
            "defense": 49,
            "specialAttack": 65,
            "specialDefense": 65,
            "speed": 45
        },
        "rarity": "Common",
        "image": "https://assets.pokemon.com/assets/cms2/img/pokedex/full/001.png",
        "evolutions": [2]
    }),
)]
pub struct Pokemon {
    /// Unique catalog id of this pokemon
    pub id: i64,

    /// Multilingual name
    pub name: Name,

    /// Elemental type tags, in declared order
    #[serde(rename = "type")]
    #[schema(example = json!(["grass", "poison"]))]
    pub types: Vec<String>,

    /// Base stats
    pub base: Base,

    /// Rarity tier, derived from the base stats
    pub rarity: Rarity,

    /// Opaque image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(nullable)]
    pub image: Option<String>,

    /// Catalog ids of this pokemon's evolutions
    ///
    /// Weak references: the referenced entries may be deleted independently.
    #[serde(default)]
    pub evolutions: Vec<i64>,
}

impl Pokemon {
    /// Merges a patch into this pokemon, yielding the full update payload.
    ///
    /// Fields absent from the patch keep their current value. The resulting payload
    /// goes through [`PokemonRecord::from_update`], so a patched `base` re-derives
    /// the rarity like any other write.
    pub fn patched(self, patch: PatchPokemon) -> UpdatePokemon {
        UpdatePokemon {
            name: patch.name.unwrap_or(self.name),
            types: patch.types.unwrap_or(self.types),
            base: patch.base.unwrap_or(self.base),
            image: match patch.image {
                Some(image) => image,
                None => self.image,
            },
            evolutions: patch.evolutions.unwrap_or(self.evolutions),
        }
    }
}

#[cfg_attr(
    doc,
    doc = r"
        Model used to insert a new pokemon in the database.

        Carries the caller-chosen catalog [`id`](CreatePokemon::id); everything else
        matches [`UpdatePokemon`]. `rarity` is deliberately absent: it is classified
        from [`base`](CreatePokemon::base) when the record is built.
    "
)]
#[cfg_attr(not(doc), doc = "Information to create a new Pokemon in the catalog")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({
    "id": 1,
    "name": { "french": "Bulbizarre", "english": "Bulbasaur" },
    "type": ["grass", "poison"],
    "base": {
        "hp": 45,
        "attack": 49,
        "defense": 49,
        "specialAttack": 65,
        "specialDefense": 65,
        "speed": 45
    },
    "image": "https://assets.pokemon.com/assets/cms2/img/pokedex/full/001.png",
    "evolutions": [2]
}))]
pub struct CreatePokemon {
    /// Unique catalog id for the new pokemon
    #[validate(range(min = 1))]
    #[schema(example = 1, minimum = 1)]
    pub id: i64,

    /// Multilingual name
    #[validate]
    pub name: Name,

    /// Elemental type tags (lowercase, from the fixed 18-type set)
    #[serde(rename = "type")]
    #[validate(custom = "validations::validate_pokemon_types")]
    #[schema(example = json!(["grass", "poison"]))]
    pub types: Vec<String>,

    /// Base stats
    #[validate]
    pub base: Base,

    /// Opaque image reference
    #[serde(default)]
    #[schema(nullable)]
    pub image: Option<String>,

    /// Catalog ids of this pokemon's evolutions
    #[serde(default)]
    pub evolutions: Vec<i64>,
}

#[cfg_attr(
    doc,
    doc = r"
        Model used to update a pokemon in the database, overwriting all fields.

        The catalog id comes from the request path and cannot be changed. As with
        [`CreatePokemon`], `rarity` is not accepted; it is re-derived from the new
        [`base`](UpdatePokemon::base) when the record is built.
    "
)]
#[cfg_attr(not(doc), doc = "Information to update a Pokemon in the catalog, overwriting all fields")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePokemon {
    /// Multilingual name
    #[validate]
    pub name: Name,

    /// Elemental type tags (lowercase, from the fixed 18-type set)
    #[serde(rename = "type")]
    #[validate(custom = "validations::validate_pokemon_types")]
    #[schema(example = json!(["grass", "poison"]))]
    pub types: Vec<String>,

    /// Base stats
    #[validate]
    pub base: Base,

    /// Opaque image reference
    #[serde(default)]
    #[schema(nullable)]
    pub image: Option<String>,

    /// Catalog ids of this pokemon's evolutions
    #[serde(default)]
    pub evolutions: Vec<i64>,
}

impl From<CreatePokemon> for UpdatePokemon {
    /// Converts a [`CreatePokemon`] into an [`UpdatePokemon`], dropping its
    /// [`id`](CreatePokemon::id).
    fn from(value: CreatePokemon) -> Self {
        Self {
            name: value.name,
            types: value.types,
            base: value.base,
            image: value.image,
            evolutions: value.evolutions,
        }
    }
}

#[cfg_attr(
    doc,
    doc = r#"
        Model used to "patch" a pokemon in the database, e.g. update some fields only.

        All fields are optional; fields that are not specified will not be updated.
        Patching `base` re-derives the rarity (see [`Pokemon::patched`]).
    "#
)]
#[cfg_attr(not(doc), doc = "Information to update specific fields of a Pokemon in the catalog")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({
    "name": { "french": "Herbizarre", "english": "Ivysaur" },
    "image": null
}))]
pub struct PatchPokemon {
    /// Multilingual name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub name: Option<Name>,

    /// Elemental type tags (lowercase, from the fixed 18-type set)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validations::validate_pokemon_types")]
    pub types: Option<Vec<String>>,

    /// Base stats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub base: Option<Base>,

    /// Opaque image reference
    #[serde(
        with = "serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    #[schema(nullable)]
    pub image: Option<Option<String>>,

    /// Catalog ids of this pokemon's evolutions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolutions: Option<Vec<i64>>,
}

/// Database record for a pokemon catalog entry.
///
/// Flattens the nested API shape to the `pokemons` table columns. Built exclusively
/// through [`from_create`](PokemonRecord::from_create) and
/// [`from_update`](PokemonRecord::from_update), which is where the rarity
/// classification happens — exactly once per write.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = pokemons, check_for_backend(diesel::pg::Pg), treat_none_as_null = true)]
pub struct PokemonRecord {
    /// Unique catalog id (primary key, caller-chosen)
    pub id: i64,

    /// French name
    pub name_french: String,

    /// English name
    pub name_english: String,

    /// Japanese name (if known)
    pub name_japanese: Option<String>,

    /// Chinese name (if known)
    pub name_chinese: Option<String>,

    /// Elemental type tags
    pub types: Vec<String>,

    /// Hit points
    pub hp: i32,

    /// Attack stat
    pub attack: i32,

    /// Defense stat
    pub defense: i32,

    /// Special attack stat
    pub special_attack: i32,

    /// Special defense stat
    pub special_defense: i32,

    /// Speed stat
    pub speed: i32,

    /// Derived rarity tier
    pub rarity: Rarity,

    /// Opaque image reference
    pub image: Option<String>,

    /// Catalog ids of evolutions (weak references)
    pub evolutions: Vec<i64>,
}

impl PokemonRecord {
    /// Builds a database record from a create payload.
    ///
    /// This is the write-time derivation point for new entries: the rarity is
    /// classified from the payload's base stats here and persisted with the record.
    pub fn from_create(payload: CreatePokemon) -> Self {
        let id = payload.id;
        Self::from_parts(id, payload.into())
    }

    /// Builds a database record for a full update of the pokemon with the given id.
    ///
    /// Re-derives the rarity from the new base stats; since the classification is a
    /// pure function of the stats, an update that does not change `base` keeps the
    /// previously persisted tier.
    pub fn from_update(id: i64, payload: UpdatePokemon) -> Self {
        Self::from_parts(id, payload)
    }

    fn from_parts(id: i64, payload: UpdatePokemon) -> Self {
        let rarity = Rarity::classify(&payload.base);

        Self {
            id,
            name_french: payload.name.french,
            name_english: payload.name.english,
            name_japanese: payload.name.japanese,
            name_chinese: payload.name.chinese,
            types: payload.types,
            hp: payload.base.hp,
            attack: payload.base.attack,
            defense: payload.base.defense,
            special_attack: payload.base.special_attack,
            special_defense: payload.base.special_defense,
            speed: payload.base.speed,
            rarity,
            image: payload.image,
            evolutions: payload.evolutions,
        }
    }
}

impl From<PokemonRecord> for Pokemon {
    /// Restores the nested API shape from a database record.
    fn from(value: PokemonRecord) -> Self {
        Self {
            id: value.id,
            name: Name {
                french: value.name_french,
                english: value.name_english,
                japanese: value.name_japanese,
                chinese: value.name_chinese,
            },
            types: value.types,
            base: Base {
                hp: value.hp,
                attack: value.attack,
                defense: value.defense,
                special_attack: value.special_attack,
                special_defense: value.special_defense,
                speed: value.speed,
            },
            rarity: value.rarity,
            image: value.image,
            evolutions: value.evolutions,
        }
    }
}

/// Model used to import pokemons in the database from the seed JSON file.
///
/// Matches the raw upstream pokedex format (capitalized type tags, `"HP"`/`"Sp. Attack"`
/// stat keys); converting to [`CreatePokemon`] normalizes the tags to lowercase.
/// Used by the `seed_db` command to seed the database initially.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct ImportPokemon {
    pub id: i64,
    pub name: Name,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub base: ImportBase,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub evolutions: Vec<i64>,
}

/// Base stats as spelled in the raw seed file.
#[derive(Debug, Copy, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct ImportBase {
    #[serde(rename = "HP")]
    pub hp: i32,
    #[serde(rename = "Attack")]
    pub attack: i32,
    #[serde(rename = "Defense")]
    pub defense: i32,
    #[serde(rename = "Sp. Attack")]
    pub special_attack: i32,
    #[serde(rename = "Sp. Defense")]
    pub special_defense: i32,
    #[serde(rename = "Speed")]
    pub speed: i32,
}

impl From<ImportPokemon> for CreatePokemon {
    /// Normalizes a raw seed entry into a create payload (lowercased type tags,
    /// camelCase stats).
    fn from(value: ImportPokemon) -> Self {
        Self {
            id: value.id,
            name: value.name,
            types: value
                .types
                .into_iter()
                .map(|tag| tag.to_lowercase())
                .collect(),
            base: Base {
                hp: value.base.hp,
                attack: value.base.attack,
                defense: value.base.defense,
                special_attack: value.base.special_attack,
                special_defense: value.base.special_defense,
                speed: value.base.speed,
            },
            image: value.image,
            evolutions: value.evolutions,
        }
    }
}

//noinspection DuplicatedCode
#[cfg(test)]
mod tests {
    use super::*;

    fn bulbasaur_create() -> CreatePokemon {
        CreatePokemon {
            id: 1,
            name: Name {
                french: "Bulbizarre".into(),
                english: "Bulbasaur".into(),
                japanese: Some("フシギダネ".into()),
                chinese: Some("妙蛙种子".into()),
            },
            types: vec!["grass".into(), "poison".into()],
            base: Base {
                hp: 45,
                attack: 49,
                defense: 49,
                special_attack: 65,
                special_defense: 65,
                speed: 45,
            },
            image: Some("https://assets.pokemon.com/assets/cms2/img/pokedex/full/001.png".into()),
            evolutions: vec![2],
        }
    }

    #[test]
    fn test_record_from_create_classifies_rarity() {
        let record = PokemonRecord::from_create(bulbasaur_create());

        assert_eq!(1, record.id);
        assert_eq!("Bulbizarre", record.name_french);
        assert_eq!("Bulbasaur", record.name_english);
        assert_eq!(vec!["grass".to_string(), "poison".to_string()], record.types);
        assert_eq!(Rarity::Common, record.rarity);
        assert_eq!(vec![2], record.evolutions);
    }

    #[test]
    fn test_record_from_update_rederives_rarity() {
        let mut payload: UpdatePokemon = bulbasaur_create().into();
        payload.base = Base {
            hp: 106,
            attack: 130,
            defense: 90,
            special_attack: 90,
            special_defense: 154,
            speed: 130,
        };

        let record = PokemonRecord::from_update(1, payload);
        assert_eq!(Rarity::Mythic, record.rarity);
    }

    #[test]
    fn test_record_round_trips_to_api_model() {
        let record = PokemonRecord::from_create(bulbasaur_create());
        let pokemon: Pokemon = record.into();

        let expected = bulbasaur_create();
        assert_eq!(expected.id, pokemon.id);
        assert_eq!(expected.name, pokemon.name);
        assert_eq!(expected.types, pokemon.types);
        assert_eq!(expected.base, pokemon.base);
        assert_eq!(Rarity::Common, pokemon.rarity);
        assert_eq!(expected.image, pokemon.image);
        assert_eq!(expected.evolutions, pokemon.evolutions);
    }

    #[test]
    fn test_patched_keeps_unspecified_fields() {
        let pokemon: Pokemon = PokemonRecord::from_create(bulbasaur_create()).into();

        let patch = PatchPokemon {
            name: Some(Name {
                french: "Herbizarre".into(),
                english: "Ivysaur".into(),
                japanese: None,
                chinese: None,
            }),
            types: None,
            base: None,
            image: Some(None),
            evolutions: None,
        };

        let updated = pokemon.patched(patch);
        assert_eq!("Ivysaur", updated.name.english);
        assert_eq!(vec!["grass".to_string(), "poison".to_string()], updated.types);
        assert_eq!(45, updated.base.hp);
        // `"image": null` in the patch clears the field.
        assert_eq!(None, updated.image);
        assert_eq!(vec![2], updated.evolutions);
    }

    #[test]
    fn test_patch_image_absent_keeps_current_value() {
        let pokemon: Pokemon = PokemonRecord::from_create(bulbasaur_create()).into();
        let image_before = pokemon.image.clone();

        let patch = PatchPokemon {
            name: None,
            types: None,
            base: None,
            image: None,
            evolutions: None,
        };

        let updated = pokemon.patched(patch);
        assert_eq!(image_before, updated.image);
    }

    mod serde_shape {
        use super::*;

        #[test]
        fn test_pokemon_json_shape() {
            let pokemon: Pokemon = PokemonRecord::from_create(bulbasaur_create()).into();
            let value = serde_json::to_value(&pokemon).unwrap();

            assert_eq!(1, value["id"]);
            assert_eq!("Bulbizarre", value["name"]["french"]);
            assert_eq!(serde_json::json!(["grass", "poison"]), value["type"]);
            assert_eq!(65, value["base"]["specialAttack"]);
            assert_eq!(65, value["base"]["specialDefense"]);
            assert_eq!("Common", value["rarity"]);
            assert_eq!(serde_json::json!([2]), value["evolutions"]);
        }

        #[test]
        fn test_create_payload_rejects_rarity() {
            // `rarity` is derived, not accepted from callers.
            let result: Result<CreatePokemon, _> = serde_json::from_value(serde_json::json!({
                "id": 1,
                "name": { "french": "Bulbizarre", "english": "Bulbasaur" },
                "type": ["grass"],
                "base": {
                    "hp": 45, "attack": 49, "defense": 49,
                    "specialAttack": 65, "specialDefense": 65, "speed": 45
                },
                "rarity": "Mythic"
            }));

            assert!(result.is_err());
        }

        #[test]
        fn test_patch_distinguishes_null_from_absent_image() {
            let cleared: PatchPokemon =
                serde_json::from_value(serde_json::json!({ "image": null })).unwrap();
            assert_eq!(Some(None), cleared.image);

            let untouched: PatchPokemon = serde_json::from_value(serde_json::json!({})).unwrap();
            assert_eq!(None, untouched.image);
        }
    }

    mod validation {
        use validator::Validate;

        use super::*;

        #[test]
        fn test_valid_create_payload() {
            assert!(bulbasaur_create().validate().is_ok());
        }

        #[test]
        fn test_unknown_type_tag_rejected() {
            let mut payload = bulbasaur_create();
            payload.types = vec!["love".into()];

            assert!(payload.validate().is_err());
        }

        #[test]
        fn test_capitalized_type_tag_rejected() {
            let mut payload = bulbasaur_create();
            payload.types = vec!["Grass".into()];

            assert!(payload.validate().is_err());
        }

        #[test]
        fn test_negative_stat_rejected() {
            let mut payload = bulbasaur_create();
            payload.base.speed = -1;

            assert!(payload.validate().is_err());
        }

        #[test]
        fn test_empty_required_name_rejected() {
            let mut payload = bulbasaur_create();
            payload.name.french = "".into();

            assert!(payload.validate().is_err());
        }
    }

    mod import {
        use super::*;
        use validator::Validate;

        #[test]
        fn test_import_normalizes_raw_format() {
            let raw = serde_json::json!({
                "id": 1,
                "name": {
                    "english": "Bulbasaur",
                    "japanese": "フシギダネ",
                    "chinese": "妙蛙种子",
                    "french": "Bulbizarre"
                },
                "type": ["Grass", "Poison"],
                "base": {
                    "HP": 45,
                    "Attack": 49,
                    "Defense": 49,
                    "Sp. Attack": 65,
                    "Sp. Defense": 65,
                    "Speed": 45
                },
                "image": "https://assets.pokemon.com/assets/cms2/img/pokedex/full/001.png"
            });

            let imported: ImportPokemon = serde_json::from_value(raw).unwrap();
            let payload: CreatePokemon = imported.into();

            assert_eq!(vec!["grass".to_string(), "poison".to_string()], payload.types);
            assert_eq!(65, payload.base.special_attack);
            assert_eq!(318, payload.base.total());
            assert!(payload.validate().is_ok());
        }
    }
}
