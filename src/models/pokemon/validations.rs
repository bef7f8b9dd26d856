//! Helpers to validate Pokemon data.

use std::borrow::Cow;

use validator::ValidationError;

/// The valid Pokemon type tags.
///
/// Can be used to validate the `type` field of a Pokemon struct. Tags are stored
/// lowercase, matching the wire format of the catalog.
pub const POKEMON_TYPES: [&str; 18] = [
    "normal", "fire", "water", "grass", "electric", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

/// Validates a list of Pokemon type tags.
///
/// Every tag must appear in [`POKEMON_TYPES`]. The tags are case-sensitive: the
/// catalog stores lowercase tags only.
pub fn validate_pokemon_types(types: &Vec<String>) -> Result<(), ValidationError> {
    match types.iter().find(|tag| !POKEMON_TYPES.contains(&tag.as_str())) {
        None => Ok(()),
        Some(invalid_tag) => {
            let error_message = format!(
                "unknown type tag `{}`; type tags must match one of {} or {}",
                invalid_tag,
                POKEMON_TYPES[..POKEMON_TYPES.len() - 1].join(", "),
                POKEMON_TYPES.last().cloned().unwrap(),
            );

            let mut validation_error = ValidationError::new("invalid_type");
            validation_error.message = Some(Cow::from(error_message));

            Err(validation_error)
        },
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Debug, Validate)]
    struct TestPokemon {
        #[validate(custom = "validate_pokemon_types")]
        pub types: Vec<String>,
    }

    mod validate_pokemon_types {
        use validator::ValidationErrors;

        use super::*;

        #[test]
        fn test_valid_types() {
            let pokemon = TestPokemon { types: vec!["grass".into(), "poison".into()] };

            let validation_result = pokemon.validate();
            assert!(validation_result.is_ok());
        }

        #[test]
        fn test_invalid_type() {
            let pokemon = TestPokemon { types: vec!["grass".into(), "patience".into()] };

            let validation_result = pokemon.validate();
            assert!(validation_result.is_err());
            assert!(ValidationErrors::has_error(&validation_result, "types"));
        }

        #[test]
        fn test_wrong_case_rejected() {
            let pokemon = TestPokemon { types: vec!["Grass".into()] };

            assert!(pokemon.validate().is_err());
        }

        #[test]
        fn test_empty_list_allowed() {
            let pokemon = TestPokemon { types: vec![] };

            assert!(pokemon.validate().is_ok());
        }
    }
}
