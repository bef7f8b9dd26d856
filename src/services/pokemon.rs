//! Service used to load and save pokemons. Used by the Boosterdex REST API.

use std::cmp::min;

use diesel::{delete, insert_into, update, BoolExpressionMethods, ExpressionMethods, NotFound, PgArrayExpressionMethods, PgTextExpressionMethods, QueryDsl};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToResponse;

use crate::db::{Pool, PooledConnection};
use crate::error::QueryContext;
use crate::models::pokemon::{CreatePokemon, PatchPokemon, Pokemon, PokemonRecord, UpdatePokemon};
use crate::rarity::Rarity;

/// Service implementation for [`Pokemon`] entities.
///
/// This type contains the actual business logic to fetch/save pokemons from the database.
/// It will be used by the [pokemons REST API endpoint implementations](crate::api::v1::pokemons)
/// to handle operations regarding [`Pokemon`] entities.
///
/// The rarity of an entry is classified when a write payload is turned into a
/// [`PokemonRecord`]; reads always return the persisted tier.
#[derive(Clone)]
pub struct Service {
    pool: Pool,
}

impl Service {
    /// Max number of pokemons that can be fetched per page when [listing](Service::get_pokemons).
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Creates a new pokemon service using the provided database connection [`Pool`].
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Fetches [`Pokemon`]s from the database in a paginated way.
    ///
    /// See [`PokemonsPage`] for details on the returned data.
    pub async fn get_pokemons(&self, page: i64, page_size: i64) -> crate::Result<PokemonsPage> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;
        let page_size = min(page_size, Self::MAX_PAGE_SIZE);

        // The page of entries and the total count are fetched in the same
        // REPEATABLE READ read-only transaction so that both queries see the same
        // data, even if entries are inserted concurrently.
        let (page_records, total_pages) = connection
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|connection| {
                async move {
                    let total_count: i64 = pokemons.count().get_result(connection).await?;

                    let page_records: Vec<PokemonRecord> = pokemons
                        .order(id)
                        .limit(page_size)
                        .offset((page - 1) * page_size)
                        .load(connection)
                        .await?;

                    let total_pages = (total_count as f64 / page_size as f64).ceil() as i64;
                    Ok::<_, diesel::result::Error>((page_records, total_pages))
                }
                .scope_boxed()
            })
            .await
            .with_query_context(|| {
                format!("failed to load pokemons at page {} (page_size: {})", page, page_size)
            })?;

        let page_pokemons = page_records.into_iter().map(Pokemon::from).collect();
        Ok(PokemonsPage { pokemons: page_pokemons, page, page_size, total_pages })
    }

    /// Returns the [`Pokemon`] with the given catalog ID from the database.
    pub async fn get_pokemon(&self, pokemon_id: i64) -> crate::Result<Pokemon> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        pokemons
            .find(pokemon_id)
            .first::<PokemonRecord>(&mut connection)
            .await
            .map(Pokemon::from)
            .with_query_context(|| format!("failed to fetch pokemon with id {}", pokemon_id))
    }

    /// Returns the [`Pokemon`] with the given name from the database.
    ///
    /// The match is case-insensitive and accepts either the english or the french name.
    pub async fn get_pokemon_by_name(&self, name: &str) -> crate::Result<Pokemon> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        pokemons
            .filter(name_english.ilike(name).or(name_french.ilike(name)))
            .order(id)
            .first::<PokemonRecord>(&mut connection)
            .await
            .map(Pokemon::from)
            .with_query_context(|| format!("failed to fetch pokemon named {}", name))
    }

    /// Returns all [`Pokemon`]s carrying the given type tag.
    ///
    /// The tag is matched lowercase, as stored in the catalog.
    pub async fn get_pokemons_by_type(&self, type_tag: &str) -> crate::Result<Vec<Pokemon>> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        let records: Vec<PokemonRecord> = pokemons
            .filter(types.contains(vec![type_tag.to_lowercase()]))
            .order(id)
            .load(&mut connection)
            .await
            .with_query_context(|| format!("failed to fetch pokemons of type {}", type_tag))?;

        Ok(records.into_iter().map(Pokemon::from).collect())
    }

    /// Returns all [`Pokemon`]s of the given rarity tier.
    ///
    /// This is the catalog partition used by the
    /// [booster service](crate::services::booster::Service) to sample drawn cards.
    pub async fn get_pokemons_by_rarity(&self, tier: Rarity) -> crate::Result<Vec<Pokemon>> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        let records: Vec<PokemonRecord> = pokemons
            .filter(rarity.eq(tier))
            .order(id)
            .load(&mut connection)
            .await
            .with_query_context(|| format!("failed to fetch pokemons of rarity {}", tier))?;

        Ok(records.into_iter().map(Pokemon::from).collect())
    }

    /// Searches the catalog by name substring and/or type tags.
    ///
    /// `search_term` matches case-insensitively against the english and french names;
    /// when `type_tags` is given, only entries carrying ALL listed tags are returned.
    /// Both filters are optional; with neither, the whole catalog is returned.
    pub async fn search_pokemons(
        &self,
        search_term: Option<&str>,
        type_tags: Option<Vec<String>>,
    ) -> crate::Result<Vec<Pokemon>> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        let mut query = pokemons.order(id).into_boxed();
        if let Some(term) = search_term {
            let pattern = format!("%{}%", term);
            query = query.filter(name_english.ilike(pattern.clone()).or(name_french.ilike(pattern)));
        }
        if let Some(tags) = type_tags {
            query = query.filter(types.contains(tags));
        }

        let records: Vec<PokemonRecord> = query
            .load(&mut connection)
            .await
            .with_query_context(|| "failed to search pokemons")?;

        Ok(records.into_iter().map(Pokemon::from).collect())
    }

    /// Creates a new [`Pokemon`] and adds it to the database.
    ///
    /// The entry's rarity is classified from the payload's base stats here, once,
    /// and persisted with the record. A duplicate catalog id is rejected by the
    /// table's primary key (reported as a unique violation).
    pub async fn create_pokemon(&self, new_pokemon: &CreatePokemon) -> crate::Result<Pokemon> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        insert_into(pokemons)
            .values(PokemonRecord::from_create(new_pokemon.clone()))
            .get_result::<PokemonRecord>(&mut connection)
            .await
            .map(Pokemon::from)
            .with_query_context(|| "failed to insert new pokemon")
    }

    /// Updates the [`Pokemon`] in the database with the given ID.
    ///
    /// This method overwrites the given pokemon completely and re-derives its rarity
    /// from the new base stats; to update certain fields only, use
    /// [`patch_pokemon`](Service::patch_pokemon) instead.
    pub async fn update_pokemon(
        &self,
        pokemon_id: i64,
        pokemon_update: &UpdatePokemon,
    ) -> crate::Result<Pokemon> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        update(pokemons.find(pokemon_id))
            .set(PokemonRecord::from_update(pokemon_id, pokemon_update.clone()))
            .get_result::<PokemonRecord>(&mut connection)
            .await
            .map(Pokemon::from)
            .with_query_context(|| format!("failed to update pokemon {}", pokemon_id))
    }

    /// Updates the [`Pokemon`] in the database with the given ID.
    ///
    /// This method only overwrites the fields that are specified (e.g. not set to `None`); to
    /// overwrite all fields, use [`update_pokemon`](Service::update_pokemon) instead.
    /// A patched `base` re-derives the rarity like a full update does.
    pub async fn patch_pokemon(
        &self,
        pokemon_id: i64,
        pokemon_patch: &PatchPokemon,
    ) -> crate::Result<Pokemon> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;
        let patch = pokemon_patch.clone();

        // Read-modify-write in one transaction: the merge with the current entry
        // must not race with another writer.
        let updated_record = connection
            .build_transaction()
            .run(|connection| {
                async move {
                    let current: PokemonRecord =
                        pokemons.find(pokemon_id).first(connection).await?;
                    let patched = Pokemon::from(current).patched(patch);

                    update(pokemons.find(pokemon_id))
                        .set(PokemonRecord::from_update(pokemon_id, patched))
                        .get_result::<PokemonRecord>(connection)
                        .await
                }
                .scope_boxed()
            })
            .await
            .with_query_context(|| format!("failed to patch pokemon {}", pokemon_id))?;

        Ok(updated_record.into())
    }

    /// Deletes the pokemon with the given ID from the database.
    pub async fn delete_pokemon(&self, pokemon_id: i64) -> crate::Result<()> {
        use crate::schema::pokemons::dsl::*;

        let mut connection = self.get_pooled_connection().await?;

        delete(pokemons.find(pokemon_id))
            .execute(&mut connection)
            .await
            .and_then(|deleted_count| if deleted_count > 0 { Ok(()) } else { Err(NotFound) })
            .with_query_context(|| format!("failed to delete pokemon {}", pokemon_id))
    }

    /// Returns a [`PooledConnection`] from our internal database connection pool.
    ///
    /// The connection can then be used to perform DB queries.
    async fn get_pooled_connection(&self) -> crate::Result<PooledConnection> {
        Ok(self.pool.get().await?)
    }
}

#[cfg_attr(
    doc,
    doc = r"
        A page of [`Pokemon`]s, as returned by [`Service::get_pokemons`].

        Contains the list of [`Pokemon`]s in the page as well as paging information.
    "
)]
#[cfg_attr(not(doc), doc = "A page of Pokemons")]
#[derive(Debug, Serialize, Deserialize, ToResponse)]
#[response(example = json!({
    "pokemons": [
        {
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
        }
    ],
    "page": 1,
    "page_size": 10,
    "total_pages": 1
}))]
pub struct PokemonsPage {
    /// The Pokemons in the page
    pub pokemons: Vec<Pokemon>,

    /// Current page number (1-based)
    pub page: i64,

    /// Page size used when query was performed
    pub page_size: i64,

    /// Total number of pages available
    pub total_pages: i64,
}
