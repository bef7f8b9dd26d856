//! Service implementing the booster draw endpoint.
//!
//! Glues the pure drawing logic of [`crate::booster`] to the storage layer: loads the
//! caller's unlock set and the catalog partitioned by rarity, draws the pack, then
//! persists the newly unlocked ids back onto the user record.

use std::collections::HashMap;

use rand::thread_rng;

use crate::booster::{draw, BoosterTable, DrawnCard, DEFAULT_DRAW_COUNT};
use crate::db::Pool;
use crate::services::{pokemon, user};

/// Service implementation for booster draws.
///
/// Holds the weighted [`BoosterTable`] (cumulative sums built once at construction)
/// and the entity services used to reach storage.
#[derive(Clone)]
pub struct Service {
    pokemons: pokemon::Service,
    users: user::Service,
    table: BoosterTable,
}

impl Service {
    /// Creates a new booster service using the provided database connection [`Pool`].
    ///
    /// Uses the standard booster table (Common=60, Rare=25, Ultra Rare=10,
    /// Legendary=4, Mythic=1).
    pub fn new(pool: Pool) -> Self {
        Self {
            pokemons: pokemon::Service::new(pool.clone()),
            users: user::Service::new(pool),
            table: BoosterTable::default(),
        }
    }

    /// Opens a booster pack for the given user.
    ///
    /// Draws [`DEFAULT_DRAW_COUNT`] cards (possibly fewer if a drawn tier has no
    /// catalog entries — an empty catalog yields an empty pack, not an error), flags
    /// each card against the user's unlock set as read before the draw, and persists
    /// the union of newly unlocked ids in a single additive update.
    pub async fn open_booster(&self, user_id: i64) -> crate::Result<Vec<DrawnCard>> {
        let already_unlocked = self.users.get_unlocked_set(user_id).await?;

        let mut catalog = HashMap::new();
        for tier in self.table.tiers() {
            catalog.insert(tier, self.pokemons.get_pokemons_by_rarity(tier).await?);
        }

        let outcome = draw(
            &mut thread_rng(),
            &self.table,
            &catalog,
            &already_unlocked,
            DEFAULT_DRAW_COUNT,
        );

        if !outcome.newly_unlocked.is_empty() {
            self.users
                .add_unlocked(user_id, outcome.newly_unlocked.iter().copied().collect())
                .await?;
        }

        Ok(outcome.cards)
    }
}
