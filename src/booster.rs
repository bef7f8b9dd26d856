//! Booster pack drawing logic.
//!
//! A booster draw samples a rarity tier from a weighted [`BoosterTable`], then samples
//! one catalog entry of that tier, [`DEFAULT_DRAW_COUNT`] times independently (with
//! replacement). Drawn cards are flagged against the snapshot of the user's unlock set
//! taken before the draw started; the caller persists the resulting
//! [`newly_unlocked`](BoosterDraw::newly_unlocked) union back onto the user record.
//!
//! Everything in this module is a pure function over its inputs plus an injected
//! random number generator, so the statistical behavior can be pinned down in tests
//! with a seeded generator.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::pokemon::Pokemon;
use crate::rarity::Rarity;

/// Number of cards drawn per booster pack.
pub const DEFAULT_DRAW_COUNT: usize = 5;

/// Default tier weights of a booster pack.
///
/// The declared order matters: it is the tie-break when a roll lands exactly on a
/// cumulative boundary (see [`BoosterTable::new`]).
pub const DEFAULT_WEIGHTS: [(Rarity, f64); 5] = [
    (Rarity::Common, 60.0),
    (Rarity::Rare, 25.0),
    (Rarity::UltraRare, 10.0),
    (Rarity::Legendary, 4.0),
    (Rarity::Mythic, 1.0),
];

/// Weighted rarity table used to pick the tier of each drawn card.
///
/// The cumulative sums are computed once at construction and reused for every draw;
/// the table is immutable configuration, not runtime state. Weights are normalized
/// against their actual sum, so they do not need to add up to 100.
#[derive(Debug, Clone)]
pub struct BoosterTable {
    cumulative: Vec<(Rarity, f64)>,
    total: f64,
}

impl BoosterTable {
    /// Builds a booster table from ordered `(tier, weight)` pairs.
    ///
    /// Weights must be positive. The given order is preserved in the cumulative walk,
    /// which makes it the tie-break precedence for rolls landing on a boundary.
    pub fn new<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = (Rarity, f64)>,
    {
        let mut total = 0.0;
        let cumulative = weights
            .into_iter()
            .map(|(tier, weight)| {
                debug_assert!(weight > 0.0, "tier weights must be positive");
                total += weight;
                (tier, total)
            })
            .collect();

        Self { cumulative, total }
    }

    /// Returns the tiers of this table, in declared order.
    pub fn tiers(&self) -> impl Iterator<Item = Rarity> + '_ {
        self.cumulative.iter().map(|&(tier, _)| tier)
    }

    /// Picks a tier at random, following the table's weights.
    ///
    /// Returns `None` only for an empty table.
    pub fn pick<R>(&self, rng: &mut R) -> Option<Rarity>
    where
        R: Rng + ?Sized,
    {
        if self.cumulative.is_empty() {
            return None;
        }

        self.pick_at(rng.gen_range(0.0..self.total))
    }

    /// Resolves a roll in `[0, total)` against the cumulative walk.
    ///
    /// The first tier whose cumulative bound exceeds the roll wins.
    fn pick_at(&self, roll: f64) -> Option<Rarity> {
        self.cumulative
            .iter()
            .find(|&&(_, bound)| roll < bound)
            .map(|&(tier, _)| tier)
    }
}

impl Default for BoosterTable {
    /// Returns the standard booster table: Common=60, Rare=25, Ultra Rare=10,
    /// Legendary=4, Mythic=1.
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHTS)
    }
}

/// A single card drawn from a booster pack.
///
/// Serializes as the pokemon itself plus an `isNew` flag telling the caller whether
/// the card was absent from their unlock set when the draw started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DrawnCard {
    /// The drawn catalog entry.
    #[serde(flatten)]
    pub pokemon: Pokemon,

    /// Whether this card was locked for the drawing user before this draw.
    #[serde(rename = "isNew")]
    pub is_new: bool,
}

/// Outcome of one booster draw.
#[derive(Debug, Clone, Default)]
pub struct BoosterDraw {
    /// The drawn cards, in draw order. May contain fewer than the requested number
    /// of cards when a drawn tier had no catalog entries, and may contain duplicates.
    pub cards: Vec<DrawnCard>,

    /// Distinct ids of drawn cards that were not yet unlocked.
    ///
    /// Always a subset of the drawn card ids and disjoint from the pre-draw unlock set.
    pub newly_unlocked: HashSet<i64>,
}

/// Draws a booster pack.
///
/// Performs `draw_count` independent iterations. Each iteration picks a tier from
/// `table`, then a uniformly random entry from that tier's subset of `catalog`. A tier
/// with no catalog entries contributes nothing to the output; this is not an error,
/// so the result may hold fewer than `draw_count` cards (or none at all for an empty
/// catalog).
///
/// The `is_new` flag of every card is computed against `already_unlocked` as it was
/// passed in; a card drawn twice in the same pack whose id was locked beforehand is
/// flagged new both times, and appears once in
/// [`newly_unlocked`](BoosterDraw::newly_unlocked).
///
/// This function only computes; persisting the enlarged unlock set is the caller's
/// responsibility.
pub fn draw<R>(
    rng: &mut R,
    table: &BoosterTable,
    catalog: &HashMap<Rarity, Vec<Pokemon>>,
    already_unlocked: &HashSet<i64>,
    draw_count: usize,
) -> BoosterDraw
where
    R: Rng + ?Sized,
{
    let mut outcome = BoosterDraw::default();

    for _ in 0..draw_count {
        let Some(tier) = table.pick(rng) else {
            continue;
        };

        // Empty tier subset: skip this iteration, no fallback to another tier.
        let Some(entry) = catalog.get(&tier).and_then(|subset| subset.choose(rng)) else {
            continue;
        };

        let is_new = !already_unlocked.contains(&entry.id);
        if is_new {
            outcome.newly_unlocked.insert(entry.id);
        }

        outcome.cards.push(DrawnCard { pokemon: entry.clone(), is_new });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::models::pokemon::{Base, Name};

    fn catalog_pokemon(id: i64, base_total: i32) -> Pokemon {
        let base = Base {
            hp: base_total - 5,
            attack: 1,
            defense: 1,
            special_attack: 1,
            special_defense: 1,
            speed: 1,
        };

        Pokemon {
            id,
            name: Name {
                french: format!("Pokefoo_{}", id),
                english: format!("Pokefoo_{}", id),
                japanese: None,
                chinese: None,
            },
            types: vec!["normal".into()],
            rarity: Rarity::classify(&base),
            base,
            image: None,
            evolutions: vec![],
        }
    }

    mod booster_table {
        use super::*;

        #[test]
        fn test_default_weights_sum_to_100() {
            let table = BoosterTable::default();
            assert_eq!(100.0, table.total);
        }

        #[test]
        fn test_tiers_in_declared_order() {
            let table = BoosterTable::default();
            let tiers: Vec<Rarity> = table.tiers().collect();
            assert_eq!(
                vec![
                    Rarity::Common,
                    Rarity::Rare,
                    Rarity::UltraRare,
                    Rarity::Legendary,
                    Rarity::Mythic
                ],
                tiers
            );
        }

        #[test]
        fn test_pick_at_band_boundaries() {
            let table = BoosterTable::default();

            assert_eq!(Some(Rarity::Common), table.pick_at(0.0));
            assert_eq!(Some(Rarity::Common), table.pick_at(59.999));
            assert_eq!(Some(Rarity::Rare), table.pick_at(60.0));
            assert_eq!(Some(Rarity::Rare), table.pick_at(84.999));
            assert_eq!(Some(Rarity::UltraRare), table.pick_at(85.0));
            assert_eq!(Some(Rarity::Legendary), table.pick_at(95.0));
            assert_eq!(Some(Rarity::Mythic), table.pick_at(99.0));
            assert_eq!(Some(Rarity::Mythic), table.pick_at(99.999));
        }

        #[test]
        fn test_declared_order_breaks_boundary_ties() {
            // With equal weights, a roll of exactly 1.0 belongs to the second
            // declared tier, whatever that tier is.
            let table = BoosterTable::new([(Rarity::Legendary, 1.0), (Rarity::Common, 1.0)]);
            assert_eq!(Some(Rarity::Legendary), table.pick_at(0.999));
            assert_eq!(Some(Rarity::Common), table.pick_at(1.0));
        }

        #[test]
        fn test_weights_need_not_sum_to_100() {
            let table = BoosterTable::new([(Rarity::Common, 3.0), (Rarity::Rare, 1.0)]);
            assert_eq!(4.0, table.total);
            assert_eq!(Some(Rarity::Common), table.pick_at(2.999));
            assert_eq!(Some(Rarity::Rare), table.pick_at(3.0));
        }

        #[test]
        fn test_pick_from_empty_table() {
            let table = BoosterTable::new([]);
            let mut rng = StdRng::seed_from_u64(1);
            assert_eq!(None, table.pick(&mut rng));
        }

        #[test]
        fn test_tier_frequencies_follow_weights() {
            const TRIALS: usize = 100_000;

            let table = BoosterTable::default();
            let mut rng = StdRng::seed_from_u64(0xB005_7E12);

            let mut counts: HashMap<Rarity, usize> = HashMap::new();
            for _ in 0..TRIALS {
                *counts.entry(table.pick(&mut rng).unwrap()).or_default() += 1;
            }

            // Chi-square goodness of fit against the declared weights. Critical value
            // for df=4 at alpha=0.001 is 18.47; the seeded generator keeps this
            // deterministic.
            let mut chi_square = 0.0;
            for (tier, weight) in DEFAULT_WEIGHTS {
                let expected = TRIALS as f64 * weight / 100.0;
                let observed = counts.get(&tier).copied().unwrap_or(0) as f64;
                chi_square += (observed - expected).powi(2) / expected;
            }

            assert!(chi_square < 18.47, "chi-square statistic too high: {}", chi_square);
        }
    }

    mod draw {
        use super::*;

        fn full_catalog() -> HashMap<Rarity, Vec<Pokemon>> {
            [
                (Rarity::Common, vec![catalog_pokemon(1, 318), catalog_pokemon(2, 350)]),
                (Rarity::Rare, vec![catalog_pokemon(3, 420)]),
                (Rarity::UltraRare, vec![catalog_pokemon(4, 480)]),
                (Rarity::Legendary, vec![catalog_pokemon(5, 580)]),
                (Rarity::Mythic, vec![catalog_pokemon(6, 680)]),
            ]
            .into()
        }

        #[test]
        fn test_never_draws_more_than_requested() {
            let table = BoosterTable::default();
            let catalog = full_catalog();
            let unlocked = HashSet::new();
            let mut rng = StdRng::seed_from_u64(7);

            for _ in 0..100 {
                let outcome = draw(&mut rng, &table, &catalog, &unlocked, DEFAULT_DRAW_COUNT);
                // Every tier has entries here, so the pack is always full.
                assert_eq!(DEFAULT_DRAW_COUNT, outcome.cards.len());
            }
        }

        #[test]
        fn test_newly_unlocked_subset_of_drawn_and_disjoint_from_unlocked() {
            let table = BoosterTable::default();
            let catalog = full_catalog();
            let unlocked: HashSet<i64> = [1, 3, 5].into();
            let mut rng = StdRng::seed_from_u64(42);

            for _ in 0..100 {
                let outcome = draw(&mut rng, &table, &catalog, &unlocked, DEFAULT_DRAW_COUNT);

                let drawn_ids: HashSet<i64> =
                    outcome.cards.iter().map(|card| card.pokemon.id).collect();
                assert!(outcome.newly_unlocked.is_subset(&drawn_ids));
                assert!(outcome.newly_unlocked.is_disjoint(&unlocked));

                for card in &outcome.cards {
                    assert_eq!(!unlocked.contains(&card.pokemon.id), card.is_new);
                }
            }
        }

        #[test]
        fn test_empty_tier_contributes_nothing() {
            // Two equally likely tiers; one has no catalog entries. Successful draws
            // must all resolve to the populated tier, and packs may come up short.
            let table = BoosterTable::new([(Rarity::Common, 1.0), (Rarity::Rare, 1.0)]);
            let catalog: HashMap<Rarity, Vec<Pokemon>> =
                [(Rarity::Rare, vec![catalog_pokemon(3, 420)])].into();
            let unlocked = HashSet::new();
            let mut rng = StdRng::seed_from_u64(3);

            let mut saw_short_pack = false;
            for _ in 0..100 {
                let outcome = draw(&mut rng, &table, &catalog, &unlocked, 3);

                assert!(outcome.cards.len() <= 3);
                saw_short_pack |= outcome.cards.len() < 3;
                for card in &outcome.cards {
                    assert_eq!(Rarity::Rare, card.pokemon.rarity);
                    assert_eq!(3, card.pokemon.id);
                }
            }
            // With a fair coin per draw, 100 packs of 3 without a single miss on the
            // empty tier would be a broken generator.
            assert!(saw_short_pack);
        }

        #[test]
        fn test_fully_empty_catalog_yields_empty_draw() {
            let table = BoosterTable::default();
            let catalog = HashMap::new();
            let unlocked = HashSet::new();
            let mut rng = StdRng::seed_from_u64(11);

            let outcome = draw(&mut rng, &table, &catalog, &unlocked, DEFAULT_DRAW_COUNT);

            assert!(outcome.cards.is_empty());
            assert!(outcome.newly_unlocked.is_empty());
        }

        #[test]
        fn test_already_unlocked_duplicate_never_flagged_new() {
            // Single-entry catalog whose only id is already unlocked: both cards of a
            // 2-draw pack are that entry, flagged not-new, and nothing unlocks.
            let table = BoosterTable::new([(Rarity::Common, 1.0)]);
            let catalog: HashMap<Rarity, Vec<Pokemon>> =
                [(Rarity::Common, vec![catalog_pokemon(7, 318)])].into();
            let unlocked: HashSet<i64> = [7].into();
            let mut rng = StdRng::seed_from_u64(13);

            let outcome = draw(&mut rng, &table, &catalog, &unlocked, 2);

            assert_eq!(2, outcome.cards.len());
            for card in &outcome.cards {
                assert_eq!(7, card.pokemon.id);
                assert!(!card.is_new);
            }
            assert!(outcome.newly_unlocked.is_empty());
        }

        #[test]
        fn test_duplicate_within_pack_flagged_new_both_times() {
            // Same setup but the id is not yet unlocked: the flag is computed against
            // the pre-draw snapshot, so both copies are new, and the id unlocks once.
            let table = BoosterTable::new([(Rarity::Common, 1.0)]);
            let catalog: HashMap<Rarity, Vec<Pokemon>> =
                [(Rarity::Common, vec![catalog_pokemon(7, 318)])].into();
            let unlocked = HashSet::new();
            let mut rng = StdRng::seed_from_u64(17);

            let outcome = draw(&mut rng, &table, &catalog, &unlocked, 2);

            assert_eq!(2, outcome.cards.len());
            for card in &outcome.cards {
                assert_eq!(7, card.pokemon.id);
                assert!(card.is_new);
            }
            assert_eq!(HashSet::from([7]), outcome.newly_unlocked);
        }
    }

    mod drawn_card {
        use super::*;

        #[test]
        fn test_serializes_flat_with_is_new_flag() {
            let card = DrawnCard { pokemon: catalog_pokemon(1, 318), is_new: true };

            let value = serde_json::to_value(&card).unwrap();
            assert_eq!(1, value["id"]);
            assert_eq!("Pokefoo_1", value["name"]["english"]);
            assert_eq!("Common", value["rarity"]);
            assert_eq!(true, value["isNew"]);
            // The pokemon fields are flattened, not nested.
            assert!(value.get("pokemon").is_none());
        }
    }
}
