//! Single-pass aggregation of per-game mention counts and recency.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::store::{Catalog, StoreError};
use crate::domain::entities::{EpisodeRecord, GameRecord};

/// Derived per-game mention statistics.
///
/// `count` equals the number of episodes whose reference list names the
/// game; `last_mentioned` is the maximum date among them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionSummary {
    pub game_id: String,
    pub count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_mentioned: OffsetDateTime,
}

/// Result of one aggregation pass over an episode set.
///
/// Encounter order is retained so the derived orderings can break ties
/// deterministically even when the store's scan order shifts between calls.
pub struct MentionIndex {
    order: Vec<String>,
    by_game: HashMap<String, MentionSummary>,
}

impl MentionIndex {
    /// Aggregate every game reference in `episodes` in one linear pass.
    pub fn aggregate(episodes: &[EpisodeRecord]) -> Self {
        let mut order = Vec::new();
        let mut by_game: HashMap<String, MentionSummary> = HashMap::new();

        for episode in episodes {
            for reference in &episode.games {
                match by_game.get_mut(&reference.id) {
                    Some(summary) => {
                        summary.count += 1;
                        if episode.date > summary.last_mentioned {
                            summary.last_mentioned = episode.date;
                        }
                    }
                    None => {
                        order.push(reference.id.clone());
                        by_game.insert(
                            reference.id.clone(),
                            MentionSummary {
                                game_id: reference.id.clone(),
                                count: 1,
                                last_mentioned: episode.date,
                            },
                        );
                    }
                }
            }
        }

        Self { order, by_game }
    }

    pub fn get(&self, game_id: &str) -> Option<&MentionSummary> {
        self.by_game.get(game_id)
    }

    pub fn len(&self) -> usize {
        self.by_game.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_game.is_empty()
    }

    /// Summaries by most recent mention, newest first.
    ///
    /// The sort is stable; equal dates keep encounter order.
    pub fn latest(&self) -> Vec<&MentionSummary> {
        let mut summaries = self.in_encounter_order();
        summaries.sort_by(|a, b| b.last_mentioned.cmp(&a.last_mentioned));
        summaries
    }

    /// Summaries by mention count, recency breaking ties.
    pub fn most_discussed(&self) -> Vec<&MentionSummary> {
        let mut summaries = self.in_encounter_order();
        summaries.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.last_mentioned.cmp(&a.last_mentioned))
        });
        summaries
    }

    fn in_encounter_order(&self) -> Vec<&MentionSummary> {
        self.order
            .iter()
            .filter_map(|id| self.by_game.get(id))
            .collect()
    }
}

/// Batch-resolve every id the callers' orderings require.
///
/// Ids with no matching game record are dropped from the map; a dangling
/// reference is a normal condition here, not an error.
pub async fn hydrate(
    catalog: &Catalog,
    ids: &[String],
) -> Result<HashMap<String, GameRecord>, StoreError> {
    let found = catalog.games_by_id(ids).await?;

    let mut reported: HashSet<&str> = HashSet::new();
    for id in ids {
        if !found.contains_key(id) && reported.insert(id) {
            debug!(game_id = %id, "dropping dangling game reference");
        }
    }

    Ok(found)
}

/// A game annotated with its mention statistics, as the games listing
/// presents it.
#[derive(Debug, Clone, Serialize)]
pub struct GameWithMentions {
    #[serde(flatten)]
    pub game: GameRecord,
    pub episode_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_mentioned: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::domain::entities::{EpisodeSections, GameReference};
    use crate::domain::types::EpisodeKind;

    use super::*;

    fn episode(number: u32, date: OffsetDateTime, game_ids: &[&str]) -> EpisodeRecord {
        EpisodeRecord {
            id: format!("ep-{number}"),
            episode_number: number,
            date,
            title: format!("Episode {number}"),
            description: String::new(),
            sections: EpisodeSections::default(),
            duration: String::new(),
            audio_url: String::new(),
            authors: String::new(),
            explicit: false,
            kind: EpisodeKind::Full,
            games: game_ids
                .iter()
                .map(|id| GameReference {
                    id: (*id).to_string(),
                    title: id.to_uppercase(),
                    igdb_id: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn counts_and_dates_follow_the_reference_lists() {
        let episodes = vec![
            episode(1, datetime!(2023-01-01 00:00:00 UTC), &["g1"]),
            episode(2, datetime!(2023-02-01 00:00:00 UTC), &["g1", "g2"]),
            episode(3, datetime!(2023-03-01 00:00:00 UTC), &["g1"]),
        ];

        let index = MentionIndex::aggregate(&episodes);

        let g1 = index.get("g1").expect("g1 summary");
        assert_eq!(g1.count, 3);
        assert_eq!(g1.last_mentioned, datetime!(2023-03-01 00:00:00 UTC));

        let g2 = index.get("g2").expect("g2 summary");
        assert_eq!(g2.count, 1);
        assert_eq!(g2.last_mentioned, datetime!(2023-02-01 00:00:00 UTC));
    }

    #[test]
    fn mention_counts_sum_to_total_reference_count() {
        let episodes = vec![
            episode(1, datetime!(2023-01-01 00:00:00 UTC), &["g1", "g2", "g3"]),
            episode(2, datetime!(2023-02-01 00:00:00 UTC), &["g2"]),
            episode(3, datetime!(2023-03-01 00:00:00 UTC), &["g1", "g3"]),
        ];

        let index = MentionIndex::aggregate(&episodes);

        let total_references: usize = episodes.iter().map(|e| e.games.len()).sum();
        let total_counts: u64 = ["g1", "g2", "g3"]
            .iter()
            .map(|id| index.get(id).expect("summary").count)
            .sum();
        assert_eq!(total_counts, total_references as u64);
    }

    #[test]
    fn repeat_mentions_outrank_a_single_recent_one() {
        // G1 referenced at D1 < D2 < D3; G2 referenced once at D2.
        let episodes = vec![
            episode(1, datetime!(2023-01-01 00:00:00 UTC), &["g1"]),
            episode(2, datetime!(2023-02-01 00:00:00 UTC), &["g1", "g2"]),
            episode(3, datetime!(2023-03-01 00:00:00 UTC), &["g1"]),
        ];

        let index = MentionIndex::aggregate(&episodes);

        let most_discussed: Vec<&str> = index
            .most_discussed()
            .iter()
            .map(|s| s.game_id.as_str())
            .collect();
        assert_eq!(most_discussed, vec!["g1", "g2"]);

        let latest: Vec<&str> = index.latest().iter().map(|s| s.game_id.as_str()).collect();
        assert_eq!(latest, vec!["g1", "g2"]);
    }

    #[test]
    fn latest_breaks_date_ties_by_encounter_order() {
        let same_day = datetime!(2023-05-01 00:00:00 UTC);
        let episodes = vec![episode(1, same_day, &["g1", "g2", "g3"])];

        let index = MentionIndex::aggregate(&episodes);

        let latest: Vec<&str> = index.latest().iter().map(|s| s.game_id.as_str()).collect();
        assert_eq!(latest, vec!["g1", "g2", "g3"]);
    }

    #[test]
    fn most_discussed_breaks_count_ties_by_recency() {
        let episodes = vec![
            episode(1, datetime!(2023-01-01 00:00:00 UTC), &["g1"]),
            episode(2, datetime!(2023-06-01 00:00:00 UTC), &["g2"]),
        ];

        let index = MentionIndex::aggregate(&episodes);

        let most_discussed: Vec<&str> = index
            .most_discussed()
            .iter()
            .map(|s| s.game_id.as_str())
            .collect();
        assert_eq!(most_discussed, vec!["g2", "g1"]);
    }

    #[test]
    fn empty_episode_set_yields_empty_index() {
        let index = MentionIndex::aggregate(&[]);
        assert!(index.is_empty());
        assert!(index.latest().is_empty());
        assert!(index.most_discussed().is_empty());
    }
}
