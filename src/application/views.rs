//! Directory views: the home page, listings, search, and the write hooks
//! that keep the cache honest.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::cache::{CacheKey, QueryCache};
use crate::application::error::AppError;
use crate::application::mentions::{self, GameWithMentions, MentionIndex};
use crate::application::pagination::{Page, paginate};
use crate::application::recommendations::{self, RecommendationEntry};
use crate::application::search;
use crate::application::store::Catalog;
use crate::domain::entities::{EpisodeRecord, GameRecord};
use crate::domain::error::DomainError;
use crate::domain::types::{Host, RecommendationCategory};

const HOME_LATEST_EPISODES: usize = 3;
const HOME_LATEST_GAMES: usize = 5;
const HOME_MOST_DISCUSSED: usize = 3;

/// Listing page sizes, one knob per surface.
#[derive(Debug, Clone, Copy)]
pub struct PageSizes {
    pub episodes: usize,
    pub games: usize,
    pub search: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            episodes: 10,
            games: 27,
            search: 10,
        }
    }
}

/// The assembled home page.
#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub latest_episodes: Vec<EpisodeRecord>,
    pub latest_games: Vec<GameRecord>,
    pub most_discussed_games: Vec<DiscussedGame>,
    pub featured_picks: Vec<GameRecord>,
}

/// A game annotated with how often it came up, for the home page.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussedGame {
    #[serde(flatten)]
    pub game: GameRecord,
    pub mention_count: u64,
}

/// Per-section page numbers for a combined search request.
#[derive(Debug, Clone, Copy)]
pub struct SearchPages {
    pub episodes: i64,
    pub games: i64,
    pub recommendations: i64,
}

impl Default for SearchPages {
    fn default() -> Self {
        Self {
            episodes: 1,
            games: 1,
            recommendations: 1,
        }
    }
}

/// The three independently paged sections of one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub episodes: Page<EpisodeRecord>,
    pub games: Page<GameRecord>,
    pub recommendations: Page<RecommendationEntry>,
}

/// Read and write entry point for every directory surface.
///
/// Reads share one [`QueryCache`]; writes go through the save hooks here so
/// cached collections are invalidated or patched in the same call.
pub struct DirectoryService {
    catalog: Catalog,
    cache: QueryCache,
    sizes: PageSizes,
}

impl DirectoryService {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_settings(catalog, QueryCache::new(), PageSizes::default())
    }

    pub fn with_settings(catalog: Catalog, cache: QueryCache, sizes: PageSizes) -> Self {
        Self {
            catalog,
            cache,
            sizes,
        }
    }

    /// The home page, cached as one unit.
    pub async fn home(&self) -> Result<Arc<HomeView>, AppError> {
        self.cache
            .get_or_compute(CacheKey::Home, || self.build_home())
            .await
    }

    async fn build_home(&self) -> Result<HomeView, AppError> {
        let episodes = self.cached_episodes().await?;
        let index = MentionIndex::aggregate(&episodes);

        let latest: Vec<_> = index.latest().into_iter().take(HOME_LATEST_GAMES).collect();
        let discussed: Vec<_> = index
            .most_discussed()
            .into_iter()
            .take(HOME_MOST_DISCUSSED)
            .collect();

        // One batch fetch covers both orderings; hydrate deduplicates.
        let ids: Vec<String> = latest
            .iter()
            .chain(discussed.iter())
            .map(|summary| summary.game_id.clone())
            .collect();
        let records = mentions::hydrate(&self.catalog, &ids).await?;

        let latest_games: Vec<GameRecord> = latest
            .iter()
            .filter_map(|summary| records.get(&summary.game_id).cloned())
            .collect();
        let most_discussed_games: Vec<DiscussedGame> = discussed
            .iter()
            .filter_map(|summary| {
                records.get(&summary.game_id).map(|game| DiscussedGame {
                    game: game.clone(),
                    mention_count: summary.count,
                })
            })
            .collect();

        let mut featured_picks: Vec<GameRecord> = self
            .catalog
            .games()
            .await?
            .into_iter()
            .filter(|game| game.featured_pick)
            .collect();
        featured_picks.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));

        debug!(
            latest_games = latest_games.len(),
            most_discussed = most_discussed_games.len(),
            featured_picks = featured_picks.len(),
            "rebuilt home view"
        );

        Ok(HomeView {
            latest_episodes: episodes.iter().take(HOME_LATEST_EPISODES).cloned().collect(),
            latest_games,
            most_discussed_games,
            featured_picks,
        })
    }

    /// The episodes listing, newest episode number first.
    pub async fn episodes(&self, query: &str, page: i64) -> Result<Page<EpisodeRecord>, AppError> {
        let episodes = self.cached_episodes().await?;
        let matches = search::filter_episodes(&episodes, query);
        Ok(paginate(&matches, page, self.sizes.episodes).into_owned())
    }

    /// The games listing, most recently mentioned first.
    pub async fn games(&self, query: &str, page: i64) -> Result<Page<GameWithMentions>, AppError> {
        let games = self.cached_games().await?;
        let matches = search::filter_discussed(&games, query);
        Ok(paginate(&matches, page, self.sizes.games).into_owned())
    }

    /// One query across episodes, games, and recommendations, each section
    /// paged on its own.
    ///
    /// The games section scans the full namespace rather than the mention-
    /// annotated listing, so never-mentioned games are still findable.
    pub async fn search(&self, query: &str, pages: SearchPages) -> Result<SearchResults, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults {
                query: String::new(),
                episodes: Page::empty(),
                games: Page::empty(),
                recommendations: Page::empty(),
            });
        }

        let episodes = self.cached_episodes().await?;
        let episode_matches = search::filter_episodes(&episodes, query);

        let mut games = self.catalog.games().await?;
        games.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        let game_matches = search::filter_games(&games, query);

        let entries = recommendations::extract(&episodes);
        let entry_matches = search::filter_recommendations(&entries, query);

        Ok(SearchResults {
            query: query.to_string(),
            episodes: paginate(&episode_matches, pages.episodes, self.sizes.search).into_owned(),
            games: paginate(&game_matches, pages.games, self.sizes.search).into_owned(),
            recommendations: paginate(&entry_matches, pages.recommendations, self.sizes.search)
                .into_owned(),
        })
    }

    /// Every host recommendation, newest episode first, optionally narrowed
    /// by host or category.
    pub async fn recommendations(
        &self,
        host: Option<Host>,
        category: Option<RecommendationCategory>,
    ) -> Result<Vec<RecommendationEntry>, AppError> {
        let episodes = self.cached_episodes().await?;
        let mut ordered = (*episodes).clone();
        ordered.sort_by(|a, b| b.date.cmp(&a.date));

        let mut entries = recommendations::extract(&ordered);
        if let Some(host) = host {
            entries.retain(|entry| entry.host == host);
        }
        if let Some(category) = category {
            entries.retain(|entry| entry.category == category);
        }
        Ok(entries)
    }

    /// Persist an episode and make it visible to readers immediately.
    pub async fn save_episode(&self, episode: &EpisodeRecord) -> Result<(), AppError> {
        validate_record(&episode.id, &episode.title)?;
        self.catalog.put_episode(episode).await?;

        // Mention stats may have shifted; those views rebuild on next read.
        self.cache.invalidate(CacheKey::Home);
        self.cache.invalidate(CacheKey::Games);
        self.cache.upsert_into(
            CacheKey::Episodes,
            episode.clone(),
            |cached: &EpisodeRecord| cached.id.as_str(),
            |a, b| b.episode_number.cmp(&a.episode_number),
        );

        info!(episode_id = %episode.id, episode_number = episode.episode_number, "saved episode");
        Ok(())
    }

    /// Persist a game and patch it into the cached listing where possible.
    pub async fn save_game(&self, game: &GameRecord) -> Result<(), AppError> {
        validate_record(&game.id, &game.title)?;
        self.catalog.put_game(game).await?;

        self.cache.invalidate(CacheKey::Home);
        if let Some(listing) = self.cache.peek::<Vec<GameWithMentions>>(CacheKey::Games)
            && let Some(existing) = listing.iter().find(|entry| entry.game.id == game.id)
        {
            // Mention stats are untouched by a game edit; carry them over.
            let updated = GameWithMentions {
                game: game.clone(),
                episode_count: existing.episode_count,
                last_mentioned: existing.last_mentioned,
            };
            self.cache.upsert_into(
                CacheKey::Games,
                updated,
                |cached: &GameWithMentions| cached.game.id.as_str(),
                |a, b| b.last_mentioned.cmp(&a.last_mentioned),
            );
        }

        info!(game_id = %game.id, "saved game");
        Ok(())
    }

    /// Toggle a game's featured flag and return the stored record.
    pub async fn set_featured_pick(
        &self,
        game_id: &str,
        featured: bool,
    ) -> Result<GameRecord, AppError> {
        let mut game = self
            .catalog
            .game(game_id)
            .await?
            .ok_or_else(|| DomainError::not_found("game"))?;
        game.featured_pick = featured;
        game.updated_at = OffsetDateTime::now_utc();
        self.save_game(&game).await?;
        Ok(game)
    }

    async fn cached_episodes(&self) -> Result<Arc<Vec<EpisodeRecord>>, AppError> {
        self.cache
            .get_or_compute(CacheKey::Episodes, || async {
                let mut episodes = self.catalog.episodes().await?;
                episodes.sort_by(|a, b| b.episode_number.cmp(&a.episode_number));
                Ok(episodes)
            })
            .await
    }

    async fn cached_games(&self) -> Result<Arc<Vec<GameWithMentions>>, AppError> {
        self.cache
            .get_or_compute(CacheKey::Games, || async {
                let episodes = self.cached_episodes().await?;
                let index = MentionIndex::aggregate(&episodes);
                let ordered = index.latest();

                let ids: Vec<String> = ordered
                    .iter()
                    .map(|summary| summary.game_id.clone())
                    .collect();
                let records = mentions::hydrate(&self.catalog, &ids).await?;

                Ok(ordered
                    .into_iter()
                    .filter_map(|summary| {
                        records.get(&summary.game_id).map(|game| GameWithMentions {
                            game: game.clone(),
                            episode_count: summary.count,
                            last_mentioned: summary.last_mentioned,
                        })
                    })
                    .collect())
            })
            .await
    }
}

fn validate_record(id: &str, title: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::validation("record id must not be empty"));
    }
    if title.trim().is_empty() {
        return Err(DomainError::validation("record title must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::application::store::{KeyValueStore, StoreError};
    use crate::domain::entities::{EpisodeSections, GameReference};
    use crate::domain::types::EpisodeKind;

    use super::*;

    #[derive(Default)]
    struct StubStore {
        data: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    }

    #[async_trait]
    impl KeyValueStore for StubStore {
        async fn scan(&self, namespace: &str) -> Result<Vec<Value>, StoreError> {
            let data = self.data.lock().expect("stub lock");
            Ok(data
                .get(namespace)
                .map(|records| records.values().cloned().collect())
                .unwrap_or_default())
        }

        async fn get(&self, namespace: &str, id: &str) -> Result<Option<Value>, StoreError> {
            let data = self.data.lock().expect("stub lock");
            Ok(data
                .get(namespace)
                .and_then(|records| records.get(id))
                .cloned())
        }

        async fn put(&self, namespace: &str, id: &str, record: Value) -> Result<(), StoreError> {
            let mut data = self.data.lock().expect("stub lock");
            data.entry(namespace.to_string())
                .or_default()
                .insert(id.to_string(), record);
            Ok(())
        }
    }

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

    fn game(id: &str, title: &str) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            igdb_id: 0,
            title: title.to_string(),
            summary: None,
            cover: None,
            release_date: None,
            developers: Vec::new(),
            publishers: Vec::new(),
            platforms: Vec::new(),
            genres: Vec::new(),
            featured_pick: false,
            updated_at: datetime!(2023-01-01 00:00:00 UTC),
        }
    }

    async fn seeded_service() -> DirectoryService {
        let catalog = Catalog::new(Arc::new(StubStore::default()));
        let service = DirectoryService::new(catalog);

        for (id, title) in [("g1", "Alpha Quest"), ("g2", "Beta Blast"), ("g3", "Gamma Run")] {
            service
                .catalog
                .put_game(&game(id, title))
                .await
                .expect("seeded game");
        }
        for record in [
            episode(1, datetime!(2023-01-01 00:00:00 UTC), &["g1"]),
            episode(2, datetime!(2023-02-01 00:00:00 UTC), &["g1", "g2"]),
            episode(3, datetime!(2023-03-01 00:00:00 UTC), &["g1", "g3"]),
            episode(4, datetime!(2023-04-01 00:00:00 UTC), &[]),
        ] {
            service
                .catalog
                .put_episode(&record)
                .await
                .expect("seeded episode");
        }
        service
    }

    #[tokio::test]
    async fn home_assembles_every_section() {
        let service = seeded_service().await;
        let mut pick = game("g2", "Beta Blast");
        pick.featured_pick = true;
        service.catalog.put_game(&pick).await.expect("flagged pick");

        let home = service.home().await.expect("home view");

        let latest: Vec<u32> = home
            .latest_episodes
            .iter()
            .map(|e| e.episode_number)
            .collect();
        assert_eq!(latest, vec![4, 3, 2]);

        let latest_games: Vec<&str> =
            home.latest_games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(latest_games, vec!["g1", "g3", "g2"]);

        let discussed: Vec<(&str, u64)> = home
            .most_discussed_games
            .iter()
            .map(|d| (d.game.id.as_str(), d.mention_count))
            .collect();
        assert_eq!(discussed, vec![("g1", 3), ("g3", 1), ("g2", 1)]);

        let picks: Vec<&str> = home.featured_picks.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(picks, vec!["g2"]);
    }

    #[tokio::test]
    async fn games_listing_drops_dangling_references() {
        let service = seeded_service().await;
        service
            .catalog
            .put_episode(&episode(5, datetime!(2023-05-01 00:00:00 UTC), &["gone"]))
            .await
            .expect("episode with dangling reference");

        let page = service.games("", 1).await.expect("games listing");

        let ids: Vec<&str> = page.items.iter().map(|g| g.game.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g3", "g2"]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn saved_episode_is_visible_before_expiry() {
        let service = seeded_service().await;
        service.episodes("", 1).await.expect("primed listing");

        service
            .save_episode(&episode(9, datetime!(2023-09-01 00:00:00 UTC), &[]))
            .await
            .expect("saved episode");

        let page = service.episodes("", 1).await.expect("refreshed listing");
        assert_eq!(page.items[0].episode_number, 9);
        assert_eq!(page.total, 5);
    }

    #[tokio::test]
    async fn search_with_blank_query_returns_empty_pages() {
        let service = seeded_service().await;
        let results = service
            .search("   ", SearchPages::default())
            .await
            .expect("search results");

        assert!(results.query.is_empty());
        assert_eq!(results.episodes, Page::empty());
        assert_eq!(results.games, Page::empty());
        assert!(results.recommendations.items.is_empty());
    }

    #[tokio::test]
    async fn search_finds_never_mentioned_games() {
        let service = seeded_service().await;
        service
            .catalog
            .put_game(&game("g9", "Quiet Gem"))
            .await
            .expect("unmentioned game");

        let results = service
            .search("quiet gem", SearchPages::default())
            .await
            .expect("search results");

        assert_eq!(results.games.items.len(), 1);
        assert_eq!(results.games.items[0].id, "g9");
        assert!(results.episodes.items.is_empty());
    }

    #[tokio::test]
    async fn invalid_record_is_rejected_before_the_store() {
        let service = seeded_service().await;
        let mut blank = episode(10, datetime!(2023-10-01 00:00:00 UTC), &[]);
        blank.title = "   ".to_string();

        let result = service.save_episode(&blank).await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Validation { .. }))
        ));
    }

    #[tokio::test]
    async fn set_featured_pick_round_trips_through_the_store() {
        let service = seeded_service().await;

        let flagged = service
            .set_featured_pick("g3", true)
            .await
            .expect("flagged game");
        assert!(flagged.featured_pick);

        let stored = service
            .catalog
            .game("g3")
            .await
            .expect("lookup")
            .expect("stored game");
        assert!(stored.featured_pick);

        let missing = service.set_featured_pick("nope", true).await;
        assert!(matches!(
            missing,
            Err(AppError::Domain(DomainError::NotFound { .. }))
        ));
    }
}
