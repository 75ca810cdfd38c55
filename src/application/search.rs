//! Case-insensitive multi-field substring filtering.
//!
//! Every filter treats an empty query as the identity. A non-empty query is
//! lowercased once and tested with logical OR across an ordered field list
//! per entity; the first matching field short-circuits the rest, so field
//! order only affects cost, never the outcome. Optional fields read as
//! empty strings.

use crate::application::mentions::GameWithMentions;
use crate::application::recommendations::RecommendationEntry;
use crate::domain::entities::{EpisodeRecord, GameRecord};

pub fn filter_episodes<'a>(episodes: &'a [EpisodeRecord], query: &str) -> Vec<&'a EpisodeRecord> {
    if query.is_empty() {
        return episodes.iter().collect();
    }
    let needle = query.to_lowercase();
    episodes
        .iter()
        .filter(|episode| episode_matches(episode, &needle))
        .collect()
}

pub fn filter_games<'a>(games: &'a [GameRecord], query: &str) -> Vec<&'a GameRecord> {
    if query.is_empty() {
        return games.iter().collect();
    }
    let needle = query.to_lowercase();
    games.iter().filter(|game| game_matches(game, &needle)).collect()
}

/// [`filter_games`] over the mention-annotated listing shape.
pub fn filter_discussed<'a>(
    games: &'a [GameWithMentions],
    query: &str,
) -> Vec<&'a GameWithMentions> {
    if query.is_empty() {
        return games.iter().collect();
    }
    let needle = query.to_lowercase();
    games
        .iter()
        .filter(|entry| game_matches(&entry.game, &needle))
        .collect()
}

pub fn filter_recommendations<'a>(
    entries: &'a [RecommendationEntry],
    query: &str,
) -> Vec<&'a RecommendationEntry> {
    if query.is_empty() {
        return entries.iter().collect();
    }
    let needle = query.to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            contains(&entry.content, &needle) || contains(&entry.episode_title, &needle)
        })
        .collect()
}

fn episode_matches(episode: &EpisodeRecord, needle: &str) -> bool {
    contains(&episode.title, needle)
        || contains(&episode.description, needle)
        || episode.episode_number.to_string().contains(needle)
        || episode
            .games
            .iter()
            .any(|reference| contains(&reference.title, needle))
        || contains(&episode.sections.main_text, needle)
        || episode
            .recommendation_slots()
            .iter()
            .any(|(_, slot)| contains(&slot.content, needle))
}

fn game_matches(game: &GameRecord, needle: &str) -> bool {
    contains(&game.title, needle)
        || opt_contains(game.summary.as_deref(), needle)
        || game.developers.iter().any(|name| contains(name, needle))
        || game.publishers.iter().any(|name| contains(name, needle))
        || game.platforms.iter().any(|name| contains(name, needle))
        || game.genres.iter().any(|name| contains(name, needle))
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn opt_contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|text| contains(text, needle))
}
