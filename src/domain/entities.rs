//! Domain entities mirrored from the key-value store.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{EpisodeKind, Host, RecommendationCategory};

/// One podcast episode, keyed by its feed guid.
///
/// Mutated in place by edits; never structurally deleted in normal
/// operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub episode_number: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub sections: EpisodeSections,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub kind: EpisodeKind,
    #[serde(default)]
    pub games: Vec<GameReference>,
}

impl EpisodeRecord {
    /// Recommendation slots paired with their host, in fixed host order.
    pub fn recommendation_slots(&self) -> [(Host, &RecommendationSlot); 3] {
        let omt = &self.sections.one_more_thing;
        [
            (Host::Kirk, &omt.kirk),
            (Host::Maddy, &omt.maddy),
            (Host::Jason, &omt.jason),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSections {
    #[serde(default)]
    pub main_text: String,
    #[serde(default)]
    pub one_more_thing: OneMoreThing,
}

/// The fixed per-host recommendation block of an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneMoreThing {
    #[serde(default)]
    pub kirk: RecommendationSlot,
    #[serde(default)]
    pub maddy: RecommendationSlot,
    #[serde(default)]
    pub jason: RecommendationSlot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSlot {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: RecommendationCategory,
}

impl RecommendationSlot {
    /// A slot with blank content emits no recommendation entry.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Denormalized weak pointer from an episode to a game.
///
/// Ownership of the full record lies in the games namespace; the reference
/// may dangle if the game is removed, and consumers treat that as normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReference {
    pub id: String,
    pub title: String,
    pub igdb_id: i64,
}

/// One discussed game, keyed by its internal id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub igdb_id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub cover: Option<CoverArt>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub release_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub featured_pick: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverArt {
    #[serde(default)]
    pub thumb_url: Option<String>,
    #[serde(default)]
    pub full_url: Option<String>,
}
