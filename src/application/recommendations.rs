//! Flattening of per-host recommendation slots into a uniform list.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::entities::EpisodeRecord;
use crate::domain::types::{Host, RecommendationCategory};

/// One host recommendation, denormalized with a snapshot of its episode so
/// consumers need no further lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEntry {
    pub content: String,
    pub category: RecommendationCategory,
    pub host: Host,
    pub episode_id: String,
    pub episode_title: String,
    pub episode_number: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// Emit one entry per non-empty slot, episode order then fixed host order.
pub fn extract(episodes: &[EpisodeRecord]) -> Vec<RecommendationEntry> {
    let mut entries = Vec::new();
    for episode in episodes {
        for (host, slot) in episode.recommendation_slots() {
            if slot.is_empty() {
                continue;
            }
            entries.push(RecommendationEntry {
                content: slot.content.clone(),
                category: slot.category,
                host,
                episode_id: episode.id.clone(),
                episode_title: episode.title.clone(),
                episode_number: episode.episode_number,
                date: episode.date,
            });
        }
    }
    entries
}
