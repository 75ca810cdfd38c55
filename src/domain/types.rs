//! Closed enumerations shared by episode and game records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category tag attached to a recommendation slot.
///
/// Stored and author-supplied; never inferred from the slot's content text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Game,
    Book,
    #[serde(rename = "TV-Show")]
    TvShow,
    Movie,
    Podcast,
    #[default]
    Misc,
}

impl RecommendationCategory {
    pub const ALL: [RecommendationCategory; 6] = [
        RecommendationCategory::Game,
        RecommendationCategory::Book,
        RecommendationCategory::TvShow,
        RecommendationCategory::Movie,
        RecommendationCategory::Podcast,
        RecommendationCategory::Misc,
    ];

    /// Wire/display name, matching the stored serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Game => "Game",
            RecommendationCategory::Book => "Book",
            RecommendationCategory::TvShow => "TV-Show",
            RecommendationCategory::Movie => "Movie",
            RecommendationCategory::Podcast => "Podcast",
            RecommendationCategory::Misc => "Misc",
        }
    }
}

impl fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of hosts, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    Kirk,
    Maddy,
    Jason,
}

impl Host {
    /// Ordering used wherever per-host slots are flattened.
    pub const ALL: [Host; 3] = [Host::Kirk, Host::Maddy, Host::Jason];

    /// Capitalized display name.
    pub fn name(&self) -> &'static str {
        match self {
            Host::Kirk => "Kirk",
            Host::Maddy => "Maddy",
            Host::Jason => "Jason",
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feed-level episode kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeKind {
    #[default]
    Full,
    Bonus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_wire_names() {
        for category in RecommendationCategory::ALL {
            let encoded = serde_json::to_string(&category).expect("encoded category");
            assert_eq!(encoded, format!("\"{category}\""));
            let decoded: RecommendationCategory =
                serde_json::from_str(&encoded).expect("decoded category");
            assert_eq!(decoded, category);
        }
    }

    #[test]
    fn tv_show_uses_hyphenated_wire_name() {
        let decoded: RecommendationCategory =
            serde_json::from_str("\"TV-Show\"").expect("decoded tv show");
        assert_eq!(decoded, RecommendationCategory::TvShow);
    }

    #[test]
    fn hosts_serialize_lowercase_and_display_capitalized() {
        let encoded = serde_json::to_string(&Host::Maddy).expect("encoded host");
        assert_eq!(encoded, "\"maddy\"");
        assert_eq!(Host::Maddy.to_string(), "Maddy");
    }

    #[test]
    fn host_order_is_kirk_maddy_jason() {
        assert_eq!(Host::ALL, [Host::Kirk, Host::Maddy, Host::Jason]);
    }
}
