use crate::{
    decimal::DecimalString,
    models::{CollectionEntry, OccupancyEntry},
};

pub const POSTER_PLACEHOLDER: &str = "https://placehold.co/600x900/18181b/ffffff?text=No+Poster";
pub const BACKDROP_PLACEHOLDER: &str =
    "https://placehold.co/1920x1080/18181b/ffffff?text=No+Backdrop";
pub const ACTOR_PLACEHOLDER: &str = "https://placehold.co/200x200/3f3f46/ffffff?text=Actor";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const UNKNOWN_TITLE: &str = "Unknown Movie";

/// Stand-in figures shown when nobody has curated a movie yet.
#[derive(Clone, Debug)]
pub struct StaticDefaults {
    pub total_collection: DecimalString,
    pub budget: DecimalString,
    pub advance_bookings: DecimalString,
    pub language_wise: Vec<CollectionEntry>,
    pub country_wise: Vec<CollectionEntry>,
    pub day_wise: Vec<CollectionEntry>,
    pub occupancy: Vec<OccupancyEntry>,
    /// Comma-joined, the way editors type them.
    pub tags: String,
    pub popularity: f64,
    pub review_rating: i64,
    pub external_review_rating: f64,
}

fn entry(label: &str, amount: u64) -> CollectionEntry {
    CollectionEntry { label: label.to_string(), amount: amount.into() }
}

fn occupancy(day: &str, occupancy: f64) -> OccupancyEntry {
    OccupancyEntry { day: day.to_string(), occupancy }
}

impl Default for StaticDefaults {
    fn default() -> Self {
        Self {
            total_collection: 1_250_000_000.into(),
            budget: 450_000_000.into(),
            advance_bookings: 150_000_000.into(),
            language_wise: vec![
                entry("Hindi", 850_000_000),
                entry("Telugu", 250_000_000),
                entry("Tamil", 100_000_000),
                entry("Others", 50_000_000),
            ],
            country_wise: vec![
                entry("Domestic (India)", 1_050_000_000),
                entry("International", 200_000_000),
            ],
            day_wise: vec![
                entry("Fri", 300_000_000),
                entry("Sat", 450_000_000),
                entry("Sun", 400_000_000),
                entry("Mon", 60_000_000),
                entry("Tue", 40_000_000),
            ],
            occupancy: vec![
                occupancy("Fri", 85.0),
                occupancy("Sat", 95.0),
                occupancy("Sun", 98.0),
                occupancy("Mon", 40.0),
                occupancy("Tue", 35.0),
            ],
            tags: "Blockbuster, Action-Packed, Massive Hit, Family Choice, Trending in India"
                .to_string(),
            popularity: 98.5,
            review_rating: 5,
            external_review_rating: 7.0,
        }
    }
}

impl StaticDefaults {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect()
    }
}
