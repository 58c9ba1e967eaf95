use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decimal::{self, DecimalString};

/// Keys the server owns; never accepted from a client as open-schema extras.
pub const RESERVED_KEYS: &[&str] = &["created_at", "updated_at", "createdAt", "updatedAt", "_id", "__v"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movie,
    Tv,
}

impl Category {
    /// Path segment TMDB uses for this category.
    pub fn as_path(self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Tv => "tv",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Category::Movie => Category::Tv,
            Category::Tv => Category::Movie,
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" | "movies" => Ok(Category::Movie),
            "tv" | "series" => Ok(Category::Tv),
            other => Err(format!("unknown category `{other}`")),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    #[serde(alias = "language", alias = "country", alias = "day", alias = "category")]
    pub label: String,
    #[serde(alias = "collection")]
    pub amount: DecimalString,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEntry {
    pub day: String,
    pub occupancy: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// One curated movie document.
///
/// Named fields cover everything the resolver and the admin form know about.
/// Anything else a client sends lands in `extra` and is written back out
/// alongside the named fields. The aliases accept the field names the admin
/// tooling and the CMS export have always used.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(alias = "m_id", default)]
    pub movie_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(alias = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(alias = "releaseDate", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,

    #[serde(
        alias = "TotalCollection",
        default,
        deserialize_with = "decimal::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_collection: Option<DecimalString>,
    #[serde(
        alias = "budzet",
        default,
        deserialize_with = "decimal::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub budget: Option<DecimalString>,
    #[serde(
        alias = "advanceBookings",
        default,
        deserialize_with = "decimal::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub advance_bookings: Option<DecimalString>,

    #[serde(alias = "LanguageWiseCollection", default, skip_serializing_if = "Option::is_none")]
    pub language_wise: Option<Vec<CollectionEntry>>,
    #[serde(alias = "CountryWiseCollection", default, skip_serializing_if = "Option::is_none")]
    pub country_wise: Option<Vec<CollectionEntry>>,
    #[serde(alias = "DayWiseCollection", default, skip_serializing_if = "Option::is_none")]
    pub day_wise: Option<Vec<CollectionEntry>>,
    #[serde(alias = "OccupancyDayWise", default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<Vec<OccupancyEntry>>,

    #[serde(alias = "Tags", default)]
    pub tags: Vec<String>,
    #[serde(alias = "Reviews", default)]
    pub reviews: Vec<Review>,
    #[serde(alias = "Popularity", default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,

    #[serde(alias = "inCinemas", default)]
    pub in_cinemas: bool,
    #[serde(alias = "isHOTYear", default)]
    pub is_hot_year: bool,
    #[serde(alias = "isUpcoming", default)]
    pub is_upcoming: bool,
    #[serde(default)]
    pub carousel: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieRecord {
    /// Drops server-owned keys a client may have echoed back into the open map.
    pub fn strip_reserved(&mut self) {
        self.extra.retain(|k, _| !RESERVED_KEYS.contains(&k.as_str()));
    }
}

/// A stored record plus the timestamps the store stamps on it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredMovie {
    #[serde(flatten)]
    pub record: MovieRecord,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CastMember {
    pub name: String,
    pub role: String,
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayReview {
    pub user: String,
    pub date: Option<String>,
    pub rating: f64,
    pub comment: String,
}

/// The fully resolved movie handed to the rendering layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub id: String,
    pub category: Category,
    pub title: String,
    pub poster: String,
    pub backdrop: String,
    pub release_date: Option<String>,
    pub year: String,
    pub rating: f64,
    pub about: String,
    pub genres: Vec<String>,
    pub duration: u32,
    pub director: String,
    pub cast: Vec<CastMember>,
    pub trailer: Option<String>,

    pub total_collection: DecimalString,
    pub budget: DecimalString,
    pub advance_bookings: DecimalString,

    pub language_wise: Vec<CollectionEntry>,
    pub country_wise: Vec<CollectionEntry>,
    pub day_wise: Vec<CollectionEntry>,
    pub occupancy: Vec<OccupancyEntry>,
    pub occupancy_headline: String,

    pub tags: Vec<String>,
    pub popularity: f64,
    pub reviews: Vec<DisplayReview>,

    pub in_cinemas: bool,
    pub is_hot_year: bool,
    pub is_upcoming: bool,
    pub carousel: bool,
}

/// A store record dressed with whatever TMDB knows about it, for listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogCard {
    pub movie_id: String,
    pub slug: Option<String>,
    pub title: String,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub overview: Option<String>,
    pub total_collection: Option<DecimalString>,
    pub in_cinemas: bool,
    pub is_hot_year: bool,
    pub is_upcoming: bool,
    pub carousel: bool,
    pub created_at: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HomeFeed {
    pub carousel: Vec<CatalogCard>,
    pub hot_year: Vec<CatalogCard>,
    pub in_cinemas: Vec<CatalogCard>,
    pub upcoming: Vec<CatalogCard>,
}

/// The JSON envelope every API response uses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), count: None, message: None, error: None, errors: None }
    }

    pub fn list(data: T, count: usize) -> Self {
        Self { count: Some(count), ..Self::ok(data) }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn failure() -> Self {
        Self { success: false, data: None, count: None, message: None, error: None, errors: None }
    }
}
