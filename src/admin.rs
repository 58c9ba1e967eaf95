//! The operator form: loose text fields in, a validated record out.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    decimal::DecimalString,
    error::{AppError, AppResult},
    identifier::slug_for_title,
    models::{CollectionEntry, MovieRecord, OccupancyEntry, Review},
};

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("trailing comma pattern"));
static PROPERTY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"[A-Za-z0-9_]+"\s*:\s*([\[{])"#).expect("property pattern"));

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    #[default]
    Create,
    Update,
}

/// What the admin page posts. Every table arrives as JSON text typed by hand.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MovieForm {
    #[serde(alias = "m_id")]
    pub movie_id: String,
    pub title: String,
    pub slug: String,
    #[serde(alias = "TotalCollection")]
    pub total_collection: String,
    #[serde(alias = "budzet")]
    pub budget: String,
    #[serde(alias = "advanceBookings")]
    pub advance_bookings: String,
    #[serde(alias = "Popularity")]
    pub popularity: String,
    /// Comma separated.
    #[serde(alias = "Tags")]
    pub tags: String,

    #[serde(alias = "inCinemas")]
    pub in_cinemas: bool,
    #[serde(alias = "isHOTYear")]
    pub is_hot_year: bool,
    #[serde(alias = "isUpcoming")]
    pub is_upcoming: bool,
    pub carousel: bool,

    #[serde(alias = "LanguageWiseCollection")]
    pub language_wise: String,
    #[serde(alias = "CountryWiseCollection")]
    pub country_wise: String,
    #[serde(alias = "DayWiseCollection")]
    pub day_wise: String,
    #[serde(alias = "OccupancyDayWise")]
    pub occupancy: String,
    #[serde(alias = "Reviews")]
    pub reviews: String,

    pub mode: FormMode,
}

impl MovieForm {
    /// Applies the form on top of `base`, which is the stored record when
    /// updating so fields the form does not show survive the save.
    ///
    /// Every problem is collected before failing, keyed by form field.
    pub fn validate(self, base: MovieRecord) -> AppResult<MovieRecord> {
        let mut errors = BTreeMap::new();

        let movie_id = self.movie_id.trim().to_string();
        if movie_id.is_empty() {
            errors.insert("movie_id".to_string(), "Movie ID (m_id) is required".to_string());
        }

        let total_collection = money(&self.total_collection, "total_collection", &mut errors);
        let budget = money(&self.budget, "budget", &mut errors);
        let advance_bookings = money(&self.advance_bookings, "advance_bookings", &mut errors);

        let language_wise: Option<Vec<CollectionEntry>> =
            blob(&self.language_wise, "language_wise", &mut errors);
        let country_wise: Option<Vec<CollectionEntry>> =
            blob(&self.country_wise, "country_wise", &mut errors);
        let day_wise: Option<Vec<CollectionEntry>> = blob(&self.day_wise, "day_wise", &mut errors);
        let occupancy: Option<Vec<OccupancyEntry>> =
            blob(&self.occupancy, "occupancy", &mut errors);
        let reviews: Option<Vec<Review>> = blob(&self.reviews, "reviews", &mut errors);

        if !errors.is_empty() {
            return Err(AppError::InvalidFields(errors));
        }

        let title = Some(self.title.trim().to_string()).filter(|t| !t.is_empty());
        let mut slug = self.slug.trim().to_string();
        if slug.is_empty() && self.mode == FormMode::Create {
            slug = title.as_deref().map(slug_for_title).unwrap_or_default();
        }

        let popularity = self.popularity.trim().parse::<f64>().ok().filter(|p| p.is_finite());

        Ok(MovieRecord {
            movie_id,
            slug: Some(slug).filter(|s| !s.is_empty()),
            title,
            total_collection,
            budget,
            advance_bookings,
            popularity: Some(popularity.unwrap_or(0.0)),
            tags: split_tags(&self.tags),
            language_wise,
            country_wise,
            day_wise,
            occupancy,
            reviews: reviews.unwrap_or_default(),
            in_cinemas: self.in_cinemas,
            is_hot_year: self.is_hot_year,
            is_upcoming: self.is_upcoming,
            carousel: self.carousel,
            ..base
        })
    }
}

/// Loads a stored record back into the form, in update mode.
pub fn form_from_record(record: &MovieRecord) -> AppResult<MovieForm> {
    fn text(value: &Option<DecimalString>) -> String {
        value.as_ref().map(|d| d.as_str().to_string()).unwrap_or_default()
    }

    Ok(MovieForm {
        movie_id: record.movie_id.clone(),
        title: record.title.clone().unwrap_or_default(),
        slug: record.slug.clone().unwrap_or_default(),
        total_collection: text(&record.total_collection),
        budget: text(&record.budget),
        advance_bookings: text(&record.advance_bookings),
        popularity: record.popularity.map(|p| p.to_string()).unwrap_or_default(),
        tags: record.tags.join(", "),
        in_cinemas: record.in_cinemas,
        is_hot_year: record.is_hot_year,
        is_upcoming: record.is_upcoming,
        carousel: record.carousel,
        language_wise: pretty(record.language_wise.as_deref().unwrap_or_default())?,
        country_wise: pretty(record.country_wise.as_deref().unwrap_or_default())?,
        day_wise: pretty(record.day_wise.as_deref().unwrap_or_default())?,
        occupancy: pretty(record.occupancy.as_deref().unwrap_or_default())?,
        reviews: pretty(&record.reviews)?,
        mode: FormMode::Update,
    })
}

/// Repairs the usual copy-paste damage in a hand-typed JSON blob and
/// pretty-prints it.
pub fn clean_json(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let no_trailing = TRAILING_COMMA.replace_all(trimmed, "$1");
    let unwrapped = PROPERTY_PREFIX.replace(&no_trailing, "$1");

    let value: serde_json::Value = serde_json::from_str(&unwrapped)
        .map_err(|err| AppError::Validation(format!("Syntax error: {err}")))?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn money(
    raw: &str,
    field: &str,
    errors: &mut BTreeMap<String, String>,
) -> Option<DecimalString> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(DecimalString::from(0));
    }
    match DecimalString::parse(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            errors.insert(field.to_string(), format!("`{raw}` is not a decimal number"));
            None
        },
    }
}

/// A blank blob means an empty table, not an absent one.
fn blob<T: DeserializeOwned>(
    raw: &str,
    field: &str,
    errors: &mut BTreeMap<String, String>,
) -> Option<Vec<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Vec::new());
    }
    match serde_json::from_str(raw) {
        Ok(rows) => Some(rows),
        Err(err) => {
            errors.insert(field.to_string(), format!("Invalid JSON: {err}"));
            None
        },
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
}

fn pretty<T: Serialize>(rows: &[T]) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
