//! Field precedence for assembling a display record.
//!
//! Three sources feed every display record: the curated record, the TMDB
//! bundle and the static defaults. Each field group picks its winner on its
//! own:
//!
//! * identity (title, imagery, dates, synopsis, rating, credits) prefers TMDB,
//!   then the curated record, then a fallback derived from the URL;
//! * money prefers the curated record, then the defaults, since TMDB carries
//!   no box-office figures;
//! * breakdown tables are taken from the record whenever the record has the
//!   field at all, even when it is an empty list.

use crate::{
    defaults::{
        ACTOR_PLACEHOLDER, BACKDROP_PLACEHOLDER, NO_DESCRIPTION, POSTER_PLACEHOLDER,
        StaticDefaults, UNKNOWN_TITLE,
    },
    models::{CastMember, Category, DisplayRecord, DisplayReview, MovieRecord, OccupancyEntry},
    tmdb::{Credits, ExternalReview, ImageUrls, TitleDetail, Video},
};

const MAX_CAST: usize = 5;
const MAX_EXTERNAL_REVIEWS: usize = 5;
const MAX_REVIEW_CHARS: usize = 300;

/// Everything TMDB answered for one title. Calls that failed or were skipped
/// leave their field empty.
#[derive(Clone, Debug, Default)]
pub struct ExternalBundle {
    pub detail: Option<TitleDetail>,
    pub credits: Credits,
    pub videos: Vec<Video>,
    pub reviews: Vec<ExternalReview>,
}

#[derive(Clone, Copy, Debug)]
pub struct MergeInput<'a> {
    pub category: Category,
    /// Identifier to show when TMDB did not recognise the title.
    pub display_id: &'a str,
    pub fallback_title: &'a str,
    pub record: Option<&'a MovieRecord>,
    pub external: &'a ExternalBundle,
}

pub fn merge(input: MergeInput<'_>, defaults: &StaticDefaults, images: &ImageUrls) -> DisplayRecord {
    let record = input.record;
    let external = input.external;
    let detail = external.detail.as_ref().filter(|d| d.is_recognised());

    let title = detail
        .and_then(|d| d.display_title())
        .map(str::to_string)
        .or_else(|| record.and_then(|r| non_blank(r.title.as_deref())))
        .or_else(|| non_blank(Some(input.fallback_title)))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let poster = detail
        .and_then(|d| d.poster_path.as_deref())
        .map(|p| images.original(p))
        .or_else(|| record.and_then(|r| non_blank(r.poster.as_deref())))
        .unwrap_or_else(|| POSTER_PLACEHOLDER.to_string());

    let backdrop = detail
        .and_then(|d| d.backdrop_path.as_deref())
        .map(|p| images.original(p))
        .or_else(|| record.and_then(|r| non_blank(r.backdrop.as_deref())))
        .unwrap_or_else(|| BACKDROP_PLACEHOLDER.to_string());

    let release_date = detail
        .and_then(|d| d.first_release())
        .map(str::to_string)
        .or_else(|| record.and_then(|r| non_blank(r.release_date.as_deref())));

    let year = release_date
        .as_deref()
        .and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .unwrap_or("N/A")
        .to_string();

    let rating = detail
        .and_then(|d| d.vote_average)
        .filter(|v| *v > 0.0)
        .or_else(|| record.and_then(|r| r.rating).filter(|v| *v > 0.0))
        .unwrap_or(0.0);

    let about = detail
        .and_then(|d| non_blank(d.overview.as_deref()))
        .or_else(|| record.and_then(|r| non_blank(r.overview.as_deref())))
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let genres = detail
        .map(|d| d.genres.iter().map(|g| g.name.clone()).collect::<Vec<_>>())
        .filter(|g| !g.is_empty())
        .or_else(|| record.and_then(|r| r.genre.clone()))
        .unwrap_or_default();

    let duration = detail
        .and_then(|d| d.duration())
        .or_else(|| record.and_then(|r| r.duration))
        .unwrap_or(0);

    let director = external
        .credits
        .crew
        .iter()
        .find(|c| c.job.as_deref() == Some("Director"))
        .map(|c| c.name.clone())
        .or_else(|| record.and_then(|r| non_blank(r.director.as_deref())))
        .unwrap_or_else(|| "Unknown".to_string());

    let cast = external
        .credits
        .cast
        .iter()
        .take(MAX_CAST)
        .map(|c| CastMember {
            name: c.name.clone(),
            role: c.character.clone().unwrap_or_default(),
            image: c
                .profile_path
                .as_deref()
                .map(|p| images.w500(p))
                .unwrap_or_else(|| ACTOR_PLACEHOLDER.to_string()),
        })
        .collect();

    let trailer = external
        .videos
        .iter()
        .find(|v| v.site.as_deref().is_none_or(|s| s.eq_ignore_ascii_case("youtube")))
        .map(|v| format!("https://www.youtube.com/watch?v={}", v.key));

    let occupancy_headline = match record {
        Some(r) => r.occupancy.as_ref().and_then(|o| o.first()).map(percent),
        None => defaults.occupancy.first().map(percent),
    }
    .unwrap_or_else(|| "N/A".to_string());

    let popularity = record
        .and_then(|r| r.popularity)
        .or_else(|| detail.and_then(|d| d.popularity))
        .unwrap_or(defaults.popularity);

    let reviews = match record {
        Some(r) if !r.reviews.is_empty() => curated_reviews(r, defaults),
        _ => external_reviews(&external.reviews, detail, defaults),
    };

    DisplayRecord {
        id: detail.map(|d| d.id.to_string()).unwrap_or_else(|| input.display_id.to_string()),
        category: input.category,
        title,
        poster,
        backdrop,
        release_date,
        year,
        rating,
        about,
        genres,
        duration,
        director,
        cast,
        trailer,

        total_collection: record
            .and_then(|r| r.total_collection.clone())
            .unwrap_or_else(|| defaults.total_collection.clone()),
        budget: record
            .and_then(|r| r.budget.clone())
            .unwrap_or_else(|| defaults.budget.clone()),
        advance_bookings: record
            .and_then(|r| r.advance_bookings.clone())
            .unwrap_or_else(|| defaults.advance_bookings.clone()),

        language_wise: record
            .and_then(|r| r.language_wise.clone())
            .unwrap_or_else(|| defaults.language_wise.clone()),
        country_wise: record
            .and_then(|r| r.country_wise.clone())
            .unwrap_or_else(|| defaults.country_wise.clone()),
        day_wise: record
            .and_then(|r| r.day_wise.clone())
            .unwrap_or_else(|| defaults.day_wise.clone()),
        occupancy: record
            .and_then(|r| r.occupancy.clone())
            .unwrap_or_else(|| defaults.occupancy.clone()),
        occupancy_headline,

        tags: record.map(|r| r.tags.clone()).unwrap_or_else(|| defaults.tag_list()),
        popularity,
        reviews,

        in_cinemas: record.is_none_or(|r| r.in_cinemas),
        is_hot_year: record.is_some_and(|r| r.is_hot_year),
        is_upcoming: record.is_some_and(|r| r.is_upcoming),
        carousel: record.is_some_and(|r| r.carousel),
    }
}

fn curated_reviews(record: &MovieRecord, defaults: &StaticDefaults) -> Vec<DisplayReview> {
    let today = jiff::Timestamp::now().to_string();
    record
        .reviews
        .iter()
        .map(|r| DisplayReview {
            user: non_blank(r.user.as_deref()).unwrap_or_else(|| "Anonymous".to_string()),
            date: Some(r.date.clone().unwrap_or_else(|| today.clone())),
            rating: r.rating.filter(|v| *v != 0).unwrap_or(defaults.review_rating) as f64,
            comment: r.comment.clone().unwrap_or_default(),
        })
        .collect()
}

fn external_reviews(
    reviews: &[ExternalReview],
    detail: Option<&TitleDetail>,
    defaults: &StaticDefaults,
) -> Vec<DisplayReview> {
    let fallback_rating = detail
        .and_then(|d| d.vote_average)
        .filter(|v| *v > 0.0)
        .unwrap_or(defaults.external_review_rating);

    reviews
        .iter()
        .take(MAX_EXTERNAL_REVIEWS)
        .map(|r| {
            let details = r.author_details.as_ref();
            DisplayReview {
                user: non_blank(r.author.as_deref())
                    .or_else(|| details.and_then(|d| non_blank(d.username.as_deref())))
                    .unwrap_or_else(|| "Anonymous".to_string()),
                date: r.created_at.clone(),
                rating: details.and_then(|d| d.rating).unwrap_or(fallback_rating),
                comment: truncate(&r.content, MAX_REVIEW_CHARS),
            }
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn percent(entry: &OccupancyEntry) -> String {
    format!("{}%", entry.occupancy)
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
