use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    defaults::UNKNOWN_TITLE,
    error::AppResult,
    identifier::{PathId, title_from_slug},
    models::{CatalogCard, Category, HomeFeed, StoredMovie},
    tmdb::{ImageUrls, MetadataSource, TitleDetail},
};

/// Dresses every stored record with TMDB imagery, keeping store order.
///
/// At most `max_concurrent` records are enriched at once. A record whose
/// lookup fails is still listed with whatever the store holds.
pub async fn enrich(
    tmdb: &dyn MetadataSource,
    images: &ImageUrls,
    movies: Vec<StoredMovie>,
    max_concurrent: usize,
) -> Vec<CatalogCard> {
    debug!(total = movies.len(), "enriching catalog");

    stream::iter(movies)
        .map(|movie| async move {
            let detail = match lookup(tmdb, &movie.record.movie_id).await {
                Ok(detail) => detail,
                Err(err) => {
                    warn!(movie_id = %movie.record.movie_id, error = %err, "catalog enrichment failed");
                    None
                },
            };
            card(movie, detail.as_ref(), images)
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}

pub fn home_feed(cards: Vec<CatalogCard>) -> HomeFeed {
    let mut feed = HomeFeed::default();
    for card in cards {
        if card.carousel {
            feed.carousel.push(card.clone());
        }
        if card.is_hot_year {
            feed.hot_year.push(card.clone());
        }
        if card.in_cinemas {
            feed.in_cinemas.push(card.clone());
        }
        if card.is_upcoming {
            feed.upcoming.push(card);
        }
    }
    feed
}

async fn lookup(tmdb: &dyn MetadataSource, movie_id: &str) -> AppResult<Option<TitleDetail>> {
    let id = match PathId::classify(movie_id) {
        PathId::Native(id) => id,
        PathId::Alias(alias) => match tmdb.find_alias(Category::Movie, &alias).await? {
            Some(id) => id,
            None => return Ok(None),
        },
        PathId::Slug(_) => return Ok(None),
    };
    tmdb.detail(Category::Movie, id).await
}

fn card(movie: StoredMovie, detail: Option<&TitleDetail>, images: &ImageUrls) -> CatalogCard {
    let StoredMovie { record, created_at, .. } = movie;

    let title = detail
        .and_then(|d| d.display_title())
        .map(str::to_string)
        .or_else(|| record.title.clone().filter(|t| !t.trim().is_empty()))
        .or_else(|| record.slug.as_deref().map(title_from_slug).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let poster = detail
        .and_then(|d| d.poster_path.as_deref())
        .map(|p| images.w500(p))
        .or(record.poster);
    let backdrop = detail
        .and_then(|d| d.backdrop_path.as_deref())
        .map(|p| images.original(p))
        .or(record.backdrop);
    let overview = detail
        .and_then(|d| d.overview.clone())
        .filter(|o| !o.is_empty())
        .or(record.overview);

    CatalogCard {
        movie_id: record.movie_id,
        slug: record.slug,
        title,
        poster,
        backdrop,
        overview,
        total_collection: record.total_collection,
        in_cinemas: record.in_cinemas,
        is_hot_year: record.is_hot_year,
        is_upcoming: record.is_upcoming,
        carousel: record.carousel,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        decimal::DecimalString,
        error::AppError,
        models::MovieRecord,
        tmdb::{Credits, ExternalReview, ListKind, SearchPage, Video},
    };

    struct FakeTmdb;

    #[async_trait]
    impl MetadataSource for FakeTmdb {
        async fn detail(&self, _: Category, id: u64) -> AppResult<Option<TitleDetail>> {
            if id == 13 {
                return Err(AppError::Internal(anyhow::anyhow!("timeout")));
            }
            Ok(Some(TitleDetail {
                id,
                title: Some(format!("Title {id}")),
                poster_path: Some("/p.jpg".into()),
                ..Default::default()
            }))
        }

        async fn credits(&self, _: Category, _: u64) -> AppResult<Credits> {
            Ok(Credits::default())
        }

        async fn videos(&self, _: Category, _: u64) -> AppResult<Vec<Video>> {
            Ok(vec![])
        }

        async fn reviews(&self, _: Category, _: u64) -> AppResult<Vec<ExternalReview>> {
            Ok(vec![])
        }

        async fn search(&self, _: Category, _: &str, _: u32) -> AppResult<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn find_alias(&self, _: Category, _: &str) -> AppResult<Option<u64>> {
            Ok(Some(550))
        }

        async fn list(&self, _: ListKind, _: u32) -> AppResult<SearchPage> {
            Ok(SearchPage::default())
        }
    }

    fn stored(movie_id: &str, created_at: i64) -> StoredMovie {
        StoredMovie {
            record: MovieRecord { movie_id: movie_id.into(), ..Default::default() },
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn enrichment_keeps_order_and_survives_failures() {
        let mut failing = stored("13", 1);
        failing.record.title = Some("Curated".into());
        failing.record.total_collection = Some(DecimalString::parse("42.10").unwrap());

        let movies = vec![stored("550", 3), stored("tt0137523", 2), failing, stored("my-film", 0)];
        let cards = enrich(&FakeTmdb, &ImageUrls::new("https://img.test"), movies, 2).await;

        let titles: Vec<_> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Title 550", "Title 550", "Curated", UNKNOWN_TITLE]);
        assert_eq!(cards[0].poster.as_deref(), Some("https://img.test/w500/p.jpg"));
        assert_eq!(cards[2].total_collection.as_ref().unwrap().as_str(), "42.10");
        assert_eq!(cards[2].poster, None);
    }

    #[tokio::test]
    async fn home_feed_groups_by_flag() {
        let mut both = stored("1", 0);
        both.record.carousel = true;
        both.record.in_cinemas = true;
        let mut upcoming = stored("2", 0);
        upcoming.record.is_upcoming = true;

        let cards =
            enrich(&FakeTmdb, &ImageUrls::new("https://img.test"), vec![both, upcoming, stored("3", 0)], 4)
                .await;
        let feed = home_feed(cards);

        assert_eq!(feed.carousel.len(), 1);
        assert_eq!(feed.in_cinemas[0].movie_id, "1");
        assert_eq!(feed.upcoming[0].movie_id, "2");
        assert!(feed.hot_year.is_empty());
    }
}
