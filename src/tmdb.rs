use std::{num::NonZeroU32, str::FromStr, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{error::AppResult, models::Category};

/// The calls the resolver and the feeds make against the metadata provider.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn detail(&self, category: Category, id: u64) -> AppResult<Option<TitleDetail>>;
    async fn credits(&self, category: Category, id: u64) -> AppResult<Credits>;
    async fn videos(&self, category: Category, id: u64) -> AppResult<Vec<Video>>;
    async fn reviews(&self, category: Category, id: u64) -> AppResult<Vec<ExternalReview>>;
    async fn search(&self, category: Category, query: &str, page: u32) -> AppResult<SearchPage>;
    /// Exchanges an IMDb id for the native one, trying `category` first.
    async fn find_alias(&self, category: Category, alias: &str) -> AppResult<Option<u64>>;
    async fn list(&self, kind: ListKind, page: u32) -> AppResult<SearchPage>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        if access_token.trim().is_empty() {
            warn!("no TMDB_ACCESS_TOKEN provided; metadata enrichment is disabled");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, access_token, base_url, limiter }
    }

    fn enabled(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        Ok(self.request(path, query).await?.error_for_status()?.json().await?)
    }

    async fn request(&self, path: &str, query: &[(&str, String)]) -> AppResult<reqwest::Response> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!(url = %url, "tmdb request");
        Ok(self.client.get(url).bearer_auth(&self.access_token).query(query).send().await?)
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn detail(&self, category: Category, id: u64) -> AppResult<Option<TitleDetail>> {
        if !self.enabled() {
            return Ok(None);
        }

        let resp = self.request(&format!("{category}/{id}"), &[]).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(resp.error_for_status()?.json().await?))
    }

    async fn credits(&self, category: Category, id: u64) -> AppResult<Credits> {
        if !self.enabled() {
            return Ok(Credits::default());
        }
        self.get(&format!("{category}/{id}/credits"), &[]).await
    }

    async fn videos(&self, category: Category, id: u64) -> AppResult<Vec<Video>> {
        if !self.enabled() {
            return Ok(vec![]);
        }
        let resp: ResultsEnvelope<Video> = self.get(&format!("{category}/{id}/videos"), &[]).await?;
        Ok(resp.results)
    }

    async fn reviews(&self, category: Category, id: u64) -> AppResult<Vec<ExternalReview>> {
        if !self.enabled() {
            return Ok(vec![]);
        }
        let resp: ResultsEnvelope<ExternalReview> =
            self.get(&format!("{category}/{id}/reviews"), &[]).await?;
        Ok(resp.results)
    }

    async fn search(&self, category: Category, query: &str, page: u32) -> AppResult<SearchPage> {
        if !self.enabled() || query.trim().is_empty() {
            return Ok(SearchPage::default());
        }
        self.get(
            &format!("search/{category}"),
            &[("query", query.to_string()), ("page", page.max(1).to_string())],
        )
        .await
    }

    async fn find_alias(&self, category: Category, alias: &str) -> AppResult<Option<u64>> {
        if !self.enabled() {
            return Ok(None);
        }

        let resp: FindResponse = self
            .get(&format!("find/{alias}"), &[("external_source", "imdb_id".to_string())])
            .await?;

        let preferred = resp.results_for(category).first().or_else(|| resp.results_for(category.other()).first());
        Ok(preferred.map(|hit| hit.id))
    }

    async fn list(&self, kind: ListKind, page: u32) -> AppResult<SearchPage> {
        if !self.enabled() {
            return Ok(SearchPage::default());
        }
        self.get(&format!("movie/{}", kind.as_path()), &[("page", page.max(1).to_string())]).await
    }
}

/// Builds absolute image URLs from the relative paths TMDB returns.
#[derive(Clone, Debug)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into().trim_end_matches('/').to_string() }
    }

    pub fn original(&self, path: &str) -> String {
        format!("{}/original{}", self.base, path)
    }

    pub fn w500(&self, path: &str) -> String {
        format!("{}/w500{}", self.base, path)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListKind {
    Upcoming,
    Popular,
    TopRated,
}

impl ListKind {
    pub fn as_path(self) -> &'static str {
        match self {
            ListKind::Upcoming => "upcoming",
            ListKind::Popular => "popular",
            ListKind::TopRated => "top_rated",
        }
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(ListKind::Upcoming),
            "popular" => Ok(ListKind::Popular),
            "top_rated" => Ok(ListKind::TopRated),
            other => Err(format!("unknown list `{other}`")),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TitleDetail {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
}

impl TitleDetail {
    /// Films carry `title`, series carry `name`.
    pub fn display_title(&self) -> Option<&str> {
        [self.title.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
    }

    pub fn is_recognised(&self) -> bool {
        self.display_title().is_some()
    }

    pub fn first_release(&self) -> Option<&str> {
        non_empty(self.release_date.as_deref()).or_else(|| non_empty(self.first_air_date.as_deref()))
    }

    pub fn duration(&self) -> Option<u32> {
        self.runtime.filter(|r| *r > 0).or_else(|| self.episode_run_time.first().copied())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[derive(Clone, Debug, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastCredit>,
    #[serde(default)]
    pub crew: Vec<CrewCredit>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CastCredit {
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CrewCredit {
    pub name: String,
    pub job: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExternalReview {
    pub author: Option<String>,
    pub author_details: Option<AuthorDetails>,
    #[serde(default)]
    pub content: String,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthorDetails {
    pub username: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchHit {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ResultsEnvelope<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<FindHit>,
    #[serde(default)]
    tv_results: Vec<FindHit>,
}

impl FindResponse {
    fn results_for(&self, category: Category) -> &[FindHit] {
        match category {
            Category::Movie => &self.movie_results,
            Category::Tv => &self.tv_results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FindHit {
    id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_detail_uses_name_and_air_date() {
        let detail: TitleDetail = serde_json::from_str(
            r#"{"id": 1399, "name": "Game of Thrones", "first_air_date": "2011-04-17",
                "episode_run_time": [60], "genres": [{"id": 18, "name": "Drama"}],
                "vote_average": 8.4, "runtime": null}"#,
        )
        .unwrap();
        assert!(detail.is_recognised());
        assert_eq!(detail.display_title(), Some("Game of Thrones"));
        assert_eq!(detail.first_release(), Some("2011-04-17"));
        assert_eq!(detail.duration(), Some(60));
    }

    #[test]
    fn blank_title_is_not_recognised() {
        let detail: TitleDetail = serde_json::from_str(r#"{"id": 1, "title": "  "}"#).unwrap();
        assert!(!detail.is_recognised());
    }

    #[test]
    fn review_without_rating_parses() {
        let review: ExternalReview = serde_json::from_str(
            r#"{"author": "x", "author_details": {"username": "x", "rating": null},
                "content": "ok", "created_at": "2020-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(review.author_details.unwrap().rating, None);
    }

    #[test]
    fn find_prefers_requested_category() {
        let resp: FindResponse = serde_json::from_str(
            r#"{"movie_results": [{"id": 550}], "tv_results": [{"id": 1399}]}"#,
        )
        .unwrap();
        assert_eq!(resp.results_for(Category::Tv)[0].id, 1399);
        assert_eq!(resp.results_for(Category::Movie)[0].id, 550);
    }

    #[test]
    fn image_urls() {
        let images = ImageUrls::new("https://image.tmdb.org/t/p/");
        assert_eq!(images.original("/a.jpg"), "https://image.tmdb.org/t/p/original/a.jpg");
        assert_eq!(images.w500("/b.jpg"), "https://image.tmdb.org/t/p/w500/b.jpg");
    }

    #[tokio::test]
    async fn without_token_every_call_is_empty() {
        let client =
            TmdbClient::new(reqwest::Client::new(), String::new(), "http://127.0.0.1:9".into(), 4);
        assert!(client.detail(Category::Movie, 550).await.unwrap().is_none());
        assert!(client.credits(Category::Movie, 550).await.unwrap().cast.is_empty());
        assert!(client.videos(Category::Tv, 1).await.unwrap().is_empty());
        assert!(client.search(Category::Movie, "x", 1).await.unwrap().results.is_empty());
        assert!(client.find_alias(Category::Movie, "tt1").await.unwrap().is_none());
    }
}
