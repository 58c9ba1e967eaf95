use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub movie_id: String,
    #[sea_orm(unique)]
    pub slug: Option<String>,
    pub title: Option<String>,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub release_date: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub genre: Option<Json>,
    pub duration: Option<i32>,
    pub director: Option<String>,
    pub total_collection: Option<String>,
    pub budget: Option<String>,
    pub advance_bookings: Option<String>,
    pub language_wise: Option<Json>,
    pub country_wise: Option<Json>,
    pub day_wise: Option<Json>,
    pub occupancy: Option<Json>,
    pub tags: Json,
    pub reviews: Json,
    pub popularity: Option<f64>,
    pub in_cinemas: bool,
    pub is_hot_year: bool,
    pub is_upcoming: bool,
    pub carousel: bool,
    pub extra: Json,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
