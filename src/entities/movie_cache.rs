use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie_cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub movie_name: String,
    pub link: Option<String>,
    pub title_ru: String,
    pub title_en: String,
    pub description_ru: String,
    pub description_en: String,
    pub genres_ru: String,
    pub genres_en: String,
    pub rating: Option<f64>,
    pub year: Option<i32>,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
