use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, Statement,
    sea_query::{Expr, OnConflict},
};

use crate::{
    entities::{movie_cache, movie_stats, search_history, users},
    models::{Lang, MovieInfo},
};

#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Exact-match lookup by canonical title. A miss is not an error.
    pub async fn get_movie(&self, movie_name: &str) -> Result<Option<movie_cache::Model>, DbErr> {
        movie_cache::Entity::find_by_id(movie_name.to_string()).one(&self.db).await
    }

    /// Idempotent upsert keyed by the Russian title; overwrites every field.
    pub async fn upsert_movie(&self, movie: &MovieInfo, link: Option<&str>) -> Result<(), DbErr> {
        let model = movie_cache::ActiveModel {
            movie_name: Set(movie.title_ru.clone()),
            link: Set(link.map(str::to_string)),
            title_ru: Set(movie.title_ru.clone()),
            title_en: Set(movie.title_en.clone()),
            description_ru: Set(movie.description_ru.clone()),
            description_en: Set(movie.description_en.clone()),
            genres_ru: Set(movie.genres_ru.join(", ")),
            genres_en: Set(movie.genres_en.join(", ")),
            rating: Set(movie.rating),
            year: Set(movie.year),
            updated_at: Set(now_sec()),
        };

        movie_cache::Entity::insert(model)
            .on_conflict(
                OnConflict::column(movie_cache::Column::MovieName)
                    .update_columns([
                        movie_cache::Column::Link,
                        movie_cache::Column::TitleRu,
                        movie_cache::Column::TitleEn,
                        movie_cache::Column::DescriptionRu,
                        movie_cache::Column::DescriptionEn,
                        movie_cache::Column::GenresRu,
                        movie_cache::Column::GenresEn,
                        movie_cache::Column::Rating,
                        movie_cache::Column::Year,
                        movie_cache::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Append-only audit row; duplicates are expected and meaningful.
    pub async fn record_query(
        &self,
        user_id: i64,
        query: &str,
        movie_name: &str,
    ) -> Result<(), DbErr> {
        let model = search_history::ActiveModel {
            id: Default::default(),
            user_id: Set(user_id),
            query: Set(query.to_string()),
            movie_name: Set(movie_name.to_string()),
            created_at: Set(now_sec()),
        };
        search_history::Entity::insert(model).exec(&self.db).await?;
        Ok(())
    }

    /// Creates the counter at 1 or adds 1, in a single statement so that
    /// concurrent identical queries cannot lose updates.
    pub async fn increment_usage(&self, user_id: i64, movie_name: &str) -> Result<(), DbErr> {
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            "INSERT INTO movie_stats (user_id, movie_name, count) VALUES (?, ?, 1) \
             ON CONFLICT(user_id, movie_name) DO UPDATE SET count = count + 1",
            [user_id.into(), movie_name.into()],
        );
        self.db.execute(stmt).await?;
        Ok(())
    }

    /// Out-of-band rating action; only touches an existing counter row.
    pub async fn set_rating(
        &self,
        user_id: i64,
        movie_name: &str,
        rating: f64,
    ) -> Result<bool, DbErr> {
        let res = movie_stats::Entity::update_many()
            .col_expr(movie_stats::Column::Rating, Expr::value(rating))
            .filter(movie_stats::Column::UserId.eq(user_id))
            .filter(movie_stats::Column::MovieName.eq(movie_name))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn history(
        &self,
        user_id: i64,
        limit: u64,
    ) -> Result<Vec<search_history::Model>, DbErr> {
        search_history::Entity::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .order_by_desc(search_history::Column::CreatedAt)
            .order_by_desc(search_history::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
    }

    pub async fn stats(&self, user_id: i64) -> Result<Vec<movie_stats::Model>, DbErr> {
        movie_stats::Entity::find()
            .filter(movie_stats::Column::UserId.eq(user_id))
            .order_by_desc(movie_stats::Column::Count)
            .all(&self.db)
            .await
    }

    pub async fn user_lang(&self, user_id: i64) -> Result<Lang, DbErr> {
        Ok(users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .and_then(|u| Lang::parse(&u.lang))
            .unwrap_or(Lang::Ru))
    }

    pub async fn set_lang(&self, user_id: i64, lang: Lang) -> Result<(), DbErr> {
        let model = users::ActiveModel {
            user_id: Set(user_id),
            lang: Set(lang.as_str().to_string()),
        };
        users::Entity::insert(model)
            .on_conflict(
                OnConflict::column(users::Column::UserId)
                    .update_columns([users::Column::Lang])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
pub(crate) async fn memory_store() -> Store {
    use sea_orm_migration::MigratorTrait;

    let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1);
    let db = sea_orm::Database::connect(opt).await.expect("connect in-memory sqlite");
    migration::Migrator::up(&db, None).await.expect("run migrations");
    Store::new(db)
}
