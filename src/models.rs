use serde::{Deserialize, Serialize};

use crate::entities::movie_cache;

pub const UNKNOWN_TITLE_RU: &str = "неизвестное название";
pub const UNKNOWN_TITLE_EN: &str = "unknown title";
pub const NO_DESCRIPTION_RU: &str = "описания нет";
pub const NO_DESCRIPTION_EN: &str = "no description";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ru,
    En,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ru" => Some(Lang::Ru),
            "en" => Some(Lang::En),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Comedy,
    Drama,
    Thriller,
    SciFi,
    Horror,
    Romance,
    Action,
    Detective,
    Adventure,
    Anime,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Comedy,
        Genre::Drama,
        Genre::Thriller,
        Genre::SciFi,
        Genre::Horror,
        Genre::Romance,
        Genre::Action,
        Genre::Detective,
        Genre::Adventure,
        Genre::Anime,
    ];

    /// Canonical name as the catalogue API spells it.
    pub fn name_ru(self) -> &'static str {
        match self {
            Genre::Comedy => "комедия",
            Genre::Drama => "драма",
            Genre::Thriller => "триллер",
            Genre::SciFi => "фантастика",
            Genre::Horror => "ужасы",
            Genre::Romance => "мелодрама",
            Genre::Action => "боевик",
            Genre::Detective => "детектив",
            Genre::Adventure => "приключения",
            Genre::Anime => "аниме",
        }
    }

    pub fn name_en(self) -> &'static str {
        match self {
            Genre::Comedy => "comedy",
            Genre::Drama => "drama",
            Genre::Thriller => "thriller",
            Genre::SciFi => "sci-fi",
            Genre::Horror => "horror",
            Genre::Romance => "romance",
            Genre::Action => "action",
            Genre::Detective => "detective",
            Genre::Adventure => "adventure",
            Genre::Anime => "anime",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.name_ru() == s || g.name_en() == s)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieInfo {
    pub kinopoisk_id: Option<i64>,
    pub title_ru: String,
    pub title_en: String,
    pub year: Option<i32>,
    pub length: Option<String>,
    pub description_ru: String,
    pub description_en: String,
    pub genres_ru: Vec<String>,
    pub genres_en: Vec<String>,
    pub rating: Option<f64>,
    pub poster_url: Option<String>,
}

impl MovieInfo {
    /// Rehydrates a record from a cache row. Catalogue id, length and poster
    /// are not persisted, so they come back absent.
    pub fn from_cache(row: &movie_cache::Model) -> Self {
        Self {
            kinopoisk_id: None,
            title_ru: row.title_ru.clone(),
            title_en: row.title_en.clone(),
            year: row.year,
            length: None,
            description_ru: row.description_ru.clone(),
            description_en: row.description_en.clone(),
            genres_ru: split_genres(&row.genres_ru),
            genres_en: split_genres(&row.genres_en),
            rating: row.rating,
            poster_url: None,
        }
    }

    pub fn title_for(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ru => &self.title_ru,
            Lang::En => &self.title_en,
        }
    }

    pub fn caption(&self, lang: Lang) -> String {
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "—".to_string());
        let rating = self
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "—".to_string());
        match lang {
            Lang::Ru => format!(
                "🟡 Название: {}\n🔴 Год: {}\n🟡 Рейтинг: {}\n🔴 Жанры: {}\nКраткое описание: {}\n",
                self.title_ru,
                year,
                rating,
                self.genres_ru.join(", "),
                self.description_ru,
            ),
            Lang::En => format!(
                "🟡 Title: {}\n🔴 Year: {}\n🟡 Rating: {}\n🔴 Genres: {}\nDescription: {}\n",
                self.title_en,
                year,
                rating,
                self.genres_en.join(", "),
                self.description_en,
            ),
        }
    }
}

pub fn split_genres(joined: &str) -> Vec<String> {
    joined
        .split(", ")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Outcome of a completed pipeline run. A missing link is a valid outcome;
/// total failure is the `Err` side of the pipeline result.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub movie: MovieInfo,
    pub link: Option<String>,
    pub canonical_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_parses_both_names() {
        assert_eq!(Genre::from_name("ужасы"), Some(Genre::Horror));
        assert_eq!(Genre::from_name("Horror"), Some(Genre::Horror));
        assert_eq!(Genre::from_name("  драма "), Some(Genre::Drama));
        assert_eq!(Genre::from_name("opera"), None);
    }

    #[test]
    fn split_genres_drops_empty_segments() {
        assert_eq!(split_genres("драма, фантастика"), vec!["драма", "фантастика"]);
        assert!(split_genres("").is_empty());
    }

    #[test]
    fn caption_follows_display_language() {
        let movie = MovieInfo {
            kinopoisk_id: Some(301),
            title_ru: "Матрица".to_string(),
            title_en: "The Matrix".to_string(),
            year: Some(1999),
            length: None,
            description_ru: "Хакер узнаёт правду".to_string(),
            description_en: "A hacker learns the truth".to_string(),
            genres_ru: vec!["фантастика".to_string()],
            genres_en: vec!["sci-fi".to_string()],
            rating: Some(8.5),
            poster_url: None,
        };
        assert!(movie.caption(Lang::Ru).contains("Матрица"));
        assert!(movie.caption(Lang::En).contains("The Matrix"));
        assert!(movie.caption(Lang::En).contains("sci-fi"));
    }
}
