use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Genres offered by the movie browser's genre filter.
pub const GENRES: [&str; 7] = [
    "Action", "Comedy", "Drama", "Sci-Fi", "Horror", "Romance", "Thriller",
];

/// Number of release years offered by the year filter, counting back from now.
pub const YEAR_FILTER_SPAN: i32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(rename = "releaseYear")]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub actors: Vec<String>,
    pub description: Option<String>,
    #[serde(rename = "posterUrl")]
    pub poster_url: Option<String>,
}

impl Movie {
    pub fn genres_display(&self) -> String {
        if self.genres.is_empty() {
            "-".to_string()
        } else {
            self.genres.join(", ")
        }
    }

    pub fn actors_display(&self) -> String {
        if self.actors.is_empty() {
            "-".to_string()
        } else {
            self.actors.join(", ")
        }
    }

    pub fn year_display(&self) -> String {
        self.release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Payload for `POST /api/movies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub genres: Vec<String>,
    #[serde(rename = "releaseYear")]
    pub release_year: Option<i32>,
    pub actors: Vec<String>,
    pub description: Option<String>,
    #[serde(rename = "posterUrl")]
    pub poster_url: Option<String>,
}

/// Query filters for `GET /api/movies`.
///
/// The backend ignores blank parameters, so blank fields are left out of the
/// query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    /// Matched against title and description.
    pub query: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub actor: Option<String>,
}

impl MovieFilter {
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let text_fields = [
            ("query", &self.query),
            ("genre", &self.genre),
            ("actor", &self.actor),
        ];
        for (name, value) in text_fields {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((name, v.to_string()));
            }
        }
        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        pairs
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Release years offered by the year filter, newest first.
pub fn year_options() -> Vec<i32> {
    year_options_from(Utc::now().year())
}

fn year_options_from(current_year: i32) -> Vec<i32> {
    (0..YEAR_FILTER_SPAN).map(|i| current_year - i).collect()
}
