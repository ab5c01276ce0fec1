use std::cmp::Reverse;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "movieId")]
    pub movie_id: Option<String>,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    /// Server local time, e.g. `2025-03-01T18:22:05.123`.
    #[serde(rename = "reviewDate")]
    pub review_date: Option<String>,
}

impl Review {
    pub fn reviewed_at(&self) -> Option<NaiveDateTime> {
        parse_review_date(self.review_date.as_deref()?)
    }

    /// Date-only display, e.g. "Mar 01, 2025".
    pub fn formatted_date(&self) -> String {
        match self.reviewed_at() {
            Some(dt) => dt.format("%b %d, %Y").to_string(),
            None => "-".to_string(),
        }
    }

    /// Rating rendered as filled and empty stars.
    pub fn stars(&self) -> String {
        let filled = self.rating.clamp(0, MAX_RATING) as usize;
        format!(
            "{}{}",
            "★".repeat(filled),
            "☆".repeat(MAX_RATING as usize - filled)
        )
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

fn parse_review_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Order reviews newest first; undated reviews go last.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by_key(|r| Reverse(r.reviewed_at()));
}

/// Payload for `POST /api/movies/{id}/reviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub rating: i32,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, date: Option<&str>) -> Review {
        Review {
            id: id.to_string(),
            user_id: Some("u1".to_string()),
            movie_id: Some("m1".to_string()),
            rating: 4,
            comment: "Good".to_string(),
            review_date: date.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_review_from_api() {
        let json = r#"{"id":"r1","userId":"u1","movieId":"m1","rating":5,"comment":"Excellent!","reviewDate":"2025-03-01T18:22:05.123"}"#;
        let r: Review = serde_json::from_str(json).expect("review json");
        assert_eq!(r.rating, 5);
        assert_eq!(r.formatted_date(), "Mar 01, 2025");
        assert!(r.is_authored_by("u1"));
        assert!(!r.is_authored_by("u2"));
    }

    #[test]
    fn test_review_date_formats() {
        assert!(parse_review_date("2025-03-01T18:22:05").is_some());
        assert!(parse_review_date("2025-03-01T18:22:05Z").is_some());
        assert!(parse_review_date("yesterday").is_none());
        assert_eq!(review("r", None).formatted_date(), "-");
    }

    #[test]
    fn test_sort_newest_first() {
        let mut reviews = vec![
            review("old", Some("2024-01-01T10:00:00")),
            review("undated", None),
            review("new", Some("2025-06-01T10:00:00")),
            review("mid", Some("2024-12-24T10:00:00.5")),
        ];
        sort_newest_first(&mut reviews);
        let ids: Vec<&str> = reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old", "undated"]);
    }

    #[test]
    fn test_stars() {
        let mut r = review("r", None);
        assert_eq!(r.stars(), "★★★★☆");
        r.rating = 9;
        assert_eq!(r.stars(), "★★★★★");
        r.rating = 0;
        assert_eq!(r.stars(), "☆☆☆☆☆");
    }
}
