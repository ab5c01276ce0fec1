//! Client-side form validation.
//!
//! Every form resolves its rules locally and produces a request payload
//! only when valid, so an invalid form never reaches the network. The
//! error messages are shown to the user verbatim.

use thiserror::Error;

use crate::models::{
    NewMovie, NewReview, ProfileUpdate, Registration, UserProfile, MAX_RATING, MIN_RATING,
};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email and password are required.")]
    MissingCredentials,

    #[error("All fields are required.")]
    MissingFields,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("You must be logged in to submit a review. Please login first.")]
    LoginRequired,

    #[error("Please select a valid rating (1-5 stars).")]
    InvalidRating,

    #[error("Please enter a comment for your review.")]
    MissingComment,

    #[error("Title is required.")]
    MissingTitle,

    #[error("Release year must be a number.")]
    InvalidYear,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Optional; left out of the request when blank.
    pub profile_picture: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Registration, ValidationError> {
        let nickname = self.nickname.trim();
        let email = self.email.trim();
        if nickname.is_empty()
            || email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        let picture = self.profile_picture.trim();
        Ok(Registration {
            nickname: nickname.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            profile_picture: (!picture.is_empty()).then(|| picture.to_string()),
        })
    }
}

/// Review entry form. A rating of 0 means "not chosen yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewForm {
    pub rating: i32,
    pub comment: String,
}

impl ReviewForm {
    pub fn validate(&self, authenticated: bool) -> Result<NewReview, ValidationError> {
        if !authenticated {
            return Err(ValidationError::LoginRequired);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::InvalidRating);
        }
        if self.comment.trim().is_empty() {
            return Err(ValidationError::MissingComment);
        }
        Ok(NewReview {
            rating: self.rating,
            comment: self.comment.clone(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// New movie form; list fields are comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieForm {
    pub title: String,
    pub genres: String,
    pub release_year: String,
    pub actors: String,
    pub description: String,
    pub poster_url: String,
}

impl MovieForm {
    pub fn validate(&self) -> Result<NewMovie, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let year = self.release_year.trim();
        let release_year = if year.is_empty() {
            None
        } else {
            Some(year.parse().map_err(|_| ValidationError::InvalidYear)?)
        };

        Ok(NewMovie {
            title: title.to_string(),
            genres: split_list(&self.genres),
            release_year,
            actors: split_list(&self.actors),
            description: non_blank(&self.description),
            poster_url: non_blank(&self.poster_url),
        })
    }
}

/// Inline profile edit. Always valid; blank nickname keeps the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub nickname: String,
    pub profile_picture: String,
}

impl ProfileForm {
    /// Prefill from the current identity.
    pub fn from_profile(profile: &UserProfile) -> Self {
        let current = ProfileUpdate::from_profile(profile);
        Self {
            nickname: current.nickname,
            profile_picture: current.profile_picture,
        }
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            nickname: self.nickname.trim().to_string(),
            profile_picture: self.profile_picture.trim().to_string(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            nickname: "neo".to_string(),
            email: "neo@example.com".to_string(),
            password: "matrix".to_string(),
            confirm_password: "matrix".to_string(),
            profile_picture: String::new(),
        }
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        assert_eq!(
            LoginForm::new("", "pw").validate(),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            LoginForm::new("a@b.com", "").validate(),
            Err(ValidationError::MissingCredentials)
        );
        assert!(LoginForm::new("a@b.com", "pw").validate().is_ok());
        assert_eq!(
            ValidationError::MissingCredentials.to_string(),
            "Email and password are required."
        );
    }

    #[test]
    fn test_register_form_rules() {
        let registration = register_form().validate().expect("valid form");
        assert_eq!(registration.nickname, "neo");
        assert_eq!(registration.profile_picture, None);

        let mut missing = register_form();
        missing.confirm_password.clear();
        assert_eq!(missing.validate(), Err(ValidationError::MissingFields));
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "All fields are required."
        );

        let mut mismatch = register_form();
        mismatch.confirm_password = "other".to_string();
        assert_eq!(mismatch.validate(), Err(ValidationError::PasswordMismatch));
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "Passwords do not match."
        );
    }

    #[test]
    fn test_register_form_keeps_picture() {
        let mut form = register_form();
        form.profile_picture = " http://img/neo.png ".to_string();
        let registration = form.validate().unwrap();
        assert_eq!(
            registration.profile_picture.as_deref(),
            Some("http://img/neo.png")
        );
    }

    #[test]
    fn test_review_form_rules() {
        let mut form = ReviewForm {
            rating: 4,
            comment: "Great".to_string(),
        };
        assert_eq!(form.validate(false), Err(ValidationError::LoginRequired));
        assert_eq!(
            ValidationError::LoginRequired.to_string(),
            "You must be logged in to submit a review. Please login first."
        );
        assert!(form.validate(true).is_ok());

        form.rating = 0;
        assert_eq!(form.validate(true), Err(ValidationError::InvalidRating));
        form.rating = 6;
        assert_eq!(form.validate(true), Err(ValidationError::InvalidRating));
        assert_eq!(
            ValidationError::InvalidRating.to_string(),
            "Please select a valid rating (1-5 stars)."
        );

        form.rating = 5;
        form.comment = "   ".to_string();
        assert_eq!(form.validate(true), Err(ValidationError::MissingComment));

        form.clear();
        assert_eq!(form.rating, 0);
        assert!(form.comment.is_empty());
    }

    #[test]
    fn test_movie_form() {
        let form = MovieForm {
            title: "Heat".to_string(),
            genres: "Action, Drama,".to_string(),
            release_year: "1995".to_string(),
            actors: "Al Pacino,Robert De Niro".to_string(),
            ..Default::default()
        };
        let movie = form.validate().unwrap();
        assert_eq!(movie.genres, vec!["Action", "Drama"]);
        assert_eq!(movie.release_year, Some(1995));
        assert_eq!(movie.actors.len(), 2);
        assert_eq!(movie.description, None);

        assert_eq!(
            MovieForm::default().validate(),
            Err(ValidationError::MissingTitle)
        );
        let bad_year = MovieForm {
            title: "Heat".to_string(),
            release_year: "199x".to_string(),
            ..Default::default()
        };
        assert_eq!(bad_year.validate(), Err(ValidationError::InvalidYear));
    }

    #[test]
    fn test_profile_form_trims() {
        let form = ProfileForm {
            nickname: " trinity ".to_string(),
            profile_picture: String::new(),
        };
        let update = form.to_update();
        assert_eq!(update.nickname, "trinity");
        assert_eq!(update.profile_picture, "");
    }

    #[test]
    fn test_profile_form_prefills_from_identity() {
        let profile = UserProfile {
            id: "u1".to_string(),
            nickname: Some("neo".to_string()),
            email: "neo@example.com".to_string(),
            profile_picture: None,
        };
        let form = ProfileForm::from_profile(&profile);
        assert_eq!(form.nickname, "neo");
        assert_eq!(form.profile_picture, "");
    }
}
