//! Application state management for WatchNow.
//!
//! This module contains the core `App` struct that manages UI state, drives
//! the session store, and collects results from background API tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use watchnow_core::auth::{AuthChange, AuthSubscription, SessionState, SessionStore};
use watchnow_core::config::Config;
use watchnow_core::forms::{MovieForm, ProfileForm, RegisterForm, ReviewForm, ValidationError};
use watchnow_core::models::{
    sort_newest_first, year_options, Movie, MovieFilter, Review, UserProfile, GENRES, MAX_RATING,
    MIN_RATING,
};
use watchnow_core::nav::Route;
use watchnow_core::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for short text fields (nickname, search query).
const MAX_FIELD_LENGTH: usize = 60;

/// Maximum length for URLs (profile picture).
const MAX_URL_LENGTH: usize = 300;

/// Maximum length for review comments.
const MAX_COMMENT_LENGTH: usize = 1000;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

pub const REGISTRATION_SUCCESS: &str = "Registration successful! Please login.";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    WritingReview,
    AddingMovie,
    EditingProfile,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

/// Registration form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFocus {
    Nickname,
    Email,
    Password,
    ConfirmPassword,
    ProfilePicture,
    Button,
}

impl RegisterFocus {
    const ORDER: [RegisterFocus; 6] = [
        RegisterFocus::Nickname,
        RegisterFocus::Email,
        RegisterFocus::Password,
        RegisterFocus::ConfirmPassword,
        RegisterFocus::ProfilePicture,
        RegisterFocus::Button,
    ];

    fn index(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Review form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFocus {
    Rating,
    Comment,
}

/// New movie form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieFocus {
    Title,
    Genres,
    Year,
    Actors,
    Description,
    Poster,
}

impl MovieFocus {
    pub const ORDER: [MovieFocus; 6] = [
        MovieFocus::Title,
        MovieFocus::Genres,
        MovieFocus::Year,
        MovieFocus::Actors,
        MovieFocus::Description,
        MovieFocus::Poster,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MovieFocus::Title => "Title",
            MovieFocus::Genres => "Genres",
            MovieFocus::Year => "Year",
            MovieFocus::Actors => "Actors",
            MovieFocus::Description => "Description",
            MovieFocus::Poster => "Poster URL",
        }
    }

    fn index(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Profile edit focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFocus {
    Nickname,
    Picture,
}

/// What the header shows about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderStatus {
    Loading,
    SignedIn(String),
    SignedOut,
}

impl HeaderStatus {
    pub fn from_state(state: &SessionState) -> Self {
        match state {
            SessionState::Uninitialized => HeaderStatus::Loading,
            SessionState::Authenticated(profile) => {
                HeaderStatus::SignedIn(profile.display_name().to_string())
            }
            SessionState::Unauthenticated => HeaderStatus::SignedOut,
        }
    }
}

/// A review awaiting delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub review_id: String,
    pub summary: String,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned API tasks. Errors are already formatted
/// for display.
enum TaskResult {
    SessionReady,
    Movies(Result<Vec<Movie>, String>),
    MovieDetail {
        movie_id: String,
        movie: Result<Movie, String>,
        reviews: Result<Vec<Review>, String>,
    },
    Reviews {
        movie_id: String,
        reviews: Result<Vec<Review>, String>,
    },
    ReviewSubmitted(Result<(), String>),
    MovieAdded(Result<Movie, String>),
    ReviewDeleted(Result<(), String>),
    ProfileReviews(Result<Vec<Review>, String>),
    ProfileUpdated(Result<(), String>),
    Login(Result<bool, String>),
    Registered(Result<(), String>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: Arc<SessionStore>,
    auth_events: AuthSubscription,

    // UI State
    pub state: AppState,
    pub route: Route,
    pub header: HeaderStatus,
    pub status_message: Option<String>,

    // Movie browser
    pub filter: MovieFilter,
    pub search_input: String,
    pub years: Vec<i32>,
    pub movies: Vec<Movie>,
    pub movies_selection: usize,
    pub movies_loading: bool,
    pub movies_error: Option<String>,

    // Movie details
    pub movie: Option<Movie>,
    pub reviews: Vec<Review>,
    pub review_selection: usize,
    pub detail_loading: bool,
    pub detail_error: Option<String>,
    pub review_form: ReviewForm,
    pub review_focus: ReviewFocus,
    pub review_error: Option<String>,

    // New movie
    pub movie_form: MovieForm,
    pub movie_focus: MovieFocus,
    pub movie_error: Option<String>,

    // Profile
    pub profile_reviews: Vec<Review>,
    pub profile_selection: usize,
    pub profile_form: ProfileForm,
    pub profile_focus: ProfileFocus,
    pub profile_error: Option<String>,

    pub pending_delete: Option<PendingDelete>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_pending: bool,

    // Registration form state
    pub register_form: RegisterForm,
    pub register_focus: RegisterFocus,
    pub register_error: Option<String>,
    pub register_pending: bool,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    pub fn new(config: Config, session: Arc<SessionStore>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Prefill credentials from env vars or config
        let login_email = std::env::var("WATCHNOW_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let login_password = std::env::var("WATCHNOW_PASSWORD").unwrap_or_default();

        let auth_events = session.subscribe();
        let header = HeaderStatus::from_state(&session.state());
        let route = session.navigator().current();

        Self {
            config,
            session,
            auth_events,

            state: AppState::Normal,
            route,
            header,
            status_message: None,

            filter: MovieFilter::default(),
            search_input: String::new(),
            years: year_options(),
            movies: Vec::new(),
            movies_selection: 0,
            movies_loading: false,
            movies_error: None,

            movie: None,
            reviews: Vec::new(),
            review_selection: 0,
            detail_loading: false,
            detail_error: None,
            review_form: ReviewForm::default(),
            review_focus: ReviewFocus::Rating,
            review_error: None,

            movie_form: MovieForm::default(),
            movie_focus: MovieFocus::Title,
            movie_error: None,

            profile_reviews: Vec::new(),
            profile_selection: 0,
            profile_form: ProfileForm::default(),
            profile_focus: ProfileFocus::Nickname,
            profile_error: None,

            pending_delete: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            login_pending: false,

            register_form: RegisterForm::default(),
            register_focus: RegisterFocus::Nickname,
            register_error: None,
            register_pending: false,

            task_rx: rx,
            task_tx: tx,
        }
    }

    /// Kick off session initialization and the first movie fetch.
    pub fn start(&mut self) {
        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            session.initialize().await;
            Self::send_result(&tx, TaskResult::SessionReady).await;
        });
        self.load_movies();
    }

    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            debug!("App closed before task result was delivered");
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.state().is_authenticated()
    }

    pub fn identity(&self) -> Option<UserProfile> {
        self.session.identity()
    }

    pub fn refresh_header(&mut self) {
        self.header = HeaderStatus::from_state(&self.session.state());
    }

    /// Show the login form, prefilled with the last email used.
    pub fn start_login(&mut self) {
        self.navigate(Route::Login);
    }

    pub fn attempt_login(&mut self) {
        if self.login_pending {
            return;
        }
        self.login_error = None;
        self.login_pending = true;

        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        let email = self.login_email.clone();
        let password = self.login_password.clone();
        tokio::spawn(async move {
            let result = session
                .login(&email, &password)
                .await
                .map_err(|e| e.user_message("Login"));
            Self::send_result(&tx, TaskResult::Login(result)).await;
        });
    }

    pub fn attempt_register(&mut self) {
        if self.register_pending {
            return;
        }
        self.register_error = None;
        self.register_pending = true;

        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        let form = self.register_form.clone();
        tokio::spawn(async move {
            let result = session
                .register(&form)
                .await
                .map(|_| ())
                .map_err(|e| e.user_message("Registration"));
            Self::send_result(&tx, TaskResult::Registered(result)).await;
        });
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.profile_reviews.clear();
        self.status_message = Some("Logged out".to_string());
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate through the session's navigator so protected routes redirect.
    pub fn navigate(&mut self, route: Route) {
        let shown = self
            .session
            .navigator()
            .navigate(route, self.is_authenticated());
        self.enter_route(shown);
    }

    fn enter_route(&mut self, route: Route) {
        debug!(?route, "Entering route");
        // The login view shows registration and logout notices
        if route != Route::Login {
            self.status_message = None;
        }
        self.route = route.clone();
        self.state = AppState::Normal;
        match route {
            Route::Home => {
                if self.movies.is_empty() && !self.movies_loading {
                    self.load_movies();
                }
            }
            Route::MovieDetails(id) => self.load_movie_detail(&id),
            Route::Profile => {
                self.profile_error = None;
                self.load_profile_reviews();
            }
            Route::Login => {
                self.login_error = None;
                self.login_focus = if self.login_email.is_empty() {
                    LoginFocus::Email
                } else {
                    LoginFocus::Password
                };
            }
            Route::Register => {
                self.register_error = None;
                self.register_focus = RegisterFocus::Nickname;
            }
        }
    }

    /// Follow navigation done elsewhere (e.g. logout sends us to Login).
    fn sync_route(&mut self) {
        let current = self.session.navigator().current();
        if current != self.route {
            self.enter_route(current);
        }
    }

    // =========================================================================
    // Movies
    // =========================================================================

    pub fn load_movies(&mut self) {
        self.movies_loading = true;
        self.movies_error = None;

        let api = self.session.api();
        let filter = self.filter.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = api
                .list_movies(&filter)
                .await
                .map_err(|e| failure("fetch movies", &e));
            Self::send_result(&tx, TaskResult::Movies(result)).await;
        });
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        self.movies.get(self.movies_selection)
    }

    pub fn apply_search(&mut self) {
        let query = self.search_input.trim();
        self.filter.query = (!query.is_empty()).then(|| query.to_string());
        self.movies_selection = 0;
        self.load_movies();
    }

    /// Step the genre filter through "any" and each genre.
    pub fn cycle_genre(&mut self, forward: bool) {
        let current = self.filter.genre.as_deref();
        self.filter.genre =
            cycle_option(current.as_ref(), &GENRES, forward).map(|genre| genre.to_string());
        self.movies_selection = 0;
        self.load_movies();
    }

    pub fn cycle_year(&mut self, forward: bool) {
        self.filter.year = cycle_option(self.filter.year.as_ref(), &self.years, forward).copied();
        self.movies_selection = 0;
        self.load_movies();
    }

    pub fn reset_filters(&mut self) {
        self.filter.reset();
        self.search_input.clear();
        self.movies_selection = 0;
        self.load_movies();
    }

    pub fn open_selected_movie(&mut self) {
        if let Some(id) = self.selected_movie().map(|m| m.id.clone()) {
            self.navigate(Route::MovieDetails(id));
        }
    }

    /// Open the new movie form. Adding movies needs a session.
    pub fn start_add_movie(&mut self) {
        if !self.is_authenticated() {
            self.status_message = Some("Login to add movies".to_string());
            return;
        }
        self.movie_form = MovieForm::default();
        self.movie_focus = MovieFocus::Title;
        self.movie_error = None;
        self.state = AppState::AddingMovie;
    }

    /// The form field behind `focus`.
    pub fn movie_field(&self, focus: MovieFocus) -> &str {
        let form = &self.movie_form;
        match focus {
            MovieFocus::Title => &form.title,
            MovieFocus::Genres => &form.genres,
            MovieFocus::Year => &form.release_year,
            MovieFocus::Actors => &form.actors,
            MovieFocus::Description => &form.description,
            MovieFocus::Poster => &form.poster_url,
        }
    }

    pub fn movie_field_mut(&mut self) -> &mut String {
        let form = &mut self.movie_form;
        match self.movie_focus {
            MovieFocus::Title => &mut form.title,
            MovieFocus::Genres => &mut form.genres,
            MovieFocus::Year => &mut form.release_year,
            MovieFocus::Actors => &mut form.actors,
            MovieFocus::Description => &mut form.description,
            MovieFocus::Poster => &mut form.poster_url,
        }
    }

    pub fn submit_movie(&mut self) {
        let movie = match self.movie_form.validate() {
            Ok(movie) => movie,
            Err(e) => {
                self.movie_error = Some(e.to_string());
                return;
            }
        };
        self.movie_error = None;

        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let api = session.api();
            let result = session
                .observe(api.add_movie(&movie).await)
                .map_err(|e| failure("add movie", &e));
            Self::send_result(&tx, TaskResult::MovieAdded(result)).await;
        });
    }

    // =========================================================================
    // Movie details and reviews
    // =========================================================================

    fn load_movie_detail(&mut self, movie_id: &str) {
        if self.movie.as_ref().map(|m| m.id.as_str()) != Some(movie_id) {
            self.movie = None;
            self.reviews.clear();
        }
        self.review_selection = 0;
        self.detail_loading = true;
        self.detail_error = None;
        self.review_error = None;

        let api = self.session.api();
        let tx = self.task_tx.clone();
        let movie_id = movie_id.to_string();
        tokio::spawn(async move {
            let (movie, reviews) =
                futures::join!(api.get_movie(&movie_id), api.list_movie_reviews(&movie_id));
            let result = TaskResult::MovieDetail {
                movie: movie.map_err(|e| failure("fetch movie details", &e)),
                reviews: reviews.map_err(|e| failure("fetch reviews", &e)),
                movie_id,
            };
            Self::send_result(&tx, result).await;
        });
    }

    fn reload_reviews(&self, movie_id: String) {
        let api = self.session.api();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let reviews = api
                .list_movie_reviews(&movie_id)
                .await
                .map_err(|e| failure("fetch reviews", &e));
            Self::send_result(&tx, TaskResult::Reviews { movie_id, reviews }).await;
        });
    }

    fn current_movie_id(&self) -> Option<&str> {
        match &self.route {
            Route::MovieDetails(id) => Some(id),
            _ => None,
        }
    }

    /// Open the review form, or explain why it can't be used.
    pub fn start_review(&mut self) {
        if !self.is_authenticated() {
            self.review_error = Some(ValidationError::LoginRequired.to_string());
            return;
        }
        self.review_error = None;
        self.review_focus = ReviewFocus::Rating;
        self.state = AppState::WritingReview;
    }

    pub fn adjust_review_rating(&mut self, delta: i32) {
        let rating = self.review_form.rating + delta;
        self.review_form.rating = rating.clamp(MIN_RATING, MAX_RATING);
    }

    pub fn submit_review(&mut self) {
        let Some(movie_id) = self.current_movie_id().map(str::to_string) else {
            return;
        };
        let review = match self.review_form.validate(self.is_authenticated()) {
            Ok(review) => review,
            Err(e) => {
                self.review_error = Some(e.to_string());
                return;
            }
        };
        self.review_error = None;

        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let api = session.api();
            let result = session
                .observe(api.add_review(&movie_id, &review).await)
                .map(|_| ())
                .map_err(|e| failure("submit review", &e));
            Self::send_result(&tx, TaskResult::ReviewSubmitted(result)).await;
        });
    }

    pub fn selected_review(&self) -> Option<&Review> {
        match self.route {
            Route::Profile => self.profile_reviews.get(self.profile_selection),
            _ => self.reviews.get(self.review_selection),
        }
    }

    pub fn can_delete(&self, review: &Review) -> bool {
        self.identity()
            .map(|me| review.is_authored_by(&me.id))
            .unwrap_or(false)
    }

    /// Ask for confirmation before deleting the selected review.
    pub fn request_delete(&mut self) {
        let Some(review) = self.selected_review().cloned() else {
            return;
        };
        if !self.can_delete(&review) {
            self.status_message = Some("You can only delete your own reviews".to_string());
            return;
        }
        self.pending_delete = Some(PendingDelete {
            summary: format!("{} {}", review.stars(), review.comment),
            review_id: review.id,
        });
        self.state = AppState::ConfirmingDelete;
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };

        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let api = session.api();
            let result = session
                .observe(api.delete_review(&pending.review_id).await)
                .map_err(|e| failure("delete review", &e));
            Self::send_result(&tx, TaskResult::ReviewDeleted(result)).await;
        });
    }

    // =========================================================================
    // Profile
    // =========================================================================

    fn load_profile_reviews(&mut self) {
        let Some(me) = self.identity() else {
            return;
        };
        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let api = session.api();
            let result = session
                .observe(api.list_user_reviews(&me.id).await)
                .map_err(|e| failure("fetch reviews", &e));
            Self::send_result(&tx, TaskResult::ProfileReviews(result)).await;
        });
    }

    pub fn start_profile_edit(&mut self) {
        let Some(me) = self.identity() else {
            return;
        };
        self.profile_form = ProfileForm::from_profile(&me);
        self.profile_focus = ProfileFocus::Nickname;
        self.profile_error = None;
        self.state = AppState::EditingProfile;
    }

    pub fn save_profile(&mut self) {
        self.state = AppState::Normal;
        let update = self.profile_form.to_update();

        let session = Arc::clone(&self.session);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let api = session.api();
            let result = match session.observe(api.update_profile(&update).await) {
                Ok(_) => {
                    session.refresh_identity().await;
                    Ok(())
                }
                Err(e) => Err(failure("update profile", &e)),
            };
            Self::send_result(&tx, TaskResult::ProfileUpdated(result)).await;
        });
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn current_list_len(&self) -> usize {
        match self.route {
            Route::Home => self.movies.len(),
            Route::MovieDetails(_) => self.reviews.len(),
            Route::Profile => self.profile_reviews.len(),
            Route::Login | Route::Register => 0,
        }
    }

    fn current_selection_mut(&mut self) -> Option<&mut usize> {
        match self.route {
            Route::Home => Some(&mut self.movies_selection),
            Route::MovieDetails(_) => Some(&mut self.review_selection),
            Route::Profile => Some(&mut self.profile_selection),
            Route::Login | Route::Register => None,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_list_len();
        if let Some(selection) = self.current_selection_mut() {
            *selection = step_selection(*selection, delta, len);
        }
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Apply auth changes and finished background tasks. Called every tick.
    pub fn check_background_tasks(&mut self) {
        let mut auth_changed = false;
        while let Some(change) = self.auth_events.try_recv() {
            debug!(?change, "Auth change received");
            if change == AuthChange::SessionExpired {
                self.status_message =
                    Some("Your session has expired. Please login again.".to_string());
            }
            auth_changed = true;
        }
        if auth_changed {
            self.refresh_header();
            self.sync_route();
        }

        let mut results = Vec::new();
        while let Ok(result) = self.task_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::SessionReady => {
                self.refresh_header();
                info!(authenticated = self.is_authenticated(), "Session ready");
            }
            TaskResult::Movies(result) => {
                self.movies_loading = false;
                match result {
                    Ok(movies) => {
                        self.movies = movies;
                        self.movies_selection =
                            self.movies_selection.min(self.movies.len().saturating_sub(1));
                    }
                    Err(msg) => {
                        self.movies.clear();
                        self.movies_error = Some(msg);
                    }
                }
            }
            TaskResult::MovieDetail {
                movie_id,
                movie,
                reviews,
            } => {
                if self.current_movie_id() != Some(movie_id.as_str()) {
                    debug!(movie_id = %movie_id, "Discarding details for a movie no longer shown");
                    return;
                }
                self.detail_loading = false;
                match movie {
                    Ok(movie) => self.movie = Some(movie),
                    Err(msg) => self.detail_error = Some(msg),
                }
                self.apply_reviews(reviews);
            }
            TaskResult::Reviews { movie_id, reviews } => {
                if self.current_movie_id() == Some(movie_id.as_str()) {
                    self.apply_reviews(reviews);
                }
            }
            TaskResult::ReviewSubmitted(result) => match result {
                Ok(()) => {
                    self.review_form.clear();
                    self.state = AppState::Normal;
                    self.status_message = Some("Review submitted".to_string());
                    if let Some(id) = self.current_movie_id().map(str::to_string) {
                        self.reload_reviews(id);
                    }
                }
                Err(msg) => self.review_error = Some(msg),
            },
            TaskResult::MovieAdded(result) => match result {
                Ok(movie) => {
                    info!(movie_id = %movie.id, "Movie added");
                    self.movie_form = MovieForm::default();
                    self.state = AppState::Normal;
                    self.status_message = Some(format!("Added \"{}\"", movie.title));
                    self.load_movies();
                }
                Err(msg) => self.movie_error = Some(msg),
            },
            TaskResult::ReviewDeleted(result) => match result {
                Ok(()) => {
                    self.status_message = Some("Review deleted".to_string());
                    match self.route.clone() {
                        Route::MovieDetails(id) => self.reload_reviews(id),
                        Route::Profile => self.load_profile_reviews(),
                        _ => {}
                    }
                }
                Err(msg) => self.status_message = Some(msg),
            },
            TaskResult::ProfileReviews(result) => match result {
                Ok(mut reviews) => {
                    sort_newest_first(&mut reviews);
                    self.profile_selection =
                        self.profile_selection.min(reviews.len().saturating_sub(1));
                    self.profile_reviews = reviews;
                }
                Err(msg) => self.profile_error = Some(msg),
            },
            TaskResult::ProfileUpdated(result) => match result {
                Ok(()) => {
                    self.refresh_header();
                    self.status_message = Some("Profile updated".to_string());
                }
                Err(msg) => self.profile_error = Some(msg),
            },
            TaskResult::Login(result) => {
                self.login_pending = false;
                match result {
                    Ok(true) => {
                        self.login_password.clear();
                        self.config.last_email = Some(self.login_email.trim().to_string());
                        if let Err(e) = self.config.save() {
                            warn!(error = %e, "Failed to save config");
                        }
                        self.refresh_header();
                        let destination = self.session.navigator().take_return();
                        self.navigate(destination);
                    }
                    // Superseded by a newer auth operation
                    Ok(false) => {}
                    Err(msg) => {
                        self.login_error = Some(msg);
                        self.refresh_header();
                    }
                }
            }
            TaskResult::Registered(result) => {
                self.register_pending = false;
                match result {
                    Ok(()) => {
                        self.login_email = self.register_form.email.trim().to_string();
                        self.login_password.clear();
                        self.register_form = RegisterForm::default();
                        self.status_message = Some(REGISTRATION_SUCCESS.to_string());
                        self.navigate(Route::Login);
                    }
                    Err(msg) => self.register_error = Some(msg),
                }
            }
        }
    }

    fn apply_reviews(&mut self, reviews: Result<Vec<Review>, String>) {
        match reviews {
            Ok(mut reviews) => {
                sort_newest_first(&mut reviews);
                self.review_selection = self.review_selection.min(reviews.len().saturating_sub(1));
                self.reviews = reviews;
            }
            Err(msg) => {
                self.reviews.clear();
                self.detail_error.get_or_insert(msg);
            }
        }
    }
}

/// "Failed to <action>: <detail>"
fn failure(action: &str, err: &ApiError) -> String {
    warn!(error = %err, action, "Request failed");
    format!("Failed to {}: {}", action, err.detail())
}

/// Step through `None` followed by each option, wrapping at both ends.
fn cycle_option<'a, T: PartialEq>(
    current: Option<&T>,
    options: &'a [T],
    forward: bool,
) -> Option<&'a T> {
    let position = current.and_then(|c| options.iter().position(|o| o == c));
    let slots = options.len() + 1;
    // Slot 0 is "any"; option i lives in slot i + 1
    let slot = position.map(|p| p + 1).unwrap_or(0);
    let next = if forward {
        (slot + 1) % slots
    } else {
        (slot + slots - 1) % slots
    };
    next.checked_sub(1).map(|i| &options[i])
}

fn step_selection(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize).min(max)
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c)
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_url_char(current_len: usize, c: char) -> bool {
    current_len < MAX_URL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_comment_char(current_len: usize, c: char) -> bool {
    current_len < MAX_COMMENT_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Focus Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_login_focus_cycle() {
        assert_eq!(LoginFocus::Email.next(), LoginFocus::Password);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Email); // Wraps around
        assert_eq!(LoginFocus::Email.prev(), LoginFocus::Button);
    }

    #[test]
    fn test_movie_focus_cycle() {
        assert_eq!(MovieFocus::Title.next(), MovieFocus::Genres);
        assert_eq!(MovieFocus::Poster.next(), MovieFocus::Title);
        assert_eq!(MovieFocus::Title.prev(), MovieFocus::Poster);
        assert_eq!(MovieFocus::Year.label(), "Year");
    }

    #[test]
    fn test_register_focus_cycle() {
        assert_eq!(RegisterFocus::Nickname.next(), RegisterFocus::Email);
        assert_eq!(RegisterFocus::ProfilePicture.next(), RegisterFocus::Button);
        assert_eq!(RegisterFocus::Button.next(), RegisterFocus::Nickname);
        assert_eq!(RegisterFocus::Nickname.prev(), RegisterFocus::Button);
    }

    // -------------------------------------------------------------------------
    // Header Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_header_status_from_state() {
        assert_eq!(
            HeaderStatus::from_state(&SessionState::Uninitialized),
            HeaderStatus::Loading
        );
        assert_eq!(
            HeaderStatus::from_state(&SessionState::Unauthenticated),
            HeaderStatus::SignedOut
        );
        let profile = UserProfile {
            id: "u1".to_string(),
            nickname: Some("neo".to_string()),
            email: "neo@example.com".to_string(),
            profile_picture: None,
        };
        assert_eq!(
            HeaderStatus::from_state(&SessionState::Authenticated(profile)),
            HeaderStatus::SignedIn("neo".to_string())
        );
    }

    // -------------------------------------------------------------------------
    // Filter and Selection Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_cycle_option_genres() {
        assert_eq!(cycle_option(None, &GENRES, true), Some(&"Action"));
        assert_eq!(cycle_option(Some(&"Thriller"), &GENRES, true), None); // Back to "any"
        assert_eq!(cycle_option(None, &GENRES, false), Some(&"Thriller"));
        assert_eq!(cycle_option(Some(&"Action"), &GENRES, false), None);
    }

    #[test]
    fn test_cycle_option_years() {
        let years = vec![2026, 2025, 2024];
        assert_eq!(cycle_option(None, &years, true), Some(&2026));
        assert_eq!(cycle_option(Some(&2026), &years, true), Some(&2025));
        assert_eq!(cycle_option(Some(&1900), &years, true), Some(&2026));
    }

    #[test]
    fn test_step_selection() {
        assert_eq!(step_selection(0, 1, 3), 1);
        assert_eq!(step_selection(2, 1, 3), 2);
        assert_eq!(step_selection(0, -1, 3), 0);
        assert_eq!(step_selection(5, PAGE_SCROLL_SIZE as isize, 8), 7);
        assert_eq!(step_selection(9, -(PAGE_SCROLL_SIZE as isize), 20), 0);
        assert_eq!(step_selection(3, 1, 0), 0);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(99, '@'));
        assert!(!can_add_email_char(100, 'a'));
        assert!(!can_add_email_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
    }

    #[test]
    fn test_can_add_url_char() {
        assert!(can_add_url_char(0, 'h'));
        assert!(!can_add_url_char(0, ' '));
        assert!(!can_add_url_char(300, 'h'));
    }

    #[test]
    fn test_can_add_comment_char() {
        assert!(can_add_comment_char(0, ' '));
        assert!(!can_add_comment_char(1000, 'a'));
        assert!(!can_add_comment_char(0, '\t'));
    }
}
