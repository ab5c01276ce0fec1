//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use watchnow_core::nav::Route;

use crate::app::{
    can_add_comment_char, can_add_email_char, can_add_field_char, can_add_password_char,
    can_add_url_char, App, AppState, LoginFocus, MovieFocus, ProfileFocus, RegisterFocus,
    ReviewFocus, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::WritingReview => {
            handle_review_input(app, key);
            return Ok(false);
        }
        AppState::AddingMovie => {
            handle_movie_form_input(app, key);
            return Ok(false);
        }
        AppState::EditingProfile => {
            handle_profile_edit_input(app, key);
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Forms take every printable key
    match app.route {
        Route::Login => {
            handle_login_input(app, key);
            return Ok(false);
        }
        Route::Register => {
            handle_register_input(app, key);
            return Ok(false);
        }
        _ => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') | KeyCode::Char('m') => {
            app.navigate(Route::Home);
            return Ok(false);
        }
        KeyCode::Char('2') | KeyCode::Char('p') => {
            app.navigate(Route::Profile);
            return Ok(false);
        }
        KeyCode::Char('l') if !app.is_authenticated() => {
            app.start_login();
            return Ok(false);
        }
        KeyCode::Char('n') if !app.is_authenticated() => {
            app.navigate(Route::Register);
            return Ok(false);
        }
        KeyCode::Char('o') if app.is_authenticated() => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        _ => {}
    }

    match app.route.clone() {
        Route::Home => handle_movies_input(app, key),
        Route::MovieDetails(_) => handle_detail_input(app, key),
        Route::Profile => handle_profile_input(app, key),
        Route::Login | Route::Register => {}
    }

    Ok(false)
}

fn handle_movies_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.open_selected_movie(),
        KeyCode::Char('/') => {
            app.search_input = app.filter.query.clone().unwrap_or_default();
            app.state = AppState::Searching;
        }
        KeyCode::Char('g') => app.cycle_genre(true),
        KeyCode::Char('G') => app.cycle_genre(false),
        KeyCode::Char('y') => app.cycle_year(true),
        KeyCode::Char('Y') => app.cycle_year(false),
        KeyCode::Char('r') => app.reset_filters(),
        KeyCode::Char('a') => app.start_add_movie(),
        KeyCode::Char('u') => app.load_movies(),
        _ => {}
    }
}

fn handle_detail_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace => app.navigate(Route::Home),
        KeyCode::Char('a') => app.start_review(),
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
}

fn handle_profile_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Home),
        KeyCode::Char('e') => app.start_profile_edit(),
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_input.clear();
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.apply_search();
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_field_char(app.search_input.chars().count(), c) {
                app.search_input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_review_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.review_error = None;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.review_focus = match app.review_focus {
                ReviewFocus::Rating => ReviewFocus::Comment,
                ReviewFocus::Comment => ReviewFocus::Rating,
            };
        }
        KeyCode::Enter => app.submit_review(),
        _ => match app.review_focus {
            ReviewFocus::Rating => match key.code {
                KeyCode::Left | KeyCode::Down | KeyCode::Char('-') => app.adjust_review_rating(-1),
                KeyCode::Right | KeyCode::Up | KeyCode::Char('+') => app.adjust_review_rating(1),
                KeyCode::Char(c @ '1'..='5') => {
                    app.review_form.rating = c.to_digit(10).map(|d| d as i32).unwrap_or(0);
                }
                _ => {}
            },
            ReviewFocus::Comment => match key.code {
                KeyCode::Backspace => {
                    app.review_form.comment.pop();
                }
                KeyCode::Char(c) => {
                    if can_add_comment_char(app.review_form.comment.chars().count(), c) {
                        app.review_form.comment.push(c);
                    }
                }
                _ => {}
            },
        },
    }
}

fn handle_movie_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.movie_error = None;
        }
        KeyCode::Down | KeyCode::Tab => app.movie_focus = app.movie_focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.movie_focus = app.movie_focus.prev(),
        KeyCode::Enter => app.submit_movie(),
        KeyCode::Backspace => {
            app.movie_field_mut().pop();
        }
        KeyCode::Char(c) => {
            let focus = app.movie_focus;
            let field = app.movie_field_mut();
            let len = field.chars().count();
            let accepted = match focus {
                MovieFocus::Year => len < 4 && c.is_ascii_digit(),
                MovieFocus::Poster => can_add_url_char(len, c),
                MovieFocus::Title => can_add_field_char(len, c),
                MovieFocus::Genres | MovieFocus::Actors | MovieFocus::Description => {
                    can_add_comment_char(len, c)
                }
            };
            if accepted {
                field.push(c);
            }
        }
        _ => {}
    }
}

fn handle_profile_edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.profile_focus = match app.profile_focus {
                ProfileFocus::Nickname => ProfileFocus::Picture,
                ProfileFocus::Picture => ProfileFocus::Nickname,
            };
        }
        KeyCode::Enter => app.save_profile(),
        KeyCode::Backspace => {
            match app.profile_focus {
                ProfileFocus::Nickname => app.profile_form.nickname.pop(),
                ProfileFocus::Picture => app.profile_form.profile_picture.pop(),
            };
        }
        KeyCode::Char(c) => match app.profile_focus {
            ProfileFocus::Nickname => {
                if can_add_field_char(app.profile_form.nickname.chars().count(), c) {
                    app.profile_form.nickname.push(c);
                }
            }
            ProfileFocus::Picture => {
                if can_add_url_char(app.profile_form.profile_picture.chars().count(), c) {
                    app.profile_form.profile_picture.push(c);
                }
            }
        },
        _ => {}
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Home),
        KeyCode::Down | KeyCode::Tab => app.login_focus = app.login_focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.login_focus = app.login_focus.prev(),
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login(),
        },
        KeyCode::Backspace => {
            match app.login_focus {
                LoginFocus::Email => {
                    app.login_email.pop();
                }
                LoginFocus::Password => {
                    app.login_password.pop();
                }
                LoginFocus::Button => {}
            }
        }
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {
                // Ignore character input on button
            }
        },
        _ => {}
    }
}

fn handle_register_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Home),
        KeyCode::Down | KeyCode::Tab => app.register_focus = app.register_focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.register_focus = app.register_focus.prev(),
        KeyCode::Enter => {
            if app.register_focus == RegisterFocus::Button {
                app.attempt_register();
            } else {
                app.register_focus = app.register_focus.next();
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = register_field(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            let focus = app.register_focus;
            if let Some(field) = register_field(app) {
                let len = field.chars().count();
                let accepted = match focus {
                    RegisterFocus::Email => can_add_email_char(len, c),
                    RegisterFocus::Password | RegisterFocus::ConfirmPassword => {
                        can_add_password_char(len, c)
                    }
                    RegisterFocus::ProfilePicture => can_add_url_char(len, c),
                    RegisterFocus::Nickname | RegisterFocus::Button => can_add_field_char(len, c),
                };
                if accepted {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
}

fn register_field(app: &mut App) -> Option<&mut String> {
    let form = &mut app.register_form;
    match app.register_focus {
        RegisterFocus::Nickname => Some(&mut form.nickname),
        RegisterFocus::Email => Some(&mut form.email),
        RegisterFocus::Password => Some(&mut form.password),
        RegisterFocus::ConfirmPassword => Some(&mut form.confirm_password),
        RegisterFocus::ProfilePicture => Some(&mut form.profile_picture),
        RegisterFocus::Button => None,
    }
}
