use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use watchnow_core::models::{MAX_RATING, MIN_RATING};
use watchnow_core::nav::Route;

use crate::app::{App, AppState, HeaderStatus, MovieFocus, ReviewFocus};

use super::styles;
use super::tabs::{account, movie_detail, movies, profile};

const TITLE: &str = "  WatchNow";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::WritingReview => render_review_overlay(frame, app),
        AppState::AddingMovie => render_movie_overlay(frame, app),
        AppState::Normal
        | AppState::Searching
        | AppState::EditingProfile
        | AppState::Quitting => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(TITLE, styles::title_style()), Span::raw("   ")];

    let nav = [
        ("[1] Movies", matches!(app.route, Route::Home | Route::MovieDetails(_))),
        ("[2] Profile", app.route == Route::Profile),
    ];
    for (i, (label, selected)) in nav.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(*label, styles::tab_style(*selected)));
    }

    let session: Vec<Span> = match &app.header {
        HeaderStatus::Loading => vec![Span::styled("Loading user...", styles::muted_style())],
        HeaderStatus::SignedIn(name) => vec![
            Span::styled(name.clone(), styles::highlight_style()),
            Span::styled("  [o] Logout", styles::muted_style()),
        ],
        HeaderStatus::SignedOut => vec![
            Span::styled("[l] Login", styles::help_key_style()),
            Span::styled("  [n] Register", styles::muted_style()),
        ],
    };

    // Push the session status to the right edge
    let left_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let right_width: usize = session.iter().map(|s| s.content.chars().count()).sum();
    let padding = (area.width as usize).saturating_sub(left_width + right_width + 2);
    spans.push(Span::raw(" ".repeat(padding)));
    spans.extend(session);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match &app.route {
        Route::Home => movies::render(frame, app, area),
        Route::MovieDetails(_) => movie_detail::render(frame, app, area),
        Route::Profile => profile::render(frame, app, area),
        Route::Login => account::render_login(frame, app, area),
        Route::Register => account::render_register(frame, app, area),
    }
}

fn shortcuts(app: &App) -> &'static str {
    match app.route {
        Route::Home => "[/]search [g]enre [y]ear [r]eset [a]dd [?]help [q]uit",
        Route::MovieDetails(_) => "[a]dd review [d]elete [Esc]back [?]help [q]uit",
        Route::Profile => "[e]dit [d]elete [Esc]back [?]help [q]uit",
        Route::Login | Route::Register => "[Tab]next [Enter]submit [Esc]back",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match &app.status_message {
        Some(msg) => format!(" {} ", msg),
        None => format!(" {} ", app.route.title()),
    };
    let right_text = format!(" {} ", shortcuts(app));

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 26, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  WatchNow", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1 / m", "Movies"),
        help_line("2 / p", "Profile (login required)"),
        help_line("↑/↓ j/k", "Navigate list"),
        help_line("Enter", "Open movie"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Movies", styles::highlight_style())),
        help_line("/", "Search by title"),
        help_line("g / G", "Next/previous genre"),
        help_line("y / Y", "Next/previous year"),
        help_line("r", "Reset filters"),
        help_line("a", "Add a movie"),
        Line::from(""),
        Line::from(Span::styled(" Account", styles::highlight_style())),
        help_line("l / n", "Login / register"),
        help_line("o", "Logout"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let paragraph = Paragraph::new(help_text).block(overlay_block(" Help "));
    frame.render_widget(paragraph, area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        confirm_hint("to quit"),
    ];

    let paragraph = Paragraph::new(lines).block(overlay_block(" Quit "));
    frame.render_widget(paragraph, area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(56, 8, frame.area());
    frame.render_widget(Clear, area);

    let summary = app
        .pending_delete
        .as_ref()
        .map(|p| p.summary.as_str())
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(
            " Are you sure you want to delete this review?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" {}", watchnow_core::utils::truncate(summary, 50)),
            styles::list_item_style(),
        )),
        Line::from(""),
        confirm_hint("to delete"),
    ];

    let paragraph = Paragraph::new(lines).block(overlay_block(" Delete review "));
    frame.render_widget(paragraph, area);
}

fn render_review_overlay(frame: &mut Frame, app: &App) {
    let height = if app.review_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(60, height, frame.area());
    frame.render_widget(Clear, area);

    let rating_focused = app.review_focus == ReviewFocus::Rating;
    let comment_focused = app.review_focus == ReviewFocus::Comment;

    let rating = app.review_form.rating;
    let stars: String = (MIN_RATING..=MAX_RATING)
        .map(|i| if i <= rating { '★' } else { '☆' })
        .collect();

    let cursor = if comment_focused { "▌" } else { "" };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(" Rating:  ", styles::muted_style()),
            Span::styled(stars, styles::field_style(rating_focused).patch(styles::rating_style())),
            Span::styled("  ←/→ or 1-5", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled(" Comment:", styles::muted_style())),
        Line::from(Span::styled(
            format!(" {}{}", app.review_form.comment, cursor),
            styles::field_style(comment_focused),
        )),
    ];

    if let Some(error) = &app.review_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [Tab] switch field  [Enter] submit  [Esc] cancel",
        styles::muted_style(),
    )));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(overlay_block(" Write a review "));
    frame.render_widget(paragraph, area);
}

fn render_movie_overlay(frame: &mut Frame, app: &App) {
    let height = if app.movie_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = MovieFocus::ORDER
        .iter()
        .map(|focus| {
            let focused = app.movie_focus == *focus;
            let cursor = if focused { "▌" } else { "" };
            let value = app.movie_field(*focus);
            Line::from(vec![
                Span::styled(format!(" {:<12}", focus.label()), styles::muted_style()),
                Span::styled(
                    format!("{}{}", watchnow_core::utils::truncate(value, 44), cursor),
                    styles::field_style(focused),
                ),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Genres and actors are comma separated",
        styles::muted_style(),
    )));

    if let Some(error) = &app.movie_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [Tab] next field  [Enter] save  [Esc] cancel",
        styles::muted_style(),
    )));

    let paragraph = Paragraph::new(lines).block(overlay_block(" Add a movie "));
    frame.render_widget(paragraph, area);
}

fn confirm_hint(action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(format!(" {}, ", action), styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ])
}

fn overlay_block(title: &'static str) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default())
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect_fixed(40, 10, outer);
        assert_eq!(inner, Rect::new(30, 15, 40, 10));
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let outer = Rect::new(5, 5, 20, 6);
        let inner = centered_rect_fixed(40, 10, outer);
        assert_eq!(inner, Rect::new(5, 5, 20, 6));
    }
}
