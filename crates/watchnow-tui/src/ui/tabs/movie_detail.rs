use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use watchnow_core::utils::format_optional;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_movie(frame, app, chunks[0]);
    render_reviews(frame, app, chunks[1]);
}

fn render_movie(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Movie ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(movie) = &app.movie else {
        let (text, style) = match &app.detail_error {
            Some(error) => (format!(" {}", error), styles::error_style()),
            None if app.detail_loading => (" Loading...".to_string(), styles::muted_style()),
            None => (" Movie not found.".to_string(), styles::muted_style()),
        };
        let paragraph = Paragraph::new(text)
            .style(style)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(movie.title.clone(), styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Release year: ", styles::muted_style()),
            Span::raw(movie.year_display()),
        ]),
        Line::from(vec![
            Span::styled("Genres:       ", styles::muted_style()),
            Span::raw(movie.genres_display()),
        ]),
        Line::from(vec![
            Span::styled("Actors:       ", styles::muted_style()),
            Span::raw(movie.actors_display()),
        ]),
    ];
    if let Some(poster) = &movie.poster_url {
        lines.push(Line::from(vec![
            Span::styled("Poster:       ", styles::muted_style()),
            Span::raw(poster.clone()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::raw(format_optional(
        movie.description.as_deref(),
        "No description.",
    ))));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_reviews(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let title = format!(" Reviews ({}) ", app.reviews.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.reviews.is_empty() {
        let text = if app.detail_loading {
            " Loading reviews..."
        } else {
            " No reviews yet. Be the first to review this movie!"
        };
        let paragraph = Paragraph::new(text)
            .style(styles::muted_style())
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, chunks[0]);
    } else {
        let items: Vec<ListItem> = app
            .reviews
            .iter()
            .map(|review| {
                let mut header = vec![
                    Span::styled(review.stars(), styles::rating_style()),
                    Span::styled(format!("  {}", review.formatted_date()), styles::muted_style()),
                ];
                if app.can_delete(review) {
                    header.push(Span::styled("  (yours)", styles::success_style()));
                }
                ListItem::new(vec![
                    Line::from(header),
                    Line::from(Span::styled(
                        format!("  {}", review.comment),
                        styles::list_item_style(),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(styles::selected_style());
        let mut state = ListState::default();
        state.select(Some(app.review_selection));
        frame.render_stateful_widget(list, chunks[0], &mut state);
    }

    render_review_hint(frame, app, chunks[1]);
}

fn render_review_hint(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.review_error {
        Some(error) => Line::from(Span::styled(format!(" {}", error), styles::error_style())),
        None if app.is_authenticated() => Line::from(vec![
            Span::styled(" [a]", styles::help_key_style()),
            Span::styled(" write a review   ", styles::muted_style()),
            Span::styled("[d]", styles::help_key_style()),
            Span::styled(" delete your review", styles::muted_style()),
        ]),
        None => Line::from(vec![
            Span::styled(" [l]", styles::help_key_style()),
            Span::styled(" login to write a review", styles::muted_style()),
        ]),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(line).block(block), area);
}
