use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use watchnow_core::utils::{format_optional, truncate};

use crate::app::{App, AppState};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_filters(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_movie_list(frame, app, body[0]);
    render_preview(frame, app, body[1]);
}

fn render_filters(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.state == AppState::Searching;

    let query = if searching {
        format!("{}▌", app.search_input)
    } else {
        format_optional(app.filter.query.as_deref(), "any title")
    };
    let genre = format_optional(app.filter.genre.as_deref(), "any");
    let year = app
        .filter
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "any".to_string());

    let line = Line::from(vec![
        Span::styled(" Search: ", styles::muted_style()),
        Span::styled(
            query,
            if searching {
                styles::search_style()
            } else {
                styles::list_item_style()
            },
        ),
        Span::styled("   Genre: ", styles::muted_style()),
        Span::styled(genre, styles::highlight_style()),
        Span::styled("   Year: ", styles::muted_style()),
        Span::styled(year, styles::highlight_style()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_movie_list(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Movies ({}) ", app.movies.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.movies_loading && app.movies.is_empty() {
        let text = Paragraph::new(" Loading movies...")
            .style(styles::muted_style())
            .block(block);
        frame.render_widget(text, area);
        return;
    }
    if let Some(error) = &app.movies_error {
        let text = Paragraph::new(format!(" {}", error))
            .style(styles::error_style())
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(text, area);
        return;
    }
    if app.movies.is_empty() {
        let text = Paragraph::new(" No movies found.")
            .style(styles::muted_style())
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Title"),
        Cell::from("Year"),
        Cell::from("Genres"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .movies
        .iter()
        .enumerate()
        .map(|(i, movie)| {
            let style = if i == app.movies_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(movie.title.as_str()),
                Cell::from(movie.year_display()),
                Cell::from(movie.genres_display()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(50),
        Constraint::Length(6),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.movies_selection));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(movie) = app.selected_movie() else {
        frame.render_widget(block, area);
        return;
    };

    let lines = vec![
        Line::from(Span::styled(movie.title.clone(), styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Year:   ", styles::muted_style()),
            Span::raw(movie.year_display()),
        ]),
        Line::from(vec![
            Span::styled("Genres: ", styles::muted_style()),
            Span::raw(movie.genres_display()),
        ]),
        Line::from(vec![
            Span::styled("Cast:   ", styles::muted_style()),
            Span::raw(truncate(&movie.actors_display(), 60)),
        ]),
        Line::from(""),
        Line::from(Span::raw(format_optional(
            movie.description.as_deref(),
            "No description.",
        ))),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] view details and reviews",
            styles::muted_style(),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}
