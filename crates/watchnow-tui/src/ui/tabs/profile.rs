use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use watchnow_core::models::UserProfile;
use watchnow_core::utils::{format_optional, truncate};

use crate::app::{App, AppState, ProfileFocus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(me) = app.identity() else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        let text = Paragraph::new(" Loading profile...")
            .style(styles::muted_style())
            .block(block);
        frame.render_widget(text, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_identity(frame, app, &me, chunks[0]);
    render_own_reviews(frame, app, chunks[1]);
}

fn render_identity(frame: &mut Frame, app: &App, me: &UserProfile, area: Rect) {
    let editing = app.state == AppState::EditingProfile;
    let block = Block::default()
        .title(if editing { " Edit profile " } else { " Profile " })
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(editing));

    let mut lines = vec![
        Line::from(Span::styled(me.display_name().to_string(), styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Email:    ", styles::muted_style()),
            Span::raw(me.email.clone()),
        ]),
    ];

    if editing {
        let nickname_focused = app.profile_focus == ProfileFocus::Nickname;
        let picture_focused = app.profile_focus == ProfileFocus::Picture;
        lines.push(edit_line(
            "Nickname: ",
            &app.profile_form.nickname,
            nickname_focused,
        ));
        lines.push(edit_line(
            "Picture:  ",
            &app.profile_form.profile_picture,
            picture_focused,
        ));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "[Tab] switch  [Enter] save  [Esc] cancel",
            styles::muted_style(),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled("Nickname: ", styles::muted_style()),
            Span::raw(format_optional(me.nickname.as_deref(), "-")),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Picture:  ", styles::muted_style()),
            Span::raw(format_optional(me.profile_picture.as_deref(), "-")),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("[e]", styles::help_key_style()),
            Span::styled(" edit profile", styles::muted_style()),
        ]));
    }

    if let Some(error) = &app.profile_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.clone(), styles::error_style())));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn edit_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{}{}", value, cursor), styles::field_style(focused)),
    ])
}

fn render_own_reviews(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" My reviews ({}) - [d]elete ", app.profile_reviews.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.state != AppState::EditingProfile));

    if app.profile_reviews.is_empty() {
        let text = Paragraph::new(" You haven't written any reviews yet.")
            .style(styles::muted_style())
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let items: Vec<ListItem> = app
        .profile_reviews
        .iter()
        .map(|review| {
            let movie = format_optional(review.movie_id.as_deref(), "unknown movie");
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(review.stars(), styles::rating_style()),
                    Span::styled(
                        format!("  {}  movie {}", review.formatted_date(), truncate(&movie, 24)),
                        styles::muted_style(),
                    ),
                ]),
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
    state.select(Some(app.profile_selection));
    frame.render_stateful_widget(list, area, &mut state);
}
