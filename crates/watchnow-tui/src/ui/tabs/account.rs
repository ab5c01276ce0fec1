//! Login and registration forms.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus, RegisterFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Visible width of a form field.
const FIELD_WIDTH: usize = 24;

pub fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let extra = [app.login_error.is_some(), app.status_message.is_some()]
        .iter()
        .filter(|shown| **shown)
        .count() as u16;
    let area = centered_rect_fixed(50, 10 + extra * 2, area);
    frame.render_widget(Clear, area);

    let mut lines = vec![];

    // Registration success, logout and expiry notices
    if let Some(msg) = &app.status_message {
        lines.push(Line::from(Span::styled(
            format!(" {}", msg),
            styles::highlight_style(),
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(""));
    lines.push(field_line(
        "   Email:    ",
        &app.login_email,
        app.login_focus == LoginFocus::Email,
    ));
    lines.push(field_line(
        "   Password: ",
        &mask(&app.login_password),
        app.login_focus == LoginFocus::Password,
    ));
    lines.push(Line::from(""));

    let label = if app.login_pending {
        "Logging in"
    } else {
        "Login"
    };
    lines.push(button_line(label, app.login_focus == LoginFocus::Button));

    if let Some(error) = &app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " No account? [Esc] then [n] to register",
        styles::muted_style(),
    )));

    let paragraph = Paragraph::new(lines).block(form_block(" Login "));
    frame.render_widget(paragraph, area);
}

pub fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.register_error.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(56, height, area);
    frame.render_widget(Clear, area);

    let form = &app.register_form;
    let focus = app.register_focus;

    let mut lines = vec![
        Line::from(""),
        field_line(
            "   Nickname:         ",
            &form.nickname,
            focus == RegisterFocus::Nickname,
        ),
        field_line(
            "   Email:            ",
            &form.email,
            focus == RegisterFocus::Email,
        ),
        field_line(
            "   Password:         ",
            &mask(&form.password),
            focus == RegisterFocus::Password,
        ),
        field_line(
            "   Confirm password: ",
            &mask(&form.confirm_password),
            focus == RegisterFocus::ConfirmPassword,
        ),
        field_line(
            "   Picture URL:      ",
            &form.profile_picture,
            focus == RegisterFocus::ProfilePicture,
        ),
        Line::from(Span::styled(
            "   (picture is optional)",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    let label = if app.register_pending {
        "Registering"
    } else {
        "Register"
    };
    lines.push(button_line(label, focus == RegisterFocus::Button));

    if let Some(error) = &app.register_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let paragraph = Paragraph::new(lines).block(form_block(" Register "));
    frame.render_widget(paragraph, area);
}

fn form_block(title: &'static str) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default())
}

/// Label plus bracketed input, showing the tail of long values.
fn field_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let count = value.chars().count();
    let visible: String = value
        .chars()
        .skip(count.saturating_sub(FIELD_WIDTH))
        .collect();
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", visible, cursor, width = FIELD_WIDTH),
            styles::field_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("              ["),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ])
}

fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_counts_chars() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("pässword"), "********");
    }

    #[test]
    fn test_field_line_shows_tail_of_long_values() {
        let value = "a".repeat(FIELD_WIDTH) + "xyz";
        let line = field_line("x", &value, false);
        let shown = line.spans[2].content.to_string();
        assert!(shown.ends_with("xyz"));
        assert_eq!(shown.chars().count(), FIELD_WIDTH);
    }
}
