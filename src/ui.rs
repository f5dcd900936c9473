pub mod reaction_stats;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    difficulty::DIFFICULTIES,
    scheduler::ActiveRound,
    session::Phase,
    threat::Category,
};

const HORIZONTAL_MARGIN: u16 = 2;
const GAUGE_WIDTH: u16 = 40;

pub fn category_color(category: Category) -> Color {
    match category {
        Category::Interrupt => Color::Yellow,
        Category::Dodge => Color::Red,
        Category::Defend => Color::Magenta,
        Category::Burst => Color::Green,
    }
}

pub fn category_symbol(category: Category) -> &'static str {
    match category {
        Category::Interrupt => "⛔",
        Category::Dodge => "↔",
        Category::Defend => "⛨",
        Category::Burst => "✦",
    }
}

/// A `width` wide slice horizontally centered in `area`
fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(3), // header
                Constraint::Min(8),    // arena
                Constraint::Length(4), // controls
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(self, chunks[0], buf);

        let state = self.session.state();
        match state.phase {
            Phase::Idle => render_idle(self, chunks[1], buf),
            Phase::Playing => match &state.active_round {
                Some(round) => render_round(self, round, chunks[1], buf),
                None => render_waiting(self, chunks[1], buf),
            },
            Phase::GameOver => render_game_over(self, chunks[1], buf),
        }

        render_controls(self, chunks[2], buf);
        render_legend(self, chunks[3], buf);
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.session.state();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let difficulty_label = match state.phase {
        Phase::Idle => app.settings.difficulty.profile().label,
        _ => state.difficulty.label,
    };

    let line = Line::from(vec![
        Span::styled("难度 ", dim),
        Span::styled(difficulty_label, bold),
        Span::styled("   分数 ", dim),
        Span::styled(state.score.to_string(), bold.fg(Color::Yellow)),
        Span::styled("   最高 ", dim),
        Span::styled(state.high_score.to_string(), bold),
        Span::styled("   提示 ", dim),
        Span::raw(if app.settings.hints { "开" } else { "关" }),
    ]);

    Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" DBM 反应训练 ")
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_idle(app: &App, area: Rect, buf: &mut Buffer) {
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let mut difficulty_spans = Vec::new();
    for d in &DIFFICULTIES {
        let style = if d.id == app.settings.difficulty {
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        difficulty_spans.push(Span::styled(format!(" {} ", d.label), style));
        difficulty_spans.push(Span::raw("  "));
    }
    difficulty_spans.pop();

    let lines = vec![
        Line::from(Span::styled(
            "DBM 反应训练",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("无需AI，纯粹的速度挑战。", italic)),
        Line::from(Span::styled(
            "应对【七星】、【风车】、【断魂刺】等技能，快速做出正确反应。",
            italic,
        )),
        Line::from(""),
        Line::from(difficulty_spans),
        Line::from(""),
        Line::from(Span::styled(
            "(←/→) 难度   (enter) 开始挑战",
            Style::default().fg(Color::Cyan),
        )),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(vertical_center(area, 10), buf);
}

fn render_waiting(app: &App, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(
            "等待技能...",
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(""),
        feedback_line(app),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(vertical_center(area, 3), buf);
}

fn render_round(app: &App, round: &ActiveRound, area: Rect, buf: &mut Buffer) {
    let threat = round.threat;
    let color = category_color(threat.category);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // marker
            Constraint::Length(1), // name
            Constraint::Length(1), // description
            Constraint::Length(1), // padding
            Constraint::Length(1), // countdown
            Constraint::Length(1), // padding
            Constraint::Length(1), // feedback
        ])
        .split(vertical_center(area, 9));

    let marker_text = format!(
        "{}  {}  {}",
        category_symbol(threat.category),
        threat.category.label(),
        category_symbol(threat.category)
    );
    let marker_width = marker_text.width() as u16 + 4;
    Paragraph::new(Span::styled(marker_text, bold.fg(color)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(color)),
        )
        .render(centered(rows[0], marker_width), buf);

    Paragraph::new(Span::styled(threat.name, bold))
        .alignment(Alignment::Center)
        .render(rows[1], buf);

    Paragraph::new(Span::styled(
        threat.description,
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center)
    .render(rows[2], buf);

    let remaining = round.remaining(app.now);
    Gauge::default()
        .gauge_style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .ratio(round.remaining_ratio(app.now))
        .label(format!("{:.1}s", remaining.as_secs_f64()))
        .render(centered(rows[4], GAUGE_WIDTH), buf);

    Paragraph::new(feedback_line(app))
        .alignment(Alignment::Center)
        .render(rows[6], buf);
}

fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.session.state();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let summary = app.session.summary();

    let mut lines = vec![
        Line::from(Span::styled("挑战结束", bold.fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(format!("{} 分", state.score), bold)),
        Line::from(Span::styled(
            format!("({})", state.difficulty.label),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(state.feedback.as_str()),
        Line::from(Span::styled(
            summary.describe(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        )),
    ];
    if state.new_best {
        lines.push(Line::from(Span::styled(
            "新纪录！",
            bold.fg(Color::Yellow),
        )));
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(vertical_center(area, 9), buf);
}

fn render_controls(app: &App, area: Rect, buf: &mut Buffer) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let active = app.session.state().active_threat().map(|t| t.category);

    for (category, cell) in Category::ALL.into_iter().zip(cells.iter()) {
        let color = category_color(category);
        let lit = app.settings.hints && active == Some(category);

        let (border_type, text_style) = if lit {
            (
                BorderType::Thick,
                Style::default()
                    .fg(Color::Black)
                    .bg(color)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (BorderType::Plain, Style::default().fg(color))
        };

        let lines = vec![
            Line::from(Span::styled(
                format!("{} {}", category_symbol(category), category.response_label()),
                text_style,
            )),
            Line::from(Span::styled(
                format!("[{}]", category.index()),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(border_type)
                    .border_style(Style::default().fg(color)),
            )
            .render(*cell, buf);
    }
}

fn render_legend(app: &App, area: Rect, buf: &mut Buffer) {
    let legend = match app.session.phase() {
        Phase::Idle => "(enter) 开始 / (←/→) 难度 / (h) 提示 / (s) 统计 / (esc) 退出",
        Phase::Playing => "(1-4 或 j k l ;) 应对 / (esc) 停止",
        Phase::GameOver => "(r) 再来一次 / (b) 返回 / (s) 统计 / (q) 退出",
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn feedback_line(app: &App) -> Line<'_> {
    Line::from(Span::styled(
        app.session.state().feedback.as_str(),
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Rows of `area` holding `height` lines vertically centered
fn vertical_center(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RuntimeSettings;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::{Duration, Instant};

    /// Buffer text with blank cells dropped; wide glyphs leave a blank after them
    fn render_to_string(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| f.render_widget(app, f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .filter(|s| *s != " ")
            .collect()
    }

    fn test_app() -> App {
        App::new(
            RuntimeSettings {
                seed: Some(5),
                record_stats: false,
                ..RuntimeSettings::default()
            },
            None,
        )
    }

    #[test]
    fn centered_clamps_to_area() {
        let area = Rect::new(10, 0, 20, 5);
        assert_eq!(centered(area, 10), Rect::new(15, 0, 10, 5));
        assert_eq!(centered(area, 50), area);
        assert_eq!(vertical_center(area, 3), Rect::new(10, 1, 20, 3));
    }

    #[test]
    fn idle_screen_lists_difficulties() {
        let app = test_app();
        let content = render_to_string(&app);
        assert!(content.contains("开始挑战"));
        assert!(content.contains("老手"));
        assert!(content.contains("修罗"));
    }

    #[test]
    fn playing_screen_shows_threat() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.session.start(app.settings.difficulty.profile(), t0);
        app.on_tick(t0 + Duration::from_millis(1000));

        let threat = app.session.state().active_threat().unwrap();
        let content = render_to_string(&app);
        let name: String = threat.name.chars().filter(|c| *c != ' ').collect();
        assert!(content.contains(&name), "missing {}", threat.name);
        assert!(content.contains(threat.category.response_label()));
    }

    #[test]
    fn waiting_screen_before_first_threat() {
        let mut app = test_app();
        app.session.start(app.settings.difficulty.profile(), Instant::now());
        assert!(render_to_string(&app).contains("等待技能"));
    }

    #[test]
    fn game_over_screen_shows_score() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.session.start(app.settings.difficulty.profile(), t0);
        app.on_tick(t0 + Duration::from_millis(1000));
        let deadline = app.session.state().active_round.as_ref().unwrap().deadline;
        app.on_tick(deadline);

        let content = render_to_string(&app);
        assert!(content.contains("挑战结束"));
        assert!(content.contains("0分"));
    }

    /// Clear `rounds` threats on normal, then let the next one time out
    fn finish_run(app: &mut App, start: Instant, rounds: usize) -> Instant {
        app.session.start(app.settings.difficulty.profile(), start);
        let mut now = start + Duration::from_millis(1000);
        app.on_tick(now);
        for _ in 0..rounds {
            let threat = app.session.state().active_threat().unwrap();
            app.session
                .submit(threat.category, now + Duration::from_millis(100))
                .unwrap();
            now += Duration::from_millis(900);
            app.on_tick(now);
        }
        let deadline = app.session.state().active_round.as_ref().unwrap().deadline;
        app.on_tick(deadline);
        deadline
    }

    #[test]
    fn game_over_panel_shows_run_summary() {
        let mut app = test_app();
        finish_run(&mut app, Instant::now(), 2);

        let content = render_to_string(&app);
        assert!(content.contains("4分"));
        assert!(content.contains("最快100ms"));
        assert!(content.contains("新纪录"));
    }

    #[test]
    fn tying_the_best_is_not_a_record() {
        let mut app = test_app();
        let end = finish_run(&mut app, Instant::now(), 1);
        assert!(render_to_string(&app).contains("新纪录"));

        finish_run(&mut app, end + Duration::from_millis(100), 1);
        let content = render_to_string(&app);
        assert!(content.contains("2分"));
        assert!(!content.contains("新纪录"));
    }
}
