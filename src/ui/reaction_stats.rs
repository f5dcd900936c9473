use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::{
    app::{App, SortBy},
    stats::{CategorySummary, ThreatSummary},
    ui::category_color,
};

fn reaction_color(avg_ms: Option<f64>) -> Color {
    match avg_ms {
        Some(ms) if ms < 400.0 => Color::Green,
        Some(ms) if ms < 700.0 => Color::Yellow,
        Some(_) => Color::Red,
        None => Color::Gray,
    }
}

fn miss_color(miss_rate: f64) -> Color {
    if miss_rate == 0.0 {
        Color::Green
    } else if miss_rate < 20.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn format_reaction(avg_ms: Option<f64>) -> String {
    avg_ms
        .map(|ms| format!("{ms:.0}"))
        .unwrap_or_else(|| "—".to_string())
}

/// Pure presenter for a single threat row
pub fn present_row(data: &ThreatSummary) -> Row<'static> {
    Row::new(vec![
        Cell::from(data.threat.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(data.category.label()).style(Style::default().fg(category_color(data.category))),
        Cell::from(format_reaction(data.avg_reaction_ms))
            .style(Style::default().fg(reaction_color(data.avg_reaction_ms))),
        Cell::from(format!("{:.1}", data.miss_rate))
            .style(Style::default().fg(miss_color(data.miss_rate))),
        Cell::from(data.attempts.to_string()),
    ])
}

fn category_line(categories: &[CategorySummary]) -> Line<'static> {
    let mut spans = Vec::new();
    for c in categories {
        spans.push(Span::styled(
            format!("{} ", c.category.label()),
            Style::default()
                .fg(category_color(c.category))
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(
            "{}ms / {:.0}% ({})    ",
            format_reaction(c.avg_reaction_ms),
            c.miss_rate,
            c.attempts
        )));
    }
    Line::from(spans)
}

/// Render the reaction statistics screen
pub fn render_reaction_stats(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(3), // per-category
            Constraint::Min(0),    // table
            Constraint::Length(2), // instructions
        ])
        .split(area);

    let view = &mut app.stats_view;
    let sort_direction = if view.sort_ascending { "↑" } else { "↓" };
    let sort_by_text = match view.sort_by {
        SortBy::Threat => "技能",
        SortBy::Reaction => "反应",
        SortBy::MissRate => "失误率",
        SortBy::Attempts => "次数",
    };

    let title = Paragraph::new(format!("反应统计 (排序: {sort_by_text} {sort_direction})"))
        .block(Block::default().borders(Borders::ALL).title("Stats"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    f.render_widget(
        Paragraph::new(category_line(&view.categories))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("分类")),
        chunks[1],
    );

    if view.threats.is_empty() {
        let hint = if app.stats_db.is_some() {
            "暂无记录，完成几轮挑战后再来查看。"
        } else {
            "反应记录已关闭。"
        };
        f.render_widget(
            Paragraph::new(hint)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            chunks[2],
        );
    } else {
        // borders + header
        let table_height = chunks[2].height.saturating_sub(3) as usize;
        let max_scroll = view.threats.len().saturating_sub(table_height);
        if view.scroll_offset > max_scroll {
            view.scroll_offset = max_scroll;
        }

        let indicator = |col: SortBy| if view.sort_by == col { sort_direction } else { "" };
        let header = Row::new(vec![
            Cell::from(format!("技能 {}", indicator(SortBy::Threat))),
            Cell::from("类别"),
            Cell::from(format!("平均反应 (ms) {}", indicator(SortBy::Reaction))),
            Cell::from(format!("失误率 (%) {}", indicator(SortBy::MissRate))),
            Cell::from(format!("次数 {}", indicator(SortBy::Attempts))),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = view
            .sorted_threats()
            .into_iter()
            .skip(view.scroll_offset)
            .take(table_height)
            .map(present_row)
            .collect();

        let widths = [
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Min(6),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("技能"))
            .column_spacing(2);
        f.render_widget(table, chunks[2]);
    }

    let instructions = if app.stats_view.confirm_clear {
        Paragraph::new("清空全部反应记录？(y) 确认  其他键取消").style(
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Paragraph::new(
            "(↑/↓) 滚动  (PgUp/PgDn) 翻页  (Home) 顶部  (1-4) 排序  (space) 升降  (c) 清空  (b) 返回",
        )
    };
    f.render_widget(
        instructions
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[3],
    );
}
