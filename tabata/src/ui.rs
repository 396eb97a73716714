use crate::app::{App, AppMode, Field};
use crate::session::DisplayFrame;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, List, ListItem, Paragraph},
    Frame,
};
use tabata_ipc::{format_mmss, Phase, RunState};
use tachyonfx::{Duration as TachyonDuration, EffectManager};

pub fn draw(f: &mut Frame, app: &App, fx: &mut EffectManager<u32>) {
    let theme = app.theme();
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background).fg(theme.foreground)),
        area,
    );
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(f, chunks[0], app);
    match app.mode {
        AppMode::Setup | AppMode::SelectingPreset => draw_setup(f, chunks[1], app),
        AppMode::Workout => draw_workout(f, chunks[1], app),
        AppMode::Complete => draw_complete(f, chunks[1], app),
    }
    draw_status_bar(f, chunks[2], app);

    if app.mode == AppMode::SelectingPreset {
        draw_preset_overlay(f, app);
    }

    fx.process_effects(TachyonDuration::from_millis(100), f.buffer_mut(), area);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let icons = &app.config.icons;
    let text = Line::from(vec![
        Span::raw(icons.header_left.clone()),
        Span::styled(
            "TABATA",
            Style::default().fg(theme.blue).add_modifier(Modifier::BOLD),
        ),
        Span::raw(icons.header_right.clone()),
    ]);
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(theme.surface)),
        ),
        area,
    );
}

fn draw_setup(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let icons = &app.config.icons;
    let block = Block::default()
        .title(Span::styled(" Session ", Style::default().fg(theme.gray)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.green));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let fields = [
        Field::Action,
        Field::Rest,
        Field::Total,
        Field::Cue,
        Field::KeepAwake,
    ];
    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(1)).collect();
    constraints.push(Constraint::Length(1)); // spacer
    constraints.push(Constraint::Length(1)); // error line
    let rows = Layout::default()
        .margin(1)
        .constraints(constraints)
        .split(inner_area);

    for (i, field) in fields.iter().enumerate() {
        let focused = app.form.focus == *field;
        let mut spans = vec![if focused {
            Span::styled(icons.select.clone(), Style::default().fg(theme.selection))
        } else {
            Span::raw(" ")
        }];
        spans.push(Span::styled(
            format!(" {:<11}", field.label()),
            Style::default().fg(theme.gray),
        ));
        let value_style = if focused {
            Style::default()
                .fg(theme.foreground)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.foreground)
        };
        match field {
            Field::Action => spans.push(Span::styled(format!("{} s", app.form.action), value_style)),
            Field::Rest => spans.push(Span::styled(format!("{} s", app.form.rest), value_style)),
            Field::Total => spans.push(Span::styled(format!("{} s", app.form.total), value_style)),
            Field::Cue => {
                if focused {
                    spans.push(Span::styled(
                        format!("◂ {} ▸", app.cue_type.name()),
                        value_style,
                    ));
                } else {
                    spans.push(Span::styled(app.cue_type.name(), value_style));
                }
            }
            Field::KeepAwake => spans.push(Span::styled(
                if app.keep_awake {
                    icons.checkbox_on.clone()
                } else {
                    icons.checkbox_off.clone()
                },
                value_style,
            )),
        }
        if focused && matches!(field, Field::Action | Field::Rest | Field::Total) {
            spans.push(Span::styled(
                icons.input_cursor.clone(),
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        if let Some(row) = rows.get(i) {
            f.render_widget(Paragraph::new(Line::from(spans)), *row);
        }
    }

    if let Some(error) = &app.error {
        if let Some(row) = rows.get(fields.len() + 1) {
            f.render_widget(
                Paragraph::new(Span::styled(
                    error.clone(),
                    Style::default().fg(theme.red).add_modifier(Modifier::BOLD),
                )),
                *row,
            );
        }
    }
}

fn draw_workout(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let icons = &app.config.icons;
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let config = session.config();
    let frame = session.last_frame().unwrap_or(DisplayFrame {
        remaining_total: i64::from(config.total_secs()),
        remaining_phase: i64::from(config.action_secs()),
        phase: session.phase,
        cycles_completed: session.cycles_completed,
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    draw_countdown(
        f,
        chunks[0],
        app,
        " Total ",
        frame.remaining_total,
        i64::from(config.total_secs()),
        theme.blue,
    );

    let (phase_icon, phase_color) = match frame.phase {
        Phase::Action => (&icons.action, theme.red),
        Phase::Rest => (&icons.rest, theme.cyan),
    };
    let phase_title = format!(" {} {} ", phase_icon, frame.phase.label());
    let phase_duration = i64::from(match frame.phase {
        Phase::Action => config.action_secs(),
        Phase::Rest => config.rest_secs(),
    });
    draw_phase(
        f,
        chunks[1],
        app,
        &phase_title,
        frame.remaining_phase,
        phase_duration,
        phase_color,
    );

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} Cycles ", icons.cycles),
                Style::default().fg(theme.gray),
            ),
            Span::styled(
                frame.cycles_completed.to_string(),
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            ),
        ]))
        .alignment(Alignment::Center),
        chunks[2],
    );

    if session.run_state == RunState::Paused {
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("{} PAUSED", icons.pause),
                Style::default()
                    .fg(theme.yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            chunks[3],
        );
    }
}

fn draw_countdown(
    f: &mut Frame,
    area: Rect,
    app: &App,
    title: &str,
    remaining: i64,
    duration: i64,
    color: ratatui::style::Color,
) {
    let theme = app.theme();
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(theme.gray)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner_area);
    f.render_widget(
        Paragraph::new(format_mmss(remaining))
            .style(
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center),
        v_chunks[0],
    );
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(color).bg(theme.surface))
            .percent((progress_ratio(remaining, duration) * 100.0) as u16),
        v_chunks[1],
    );
}

/// Like the total countdown but with the cell-based bar, which reads
/// better for the short phase intervals.
fn draw_phase(
    f: &mut Frame,
    area: Rect,
    app: &App,
    title: &str,
    remaining: i64,
    duration: i64,
    color: ratatui::style::Color,
) {
    let theme = app.theme();
    let icons = &app.config.icons;
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(theme.gray)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner_area);
    f.render_widget(
        Paragraph::new(format_mmss(remaining))
            .style(
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center),
        v_chunks[0],
    );
    let filled = (progress_ratio(remaining, duration) * 10.0) as usize;
    let bar = format!(
        "{}{}",
        icons.progress_filled.repeat(filled),
        icons.progress_empty.repeat(10 - filled)
    );
    f.render_widget(
        Paragraph::new(Span::styled(bar, Style::default().fg(color)))
            .alignment(Alignment::Center),
        v_chunks[1],
    );
}

fn progress_ratio(remaining: i64, duration: i64) -> f64 {
    if duration > 0 {
        1.0 - (remaining as f64 / duration as f64).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn draw_complete(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let icons = &app.config.icons;
    let Some(summary) = app.summary else {
        return;
    };
    let block = Block::default()
        .title(Span::styled(" Done ", Style::default().fg(theme.gray)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.green));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled(
            "Workout complete",
            Style::default()
                .fg(theme.green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("Total time  ", Style::default().fg(theme.gray)),
            Span::styled(
                format_mmss(i64::from(summary.total_secs)),
                Style::default().fg(theme.foreground),
            ),
        ]),
        Line::from(vec![
            Span::styled(
                format!("Cycles {}  ", icons.cycles),
                Style::default().fg(theme.gray),
            ),
            Span::styled(
                summary.cycles_completed.to_string(),
                Style::default().fg(theme.foreground),
            ),
        ]),
    ];
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered_rect(60, 50, inner_area),
    );
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let icons = &app.config.icons;
    let run_state = app.session.as_ref().map(|s| s.run_state);
    let state_icon = match run_state {
        Some(RunState::Running) => &icons.play,
        Some(RunState::Paused) => &icons.pause,
        _ => &icons.stop,
    };
    let (mode_text, mode_color) = match app.mode {
        AppMode::Setup => ("SETUP", theme.green),
        AppMode::SelectingPreset => ("PRESET", theme.magenta),
        AppMode::Workout => match run_state {
            Some(RunState::Paused) => ("PAUSED", theme.yellow),
            _ => ("RUNNING", theme.red),
        },
        AppMode::Complete => ("DONE", theme.blue),
    };
    let help = match app.mode {
        AppMode::Setup => "enter:start │ p:presets │ t:theme │ tab:field │ ◂▸:adjust │ q:quit",
        AppMode::SelectingPreset => "1-4:start preset │ esc:cancel",
        AppMode::Workout => "space:pause/resume │ s:stop",
        AppMode::Complete => "r:again │ q:quit",
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} {} ", state_icon, mode_text),
                Style::default()
                    .bg(mode_color)
                    .fg(theme.background)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} ", icons.separator),
                Style::default().fg(theme.surface),
            ),
            Span::raw(help),
        ]))
        .block(Block::default().style(Style::default().bg(theme.surface).fg(theme.gray))),
        area,
    );
}

fn draw_preset_overlay(f: &mut Frame, app: &App) {
    let theme = app.theme();
    let area = centered_rect(50, 40, f.area());
    f.render_widget(Clear, area);
    let items: Vec<ListItem> = app
        .presets
        .iter()
        .enumerate()
        .map(|(i, preset)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(theme.blue)),
                Span::raw(preset.name),
                Span::styled(
                    format!(
                        " ({}s/{}s · {})",
                        preset.action_secs,
                        preset.rest_secs,
                        format_mmss(i64::from(preset.total_secs))
                    ),
                    Style::default().fg(theme.gray),
                ),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(items).block(
            Block::default()
                .title(" Select Preset ")
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.magenta))
                .style(Style::default().bg(theme.background)),
        ),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
