use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap},
};
use crate::tui::app::{App, View};
use crate::tui::theme::Theme;
use adlens_core::{describe, BuilderPhase, InputKind, ValueSlot, CATEGORIES, COLUMNS};

pub fn render(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    render_topbar(frame, app, chunks[0], theme);
    render_table(frame, app, chunks[1], theme);
    render_bottombar(frame, app, chunks[2], theme);
    if app.popover_open { render_popover(frame, app, area, theme); }
    if app.view == View::Help { render_help(frame, area); }
}

fn render_topbar(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let n = app.filters.len();
    let badge_style = if n > 0 {
        Style::default().fg(theme.filter_badge).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.muted)
    };
    let badge = if n > 1 {
        format!("[Filters ({n}) {}]", app.filters.conjunction())
    } else {
        format!("[Filters ({n})]")
    };
    let info = format!(" {} | {}/{} rows", app.source, app.visible.len(), app.records.len());
    let line = Line::from(vec![Span::styled(badge, badge_style), Span::raw(info)]);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(theme.bar_bg).fg(theme.bar_fg)), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    if app.loading {
        frame.render_widget(Paragraph::new("Loading…").block(Block::default().borders(Borders::ALL).title("Creatives")), area);
        return;
    }
    if app.visible.is_empty() {
        let (msg, color) = if app.status_msg.starts_with("Load failed") {
            (app.status_msg.as_str(), theme.load_error)
        } else if app.records.is_empty() {
            ("No data.", theme.muted)
        } else {
            ("No rows match the active filters.", theme.attention)
        };
        frame.render_widget(Paragraph::new(msg).style(Style::default().fg(color)).block(Block::default().borders(Borders::ALL).title("Creatives")), area);
        return;
    }
    let header = Row::new(COLUMNS.iter().enumerate().map(|(i, c)| {
        let arrow = match app.sort_col {
            Some(s) if s == i => if app.sort_asc { " ▲" } else { " ▼" },
            _ => "",
        };
        Cell::from(format!("{}{arrow}", c.title)).style(Style::default().add_modifier(Modifier::BOLD))
    }));
    let start = app.page() * app.page_size;
    let page_rows = app.visible.iter().skip(start).take(app.page_size);
    let rows: Vec<Row> = page_rows.map(|&i| {
        let r = &app.records[i];
        Row::new(COLUMNS.iter().map(|c| {
            let color = if c.field.is_numeric() { theme.metric } else { theme.dimension };
            Cell::from(truncate(&c.render(r), c.width as usize)).style(Style::default().fg(color))
        }))
    }).collect();
    let widths: Vec<Constraint> = COLUMNS.iter().map(|c| Constraint::Length(c.width)).collect();
    let title = format!("Creatives ({} matched) | page {}/{}", app.visible.len(), app.page() + 1, app.page_count());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default();
    state.select(Some(app.selected_row - start));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_popover(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);
    let outer = Block::default().borders(Borders::ALL).title("Filters (f)")
        .border_style(Style::default().fg(theme.focus));
    let inner = outer.inner(popup);
    frame.render_widget(outer, popup);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(8), Constraint::Length(1)])
        .split(inner);
    match app.builder.phase() {
        BuilderPhase::Idle => {
            frame.render_widget(
                Paragraph::new("n/Enter: add filter   x: remove   a: AND/OR   Esc: close")
                    .style(Style::default().fg(theme.muted)),
                parts[0],
            );
        }
        BuilderPhase::CategoryPicking => render_picking(frame, app, parts[0], theme),
        BuilderPhase::ConditionEditing => render_editing(frame, app, parts[0], theme),
    }
    render_active_filters(frame, app, parts[1], theme);
    frame.render_widget(Paragraph::new(popover_hint(app)).style(Style::default().fg(theme.muted)), parts[2]);
}

fn render_picking(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    let active = CATEGORIES.iter().position(|c| c.name == app.builder.active_category().name).unwrap_or(0);
    let tabs = Tabs::new(CATEGORIES.iter().map(|c| c.name))
        .select(active)
        .highlight_style(Style::default().fg(theme.focus).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, rows[0]);
    frame.render_widget(Paragraph::new(format!("Search: {}_", app.builder.search())), rows[1]);
    let options = app.builder.visible_options();
    if options.is_empty() {
        frame.render_widget(Paragraph::new("No matching options").style(Style::default().fg(theme.muted)), rows[2]);
        return;
    }
    let items: Vec<ListItem> = options.iter().map(|o| ListItem::new(*o)).collect();
    let mut state = ListState::default();
    state.select(Some(app.option_selected.min(options.len() - 1)));
    let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, rows[2], &mut state);
}

fn render_editing(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let b = &app.builder;
    let cat = b.active_category();
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} › {}", cat.name, b.selected_option().unwrap_or("")),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    let mut ops = vec![Span::raw("Operator: ")];
    for op in cat.operators {
        let style = if Some(*op) == b.operator() {
            Style::default().fg(theme.focus).add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        ops.push(Span::styled(format!(" {} ", op.label()), style));
    }
    lines.push(Line::from(ops));
    let focus = |slot: ValueSlot| if b.focused_slot() == slot { "_" } else { "" };
    match b.input_kind() {
        InputKind::NumberRange => {
            lines.push(Line::from(format!("From:     {}{}", b.value(), focus(ValueSlot::Start))));
            lines.push(Line::from(format!("To:       {}{}", b.value_end(), focus(ValueSlot::End))));
        }
        InputKind::Select => {
            let n = b.value_choices(&app.records).len();
            lines.push(Line::from(format!("Value:    {}_   (↑/↓ {n} values)", b.value())));
        }
        InputKind::Number | InputKind::Text => {
            lines.push(Line::from(format!("Value:    {}_", b.value())));
        }
    }
    lines.push(Line::from(""));
    let apply = if b.can_apply() {
        Span::styled("[ Apply ]", Style::default().fg(theme.apply_ready).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("[ Apply ]", Style::default().fg(theme.muted))
    };
    let mut apply_line = vec![apply];
    if let Some(err) = b.validation_error() {
        apply_line.push(Span::styled(format!("  {err}"), Style::default().fg(theme.attention)));
    }
    lines.push(Line::from(apply_line));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_active_filters(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let title = format!("Active filters ({})", app.filters.len());
    let block = Block::default().borders(Borders::TOP).title(title);
    if app.filters.is_empty() {
        frame.render_widget(Paragraph::new("none").style(Style::default().fg(theme.muted)).block(block), area);
        return;
    }
    let joiner = app.filters.conjunction().to_string();
    let items: Vec<ListItem> = app.filters.iter().enumerate().map(|(i, c)| {
        let lead = if i == 0 { " ".repeat(joiner.len()) } else { joiner.clone() };
        ListItem::new(Line::from(vec![
            Span::styled(format!("{lead} "), Style::default().fg(theme.filter_badge)),
            Span::raw(describe(c)),
        ]))
    }).collect();
    let mut state = ListState::default();
    if app.builder.phase() == BuilderPhase::Idle {
        state.select(Some(app.active_selected.min(app.filters.len() - 1)));
    }
    let list = List::new(items).block(block).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state);
}

fn popover_hint(app: &App) -> &'static str {
    match app.builder.phase() {
        BuilderPhase::Idle => "j/k select  x remove  a AND/OR  n add  Esc close",
        BuilderPhase::CategoryPicking => "Tab/←→ category  type to search  ↑/↓ option  Enter pick  Esc cancel",
        BuilderPhase::ConditionEditing => match app.builder.input_kind() {
            InputKind::NumberRange => "←/→ operator  Tab from/to  Enter apply  Esc back",
            InputKind::Select => "←/→ operator  ↑/↓ value  Enter apply  Esc back",
            _ => "←/→ operator  Enter apply  Esc back",
        },
    }
}

fn render_help(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled("Keybindings", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  q        Quit"),
        Line::from("  ?        Toggle help"),
        Line::from("  j/k      Move row"),
        Line::from("  n/p      Next/previous page"),
        Line::from("  g/G      First/last row"),
        Line::from("  </>      Sort column"),
        Line::from("  s        Sort direction"),
        Line::from("  f        Filter popover"),
        Line::from("  E        Export visible rows to CSV"),
        Line::from(""),
        Line::from(Span::styled("Filter popover", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  n        New filter"),
        Line::from("  x        Remove selected filter"),
        Line::from("  a        Toggle AND/OR"),
        Line::from("  Tab      Next category / value slot"),
        Line::from("  ←/→      Change operator"),
        Line::from("  Enter    Pick option / apply"),
        Line::from("  Esc      Back / close"),
    ];
    let popup = centered_rect(50, 70, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help (?)")), popup);
}

fn render_bottombar(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let bar_text = format!(" {} | q:quit ?:help f:filters </>:sort E:export", app.status_msg);
    frame.render_widget(Paragraph::new(bar_text).style(Style::default().bg(theme.bar_bg).fg(theme.bar_fg)), area);
}

fn centered_rect(px: u16, py: u16, r: Rect) -> Rect {
    let v = Layout::default().direction(Direction::Vertical).constraints([Constraint::Percentage((100-py)/2), Constraint::Percentage(py), Constraint::Percentage((100-py)/2)]).split(r);
    Layout::default().direction(Direction::Horizontal).constraints([Constraint::Percentage((100-px)/2), Constraint::Percentage(px), Constraint::Percentage((100-px)/2)]).split(v[1])[1]
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { s.to_owned() } else { format!("{}\u{2026}", s.chars().take(max.saturating_sub(1)).collect::<String>()) }
}
