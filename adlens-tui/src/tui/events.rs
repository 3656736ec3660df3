use crate::tui::app::{App, View};
use adlens_core::{BuilderPhase, InputKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }
    if app.view == View::Help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.view = View::Table;
        }
        return;
    }
    if !app.popover_open {
        handle_table(app, key);
        return;
    }
    match app.builder.phase() {
        BuilderPhase::Idle => handle_active_list(app, key),
        BuilderPhase::CategoryPicking => handle_picking(app, key),
        BuilderPhase::ConditionEditing => handle_editing(app, key),
    }
}

fn handle_table(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.view = View::Help,
        KeyCode::Char('j') | KeyCode::Down => app.row_down(),
        KeyCode::Char('k') | KeyCode::Up => app.row_up(),
        KeyCode::PageDown | KeyCode::Char('n') => app.page_down(),
        KeyCode::PageUp | KeyCode::Char('p') => app.page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.selected_row = 0,
        KeyCode::Char('G') | KeyCode::End => app.selected_row = app.visible.len().saturating_sub(1),
        KeyCode::Char('>') => app.cycle_sort(true),
        KeyCode::Char('<') => app.cycle_sort(false),
        KeyCode::Char('s') => app.toggle_sort_dir(),
        KeyCode::Char('f') => app.open_popover(),
        KeyCode::Char('E') => app.export_visible(),
        _ => {}
    }
}

// popover open, builder idle: the active filter list
fn handle_active_list(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('q') => app.close_popover(),
        KeyCode::Char('n') | KeyCode::Enter => app.start_new_filter(),
        KeyCode::Char('j') | KeyCode::Down => {
            if app.active_selected + 1 < app.filters.len() {
                app.active_selected += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.active_selected = app.active_selected.saturating_sub(1);
        }
        KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
            if app.remove_selected_filter() {
                app.status_msg = format!("{} of {} rows match", app.visible.len(), app.records.len());
            }
        }
        KeyCode::Char('a') => app.toggle_conjunction(),
        _ => {}
    }
}

fn handle_picking(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.builder.cancel(),
        KeyCode::Tab | KeyCode::Right => {
            app.builder.next_tab();
            app.option_selected = 0;
        }
        KeyCode::BackTab | KeyCode::Left => {
            app.builder.prev_tab();
            app.option_selected = 0;
        }
        KeyCode::Down => app.option_down(),
        KeyCode::Up => app.option_up(),
        KeyCode::Enter => {
            app.pick_highlighted_option();
        }
        KeyCode::Backspace => {
            app.builder.pop_char();
            app.option_selected = 0;
        }
        KeyCode::Char(c) => {
            app.builder.push_char(c);
            app.option_selected = 0;
        }
        _ => {}
    }
}

fn handle_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.builder.back(),
        KeyCode::Left => app.builder.cycle_operator(false),
        KeyCode::Right => app.builder.cycle_operator(true),
        KeyCode::Tab | KeyCode::BackTab => app.builder.toggle_slot(),
        KeyCode::Up | KeyCode::Down if app.builder.input_kind() == InputKind::Select => {
            let choices = app.builder.value_choices(&app.records);
            app.builder.cycle_choice(&choices, key.code == KeyCode::Down);
        }
        KeyCode::Enter => {
            if app.commit_filter().is_none() {
                if let Some(err) = app.builder.validation_error() {
                    app.status_msg = format!("Cannot apply: {err}");
                }
            }
        }
        KeyCode::Backspace => app.builder.pop_char(),
        KeyCode::Char(c) => app.builder.push_char(c),
        _ => {}
    }
}
