//! Rendering: translates store snapshots into widgets. No entity data is
//! owned here.

mod views;

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{App, Mode, ViewState};

pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1),
      Constraint::Min(0),
      Constraint::Length(2),
    ])
    .split(frame.area());

  draw_header(frame, chunks[0], app);
  draw_body(frame, chunks[1], app);
  draw_footer(frame, chunks[2], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
  let header = Paragraph::new(Line::from(vec![
    Span::styled(" tango ", Style::default().fg(Color::Black).bg(Color::Cyan)),
    Span::raw(" "),
    Span::styled(app.title(), Style::default().fg(Color::DarkGray)),
  ]));
  frame.render_widget(header, area);
}

fn draw_body(frame: &mut Frame, area: Rect, app: &App) {
  match app.current_view() {
    Some(ViewState::DeckList { selected }) => {
      let decks = app.decks().all_decks();
      views::deck_list::draw_deck_list(frame, area, &decks, *selected, app.decks().is_loading());
    }
    Some(ViewState::CardBrowser { deck_id, flipped }) => {
      let cards = app.decks().words_in_deck(deck_id).unwrap_or_default();
      let index = app.session().current_card_index().min(cards.len().saturating_sub(1));
      let name = app.decks().deck_name(deck_id).unwrap_or_default();
      let bookmarked = cards
        .get(index)
        .map(|card| app.bookmarks().is_bookmarked(&card.id))
        .unwrap_or(false);
      let simple_mode = app
        .user()
        .settings()
        .map(|s| s.simple_card_mode)
        .unwrap_or(false);
      views::card_view::draw_card_view(
        frame,
        area,
        &name,
        &cards,
        index,
        *flipped,
        bookmarked,
        simple_mode,
        app.decks().is_loading(),
      );
    }
    None => {}
  }
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Length(1)])
    .split(area);

  // Status row: confirm prompt > command input > error > nothing
  let status = match app.mode() {
    Mode::Confirm => app
      .confirm_prompt()
      .map(|prompt| Line::styled(prompt, Style::default().fg(Color::Yellow))),
    Mode::Command => {
      let mut spans = vec![Span::raw(format!(":{}", app.command_input()))];
      for (i, command) in app.autocomplete_suggestions().iter().enumerate() {
        let style = if i == app.selected_suggestion() {
          Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
          Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(command.name, style));
      }
      Some(Line::from(spans))
    }
    Mode::Normal => app
      .current_error()
      .map(|error| Line::styled(error, Style::default().fg(Color::Red))),
  };
  if let Some(line) = status {
    frame.render_widget(Paragraph::new(line), rows[0]);
  }

  let hints = match app.current_view() {
    Some(ViewState::CardBrowser { .. }) => {
      " h/l cards  space flip  b bookmark  r refresh  q back"
    }
    _ => " j/k move  enter open  x delete  r refresh  : command  q quit",
  };
  frame.render_widget(
    Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
    rows[1],
  );
}
