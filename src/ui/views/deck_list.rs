use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::models::Deck;

pub fn draw_deck_list(
  frame: &mut Frame,
  area: Rect,
  decks: &[Deck],
  selected: usize,
  loading: bool,
) {
  let title = if loading {
    format!(" Wordbooks ({}) (loading...) ", decks.len())
  } else {
    format!(" Wordbooks ({}) ", decks.len())
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if decks.is_empty() && !loading {
    let paragraph = Paragraph::new("No wordbooks yet. Create one on the web app, then press r.")
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let items: Vec<ListItem> = decks
    .iter()
    .map(|deck| {
      let visibility = if deck.is_public {
        Span::styled("public ", Style::default().fg(Color::Green))
      } else {
        Span::styled("       ", Style::default())
      };

      let line = Line::from(vec![
        Span::styled(
          format!("{:<24}", truncate(&deck.name, 24)),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        visibility,
        Span::styled(
          format!("{:>4} words", deck.num_words),
          Style::default().fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(
          deck
            .owner_display_name
            .clone()
            .map(|name| format!("by {}", name))
            .unwrap_or_default(),
          Style::default().fg(Color::DarkGray),
        ),
      ]);
      ListItem::new(line)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(selected.min(decks.len().saturating_sub(1))));

  frame.render_stateful_widget(list, area, &mut state);
}

fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}
