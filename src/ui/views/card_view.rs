use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::models::Card;

#[allow(clippy::too_many_arguments)]
pub fn draw_card_view(
  frame: &mut Frame,
  area: Rect,
  deck_name: &str,
  cards: &[Card],
  index: usize,
  flipped: bool,
  bookmarked: bool,
  simple_mode: bool,
  loading: bool,
) {
  let name = if deck_name.is_empty() { "wordbook" } else { deck_name };
  let title = if loading && cards.is_empty() {
    format!(" {} (loading...) ", name)
  } else {
    format!(" {} ({}/{}) ", name, (index + 1).min(cards.len()), cards.len())
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let Some(card) = cards.get(index) else {
    let message = if loading {
      "Loading words..."
    } else {
      "No words in this wordbook yet."
    };
    let paragraph = Paragraph::new(message)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  };

  let mut lines: Vec<Line> = Vec::new();

  let mut headline = vec![Span::styled(
    card.english.clone(),
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
  )];
  if let Some(text) = card.phonetics.as_ref().and_then(|p| p.text.clone()) {
    headline.push(Span::raw("  "));
    headline.push(Span::styled(text, Style::default().fg(Color::DarkGray)));
  }
  if bookmarked {
    headline.push(Span::raw("  "));
    headline.push(Span::styled("★", Style::default().fg(Color::Yellow)));
  }
  lines.push(Line::from(headline));
  lines.push(Line::raw(""));

  if !flipped {
    lines.push(Line::styled(
      "(space to flip)",
      Style::default().fg(Color::DarkGray),
    ));
  } else {
    for definition in &card.definitions {
      lines.push(Line::from(vec![
        Span::styled(
          format!("【{}】", definition.part_of_speech),
          Style::default().fg(Color::Green),
        ),
        Span::raw(definition.japanese.join(" / ")),
      ]));
    }

    if !simple_mode {
      if !card.synonyms.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
          Span::styled("synonyms: ", Style::default().fg(Color::DarkGray)),
          Span::raw(card.synonyms.join(", ")),
        ]));
      }

      if !card.example_sentences.is_empty() {
        lines.push(Line::raw(""));
        for example in &card.example_sentences {
          lines.push(Line::from(Span::raw(format!("  {}", example.english))));
          lines.push(Line::from(Span::styled(
            format!("  {}", example.japanese),
            Style::default().fg(Color::DarkGray),
          )));
        }
      }
    }
  }

  let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
  frame.render_widget(paragraph, area);
}
