//! Terminal viewer: move a hover cursor over the page text and delete
//! highlights from under it.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pagemark_dom::{Document, NodeId};
use pagemark_engine::{
    FileStore, HoverTarget, InteractionController, InteractionTiming, MarkerStyle,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{
    io::{Stdout, stdout},
    time::{Duration, Instant},
};

const IDLE_POLL: Duration = Duration::from_millis(250);

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dt", "figcaption",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "html", "li", "main", "nav", "p",
    "pre", "section", "td", "th",
];

/// One text node as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    node: NodeId,
    text: String,
    painted: bool,
    active: bool,
}

/// Text nodes grouped into one line per enclosing block element.
fn layout_lines(doc: &Document, style: &MarkerStyle) -> Vec<Vec<Segment>> {
    let mut lines: Vec<Vec<Segment>> = Vec::new();
    let mut current_block = None;

    for node in doc.text_descendants(doc.root()) {
        if doc[node].is_whitespace_text() {
            continue;
        }
        let block = doc
            .ancestors(node)
            .find(|ancestor| doc[*ancestor].tag_name().is_some_and(|tag| BLOCK_TAGS.contains(&tag)))
            .unwrap_or(doc.root());
        let marker = style.marker_for(doc, node);
        let segment = Segment {
            node,
            text: doc[node].text().unwrap_or_default().to_string(),
            painted: marker.is_some(),
            active: marker.is_some_and(|m| doc.attr(m, &style.active_attribute) == Some("true")),
        };
        match lines.last_mut() {
            Some(line) if current_block == Some(block) => line.push(segment),
            _ => lines.push(vec![segment]),
        }
        current_block = Some(block);
    }
    lines
}

struct App<'a> {
    doc: Document,
    style: MarkerStyle,
    controller: InteractionController,
    store: &'a mut FileStore,
    lines: Vec<Vec<Segment>>,
    cursor: usize,
    status: String,
}

impl<'a> App<'a> {
    fn new(
        doc: Document,
        style: MarkerStyle,
        timing: InteractionTiming,
        store: &'a mut FileStore,
    ) -> Self {
        let lines = layout_lines(&doc, &style);
        let mut app = Self {
            doc,
            style,
            controller: InteractionController::new(timing),
            store,
            lines,
            cursor: 0,
            status: String::new(),
        };
        if let Some(node) = app.hovered() {
            app.controller.pointer_enter(
                &app.doc,
                &app.style,
                HoverTarget::Node(node),
                Instant::now(),
            );
        }
        app
    }

    fn segment_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    fn hovered(&self) -> Option<NodeId> {
        self.lines.iter().flatten().nth(self.cursor).map(|s| s.node)
    }

    fn refresh(&mut self) {
        self.lines = layout_lines(&self.doc, &self.style);
        self.cursor = self.cursor.min(self.segment_count().saturating_sub(1));
    }

    fn move_cursor(&mut self, forward: bool) {
        let count = self.segment_count();
        if count == 0 {
            return;
        }
        self.cursor = if forward {
            (self.cursor + 1) % count
        } else {
            (self.cursor + count - 1) % count
        };
        if let Some(node) = self.hovered() {
            let now = Instant::now();
            let target = HoverTarget::Node(node);
            self.controller
                .pointer_leave(&self.doc, &self.style, target, now);
            self.controller
                .pointer_enter(&self.doc, &self.style, target, now);
        }
    }

    fn tick(&mut self) {
        if self
            .controller
            .tick(&mut self.doc, &self.style, Instant::now())
            .is_some()
        {
            self.refresh();
        }
    }

    fn delete_active(&mut self) {
        self.status = match self
            .controller
            .activate_delete(&mut self.doc, &self.style, &mut *self.store)
        {
            Ok(Some(report)) => format!("Deleted highlight ({} markers removed)", report.touched()),
            Ok(None) => "No highlight under the cursor".to_string(),
            Err(e) => format!("Removed from page, but not from the store: {e}"),
        };
        self.refresh();
        // Whatever now sits under the cursor becomes the hover target.
        if let Some(node) = self.hovered() {
            self.controller.pointer_enter(
                &self.doc,
                &self.style,
                HoverTarget::Node(node),
                Instant::now(),
            );
        }
    }
}

pub fn run(
    doc: Document,
    style: MarkerStyle,
    timing: InteractionTiming,
    store: &mut FileStore,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(doc, style, timing, store);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App<'_>) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = app
            .controller
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
        {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Right | KeyCode::Char('l') => app.move_cursor(true),
                KeyCode::Left | KeyCode::Char('h') => app.move_cursor(false),
                KeyCode::Char('d') => app.delete_active(),
                _ => {}
            }
        }
        app.tick();
    }
}

fn ui(f: &mut Frame, app: &App<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let hovered = app.hovered();
    let page_lines: Vec<Line> = app
        .lines
        .iter()
        .map(|line| {
            let spans: Vec<Span> = line
                .iter()
                .map(|segment| {
                    let mut style = match (segment.active, segment.painted) {
                        (true, _) => Style::default().bg(Color::Magenta).fg(Color::White),
                        (false, true) => Style::default().bg(Color::Yellow).fg(Color::Black),
                        (false, false) => Style::default(),
                    };
                    if Some(segment.node) == hovered {
                        style = style.add_modifier(Modifier::UNDERLINED);
                    }
                    Span::styled(segment.text.clone(), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let title = match app.controller.active() {
        Some(active) => format!("Page (active: {}, d to delete)", active.id),
        None => "Page".to_string(),
    };
    let page = Paragraph::new(page_lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(page, chunks[0]);

    let help = Paragraph::new(vec![
        Line::from(vec![Span::raw("q: Quit | ←/h: Previous | →/l: Next | d: Delete")]),
        Line::from(vec![Span::raw(app.status.clone())]),
    ]);
    f.render_widget(help, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_dom::parse_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_is_grouped_by_block() {
        let doc = parse_html(concat!(
            "<h1>Title</h1>\n",
            r#"<p>Hello <mark data-highlight-ids="a" data-highlight-active="true">world</mark></p>"#,
            "<ul><li>one</li><li>two</li></ul>"
        ));
        let lines = layout_lines(&doc, &MarkerStyle::default());

        let texts: Vec<Vec<&str>> = lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect())
            .collect();
        assert_eq!(
            texts,
            vec![vec!["Title"], vec!["Hello ", "world"], vec!["one"], vec!["two"]]
        );
        assert!(lines[1][1].painted && lines[1][1].active);
        assert!(!lines[1][0].painted);
    }
}
