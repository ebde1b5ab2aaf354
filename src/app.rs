use crate::backend::{Watch, Watcher};
use crate::event::EventHandler;
use crate::model::Layout;
use crate::moderation::ModerationPolicy;
use crate::query::FeedQuery;
use crate::source::ContentSource;
use crate::types::{Action, Event};
use crate::widgets::feed::FeedWidget;
use color_eyre::Result;
use std::io::{stdout, Write};
use tokio::sync::mpsc;

const HELP: &str = "commands: m(ore), r(efresh), g <query>, q(uit)";

pub fn io() -> impl Write {
    stdout()
}

/// Maps one input line to an action. Blank lines are ignored.
pub fn parse_command(line: &str) -> Option<Action> {
    let line = line.trim();
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(command, rest)| (command, rest.trim()));
    Some(match command {
        "" => return None,
        "m" | "more" => Action::LoadMore,
        "r" | "refresh" => Action::Refresh,
        "q" | "quit" => Action::Quit,
        "g" | "go" => match rest.parse::<FeedQuery>() {
            Ok(query) => Action::Switch(query),
            Err(e) => Action::Error(e.to_string()),
        },
        _ => Action::Error(format!("unknown command: {command}. {HELP}")),
    })
}

pub struct App {
    query: FeedQuery,
    layout: Layout,
    width: usize,
}

impl App {
    pub fn new(query: FeedQuery, layout: Layout, width: usize) -> Self {
        log::debug!("App::new({query:?}, {layout:?}, {width})");
        Self {
            query,
            layout,
            width,
        }
    }
    pub async fn run<S, M>(&mut self, watcher: &Watcher<S, M>) -> Result<()>
    where
        S: ContentSource + 'static,
        M: ModerationPolicy + 'static,
    {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let mut events = EventHandler::new();
        let mut out = io();
        writeln!(out, "{HELP}")?;

        let mut feed = watcher.feed(self.query.clone(), self.layout);
        let mut rx = feed.subscribe();
        let mut should_quit = false;
        loop {
            tokio::select! {
                changed = rx.changed() => match changed {
                    Ok(()) => action_tx.send(Action::Render)?,
                    Err(e) => {
                        log::warn!("feed session closed: {e}");
                        action_tx.send(Action::Quit)?;
                    }
                },
                event = events.next() => match event {
                    Some(Event::Line(line)) => {
                        if let Some(action) = parse_command(&line) {
                            action_tx.send(action)?;
                        }
                    }
                    Some(Event::Error(e)) => {
                        action_tx.send(Action::Error(e))?;
                        action_tx.send(Action::Quit)?;
                    }
                    Some(Event::Eof) | None => action_tx.send(Action::Quit)?,
                },
            }
            while let Ok(action) = action_rx.try_recv() {
                if !matches!(action, Action::Render) {
                    log::info!("Action {action:?}");
                }
                match action {
                    Action::Quit => should_quit = true,
                    Action::Render => {
                        let snapshot = rx.borrow_and_update().clone();
                        let widget = FeedWidget::new(&self.query, &snapshot);
                        write!(out, "{}", widget.render(self.width))?;
                        out.flush()?;
                    }
                    Action::Refresh => feed.refresh(),
                    Action::LoadMore => feed.load_more(),
                    Action::Switch(query) => {
                        feed.unsubscribe();
                        self.query = query;
                        feed = watcher.feed(self.query.clone(), self.layout);
                        rx = feed.subscribe();
                    }
                    Action::Error(e) => {
                        log::error!("{e}");
                        writeln!(out, "! {e}")?;
                    }
                }
            }
            if should_quit {
                break;
            }
        }
        feed.unsubscribe();
        Ok(())
    }
}
