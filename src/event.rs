use crate::types::Event;
use std::io::{stdin, BufRead};
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Reads stdin line by line.
///
/// Blocking reads run on a plain thread so that the runtime can shut down
/// while a read is still pending.
pub struct EventHandler {
    rx: UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        thread::spawn(move || {
            for line in stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if !Self::send(&tx, Event::Line(line)) {
                            return;
                        }
                    }
                    Err(e) => {
                        Self::send(&tx, Event::Error(e.to_string()));
                        return;
                    }
                }
            }
            Self::send(&tx, Event::Eof);
        });
        Self { rx }
    }
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
    fn send(tx: &UnboundedSender<Event>, event: Event) -> bool {
        if let Err(e) = tx.send(event) {
            log::debug!("event receiver closed: {e}");
            return false;
        }
        true
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
