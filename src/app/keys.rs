//! Raw keyboard signal source (headless: one `<key> down|up` per stdin line)

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A raw key transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySignal {
    pub key: String,
    pub pressed: bool,
}

/// Parse a line such as `w down` or `Shift up`
pub fn parse_line(line: &str) -> Option<KeySignal> {
    let mut parts = line.split_whitespace();
    let key = parts.next()?;
    let pressed = match parts.next()? {
        "down" => true,
        "up" => false,
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(KeySignal {
        key: key.to_string(),
        pressed,
    })
}

/// Forward key signals from stdin until EOF
pub fn spawn_stdin_reader(tx: mpsc::UnboundedSender<KeySignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_line(&line) {
                    Some(signal) => {
                        if tx.send(signal).is_err() {
                            break;
                        }
                    }
                    None => debug!(line = %line, "Ignoring malformed key line"),
                },
                Ok(None) => {
                    debug!("Key input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read key input");
                    break;
                }
            }
        }
    })
}
