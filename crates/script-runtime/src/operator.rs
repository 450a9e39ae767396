//! Operator keyboard input for `pause`
//!
//! Stdin is read on a detached OS thread that forwards lines over a channel,
//! so an interrupted `pause` never holds the runtime open on shutdown.

use std::io::{self, BufRead};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tracing::debug;

const LINE_BUFFER: usize = 4;

/// Stdin lines as an [`AsyncRead`]; the reader thread starts on first read.
pub struct OperatorInput {
    source: Source,
    pending: Vec<u8>,
    offset: usize,
}

enum Source {
    Stdin,
    Channel(mpsc::Receiver<Vec<u8>>),
    Closed,
}

impl OperatorInput {
    pub fn stdin() -> Self {
        Self {
            source: Source::Stdin,
            pending: Vec::new(),
            offset: 0,
        }
    }

    pub(crate) fn from_channel(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            source: Source::Channel(rx),
            pending: Vec::new(),
            offset: 0,
        }
    }
}

fn spawn_stdin_reader() -> Source {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    let spawned = thread::Builder::new()
        .name("soulscript-operator".into())
        .spawn(move || {
            let stdin = io::stdin();
            let mut reader = stdin.lock();
            loop {
                let mut line = Vec::new();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        debug!(?err, "operator input closed");
                        break;
                    }
                }
            }
        });
    match spawned {
        Ok(_) => Source::Channel(rx),
        Err(err) => {
            debug!(?err, "cannot start operator input thread");
            Source::Closed
        }
    }
}

impl AsyncRead for OperatorInput {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        if this.offset >= this.pending.len() {
            if matches!(this.source, Source::Stdin) {
                this.source = spawn_stdin_reader();
            }
            let Source::Channel(rx) = &mut this.source else {
                return Poll::Ready(Ok(()));
            };
            match rx.poll_recv(cx) {
                Poll::Ready(Some(chunk)) => {
                    this.pending = chunk;
                    this.offset = 0;
                }
                Poll::Ready(None) => {
                    this.source = Source::Closed;
                    return Poll::Ready(Ok(()));
                }
                Poll::Pending => return Poll::Pending,
            }
        }

        let available = &this.pending[this.offset..];
        let take = available.len().min(buf.remaining());
        buf.put_slice(&available[..take]);
        this.offset += take;
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn forwards_lines_then_reports_end_of_input() {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let mut input = BufReader::new(OperatorInput::from_channel(rx));
        tx.send(b"go\n".to_vec()).await.unwrap();
        tx.send(b"again\n".to_vec()).await.unwrap();
        drop(tx);

        let mut line = String::new();
        assert_eq!(input.read_line(&mut line).await.unwrap(), 3);
        assert_eq!(line, "go\n");
        line.clear();
        input.read_line(&mut line).await.unwrap();
        assert_eq!(line, "again\n");
        line.clear();
        assert_eq!(input.read_line(&mut line).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn pending_read_can_be_abandoned() {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let mut input = BufReader::new(OperatorInput::from_channel(rx));
        let mut line = String::new();
        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            input.read_line(&mut line),
        )
        .await;
        assert!(waited.is_err());
        drop(input);
        assert!(tx.is_closed());
    }
}
