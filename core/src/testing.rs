//! In-memory connector and streams for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

use crate::connection::{Connector, Transport};
use crate::error::HttpError;
use crate::url::Endpoint;

#[derive(Default)]
struct Log {
    pending: VecDeque<FakeStream>,
    connects: usize,
    closed: Vec<usize>,
    sent: Vec<u8>,
}

/// Hands out scripted streams in order and records what happens to them.
/// Once the script runs out, connects are refused.
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    log: Rc<RefCell<Log>>,
}

impl FakeConnector {
    pub(crate) fn new(streams: Vec<FakeStream>) -> Self {
        let connector = Self::default();
        connector.log.borrow_mut().pending.extend(streams);
        connector
    }

    pub(crate) fn connects(&self) -> usize {
        self.log.borrow().connects
    }

    /// Ids of closed streams, in closing order. Ids count connects from 1.
    pub(crate) fn closed(&self) -> Vec<usize> {
        self.log.borrow().closed.clone()
    }

    /// Everything written to any stream, in order.
    pub(crate) fn sent(&self) -> String {
        String::from_utf8_lossy(&self.log.borrow().sent).into_owned()
    }
}

impl Connector for FakeConnector {
    type Stream = FakeStream;

    fn connect(&self, _endpoint: &Endpoint) -> Result<FakeStream, HttpError> {
        let mut log = self.log.borrow_mut();
        let Some(mut stream) = log.pending.pop_front() else {
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
        };
        log.connects += 1;
        stream.id = log.connects;
        stream.log = Rc::clone(&self.log);
        Ok(stream)
    }
}

/// A scripted peer. Like a real server it answers only after a request has
/// been written: each write releases the next scripted response once the
/// previous one has been read in full. With the script exhausted, reads hit
/// EOF as if the peer had hung up.
pub(crate) struct FakeStream {
    id: usize,
    script: VecDeque<Vec<u8>>,
    incoming: Cursor<Vec<u8>>,
    broken: bool,
    log: Rc<RefCell<Log>>,
}

impl FakeStream {
    /// A stream whose peer answers one request with `bytes` and then closes.
    pub(crate) fn replying(bytes: &[u8]) -> Self {
        Self::scripted(vec![bytes.to_vec()])
    }

    /// A stream whose peer answers successive requests with `responses`, in
    /// order, and then closes.
    pub(crate) fn scripted(responses: Vec<Vec<u8>>) -> Self {
        Self {
            id: 0,
            script: responses.into(),
            incoming: Cursor::default(),
            broken: false,
            log: Rc::default(),
        }
    }

    /// A stream that rejects every write.
    pub(crate) fn broken() -> Self {
        Self {
            broken: true,
            ..Self::replying(b"")
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }
}

impl Read for FakeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.incoming.read(buf)
    }
}

impl Write for FakeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.log.borrow_mut().sent.extend_from_slice(buf);
        let drained = self.incoming.position() as usize >= self.incoming.get_ref().len();
        if drained {
            if let Some(next) = self.script.pop_front() {
                self.incoming = Cursor::new(next);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for FakeStream {
    fn close(&mut self) -> io::Result<()> {
        self.log.borrow_mut().closed.push(self.id);
        Ok(())
    }
}

/// A complete response with a `Content-Length` framed body.
pub(crate) fn ok_response(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

mod tests {
    use super::*;

    fn read_all(stream: &mut FakeStream) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn scripted_stream_answers_only_after_a_request() {
        let mut stream = FakeStream::scripted(vec![b"first".to_vec(), b"second".to_vec()]);
        assert!(read_all(&mut stream).is_empty());

        stream.write_all(b"req 1").unwrap();
        assert_eq!(read_all(&mut stream), b"first");
        stream.write_all(b"req 2").unwrap();
        assert_eq!(read_all(&mut stream), b"second");

        stream.write_all(b"req 3").unwrap();
        assert!(read_all(&mut stream).is_empty());
    }

    #[test]
    fn unread_response_is_not_replaced() {
        let mut stream = FakeStream::scripted(vec![b"first".to_vec(), b"second".to_vec()]);
        stream.write_all(b"head").unwrap();
        stream.write_all(b"body").unwrap();
        assert_eq!(read_all(&mut stream), b"first");
    }
}
