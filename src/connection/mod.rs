//! Buffered, timeout-aware wrapper around a byte stream
//!
//! [`Connection`] adds optional read/write buffering and per-operation
//! timeouts to any [`Stream`], plus the helpers line-oriented protocols need:
//! read-at-least-N, read-line and formatted writes.
//!
//! Buffer sizes and timeouts are one-shot: each may be set once, either in
//! the [`ConnectionConfig`] or later through a `mod_*` method. Setting one a
//! second time is a programming error and panics.

mod config;
mod stream;

pub use config::ConnectionConfig;
pub use stream::Stream;

use crate::core::Result;
use config::timeout_from_ms;
use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

enum Reader<S: Stream> {
    Direct(S),
    Buffered(BufReader<S>),
}

impl<S: Stream> Read for Reader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Reader::Direct(s) => s.read(buf),
            Reader::Buffered(r) => r.read(buf),
        }
    }
}

enum Writer<S: Stream> {
    Direct(S),
    Buffered(BufWriter<S>),
}

impl<S: Stream> Write for Writer<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Writer::Direct(s) => s.write(buf),
            Writer::Buffered(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Writer::Direct(s) => s.flush(),
            Writer::Buffered(w) => w.flush(),
        }
    }
}

/// One piece of a line returned by [`Connection::read_line`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line content without its terminator
    pub bytes: Vec<u8>,
    /// More of the same line follows; the read buffer filled first
    pub is_prefix: bool,
}

impl Line {
    fn complete(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            is_prefix: false,
        }
    }
}

/// A stream with optional buffering and timeouts
pub struct Connection<S: Stream> {
    stream: S,
    reader: Reader<S>,
    writer: Writer<S>,
    config: ConnectionConfig,
}

impl<S: Stream> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("peer_addr", &self.stream.peer_addr().ok())
            .finish()
    }
}

impl<S: Stream> Connection<S> {
    /// Wrap `stream`, applying the buffers and timeouts in `config`
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::Io` - The stream could not be cloned or configured
    pub fn new(stream: S, config: ConnectionConfig) -> Result<Self> {
        let reader = if config.read_buf_size > 0 {
            Reader::Buffered(BufReader::with_capacity(
                config.read_buf_size,
                stream.try_clone()?,
            ))
        } else {
            Reader::Direct(stream.try_clone()?)
        };
        let writer = if config.write_buf_size > 0 {
            Writer::Buffered(BufWriter::with_capacity(
                config.write_buf_size,
                stream.try_clone()?,
            ))
        } else {
            Writer::Direct(stream.try_clone()?)
        };

        stream.set_read_timeout(timeout_from_ms(config.read_timeout_ms))?;
        stream.set_write_timeout(timeout_from_ms(config.write_timeout_ms))?;

        Ok(Self {
            stream,
            reader,
            writer,
            config,
        })
    }

    /// Current settings
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Read into `buf` until at least `min` bytes have arrived
    ///
    /// Returns the number of bytes read, which may exceed `min`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `buf` is shorter than `min`
    /// - `UnexpectedEof` if the stream ends first
    /// - `WouldBlock`/`TimedOut` if a read timeout fires
    pub fn read_at_least(&mut self, buf: &mut [u8], min: usize) -> io::Result<usize> {
        if buf.len() < min {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("buffer of {} bytes cannot hold {} bytes", buf.len(), min),
            ));
        }

        let mut n = 0;
        while n < min {
            match self.reader.read(&mut buf[n..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("stream ended after {} of {} bytes", n, min),
                    ))
                }
                Ok(read) => n += read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(n)
    }

    /// Read one line without its `\n` or `\r\n` terminator
    ///
    /// A line never grows past the read buffer size. A longer line comes back
    /// in pieces: every piece but the last has [`Line::is_prefix`] set.
    /// Returns `None` once the stream is exhausted. A final line without a
    /// terminator is still returned.
    ///
    /// # Panics
    ///
    /// Panics if the connection has no read buffer.
    pub fn read_line(&mut self) -> io::Result<Option<Line>> {
        let limit = self.config.read_buf_size;
        let Reader::Buffered(reader) = &mut self.reader else {
            panic!("connection: read_line requires a read buffer");
        };

        let mut bytes = Vec::new();
        loop {
            let (used, terminated, full) = {
                let available = match reader.fill_buf() {
                    Ok(available) => available,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if available.is_empty() {
                    if bytes.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(Line::complete(bytes)));
                }

                let window = &available[..available.len().min(limit - bytes.len())];
                match window.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        bytes.extend_from_slice(&window[..pos]);
                        (pos + 1, true, false)
                    }
                    None => {
                        let mut take = window.len();
                        let full = bytes.len() + take == limit;
                        // Keep a trailing `\r` back so a `\r\n` split across
                        // pieces is still stripped.
                        if full && bytes.len() + take > 1 && window[take - 1] == b'\r' {
                            take -= 1;
                        }
                        bytes.extend_from_slice(&window[..take]);
                        (take, false, full)
                    }
                }
            };
            reader.consume(used);

            if terminated {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                return Ok(Some(Line::complete(bytes)));
            }
            if full {
                return Ok(Some(Line {
                    bytes,
                    is_prefix: true,
                }));
            }
        }
    }

    /// Write formatted text, returning the number of bytes written
    ///
    /// Goes through the write buffer when there is one.
    ///
    /// ```rust,ignore
    /// conn.printf(format_args!("{} {}\r\n", status, reason))?;
    /// ```
    pub fn printf(&mut self, args: fmt::Arguments<'_>) -> io::Result<usize> {
        let text = fmt::format(args);
        self.writer.write_all(text.as_bytes())?;
        Ok(text.len())
    }

    /// Turn on write buffering
    ///
    /// # Panics
    ///
    /// Panics if a write buffer is already configured.
    pub fn mod_write_buf_size(&mut self, bytes: usize) -> io::Result<()> {
        assert!(
            self.config.write_buf_size == 0,
            "connection: write buffer size already set to {}",
            self.config.write_buf_size
        );
        self.config.write_buf_size = bytes;
        if bytes > 0 {
            self.writer = Writer::Buffered(BufWriter::with_capacity(bytes, self.stream.try_clone()?));
        }
        Ok(())
    }

    /// Turn on the per-read timeout
    ///
    /// # Panics
    ///
    /// Panics if a read timeout is already configured.
    pub fn mod_read_timeout_ms(&mut self, ms: u64) -> io::Result<()> {
        assert!(
            self.config.read_timeout_ms == 0,
            "connection: read timeout already set to {}ms",
            self.config.read_timeout_ms
        );
        self.config.read_timeout_ms = ms;
        self.stream.set_read_timeout(timeout_from_ms(ms))
    }

    /// Turn on the per-write timeout
    ///
    /// # Panics
    ///
    /// Panics if a write timeout is already configured.
    pub fn mod_write_timeout_ms(&mut self, ms: u64) -> io::Result<()> {
        assert!(
            self.config.write_timeout_ms == 0,
            "connection: write timeout already set to {}ms",
            self.config.write_timeout_ms
        );
        self.config.write_timeout_ms = ms;
        self.stream.set_write_timeout(timeout_from_ms(ms))
    }

    /// Local address of the stream
    pub fn local_addr(&self) -> io::Result<S::Addr> {
        self.stream.local_addr()
    }

    /// Remote address of the stream
    pub fn peer_addr(&self) -> io::Result<S::Addr> {
        self.stream.peer_addr()
    }

    /// Flush pending writes and shut the stream down
    pub fn close(mut self) -> io::Result<()> {
        let flushed = self.writer.flush();
        let shutdown = self.stream.shutdown();
        flushed.and(shutdown)
    }
}

impl<S: Stream> Read for Connection<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<S: Stream> Write for Connection<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
