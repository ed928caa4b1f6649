//! Byte streams a [`Connection`](super::Connection) can wrap

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// A duplex byte stream with socket-style controls
///
/// Clones made with [`try_clone`](Stream::try_clone) must refer to the same
/// underlying socket, so a timeout set through one applies to all of them.
pub trait Stream: Read + Write + Send + Sized {
    /// Address type reported by the stream
    type Addr: std::fmt::Debug;

    /// Another handle to the same socket
    fn try_clone(&self) -> io::Result<Self>;

    /// Per-operation read timeout (None = block forever)
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Per-operation write timeout (None = block forever)
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Shut down both halves
    fn shutdown(&self) -> io::Result<()>;

    /// Local address
    fn local_addr(&self) -> io::Result<Self::Addr>;

    /// Remote address
    fn peer_addr(&self) -> io::Result<Self::Addr>;
}

impl Stream for TcpStream {
    type Addr = SocketAddr;

    fn try_clone(&self) -> io::Result<Self> {
        TcpStream::try_clone(self)
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

#[cfg(unix)]
impl Stream for std::os::unix::net::UnixStream {
    type Addr = std::os::unix::net::SocketAddr;

    fn try_clone(&self) -> io::Result<Self> {
        std::os::unix::net::UnixStream::try_clone(self)
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_write_timeout(self, timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        std::os::unix::net::UnixStream::shutdown(self, Shutdown::Both)
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        std::os::unix::net::UnixStream::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<Self::Addr> {
        std::os::unix::net::UnixStream::peer_addr(self)
    }
}
