//! UDP channel shared by all multiplexed uTP connections
//!
//! Provides a cross-platform non-blocking UDP socket wrapper. One channel
//! is shared read/write across every connection multiplexed on it; the
//! owning dispatch loop reads datagrams, demultiplexes them by connection
//! id and hands the channel to each [`utp_protocol::Connection`] as its
//! send primitive.

use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use tracing::debug;
use utp_protocol::DatagramSender;

/// Channel configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid socket address")]
    InvalidAddress,
}

/// Shared UDP channel
pub struct UtpChannel {
    inner: Socket,
}

impl UtpChannel {
    /// Create a new channel bound to the given address
    pub fn bind(addr: SocketAddr) -> Result<Self, ChannelError> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;

        let channel = UtpChannel { inner: socket };
        debug!(local = %channel.local_addr()?, "bound uTP channel");
        Ok(channel)
    }

    /// Set the send buffer size
    pub fn set_send_buffer_size(&self, size: usize) -> Result<(), ChannelError> {
        self.inner.set_send_buffer_size(size)?;
        Ok(())
    }

    /// Set the receive buffer size
    pub fn set_recv_buffer_size(&self, size: usize) -> Result<(), ChannelError> {
        self.inner.set_recv_buffer_size(size)?;
        Ok(())
    }

    /// Get the local address this channel is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ChannelError> {
        self.inner
            .local_addr()?
            .as_socket()
            .ok_or(ChannelError::InvalidAddress)
    }

    /// Send a datagram to the given address
    ///
    /// Returns the number of bytes sent, or WouldBlock if the socket is
    /// not ready.
    pub fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, ChannelError> {
        Ok(self.inner.send_to(buf, &target.into())?)
    }

    /// Receive a datagram from the channel
    ///
    /// Returns the number of bytes received and the source address, or
    /// WouldBlock if no datagram is pending.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), ChannelError> {
        use std::mem::MaybeUninit;
        let uninit_buf = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
        };

        match self.inner.recv_from(uninit_buf) {
            Ok((n, addr)) => Ok((n, addr.as_socket().ok_or(ChannelError::InvalidAddress)?)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(ChannelError::Io(e)),
            Err(e) => Err(ChannelError::Io(e)),
        }
    }

    /// Try to clone the channel
    pub fn try_clone(&self) -> Result<Self, ChannelError> {
        Ok(UtpChannel {
            inner: self.inner.try_clone()?,
        })
    }
}

impl DatagramSender for UtpChannel {
    fn send_datagram(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, &target.into())
    }
}
