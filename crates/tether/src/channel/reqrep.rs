use std::net::SocketAddr;
use std::time::Duration;

use super::socket::ChannelSocket;
use super::{ChannelError, ChannelName};

pub struct Requester {
    socket: ChannelSocket,
    timeout: Duration,
}

impl Requester {
    pub fn dial(addr: SocketAddr, timeout: Duration) -> Result<Self, ChannelError> {
        let socket = ChannelSocket::dial(addr).map_err(|source| ChannelError::Setup {
            channel: ChannelName::Resources,
            addr,
            source,
        })?;

        Ok(Self { socket, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>, ChannelError> {
        // Replies left over from a timed-out exchange would break the
        // send/receive pairing.
        let mut stale = 0usize;
        while let Ok(Some(_)) = self.socket.try_recv() {
            stale += 1;
        }
        if stale > 0 {
            log::debug!("discarded {stale} stale resource replies");
        }

        self.socket
            .send(payload)
            .map_err(|source| ChannelError::Send {
                channel: ChannelName::Resources,
                source,
            })?;

        match self.socket.recv_timeout(self.timeout) {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(ChannelError::Timeout(self.timeout)),
            Err(source) => Err(ChannelError::Receive {
                channel: ChannelName::Resources,
                source,
            }),
        }
    }
}

#[derive(Debug)]
pub struct Replier {
    socket: ChannelSocket,
}

impl Replier {
    pub fn bind(addr: SocketAddr) -> Result<Self, ChannelError> {
        let socket = ChannelSocket::bind(addr).map_err(|source| ChannelError::Setup {
            channel: ChannelName::Resources,
            addr,
            source,
        })?;

        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    pub fn try_recv(&mut self) -> Option<(Vec<u8>, SocketAddr)> {
        match self.socket.try_recv_from() {
            Ok(request) => request,
            Err(e) => {
                log::warn!("resource request receive failed: {e}");
                None
            }
        }
    }

    pub fn reply(&self, payload: &[u8], to: SocketAddr) -> Result<(), ChannelError> {
        self.socket
            .send_to(payload, to)
            .map(|_| ())
            .map_err(|source| ChannelError::Send {
                channel: ChannelName::Resources,
                source,
            })
    }
}
