use std::net::SocketAddr;

use super::socket::ChannelSocket;
use super::{ChannelError, ChannelName};

pub struct Pusher {
    socket: ChannelSocket,
}

impl Pusher {
    pub fn dial(addr: SocketAddr) -> Result<Self, ChannelError> {
        let socket = ChannelSocket::dial(addr).map_err(|source| ChannelError::Setup {
            channel: ChannelName::Input,
            addr,
            source,
        })?;

        Ok(Self { socket })
    }

    pub fn push(&self, payload: &[u8]) -> Result<(), ChannelError> {
        self.socket
            .send(payload)
            .map(|_| ())
            .map_err(|source| ChannelError::Send {
                channel: ChannelName::Input,
                source,
            })
    }
}

#[derive(Debug)]
pub struct Puller {
    socket: ChannelSocket,
}

impl Puller {
    pub fn bind(addr: SocketAddr) -> Result<Self, ChannelError> {
        let socket = ChannelSocket::bind(addr).map_err(|source| ChannelError::Setup {
            channel: ChannelName::Input,
            addr,
            source,
        })?;

        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    pub fn try_pull(&mut self) -> Option<Vec<u8>> {
        match self.socket.try_recv_from() {
            Ok(message) => message.map(|(data, _)| data),
            Err(e) => {
                log::warn!("input receive failed: {e}");
                None
            }
        }
    }
}
