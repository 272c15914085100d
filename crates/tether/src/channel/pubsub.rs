use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::wire::{ControlFrame, PROTOCOL_VERSION};

use super::socket::ChannelSocket;
use super::{ChannelError, ChannelName};

const DEFAULT_SUBSCRIBER_TTL: Duration = Duration::from_secs(5);
const ANNOUNCE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Publisher {
    socket: ChannelSocket,
    subscribers: HashMap<SocketAddr, Instant>,
    subscriber_ttl: Duration,
}

impl Publisher {
    pub fn bind(addr: SocketAddr) -> Result<Self, ChannelError> {
        let socket = ChannelSocket::bind(addr).map_err(|source| ChannelError::Setup {
            channel: ChannelName::Gameplay,
            addr,
            source,
        })?;

        Ok(Self {
            socket,
            subscribers: HashMap::new(),
            subscriber_ttl: DEFAULT_SUBSCRIBER_TTL,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    pub fn set_subscriber_ttl(&mut self, ttl: Duration) {
        self.subscriber_ttl = ttl;
    }

    pub fn poll_subscriptions(&mut self) {
        loop {
            match self.socket.try_recv_from() {
                Ok(Some((data, from))) => match ControlFrame::decode(&data) {
                    Ok(ControlFrame::Subscribe { protocol_version }) => {
                        if protocol_version != PROTOCOL_VERSION {
                            log::warn!(
                                "rejecting subscriber {from}: wire version {protocol_version}, ours is {PROTOCOL_VERSION}"
                            );
                            continue;
                        }
                        if self.subscribers.insert(from, Instant::now()).is_none() {
                            log::info!("subscriber attached: {from}");
                        }
                    }
                    Ok(ControlFrame::Unsubscribe) => {
                        if self.subscribers.remove(&from).is_some() {
                            log::info!("subscriber detached: {from}");
                        }
                    }
                    Err(e) => {
                        log::debug!("dropping malformed control frame from {from}: {e}");
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    log::warn!("gameplay control receive failed: {e}");
                    break;
                }
            }
        }

        let ttl = self.subscriber_ttl;
        self.subscribers.retain(|addr, last_seen| {
            let live = last_seen.elapsed() <= ttl;
            if !live {
                log::info!("subscriber expired: {addr}");
            }
            live
        });
    }

    pub fn publish(&mut self, payload: &[u8]) -> usize {
        self.poll_subscriptions();

        let mut delivered = 0;
        for addr in self.subscribers.keys() {
            match self.socket.send_to(payload, *addr) {
                Ok(_) => delivered += 1,
                Err(e) => log::warn!("publish to {addr} failed: {e}"),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

pub struct Subscriber {
    socket: ChannelSocket,
    last_announce: Instant,
}

impl Subscriber {
    pub fn dial(addr: SocketAddr) -> Result<Self, ChannelError> {
        let socket = ChannelSocket::dial(addr).map_err(|source| ChannelError::Setup {
            channel: ChannelName::Gameplay,
            addr,
            source,
        })?;

        let mut subscriber = Self {
            socket,
            last_announce: Instant::now(),
        };
        subscriber.announce();
        Ok(subscriber)
    }

    fn announce(&mut self) {
        match (ControlFrame::Subscribe {
            protocol_version: PROTOCOL_VERSION,
        })
        .encode()
        {
            Ok(data) => {
                if let Err(e) = self.socket.send(&data) {
                    log::debug!("subscribe announce failed: {e}");
                }
            }
            Err(e) => log::error!("failed to encode subscribe frame: {e}"),
        }
        self.last_announce = Instant::now();
    }

    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        if self.last_announce.elapsed() >= ANNOUNCE_INTERVAL {
            self.announce();
        }

        match self.socket.try_recv() {
            Ok(message) => message,
            Err(e) => {
                log::warn!("gameplay receive failed: {e}");
                None
            }
        }
    }

    pub fn close(&mut self) {
        if let Ok(data) = ControlFrame::Unsubscribe.encode() {
            let _ = self.socket.send(&data);
        }
    }
}
