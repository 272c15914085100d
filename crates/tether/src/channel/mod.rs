mod pipeline;
mod pubsub;
mod reqrep;
mod socket;

pub use pipeline::{Puller, Pusher};
pub use pubsub::{Publisher, Subscriber};
pub use reqrep::{Replier, Requester};
pub use socket::{ChannelSocket, MAX_DATAGRAM_SIZE};

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelName {
    Resources,
    Gameplay,
    Input,
}

impl ChannelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::Resources => "resources",
            ChannelName::Gameplay => "gameplay",
            ChannelName::Input => "input",
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to open {channel} channel at {addr}: {source}")]
    Setup {
        channel: ChannelName,
        addr: SocketAddr,
        source: io::Error,
    },
    #[error("send on {channel} channel failed: {source}")]
    Send {
        channel: ChannelName,
        source: io::Error,
    },
    #[error("receive on {channel} channel failed: {source}")]
    Receive {
        channel: ChannelName,
        source: io::Error,
    },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub resources: SocketAddr,
    pub gameplay: SocketAddr,
    pub input: SocketAddr,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            resources: SocketAddr::from(([127, 0, 0, 1], 9001)),
            gameplay: SocketAddr::from(([127, 0, 0, 1], 9002)),
            input: SocketAddr::from(([127, 0, 0, 1], 9003)),
        }
    }
}

#[derive(Debug)]
pub struct BackendChannels {
    pub resources: Replier,
    pub gameplay: Publisher,
    pub input: Puller,
}

impl BackendChannels {
    // Binds Resources, then Gameplay, then Input; a failure drops whatever
    // was opened so far.
    pub fn open(config: &ChannelConfig) -> Result<Self, ChannelError> {
        let resources = Replier::bind(config.resources)?;
        let gameplay = Publisher::bind(config.gameplay)?;
        let input = Puller::bind(config.input)?;

        Ok(Self {
            resources,
            gameplay,
            input,
        })
    }
}

pub struct FrontendChannels {
    pub resources: Requester,
    pub gameplay: Subscriber,
    pub input: Pusher,
}

impl FrontendChannels {
    pub fn open(
        config: &ChannelConfig,
        resource_timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let resources = Requester::dial(config.resources, resource_timeout)?;
        let gameplay = Subscriber::dial(config.gameplay)?;
        let input = Pusher::dial(config.input)?;

        Ok(Self {
            resources,
            gameplay,
            input,
        })
    }

    pub fn close(&mut self) {
        self.gameplay.close();
    }
}
