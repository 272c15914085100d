use std::collections::VecDeque;
use std::time::Duration;

use crate::channel::{ChannelConfig, ChannelError, FrontendChannels};
use crate::stats::StatsHandle;
use crate::wire::{
    Envelope, FrameUpdate, InputCommand, ResourceKind, ResourcePayload, ResourceRequest,
    ResourceResponse, TextureImage,
};

#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub resource_timeout: Duration,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            resource_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrontendEvent {
    MapChanged { map_name: String },
    Disconnected { reason: String },
}

pub struct Frontend {
    channels: FrontendChannels,
    stats: StatsHandle,
    latest: Option<FrameUpdate>,
    events: VecDeque<FrontendEvent>,
    input_sequence: u32,
}

impl Frontend {
    pub fn open(
        config: &ChannelConfig,
        options: FrontendConfig,
        stats: StatsHandle,
    ) -> Result<Self, ChannelError> {
        let channels = FrontendChannels::open(config, options.resource_timeout)?;
        log::info!(
            "frontend channels open: resources {}, gameplay {}, input {}",
            config.resources,
            config.gameplay,
            config.input
        );

        Ok(Self {
            channels,
            stats,
            latest: None,
            events: VecDeque::new(),
            input_sequence: 0,
        })
    }

    pub fn stats(&self) -> &StatsHandle {
        &self.stats
    }

    pub fn poll_gameplay(&mut self) -> bool {
        let Some(data) = self.channels.gameplay.try_recv() else {
            return false;
        };

        match Envelope::decode(&data) {
            Ok(Envelope::FrameUpdate(frame)) => {
                self.stats.record_frame_received(data.len());
                log::debug!(
                    "frame {} received ({} entities, {} lights)",
                    frame.frame_number,
                    frame.entities.len(),
                    frame.lights.len()
                );
                // Whole-record replace, last message wins.
                self.latest = Some(frame);
            }
            Ok(Envelope::MapChanged { map_name }) => {
                self.stats.record_message_received(data.len());
                self.events.push_back(FrontendEvent::MapChanged { map_name });
            }
            Ok(Envelope::Disconnected { reason }) => {
                self.stats.record_message_received(data.len());
                self.events
                    .push_back(FrontendEvent::Disconnected { reason });
            }
            Err(e) => {
                log::warn!("dropping malformed gameplay message: {e}");
                return false;
            }
        }

        true
    }

    pub fn latest(&self) -> Option<&FrameUpdate> {
        self.latest.as_ref()
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = FrontendEvent> + '_ {
        self.events.drain(..)
    }

    pub fn send_input(&mut self, mut command: InputCommand) {
        self.input_sequence = self.input_sequence.wrapping_add(1);
        command.sequence = self.input_sequence;

        match command.encode() {
            Ok(data) => match self.channels.input.push(&data) {
                Ok(()) => self.stats.record_message_sent(data.len()),
                Err(e) => log::warn!("input push failed: {e}"),
            },
            Err(e) => log::error!("failed to encode input command: {e}"),
        }
    }

    // Timeout, transport failure, and a mismatched reply all read as
    // "unavailable".
    pub fn fetch_resource(
        &mut self,
        kind: ResourceKind,
        id: u32,
        name: Option<&str>,
    ) -> Option<ResourceResponse> {
        let request = ResourceRequest {
            kind,
            id,
            name: name.map(str::to_string),
        };
        let encoded = match request.encode() {
            Ok(data) => data,
            Err(e) => {
                log::error!("failed to encode resource request: {e}");
                return None;
            }
        };

        self.stats.record_message_sent(encoded.len());
        let reply = match self.channels.resources.request(&encoded) {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("resource request {id} failed: {e}");
                return None;
            }
        };
        self.stats.record_message_received(reply.len());

        match ResourceResponse::decode(&reply) {
            Ok(response) if response.id == id => Some(response),
            Ok(response) => {
                log::warn!("resource reply id {} does not match request {id}", response.id);
                None
            }
            Err(e) => {
                log::warn!("dropping malformed resource response: {e}");
                None
            }
        }
    }

    pub fn fetch_texture(&mut self, id: u32, name: &str) -> Option<TextureImage> {
        let response = self.fetch_resource(ResourceKind::Texture, id, Some(name))?;
        match response.payload {
            ResourcePayload::Texture {
                width,
                height,
                pixels,
            } if !pixels.is_empty() => Some(TextureImage {
                width,
                height,
                pixels,
            }),
            _ => None,
        }
    }

    pub fn close(&mut self) {
        self.channels.close();
    }
}
