use std::time::Instant;

use glam::Vec3;

use crate::channel::{BackendChannels, ChannelConfig, ChannelError};
use crate::stats::StatsHandle;
use crate::wire::{
    DynamicLight, Entity, EntityEffects, Envelope, FrameUpdate, GameState, InputCommand,
    PlayerState, ResourceKind, ResourcePayload, ResourceRequest, ResourceResponse, TextureImage,
    normalize_name,
};

#[derive(Debug, Clone)]
pub struct WorldView {
    pub timestamp: f64,
    pub view_origin: Vec3,
    pub view_angles: Vec3,
    pub player: PlayerState,
    pub game: GameState,
    pub entities: Vec<EntityView>,
    pub lights: Vec<LightView>,
}

impl WorldView {
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            view_origin: Vec3::ZERO,
            view_angles: Vec3::ZERO,
            player: PlayerState::default(),
            game: GameState::default(),
            entities: Vec::new(),
            lights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityView {
    pub origin: Vec3,
    pub angles: Vec3,
    pub model_id: u16,
    pub frame: u16,
    pub skin: u8,
    pub effects: EntityEffects,
    pub alpha: f32,
    pub scale: f32,
}

impl EntityView {
    pub fn new(model_id: u16) -> Self {
        Self {
            origin: Vec3::ZERO,
            angles: Vec3::ZERO,
            model_id,
            frame: 0,
            skin: 0,
            effects: EntityEffects::empty(),
            alpha: 1.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LightView {
    pub key: u32,
    pub origin: Vec3,
    pub radius: f32,
    pub color: Vec3,
}

/// Accumulates one frame per tick: scalar state set once, sequences
/// appended, finished exactly once.
pub struct FrameBuilder {
    frame: FrameUpdate,
}

impl FrameBuilder {
    pub fn new(frame_number: u32, timestamp: f64) -> Self {
        Self {
            frame: FrameUpdate::new(frame_number, timestamp),
        }
    }

    pub fn set_view(&mut self, origin: Vec3, angles: Vec3) {
        self.frame.view_origin = origin.into();
        self.frame.view_angles = angles.into();
    }

    pub fn set_player(&mut self, player: PlayerState) {
        self.frame.player = player;
    }

    pub fn set_game(&mut self, game: GameState) {
        self.frame.game = game;
    }

    pub fn push_entity(&mut self, view: &EntityView) {
        self.frame.entities.push(Entity {
            origin: view.origin.into(),
            angles: view.angles.into(),
            model_id: view.model_id,
            frame: view.frame,
            skin: view.skin,
            effects: view.effects.bits(),
            alpha: view.alpha.clamp(0.0, 1.0),
            scale: view.scale.max(0.0),
        });
    }

    pub fn push_light(&mut self, view: &LightView) {
        self.frame.lights.push(DynamicLight {
            key: view.key,
            origin: view.origin.into(),
            radius: view.radius,
            color: view.color.into(),
        });
    }

    pub fn entity_count(&self) -> usize {
        self.frame.entities.len()
    }

    pub fn finish(self) -> FrameUpdate {
        self.frame
    }
}

pub trait AssetSource {
    fn fetch(&self, name: &str) -> Option<TextureImage>;
}

pub struct Backend {
    channels: BackendChannels,
    stats: StatsHandle,
    next_frame_number: u32,
    current_input: Option<InputCommand>,
}

impl Backend {
    pub fn open(config: &ChannelConfig, stats: StatsHandle) -> Result<Self, ChannelError> {
        let channels = BackendChannels::open(config)?;
        log::info!(
            "backend channels open: resources {}, gameplay {}, input {}",
            config.resources,
            config.gameplay,
            config.input
        );

        Ok(Self {
            channels,
            stats,
            next_frame_number: 0,
            current_input: None,
        })
    }

    pub fn stats(&self) -> &StatsHandle {
        &self.stats
    }

    pub fn poll_subscribers(&mut self) -> usize {
        self.channels.gameplay.poll_subscriptions();
        self.channels.gameplay.subscriber_count()
    }

    // None means no publishable state this tick (no world or no session),
    // which is a silent no-op rather than an error.
    pub fn publish_tick(&mut self, view: Option<&WorldView>) {
        let Some(view) = view else { return };

        let started = Instant::now();
        let frame_number = self.next_frame_number;
        self.next_frame_number = self.next_frame_number.wrapping_add(1);

        let mut builder = FrameBuilder::new(frame_number, view.timestamp);
        builder.set_view(view.view_origin, view.view_angles);
        builder.set_player(view.player);
        builder.set_game(view.game.clone());
        for entity in &view.entities {
            builder.push_entity(entity);
        }
        for light in &view.lights {
            builder.push_light(light);
        }

        let envelope = Envelope::FrameUpdate(builder.finish());
        let encoded = match envelope.encode() {
            Ok(data) => data,
            Err(e) => {
                log::error!("failed to encode frame {frame_number}: {e}");
                return;
            }
        };

        self.channels.gameplay.publish(&encoded);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.stats.record_frame_sent(encoded.len(), elapsed_ms);
    }

    pub fn publish_map_changed(&mut self, map_name: &str) {
        self.publish_event(Envelope::MapChanged {
            map_name: map_name.to_string(),
        });
    }

    pub fn publish_disconnected(&mut self, reason: &str) {
        self.publish_event(Envelope::Disconnected {
            reason: reason.to_string(),
        });
    }

    fn publish_event(&mut self, envelope: Envelope) {
        match envelope.encode() {
            Ok(data) => {
                self.channels.gameplay.publish(&data);
                self.stats.record_message_sent(data.len());
            }
            Err(e) => log::error!("failed to encode gameplay event: {e}"),
        }
    }

    // Movement state is last-wins across the drain; console text from
    // superseded commands still surfaces, in arrival order.
    pub fn drain_input(&mut self) -> Vec<String> {
        let mut console = Vec::new();

        while let Some(data) = self.channels.input.try_pull() {
            self.stats.record_message_received(data.len());

            match InputCommand::decode(&data) {
                Ok(command) => {
                    if let Some(text) = &command.console {
                        if !text.is_empty() {
                            console.push(text.clone());
                        }
                    }
                    self.current_input = Some(command);
                }
                Err(e) => log::warn!("dropping malformed input command: {e}"),
            }
        }

        console
    }

    pub fn current_input(&self) -> Option<&InputCommand> {
        self.current_input.as_ref()
    }

    pub fn has_pending_input(&self) -> bool {
        self.current_input.is_some()
    }

    pub fn serve_resources(&mut self, assets: &dyn AssetSource) -> usize {
        let mut served = 0;

        while let Some((data, from)) = self.channels.resources.try_recv() {
            self.stats.record_message_received(data.len());

            let request = match ResourceRequest::decode(&data) {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("dropping malformed resource request from {from}: {e}");
                    continue;
                }
            };

            let response = build_response(&request, assets);
            match response.encode() {
                Ok(encoded) => {
                    if let Err(e) = self.channels.resources.reply(&encoded, from) {
                        log::warn!("resource reply to {from} failed: {e}");
                    } else {
                        self.stats.record_message_sent(encoded.len());
                        served += 1;
                    }
                }
                Err(e) => log::error!("failed to encode resource response: {e}"),
            }
        }

        served
    }
}

fn build_response(request: &ResourceRequest, assets: &dyn AssetSource) -> ResourceResponse {
    let payload = match request.kind {
        ResourceKind::Texture => {
            let found = request
                .name
                .as_deref()
                .map(normalize_name)
                .and_then(|name| assets.fetch(&name));
            match found {
                Some(image) => ResourcePayload::Texture {
                    width: image.width,
                    height: image.height,
                    pixels: image.pixels,
                },
                None => ResourcePayload::empty(ResourceKind::Texture),
            }
        }
        // Models are not served yet; the exchange still owes one reply.
        ResourceKind::Model => ResourcePayload::empty(ResourceKind::Model),
    };

    ResourceResponse {
        id: request.id,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_builder_appends_sequences() {
        let mut builder = FrameBuilder::new(7, 0.5);
        builder.set_view(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 90.0, 0.0));

        let mut ent = EntityView::new(3);
        ent.origin = Vec3::new(4.0, 5.0, 6.0);
        builder.push_entity(&ent);
        builder.push_entity(&EntityView::new(8));
        builder.push_light(&LightView {
            key: 1,
            origin: Vec3::ZERO,
            radius: 300.0,
            color: Vec3::ONE,
        });

        assert_eq!(builder.entity_count(), 2);

        let frame = builder.finish();
        assert_eq!(frame.frame_number, 7);
        assert_eq!(frame.view_origin, [1.0, 2.0, 3.0]);
        assert_eq!(frame.entities.len(), 2);
        assert_eq!(frame.entities[0].origin, [4.0, 5.0, 6.0]);
        assert_eq!(frame.lights.len(), 1);
        assert_eq!(frame.lights[0].radius, 300.0);
    }

    #[test]
    fn frame_builder_clamps_alpha_and_scale() {
        let mut builder = FrameBuilder::new(0, 0.0);

        let mut ent = EntityView::new(1);
        ent.alpha = 3.0;
        ent.scale = -1.0;
        builder.push_entity(&ent);

        let frame = builder.finish();
        assert_eq!(frame.entities[0].alpha, 1.0);
        assert_eq!(frame.entities[0].scale, 0.0);
    }

    struct NoAssets;

    impl AssetSource for NoAssets {
        fn fetch(&self, _name: &str) -> Option<TextureImage> {
            None
        }
    }

    #[test]
    fn response_to_miss_is_empty_not_absent() {
        let request = ResourceRequest::by_name(ResourceKind::Texture, 11, "nosuch");
        let response = build_response(&request, &NoAssets);

        assert_eq!(response.id, 11);
        assert!(response.payload.is_empty());
    }

    #[test]
    fn unsupported_kind_still_gets_a_reply() {
        let request = ResourceRequest {
            kind: ResourceKind::Model,
            id: 4,
            name: None,
        };
        let response = build_response(&request, &NoAssets);

        assert_eq!(response.id, 4);
        assert!(matches!(
            response.payload,
            ResourcePayload::Model { ref bytes } if bytes.is_empty()
        ));
    }
}
