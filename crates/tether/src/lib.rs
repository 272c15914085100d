pub mod backend;
pub mod channel;
pub mod frontend;
pub mod stats;
pub mod wire;

pub use backend::{AssetSource, Backend, EntityView, FrameBuilder, LightView, WorldView};
pub use channel::{
    BackendChannels, ChannelConfig, ChannelError, ChannelName, FrontendChannels,
    MAX_DATAGRAM_SIZE, Publisher, Puller, Pusher, Replier, Requester, Subscriber,
};
pub use frontend::{Frontend, FrontendConfig, FrontendEvent};
pub use stats::{ReplicationStats, StatsHandle, TimingStats};
pub use wire::{
    ControlFrame, DynamicLight, Entity, EntityEffects, Envelope, FrameUpdate, GameState,
    InputButtons, InputCommand, PROTOCOL_VERSION, PlayerState, ResourceKind, ResourcePayload,
    ResourceRequest, ResourceResponse, TextureImage, WireError, normalize_name,
};
