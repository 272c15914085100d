mod control;
mod envelope;
mod input;
mod resource;

pub use control::ControlFrame;
pub use envelope::{
    ArchivedEnvelope, DynamicLight, Entity, EntityEffects, Envelope, FrameUpdate, GameState,
    PlayerState,
};
pub use input::{InputButtons, InputCommand};
pub use resource::{
    MAX_RESOURCE_NAME, ResourceKind, ResourcePayload, ResourceRequest, ResourceResponse,
    TextureImage, normalize_name,
};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("encode failed: {0}")]
    Encode(rkyv::rancor::Error),
    #[error("decode failed: {0}")]
    Decode(rkyv::rancor::Error),
}
