use rkyv::{rancor, Archive, Deserialize, Serialize};

use super::WireError;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntityEffects: u32 {
        const BRIGHT_FIELD = 1 << 0;
        const MUZZLE_FLASH = 1 << 1;
        const BRIGHT_LIGHT = 1 << 2;
        const DIM_LIGHT = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PlayerState {
    pub health: i16,
    pub armor: i16,
    pub weapon: u8,
    pub ammo: u16,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            health: 100,
            armor: 0,
            weapon: 0,
            ammo: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct GameState {
    pub paused: bool,
    pub in_game: bool,
    pub intermission: bool,
    pub map_name: String,
    pub time: f64,
    pub gravity: f32,
    pub max_speed: f32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            paused: false,
            in_game: false,
            intermission: false,
            map_name: String::new(),
            time: 0.0,
            gravity: 800.0,
            max_speed: 320.0,
        }
    }
}

// Entities carry no stable identity across frames; lights are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct Entity {
    pub origin: [f32; 3],
    pub angles: [f32; 3],
    pub model_id: u16,
    pub frame: u16,
    pub skin: u8,
    pub effects: u32,
    pub alpha: f32,
    pub scale: f32,
}

impl Entity {
    pub fn new(model_id: u16) -> Self {
        Self {
            origin: [0.0; 3],
            angles: [0.0; 3],
            model_id,
            frame: 0,
            skin: 0,
            effects: 0,
            alpha: 1.0,
            scale: 1.0,
        }
    }

    pub fn effects(&self) -> EntityEffects {
        EntityEffects::from_bits_truncate(self.effects)
    }

    pub fn set_effects(&mut self, effects: EntityEffects) {
        self.effects = effects.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct DynamicLight {
    pub key: u32,
    pub origin: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
}

impl DynamicLight {
    pub fn new(key: u32) -> Self {
        Self {
            key,
            origin: [0.0; 3],
            radius: 0.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct FrameUpdate {
    pub frame_number: u32,
    pub timestamp: f64,
    pub view_origin: [f32; 3],
    pub view_angles: [f32; 3],
    pub player: PlayerState,
    pub game: GameState,
    pub entities: Vec<Entity>,
    pub lights: Vec<DynamicLight>,
}

impl FrameUpdate {
    pub fn new(frame_number: u32, timestamp: f64) -> Self {
        Self {
            frame_number,
            timestamp,
            view_origin: [0.0; 3],
            view_angles: [0.0; 3],
            player: PlayerState::default(),
            game: GameState::default(),
            entities: Vec::new(),
            lights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Envelope {
    FrameUpdate(FrameUpdate),
    MapChanged { map_name: String },
    Disconnected { reason: String },
}

impl Envelope {
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(WireError::Encode)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(WireError::Decode)
    }

    pub fn access(data: &[u8]) -> Result<&ArchivedEnvelope, WireError> {
        rkyv::access::<ArchivedEnvelope, rancor::Error>(data).map_err(WireError::Decode)
    }
}
