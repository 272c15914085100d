use rkyv::{rancor, Archive, Deserialize, Serialize};

use super::WireError;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputButtons: u32 {
        const ATTACK = 1 << 0;
        const JUMP = 1 << 1;
        const USE = 1 << 2;
    }
}

// A command is the complete input state at one instant, never a delta.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct InputCommand {
    pub sequence: u32,
    pub timestamp: f64,
    pub forward_move: f32,
    pub side_move: f32,
    pub up_move: f32,
    pub view_angles: [f32; 3],
    pub buttons: u32,
    pub impulse: u8,
    pub console: Option<String>,
}

impl InputCommand {
    pub fn new(sequence: u32, timestamp: f64) -> Self {
        Self {
            sequence,
            timestamp,
            forward_move: 0.0,
            side_move: 0.0,
            up_move: 0.0,
            view_angles: [0.0; 3],
            buttons: 0,
            impulse: 0,
            console: None,
        }
    }

    pub fn console_only(sequence: u32, timestamp: f64, text: impl Into<String>) -> Self {
        let mut cmd = Self::new(sequence, timestamp);
        cmd.console = Some(text.into());
        cmd
    }

    pub fn buttons(&self) -> InputButtons {
        InputButtons::from_bits_truncate(self.buttons)
    }

    pub fn set_buttons(&mut self, buttons: InputButtons) {
        self.buttons = buttons.bits();
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(WireError::Encode)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(WireError::Decode)
    }
}
