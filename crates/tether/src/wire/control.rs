use rkyv::{rancor, Archive, Deserialize, Serialize};

use super::WireError;

// Frontend-to-backend traffic on the Gameplay channel. The broadcast
// direction carries Envelope frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ControlFrame {
    Subscribe { protocol_version: u32 },
    Unsubscribe,
}

impl ControlFrame {
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(WireError::Encode)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(WireError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::PROTOCOL_VERSION;

    #[test]
    fn control_roundtrip() {
        let frame = ControlFrame::Subscribe {
            protocol_version: PROTOCOL_VERSION,
        };

        let encoded = frame.encode().unwrap();
        assert_eq!(ControlFrame::decode(&encoded).unwrap(), frame);

        let encoded = ControlFrame::Unsubscribe.encode().unwrap();
        assert_eq!(
            ControlFrame::decode(&encoded).unwrap(),
            ControlFrame::Unsubscribe
        );
    }
}
