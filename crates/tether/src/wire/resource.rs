use rkyv::{rancor, Archive, Deserialize, Serialize};

use super::WireError;

pub const MAX_RESOURCE_NAME: usize = 16;

// Lowercased and truncated on both sides so lookups agree on the key.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .take(MAX_RESOURCE_NAME)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ResourceKind {
    Texture,
    Model,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ResourceRequest {
    pub kind: ResourceKind,
    pub id: u32,
    pub name: Option<String>,
}

impl ResourceRequest {
    pub fn by_name(kind: ResourceKind, id: u32, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            name: Some(name.into()),
        }
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

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ResourcePayload {
    Texture {
        width: u16,
        height: u16,
        pixels: Vec<u8>,
    },
    Model {
        bytes: Vec<u8>,
    },
}

impl ResourcePayload {
    // Absence is zero-length content of the requested kind, never a
    // refused reply.
    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Texture => ResourcePayload::Texture {
                width: 0,
                height: 0,
                pixels: Vec::new(),
            },
            ResourceKind::Model => ResourcePayload::Model { bytes: Vec::new() },
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResourcePayload::Texture { pixels, .. } => pixels.is_empty(),
            ResourcePayload::Model { bytes } => bytes.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ResourceResponse {
    pub id: u32,
    pub payload: ResourcePayload,
}

impl ResourceResponse {
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(WireError::Encode)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(WireError::Decode)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrip() {
        let request = ResourceRequest::by_name(ResourceKind::Texture, 5, "conchars");

        let encoded = request.encode().unwrap();
        let decoded = ResourceRequest::decode(&encoded).unwrap();

        assert_eq!(request, decoded);
    }

    #[test]
    fn response_roundtrip() {
        let response = ResourceResponse {
            id: 5,
            payload: ResourcePayload::Texture {
                width: 2,
                height: 2,
                pixels: vec![0, 15, 15, 0],
            },
        };

        let encoded = response.encode().unwrap();
        let decoded = ResourceResponse::decode(&encoded).unwrap();

        assert_eq!(response, decoded);
        assert!(!decoded.payload.is_empty());
    }

    #[test]
    fn empty_payload_signals_absence() {
        assert!(ResourcePayload::empty(ResourceKind::Texture).is_empty());
        assert!(ResourcePayload::empty(ResourceKind::Model).is_empty());
    }

    #[test]
    fn name_normalization() {
        assert_eq!(normalize_name("CONCHARS"), "conchars");
        assert_eq!(normalize_name("Sky1"), "sky1");
        assert_eq!(normalize_name("a_very_long_texture_name"), "a_very_long_text");
    }
}
