use std::collections::HashMap;

use tether::wire::TextureImage;
use tether::AssetSource;

// Stands in for a real asset store; lookup keys are already-normalized.
pub struct ProceduralAssets {
    textures: HashMap<String, TextureImage>,
}

impl ProceduralAssets {
    pub fn with_builtins() -> Self {
        let mut textures = HashMap::new();
        for (name, size) in [("conchars", 128u16), ("disc", 24), ("backtile", 64)] {
            textures.insert(name.to_string(), checkerboard(size, size));
        }
        Self { textures }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }
}

impl AssetSource for ProceduralAssets {
    fn fetch(&self, name: &str) -> Option<TextureImage> {
        self.textures.get(name).cloned()
    }
}

fn checkerboard(width: u16, height: u16) -> TextureImage {
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(if (x / 8 + y / 8) % 2 == 0 { 0x0F } else { 0x00 });
        }
    }
    TextureImage {
        width,
        height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_and_unknown_names_miss() {
        let assets = ProceduralAssets::with_builtins();
        assert!(assets.len() >= 3);

        let image = assets.fetch("conchars").unwrap();
        assert_eq!(image.width, 128);
        assert_eq!(image.pixels.len(), 128 * 128);

        assert!(assets.fetch("no_such_texture").is_none());
    }
}
