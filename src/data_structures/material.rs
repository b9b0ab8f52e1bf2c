//! Shared flat-colour materials.
//!
//! Materials are stored once in a [`MaterialTable`] and referenced by
//! [`MaterialId`] from any number of mesh nodes. The table lives as long as
//! the scene graph that owns it.

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ColorParseError {
    #[error("colour `{0}` must look like #rrggbb")]
    Format(String),
}

/// An unlit, single-colour material (three.js `MeshBasicMaterial`).
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// sRGB colour, 8 bit per channel.
    pub color: [u8; 3],
}

impl Material {
    pub fn new(name: &str, color: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            color,
        }
    }

    pub fn from_hex(name: &str, hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.is_ascii())
            .ok_or_else(|| ColorParseError::Format(hex.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ColorParseError::Format(hex.to_string()))
        };
        Ok(Self::new(name, [channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Linear RGBA as expected by an sRGB render target.
    pub fn linear_rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.color.map(srgb_to_linear);
        [r, g, b, 1.0]
    }
}

fn srgb_to_linear(c: u8) -> f32 {
    let c = f32::from(c) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(MaterialId)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        let building = Material::from_hex("building", "#2e8bc0").unwrap();
        assert_eq!(building.color, [0x2e, 0x8b, 0xc0]);
        assert!(Material::from_hex("bad", "2e8bc0").is_err());
        assert!(Material::from_hex("bad", "#2e8bcz").is_err());
        assert!(Material::from_hex("bad", "#fff").is_err());
    }

    #[test]
    fn linear_conversion_keeps_extremes() {
        let red = Material::new("red", [255, 0, 0]);
        assert_eq!(red.linear_rgba(), [1.0, 0.0, 0.0, 1.0]);
        let gray = Material::new("gray", [128, 128, 128]).linear_rgba();
        assert!(gray[0] > 0.2 && gray[0] < 0.23);
    }

    #[test]
    fn table_lookups_are_shared() {
        let mut table = MaterialTable::new();
        let grass = table.insert(Material::new("grass", [0, 128, 0]));
        let road = table.insert(Material::new("road", [128, 128, 128]));
        assert_ne!(grass, road);
        assert_eq!(table.find("road"), Some(road));
        assert_eq!(table.get(grass).map(|m| m.name.as_str()), Some("grass"));
        assert_eq!(table.len(), 2);
    }
}
