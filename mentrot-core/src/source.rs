use std::collections::HashMap;

/// Read-only view of the loaded stimulus set, enough for layout and hit
/// testing. The engine never touches pixel data through this seam.
pub trait StimulusSource {
    fn dimensions(&self, name: &str) -> Option<(u32, u32)>;

    fn contains(&self, name: &str) -> bool {
        self.dimensions(name).is_some()
    }
}

/// Plain name→dimensions table. The asset registry exports one of these for
/// the engine; tests build them directly.
#[derive(Debug, Clone, Default)]
pub struct StimulusSizes {
    map: HashMap<String, (u32, u32)>,
}

impl StimulusSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, size: (u32, u32)) {
        self.map.insert(name.into(), size);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl StimulusSource for StimulusSizes {
    fn dimensions(&self, name: &str) -> Option<(u32, u32)> {
        self.map.get(name).copied()
    }
}
