use anyhow::{Context, Result, bail};
use mentrot_core::source::StimulusSizes;
use mentrot_core::stimulus::{all_names, required_names};
use std::collections::HashMap;
use std::path::Path;
use tiny_skia::{IntSize, Pixmap};

/// Immutable mapping from stimulus name to a decoded, premultiplied pixmap.
///
/// Built once at startup and passed into the session; names may be absent
/// (missing optional assets degrade gracefully, required ones are caught by
/// `validate_trial_images`).
pub struct AssetRegistry {
    images: HashMap<String, Pixmap>,
}

impl AssetRegistry {
    /// Load `<dir>/<name>.png` for every expected name. Missing or
    /// undecodable files warn and leave the name absent.
    pub fn load(dir: &Path) -> Self {
        let mut images = HashMap::new();
        for name in all_names() {
            let path = dir.join(format!("{name}.png"));
            if !path.exists() {
                eprintln!("Warning: image file {} not found.", path.display());
                continue;
            }
            match load_png(&path) {
                Ok(pixmap) => {
                    images.insert(name, pixmap);
                }
                Err(e) => {
                    eprintln!("Warning: could not load {}: {e:#}", path.display());
                }
            }
        }
        Self { images }
    }

    pub fn get(&self, name: &str) -> Option<&Pixmap> {
        self.images.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    pub fn dimensions(&self, name: &str) -> Option<(u32, u32)> {
        self.images.get(name).map(|p| (p.width(), p.height()))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Fail fast if any of the 45 enumerated trial stimuli is absent.
    pub fn validate_trial_images(&self) -> Result<()> {
        let missing: Vec<String> = required_names()
            .into_iter()
            .filter(|name| !self.images.contains_key(name))
            .collect();
        if !missing.is_empty() {
            bail!(
                "missing {} required trial stimulus image(s): {}",
                missing.len(),
                missing.join(", ")
            );
        }
        Ok(())
    }

    /// Name→dimensions table for the engine's layout and hit testing.
    pub fn size_table(&self) -> StimulusSizes {
        let mut sizes = StimulusSizes::new();
        for (name, pixmap) in &self.images {
            sizes.insert(name.clone(), (pixmap.width(), pixmap.height()));
        }
        sizes
    }
}

/// Decode a PNG into a premultiplied-alpha pixmap.
fn load_png(path: &Path) -> Result<Pixmap> {
    let img = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .into_rgba8();
    let (w, h) = img.dimensions();
    let mut data = img.into_raw();
    // image gives straight alpha, tiny-skia wants premultiplied
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a < 255 {
            px[0] = ((px[0] as u16 * a) / 255) as u8;
            px[1] = ((px[1] as u16 * a) / 255) as u8;
            px[2] = ((px[2] as u16 * a) / 255) as u8;
        }
    }
    let size = IntSize::from_wh(w, h).context("zero-sized image")?;
    Pixmap::from_vec(data, size).context("pixmap allocation")
}
