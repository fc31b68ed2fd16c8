mod app;
pub use app::App;

use anyhow::Result;
use mentrot_assets::AssetRegistry;
use mentrot_render::load_font;
use std::path::Path;

/// Directory holding the 52 stimulus images, one PNG per symbolic name.
const STIMULUS_DIR: &str = "stimuli";

fn main() -> Result<()> {
    let registry = AssetRegistry::load(Path::new(STIMULUS_DIR));
    registry.validate_trial_images()?;
    let font = load_font()?;

    let app = App::new(registry, font)?;
    app.run()
}
