pub mod renderer;
pub mod text;

pub use renderer::TaskRenderer;
pub use text::{TextCache, load_font, render_text_pixmap};
