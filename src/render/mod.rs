pub mod svg;

pub use svg::{render_svg, RenderOptions, WheelTheme};
