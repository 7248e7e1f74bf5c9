//! Charts module - Chart rendering

mod renderer;

pub use renderer::{ChartRenderer, RenderError, PALETTE, PRIMARY_COLOR};
