//! Configuration for sonoscene

mod render_options;

pub use render_options::{NearFieldPolicy, RenderOptions};
