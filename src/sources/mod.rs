//! Certificate material sources.

mod material;
mod reload_source;

pub use material::{FsReader, LoadedMaterial, MaterialLoader, MaterialReader};
pub use reload_source::ReloadSource;
