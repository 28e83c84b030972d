//! Image processing in pure Rust with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Downscale** | `resize_exact` + Lanczos3 |
//! | **Enlarge** | `resize_exact` + CatmullRom |
//! | **Encode** | JPEG (`JpegEncoder`) or AVIF (rav1e) with a quality setting |
//!
//! The module is split into:
//! - **Engine**: [`ImageEngine`] trait + [`RustEngine`]
//! - **Parameters**: [`Quality`] and [`OutputFormat`]
//! - **Calculations**: Pure downscale/enlarge decision (unit testable)
//! - **Transform**: One size token in, one [`ResultItem`] out

mod calculations;
pub mod engine;
mod params;
pub mod rust_engine;
pub mod transform;

pub use calculations::{Resample, choose_resample};
pub use engine::{Dimensions, EngineError, ImageEngine};
pub use params::{OutputFormat, Quality, QualityError};
pub use rust_engine::RustEngine;
pub use transform::{
    ItemStatus, ResultItem, TransformError, TransformOptions, to_data_uri, transform,
};
