use std::sync::Arc;

pub mod decode;
pub mod intake;

/// A decoded upload, ready for compositing.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}
