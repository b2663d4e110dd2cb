//! Stacked-subtitle image composition.
//!
//! capband turns a source image plus multi-line caption text into a single
//! PNG: every caption line gets a subtitle band cut from the image's own
//! bottom strip, darkened and overlaid with centered white text, and each
//! line after the first extends the canvas downward by one band.
#![forbid(unsafe_code)]

pub mod assets;
pub mod compose;
pub mod error;
pub mod layout;
pub mod model;
pub mod notice;
pub mod present;
pub mod session;
pub mod text;

pub use assets::SourceImage;
pub use assets::intake::{MAX_UPLOAD_BYTES, UploadOrigin};
pub use compose::{CompositeImage, CompositePlan, compose};
pub use error::{CapbandError, CapbandResult};
pub use layout::BandMetrics;
pub use model::{ComposeJob, split_text_lines};
pub use notice::{NOTICE_TTL, Notice};
pub use session::{ComposeSession, DecodeTicket, DownloadFile};
pub use text::{TextBrushRgba8, TextLayoutEngine};
