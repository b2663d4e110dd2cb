//! Stateful editing session: image intake, caption text, generation,
//! download.
//!
//! The session owns everything the page remembers between user actions.
//! Time is passed in explicitly everywhere it matters, so notice expiry
//! and download naming are deterministic under test.

use std::time::Instant;

use crate::assets::SourceImage;
use crate::assets::intake::{UploadOrigin, decode_upload, screen_upload};
use crate::compose::{CompositeImage, compose};
use crate::error::CapbandResult;
use crate::model::split_text_lines;
use crate::notice::{Notice, NoticeBoard};
use crate::present::{encode_png, suggested_filename};
use crate::text::TextLayoutEngine;

/// Ticket for an in-flight image decode.
///
/// Each accepted upload gets a fresh ticket; finishing with a superseded
/// one is ignored, so a slow decode can never clobber a newer upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeTicket {
    serial: u64,
}

/// A named PNG ready to hand to the user.
#[derive(Clone, Debug)]
pub struct DownloadFile {
    pub filename: String,
    pub png: Vec<u8>,
}

/// One user's editing state.
#[derive(Default)]
pub struct ComposeSession {
    raw_text: String,
    lines: Vec<String>,
    source: Option<SourceImage>,
    composite: Option<CompositeImage>,
    generating: bool,
    decode_serial: u64,
    notices: NoticeBoard,
}

impl ComposeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate an upload and reserve a decode slot for it.
    ///
    /// Returns `None` when the upload is rejected, with the reason posted
    /// as a notice. Each call supersedes any ticket still outstanding.
    pub fn begin_image_decode(
        &mut self,
        byte_len: u64,
        origin: &UploadOrigin,
        now: Instant,
    ) -> Option<DecodeTicket> {
        if let Err(notice) = screen_upload(byte_len, origin) {
            self.notices.post(notice, now);
            return None;
        }
        self.decode_serial += 1;
        Some(DecodeTicket {
            serial: self.decode_serial,
        })
    }

    /// Land a finished decode. Returns whether the session took the image.
    ///
    /// A stale ticket is dropped silently; its outcome, success or failure,
    /// belongs to an upload the user has already replaced.
    pub fn finish_image_decode(
        &mut self,
        ticket: DecodeTicket,
        outcome: Result<SourceImage, Notice>,
        now: Instant,
    ) -> bool {
        if ticket.serial != self.decode_serial {
            return false;
        }
        match outcome {
            Ok(source) => {
                self.source = Some(source);
                true
            }
            Err(notice) => {
                self.notices.post(notice, now);
                false
            }
        }
    }

    /// Screen and decode an upload in one synchronous step.
    pub fn submit_image(&mut self, bytes: &[u8], origin: &UploadOrigin, now: Instant) -> bool {
        let Some(ticket) = self.begin_image_decode(bytes.len() as u64, origin, now) else {
            return false;
        };
        self.finish_image_decode(ticket, decode_upload(bytes), now)
    }

    /// Replace the caption text.
    pub fn submit_text(&mut self, text: &str) {
        self.raw_text = text.to_owned();
        self.lines = split_text_lines(text);
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn text_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn current_composite(&self) -> Option<&CompositeImage> {
        self.composite.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Whether the generate control should be enabled.
    pub fn can_generate(&self) -> bool {
        self.source.is_some() && !self.lines.is_empty() && !self.generating
    }

    pub fn current_notice(&self, now: Instant) -> Option<Notice> {
        self.notices.current(now)
    }

    /// Run the compositor over the current image and caption lines.
    ///
    /// Returns whether a new composite was installed. Failures keep the
    /// previous composite and surface as a retry notice.
    pub fn generate(
        &mut self,
        engine: &mut TextLayoutEngine,
        font_bytes: &[u8],
        now: Instant,
    ) -> bool {
        let Some(source) = self.source.as_ref() else {
            self.notices.post(Notice::MissingImage, now);
            return false;
        };
        if self.lines.is_empty() {
            self.notices.post(Notice::MissingText, now);
            return false;
        }
        if self.generating {
            return false;
        }

        self.generating = true;
        let result = compose(source, &self.lines, engine, font_bytes);
        self.generating = false;

        match result {
            Ok(composite) => {
                self.composite = Some(composite);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "compose failed");
                self.notices.post(Notice::CompositionFailure, now);
                false
            }
        }
    }

    /// Package the current composite for download.
    ///
    /// `None` means there was nothing to download and a notice was posted.
    pub fn download(
        &mut self,
        now: Instant,
        timestamp_ms: u64,
    ) -> Option<CapbandResult<DownloadFile>> {
        let Some(composite) = self.composite.as_ref() else {
            self.notices.post(Notice::NothingToDownload, now);
            return None;
        };
        Some(encode_png(composite).map(|png| DownloadFile {
            filename: suggested_filename(timestamp_ms),
            png,
        }))
    }
}
