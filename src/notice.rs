use std::time::{Duration, Instant};

/// How long a posted notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// User-facing, non-fatal notices. Every variant maps to the transient
/// message shown near the upload area; none of them abort the session.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    #[error("请上传图片文件")]
    NotAnImage,

    #[error("图片大小不能超过 10MB")]
    FileTooLarge,

    #[error("图片加载失败")]
    DecodeFailed,

    #[error("请先上传图片")]
    MissingImage,

    #[error("请输入至少一行文本")]
    MissingText,

    #[error("生成图片失败，请重试")]
    CompositionFailure,

    #[error("没有可下载的图片")]
    NothingToDownload,
}

/// Single-slot holder for the currently displayed notice.
///
/// Posting replaces whatever is showing; a notice expires [`NOTICE_TTL`]
/// after it was posted. Time is passed in explicitly so expiry is
/// deterministic under test.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    slot: Option<(Notice, Instant)>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, notice: Notice, now: Instant) {
        self.slot = Some((notice, now));
    }

    /// The notice to display at `now`, if any is still within its window.
    pub fn current(&self, now: Instant) -> Option<Notice> {
        let (notice, posted) = self.slot?;
        if now.saturating_duration_since(posted) >= NOTICE_TTL {
            return None;
        }
        Some(notice)
    }
}
