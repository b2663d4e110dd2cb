use crate::assets::SourceImage;
use crate::assets::decode::decode_image;
use crate::notice::Notice;

/// Upper bound on accepted uploads. Exactly this many bytes is still fine.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// How an upload arrived. The drop path carries the MIME type declared by
/// the drag source and re-validates it; the picker path was already
/// filtered by the file dialog and is not re-checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOrigin {
    Picker,
    Drop { mime: String },
}

/// Gate an upload before any decode work is spent on it.
pub fn screen_upload(byte_len: u64, origin: &UploadOrigin) -> Result<(), Notice> {
    if let UploadOrigin::Drop { mime } = origin
        && !mime.starts_with("image/")
    {
        return Err(Notice::NotAnImage);
    }
    if byte_len > MAX_UPLOAD_BYTES {
        return Err(Notice::FileTooLarge);
    }
    Ok(())
}

/// Decode a gated upload. Failures surface as the load-failure notice, not
/// as a hard error; the caller's session state is left untouched.
pub fn decode_upload(bytes: &[u8]) -> Result<SourceImage, Notice> {
    decode_image(bytes).map_err(|_| Notice::DecodeFailed)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn size_gate_boundary_is_inclusive() {
        assert_eq!(screen_upload(MAX_UPLOAD_BYTES, &UploadOrigin::Picker), Ok(()));
        assert_eq!(
            screen_upload(MAX_UPLOAD_BYTES + 1, &UploadOrigin::Picker),
            Err(Notice::FileTooLarge)
        );
    }

    #[test]
    fn drop_origin_checks_declared_mime() {
        let text = UploadOrigin::Drop {
            mime: "text/plain".into(),
        };
        assert_eq!(screen_upload(10, &text), Err(Notice::NotAnImage));

        let png = UploadOrigin::Drop {
            mime: "image/png".into(),
        };
        assert_eq!(screen_upload(10, &png), Ok(()));
    }

    #[test]
    fn picker_origin_skips_mime_check() {
        // The picker path never sees a MIME type; only the size gate applies.
        assert_eq!(screen_upload(10, &UploadOrigin::Picker), Ok(()));
        assert_eq!(
            screen_upload(MAX_UPLOAD_BYTES + 1, &UploadOrigin::Picker),
            Err(Notice::FileTooLarge)
        );
    }

    #[test]
    fn mime_gate_runs_before_size_gate() {
        let text = UploadOrigin::Drop {
            mime: "application/pdf".into(),
        };
        assert_eq!(
            screen_upload(MAX_UPLOAD_BYTES + 1, &text),
            Err(Notice::NotAnImage)
        );
    }

    #[test]
    fn decode_upload_maps_failure_to_notice() {
        assert_eq!(decode_upload(b"junk").unwrap_err(), Notice::DecodeFailed);
    }

    #[test]
    fn decode_upload_accepts_valid_png() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let source = decode_upload(&buf).unwrap();
        assert_eq!((source.width, source.height), (3, 2));
    }
}
