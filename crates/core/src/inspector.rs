use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use image::error::{DecodingError, ImageFormatHint};
use image::{ImageError, ImageFormat, ImageReader};
use tracing::debug;

use crate::config::ValidationPolicy;
use crate::domain::{Classification, ImageMetadata, Rejection};

/// Bytes read from the end of a JPEG when looking for its end-of-image marker.
const JPEG_TAIL_WINDOW: u64 = 4096;

/// Validate a single file against `policy`.
///
/// Checks run in order and stop at the first failure:
/// extension, full decode, minimum width, minimum file size.
/// Every failure, including I/O errors, is returned as `Classification::Failed`.
pub fn inspect(path: &Path, policy: &ValidationPolicy) -> Classification {
    match run_checks(path, policy) {
        Ok(meta) => Classification::Passed(meta),
        Err(reason) => {
            debug!(path = %path.display(), kind = ?reason.kind(), "rejected: {reason}");
            Classification::Failed(reason)
        }
    }
}

fn run_checks(path: &Path, policy: &ValidationPolicy) -> Result<ImageMetadata, Rejection> {
    check_extension(path, policy)?;
    verify_integrity(path)?;

    let (width, height, format) = read_header(path)?;
    if width < policy.min_width {
        return Err(Rejection::BelowMinWidth {
            path: path.to_path_buf(),
            width,
            min_width: policy.min_width,
        });
    }

    let size_bytes = file_size(path)?;
    let size_kb = size_bytes as f64 / 1024.0;
    if size_kb < policy.min_size_kb {
        return Err(Rejection::TooSmall {
            path: path.to_path_buf(),
            size_bytes,
            min_size_kb: policy.min_size_kb,
        });
    }

    Ok(ImageMetadata {
        width,
        height,
        size_kb: round_2(size_kb),
        format: format_tag(format),
    })
}

fn check_extension(path: &Path, policy: &ValidationPolicy) -> Result<(), Rejection> {
    let allowed = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| policy.allows_extension(e));
    if allowed {
        Ok(())
    } else {
        Err(Rejection::InvalidFormat(path.to_path_buf()))
    }
}

fn open_reader(
    path: &Path,
) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, Rejection> {
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| Rejection::Unreadable {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode the whole file and discard the pixels. Malformed PNG data surfaces
/// here as a decoder error. The JPEG decoder pads missing scan data instead of
/// failing, so a JPEG must also end with an end-of-image marker.
fn verify_integrity(path: &Path) -> Result<(), Rejection> {
    let reader = open_reader(path)?;
    let format = reader.format();
    reader.decode().map(drop).map_err(|source| Rejection::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    if format == Some(ImageFormat::Jpeg) && !has_jpeg_eoi(path)? {
        return Err(Rejection::Corrupt {
            path: path.to_path_buf(),
            source: ImageError::Decoding(DecodingError::new(
                ImageFormatHint::Exact(ImageFormat::Jpeg),
                "missing end-of-image marker, file is truncated",
            )),
        });
    }
    Ok(())
}

/// True when the file ends with `FF D9`, ignoring trailing zero padding.
fn has_jpeg_eoi(path: &Path) -> Result<bool, Rejection> {
    let unreadable = |source: std::io::Error| Rejection::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(unreadable)?;
    let len = file.metadata().map_err(unreadable)?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(JPEG_TAIL_WINDOW)))
        .map_err(unreadable)?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail).map_err(unreadable)?;

    let end = tail.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Ok(tail[..end].ends_with(&[0xFF, 0xD9]))
}

/// Read dimensions and container format from the header.
fn read_header(path: &Path) -> Result<(u32, u32, Option<ImageFormat>), Rejection> {
    let reader = open_reader(path)?;
    let format = reader.format();
    let (width, height) = reader.into_dimensions().map_err(|source| Rejection::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), width, height, ?format, "read image header");
    Ok((width, height, format))
}

fn file_size(path: &Path) -> Result<u64, Rejection> {
    let meta = std::fs::metadata(path).map_err(|source| Rejection::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(meta.len())
}

fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Uppercase format tag as stored in the `format` column.
pub fn format_tag(format: Option<ImageFormat>) -> String {
    match format {
        Some(ImageFormat::Png) => "PNG".to_string(),
        Some(ImageFormat::Jpeg) => "JPEG".to_string(),
        Some(other) => other
            .extensions_str()
            .first()
            .map(|e| e.to_ascii_uppercase())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        None => "UNKNOWN".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RejectionKind, ValidationStatus};
    use std::fs;
    use std::path::PathBuf;

    /// Noisy RGB pixels so PNG compression cannot shrink the file much.
    fn noisy_png(path: &Path, width: u32, height: u32) {
        let mut state: u32 = 0x9E37_79B9 ^ width.wrapping_mul(31) ^ height;
        let img = image::RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let b = state.to_le_bytes();
            image::Rgb([b[0], b[1], b[2]])
        });
        img.save(path).unwrap();
    }

    fn flat_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 80, 120]));
        img.save(path).unwrap();
    }

    fn failure(classification: Classification) -> Rejection {
        match classification {
            Classification::Failed(reason) => reason,
            Classification::Passed(meta) => panic!("expected failure, got {meta:?}"),
        }
    }

    #[test]
    fn test_valid_png_passes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("photo.png");
        noisy_png(&path, 200, 120);

        let classification = inspect(&path, &ValidationPolicy::default());
        assert_eq!(classification.status(), ValidationStatus::Passed);
        assert_eq!(classification.notes(), "Validation successful");

        let meta = classification.metadata().unwrap();
        assert_eq!(meta.width, 200);
        assert_eq!(meta.height, 120);
        assert_eq!(meta.format, "PNG");
        let expected_kb = fs::metadata(&path).unwrap().len() as f64 / 1024.0;
        assert_eq!(meta.size_kb, (expected_kb * 100.0).round() / 100.0);
    }

    #[test]
    fn test_valid_jpeg_passes_with_uppercase_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let jpg = tmp.path().join("photo.jpg");
        noisy_png(&tmp.path().join("seed.png"), 300, 300);
        image::open(tmp.path().join("seed.png")).unwrap().save(&jpg).unwrap();
        let upper = tmp.path().join("PHOTO.JPG");
        fs::rename(&jpg, &upper).unwrap();

        let classification = inspect(&upper, &ValidationPolicy::default());
        let meta = classification.metadata().expect("jpeg should pass");
        assert_eq!(meta.format, "JPEG");
        assert_eq!((meta.width, meta.height), (300, 300));
    }

    #[test]
    fn test_disallowed_extension_fails_regardless_of_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("photo.gif");
        noisy_png(&path.with_extension("png"), 200, 200);
        fs::rename(path.with_extension("png"), &path).unwrap();

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert_eq!(reason.kind(), RejectionKind::InputFormat);
        assert!(reason.to_string().contains("invalid file format"));
    }

    #[test]
    fn test_missing_extension_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("README");
        fs::write(&path, b"hello").unwrap();

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert!(matches!(reason, Rejection::InvalidFormat(_)));
    }

    #[test]
    fn test_truncated_png_fails_integrity() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.png");
        noisy_png(&path, 200, 200);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert_eq!(reason.kind(), RejectionKind::Integrity);
        assert!(reason.to_string().contains("corrupt or unreadable image"));
    }

    #[test]
    fn test_truncated_jpeg_fails_integrity() {
        let tmp = tempfile::tempdir().unwrap();
        let seed = tmp.path().join("seed.png");
        noisy_png(&seed, 400, 400);
        let path = tmp.path().join("cut.jpg");
        image::open(&seed).unwrap().save(&path).unwrap();
        assert_eq!(
            inspect(&path, &ValidationPolicy::default()).status(),
            ValidationStatus::Passed
        );

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert_eq!(reason.kind(), RejectionKind::Integrity);
        assert!(reason.to_string().contains("end-of-image marker"));
    }

    #[test]
    fn test_jpeg_with_zero_padding_passes() {
        let tmp = tempfile::tempdir().unwrap();
        let seed = tmp.path().join("seed.png");
        noisy_png(&seed, 200, 200);
        let path = tmp.path().join("padded.jpg");
        image::open(&seed).unwrap().save(&path).unwrap();
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0u8; 512]);
        fs::write(&path, &bytes).unwrap();

        assert_eq!(
            inspect(&path, &ValidationPolicy::default()).status(),
            ValidationStatus::Passed
        );
    }

    #[test]
    fn test_garbage_bytes_fail_integrity() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("noise.jpg");
        fs::write(&path, vec![0xAB; 64 * 1024]).unwrap();

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert!(matches!(reason, Rejection::Corrupt { .. }));
    }

    #[test]
    fn test_empty_file_fails_integrity() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.png");
        fs::write(&path, b"").unwrap();

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert_eq!(reason.kind(), RejectionKind::Integrity);
    }

    #[test]
    fn test_width_99_fails_resolution_even_when_large() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("narrow.png");
        noisy_png(&path, 99, 300);
        assert!(fs::metadata(&path).unwrap().len() >= 10 * 1024);

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert!(matches!(reason, Rejection::BelowMinWidth { width: 99, .. }));
        assert!(reason.to_string().contains("below minimum resolution"));
    }

    #[test]
    fn test_width_100_passes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("edge.png");
        noisy_png(&path, 100, 200);

        let classification = inspect(&path, &ValidationPolicy::default());
        assert_eq!(classification.status(), ValidationStatus::Passed);
        assert_eq!(classification.metadata().unwrap().width, 100);
    }

    /// Flat PNG padded with zeros after IEND to an exact byte length.
    fn padded_png(path: &Path, len: usize) {
        flat_png(path, 120, 120);
        let mut bytes = fs::read(path).unwrap();
        assert!(bytes.len() < len);
        bytes.resize(len, 0);
        fs::write(path, &bytes).unwrap();
    }

    #[test]
    fn test_size_boundary_10240_bytes_passes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("exact.png");
        padded_png(&path, 10 * 1024);

        let classification = inspect(&path, &ValidationPolicy::default());
        assert_eq!(classification.status(), ValidationStatus::Passed);
        assert_eq!(classification.metadata().unwrap().size_kb, 10.0);
    }

    #[test]
    fn test_size_boundary_10239_bytes_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("short.png");
        padded_png(&path, 10 * 1024 - 1);

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert!(matches!(reason, Rejection::TooSmall { size_bytes: 10239, .. }));
        assert!(reason.to_string().contains("10239 bytes"));
    }

    #[test]
    fn test_height_is_not_checked() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wide.png");
        noisy_png(&path, 400, 20);

        let classification = inspect(&path, &ValidationPolicy::default());
        assert_eq!(classification.status(), ValidationStatus::Passed);
        assert_eq!(classification.metadata().unwrap().height, 20);
    }

    #[test]
    fn test_small_file_fails_size_check() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("flat.png");
        flat_png(&path, 120, 120);
        assert!(fs::metadata(&path).unwrap().len() < 10 * 1024);

        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert!(matches!(reason, Rejection::TooSmall { .. }));
        assert!(reason.to_string().contains("too small"));
    }

    #[test]
    fn test_policy_thresholds_are_respected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("flat.png");
        flat_png(&path, 50, 50);

        let lenient = ValidationPolicy {
            min_width: 10,
            min_size_kb: 0.0,
            ..ValidationPolicy::default()
        };
        assert_eq!(inspect(&path, &lenient).status(), ValidationStatus::Passed);
    }

    #[test]
    fn test_missing_file_is_captured() {
        let path = PathBuf::from("/nonexistent/dir/photo.png");
        let reason = failure(inspect(&path, &ValidationPolicy::default()));
        assert_eq!(reason.kind(), RejectionKind::Unexpected);
    }

    #[test]
    fn test_round_2() {
        assert_eq!(round_2(19.53125), 19.53);
        assert_eq!(round_2(10.005_000_1), 10.01);
        assert_eq!(round_2(0.0), 0.0);
    }

    #[test]
    fn test_format_tag() {
        assert_eq!(format_tag(Some(ImageFormat::Png)), "PNG");
        assert_eq!(format_tag(Some(ImageFormat::Jpeg)), "JPEG");
        assert_eq!(format_tag(Some(ImageFormat::Gif)), "GIF");
        assert_eq!(format_tag(None), "UNKNOWN");
    }
}
