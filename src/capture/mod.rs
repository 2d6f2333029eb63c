use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

mod screen;

pub use screen::SystemScreenGrabber;

pub const DEFAULT_THUMBNAIL_MAX_EDGE: u32 = 320;
const PLACEHOLDER_SHADE: Rgba<u8> = Rgba([0x55, 0x55, 0x55, 0xff]);

/// Screenshot taken at trigger time. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureArtifact {
    pub capture_id: String,
    pub full_image: RgbaImage,
    pub thumbnail: RgbaImage,
    pub taken_at_ms: u64,
}

impl CaptureArtifact {
    pub fn width(&self) -> u32 {
        self.full_image.width()
    }

    pub fn height(&self) -> u32 {
        self.full_image.height()
    }

    /// Full-resolution image as PNG bytes, the form the ticketing backend receives.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        self.full_image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Raw RGBA8 pixels as handed back by the OS screen-grab primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no display available for capture")]
    DisplayUnavailable,
    #[error("screen capture permission denied: {message}")]
    PermissionDenied { message: String },
    #[error("screen capture backend failed: {message}")]
    Backend { message: String },
    #[error("invalid captured frame: {message}")]
    InvalidFrame { message: String },
    #[error("system clock error: {message}")]
    Clock { message: String },
}

pub trait ScreenGrabber {
    fn grab_screen(&self) -> Result<RawFrame, CaptureError>;
}

/// Grabs the screen and derives the thumbnail before returning, so callers can
/// sequence the capture strictly ahead of any window they are about to show.
pub fn capture_with<G: ScreenGrabber + ?Sized>(
    grabber: &G,
    max_edge: u32,
) -> Result<CaptureArtifact, CaptureError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CaptureError::Clock {
            message: format!("system time before unix epoch: {err}"),
        })?;

    let frame = grabber.grab_screen()?;
    let full_image = full_image_from_frame(frame)?;
    let thumbnail = make_thumbnail(&full_image, max_edge);

    let artifact = CaptureArtifact {
        capture_id: format!("capture-{}", now.as_nanos()),
        full_image,
        thumbnail,
        taken_at_ms: now.as_millis() as u64,
    };
    tracing::debug!(
        capture_id = %artifact.capture_id,
        width = artifact.width(),
        height = artifact.height(),
        thumbnail_width = artifact.thumbnail.width(),
        thumbnail_height = artifact.thumbnail.height(),
        "screen captured"
    );
    Ok(artifact)
}

fn full_image_from_frame(frame: RawFrame) -> Result<RgbaImage, CaptureError> {
    let RawFrame {
        width,
        height,
        rgba,
    } = frame;
    if width == 0 || height == 0 {
        return Err(CaptureError::InvalidFrame {
            message: format!("frame must be positive, got {width}x{height}"),
        });
    }

    let len = rgba.len();
    RgbaImage::from_raw(width, height, rgba).ok_or_else(|| CaptureError::InvalidFrame {
        message: format!("{len} bytes do not cover a {width}x{height} rgba frame"),
    })
}

/// Aspect-preserving downscale so the longest edge is at most `max_edge`.
/// A degenerate source or bound yields a grey placeholder instead of an error.
pub fn make_thumbnail(full: &RgbaImage, max_edge: u32) -> RgbaImage {
    match downscale(full, max_edge) {
        Ok(thumbnail) => thumbnail,
        Err(err) => {
            tracing::warn!(?err, "thumbnail downscale failed; using placeholder");
            placeholder_thumbnail(max_edge)
        }
    }
}

fn downscale(full: &RgbaImage, max_edge: u32) -> Result<RgbaImage, CaptureError> {
    let (width, height) = full.dimensions();
    if width == 0 || height == 0 || max_edge == 0 {
        return Err(CaptureError::InvalidFrame {
            message: format!("cannot downscale {width}x{height} into max edge {max_edge}"),
        });
    }

    let (target_width, target_height) = fit_within(width, height, max_edge);
    if (target_width, target_height) == (width, height) {
        return Ok(full.clone());
    }
    Ok(image::imageops::thumbnail(
        full,
        target_width,
        target_height,
    ))
}

fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge {
        return (width, height);
    }

    let scale = f64::from(max_edge) / f64::from(longest);
    let scaled = |edge: u32| ((f64::from(edge) * scale).round() as u32).clamp(1, max_edge);
    (scaled(width), scaled(height))
}

fn placeholder_thumbnail(max_edge: u32) -> RgbaImage {
    let width = if max_edge == 0 {
        DEFAULT_THUMBNAIL_MAX_EDGE
    } else {
        max_edge
    };
    let height = (width * 9 / 16).max(1);
    RgbaImage::from_pixel(width, height, PLACEHOLDER_SHADE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeScreenGrabber {
        frame: Option<RawFrame>,
        failure: RefCell<Option<CaptureError>>,
        calls: RefCell<usize>,
    }

    impl FakeScreenGrabber {
        fn with_frame(width: u32, height: u32) -> Self {
            Self {
                frame: Some(RawFrame {
                    width,
                    height,
                    rgba: vec![200; (width * height * 4) as usize],
                }),
                failure: RefCell::new(None),
                calls: RefCell::new(0),
            }
        }

        fn failing(err: CaptureError) -> Self {
            Self {
                frame: None,
                failure: RefCell::new(Some(err)),
                calls: RefCell::new(0),
            }
        }
    }

    impl ScreenGrabber for FakeScreenGrabber {
        fn grab_screen(&self) -> Result<RawFrame, CaptureError> {
            *self.calls.borrow_mut() += 1;
            if let Some(err) = self.failure.borrow_mut().take() {
                return Err(err);
            }
            self.frame.clone().ok_or(CaptureError::DisplayUnavailable)
        }
    }

    #[test]
    fn capture_with_builds_full_image_and_bounded_thumbnail() {
        let grabber = FakeScreenGrabber::with_frame(1920, 1080);
        let artifact = capture_with(&grabber, 320).expect("fake grabber should capture");

        assert_eq!(artifact.width(), 1920);
        assert_eq!(artifact.height(), 1080);
        assert_eq!(artifact.thumbnail.dimensions(), (320, 180));
        assert!(artifact.capture_id.starts_with("capture-"));
        assert!(artifact.taken_at_ms > 0);
        assert_eq!(*grabber.calls.borrow(), 1);
    }

    #[test]
    fn capture_with_keeps_small_frames_at_native_size() {
        let grabber = FakeScreenGrabber::with_frame(200, 100);
        let artifact = capture_with(&grabber, 320).expect("small frame should capture");
        assert_eq!(artifact.thumbnail.dimensions(), (200, 100));
    }

    #[test]
    fn capture_with_bubbles_backend_failure() {
        let grabber = FakeScreenGrabber::failing(CaptureError::PermissionDenied {
            message: "simulated".to_string(),
        });
        let err = capture_with(&grabber, 320).expect_err("permission failure should bubble");
        assert!(matches!(err, CaptureError::PermissionDenied { message: _ }));
    }

    #[test]
    fn capture_with_rejects_truncated_frames() {
        let grabber = FakeScreenGrabber {
            frame: Some(RawFrame {
                width: 10,
                height: 10,
                rgba: vec![0; 12],
            }),
            failure: RefCell::new(None),
            calls: RefCell::new(0),
        };
        let err = capture_with(&grabber, 320).expect_err("short buffer should be invalid");
        assert!(matches!(err, CaptureError::InvalidFrame { message: _ }));
    }

    #[test]
    fn capture_with_rejects_empty_frames() {
        let grabber = FakeScreenGrabber::with_frame(0, 0);
        let err = capture_with(&grabber, 320).expect_err("empty frame should be invalid");
        assert!(matches!(err, CaptureError::InvalidFrame { message: _ }));
    }

    #[test]
    fn make_thumbnail_falls_back_to_placeholder_for_zero_bound() {
        let full = RgbaImage::from_pixel(64, 32, Rgba([1, 2, 3, 255]));
        let thumbnail = make_thumbnail(&full, 0);
        assert_eq!(
            thumbnail.dimensions(),
            (DEFAULT_THUMBNAIL_MAX_EDGE, DEFAULT_THUMBNAIL_MAX_EDGE * 9 / 16)
        );
        assert_eq!(thumbnail.get_pixel(0, 0), &PLACEHOLDER_SHADE);
    }

    #[test]
    fn fit_within_preserves_portrait_aspect() {
        assert_eq!(fit_within(1080, 1920, 320), (180, 320));
        assert_eq!(fit_within(5000, 1, 320), (320, 1));
    }

    #[test]
    fn encode_png_produces_png_signature() {
        let grabber = FakeScreenGrabber::with_frame(8, 8);
        let artifact = capture_with(&grabber, 320).expect("capture should work");
        let bytes = artifact.encode_png().expect("png encoding should work");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
