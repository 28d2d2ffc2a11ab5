//! Output directory and frame file naming.
//!
//! Frames land in `save_dir/<video file stem>/` and are named
//! `frame_<index>.<ext>`, with the index zero-padded to the number of
//! decimal digits in the video's total frame count. A 1234-frame video
//! therefore produces `frame_0000.png` through `frame_1233.png`.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::ExtractError;

/// Image container used for written frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// Lossless PNG. This is the default.
    #[default]
    Png,
    /// Baseline JPEG.
    Jpeg,
    /// Windows bitmap.
    Bmp,
    /// TIFF.
    Tiff,
}

impl ImageFormat {
    /// File extension written after the frame index, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
        }
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = ExtractError;

    /// Parse an extension such as `png`, `.JPG` or `tif`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "bmp" => Ok(ImageFormat::Bmp),
            "tif" | "tiff" => Ok(ImageFormat::Tiff),
            other => Err(ExtractError::invalid(
                "image_format",
                format!("unsupported extension `{other}` (png, jpg, jpeg, bmp, tif, tiff)"),
            )),
        }
    }
}

/// Number of decimal digits in `total_frames`, used as the padding width.
pub fn padding_width(total_frames: u64) -> usize {
    total_frames.to_string().len()
}

/// File name for frame `index` of a video with `total_frames` frames.
///
/// ```
/// use framesplit::{ImageFormat, frame_file_name};
///
/// assert_eq!(frame_file_name(7, 1234, ImageFormat::Png), "frame_0007.png");
/// assert_eq!(frame_file_name(3, 9, ImageFormat::Png), "frame_3.png");
/// ```
pub fn frame_file_name(index: u64, total_frames: u64, format: ImageFormat) -> String {
    let width = padding_width(total_frames);
    format!("frame_{index:0width$}.{}", format.extension())
}

/// Directory frames of `video_path` are written into: `save_dir/<stem>`.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidArgument`] if the path has no file stem.
pub fn output_directory(save_dir: &Path, video_path: &Path) -> Result<PathBuf, ExtractError> {
    let stem = video_path.file_stem().ok_or_else(|| {
        ExtractError::invalid(
            "video_path",
            format!("{} has no file name", video_path.display()),
        )
    })?;
    Ok(save_dir.join(stem))
}

/// Create `directory` and any missing parents.
pub(crate) fn prepare_directory(directory: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(directory)?;
    log::debug!("Output directory ready: {}", directory.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_follows_total_digit_count() {
        assert_eq!(padding_width(9), 1);
        assert_eq!(padding_width(10), 2);
        assert_eq!(padding_width(1234), 4);
    }

    #[test]
    fn names_use_configured_extension() {
        assert_eq!(frame_file_name(42, 100, ImageFormat::Jpeg), "frame_042.jpg");
        assert_eq!(frame_file_name(1233, 1234, ImageFormat::Tiff), "frame_1233.tiff");
    }

    #[test]
    fn parse_extension_aliases() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!(".jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("tif".parse::<ImageFormat>().unwrap(), ImageFormat::Tiff);
        assert!("webm".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn output_directory_uses_stem() {
        let directory = output_directory(Path::new("out"), Path::new("clips/holiday.mp4")).unwrap();
        assert_eq!(directory, Path::new("out").join("holiday"));
    }
}
