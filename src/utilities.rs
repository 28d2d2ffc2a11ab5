//! Internal helpers shared by the FFmpeg source.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 frame into a tightly-packed buffer.
///
/// FFmpeg rows frequently carry padding (stride > width × 3); it is
/// stripped so the result can go straight into [`image::RgbImage::from_raw`].
pub(crate) fn packed_rgb(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * 3;
    let rows = height as usize;
    let data = video_frame.data(0);

    if stride == row_length {
        return data[..row_length * rows].to_vec();
    }

    data.chunks(stride)
        .take(rows)
        .flat_map(|row| &row[..row_length])
        .copied()
        .collect()
}

/// Rescale a PTS value to the nearest frame number, counted from the
/// stream's first timestamp.
pub(crate) fn pts_to_frame_number(
    pts: i64,
    start_time: i64,
    time_base: Rational,
    frames_per_second: f64,
) -> u64 {
    let seconds = ticks_to_seconds(pts.saturating_sub(start_time), time_base);
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Convert a stream timestamp offset to `AV_TIME_BASE` microseconds.
pub(crate) fn ticks_to_microseconds(ticks: i64, time_base: Rational) -> i64 {
    (ticks_to_seconds(ticks, time_base) * 1_000_000.0) as i64
}

fn ticks_to_seconds(ticks: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    ticks as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a frame number to a container seek timestamp.
///
/// `Input::seek` with no stream index expects `AV_TIME_BASE` units
/// (microseconds), so the stream time base is bypassed entirely.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// Frames per second from a rational rate, or `None` for `0/0` rates.
pub(crate) fn rate_to_fps(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        None
    } else {
        Some(rate.numerator() as f64 / rate.denominator() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_maps_to_frame_numbers() {
        // 1/90000 time base, 30 fps: one frame every 3000 ticks.
        let time_base = Rational::new(1, 90_000);
        assert_eq!(pts_to_frame_number(0, 0, time_base, 30.0), 0);
        assert_eq!(pts_to_frame_number(9_000, 0, time_base, 30.0), 3);
        assert_eq!(pts_to_frame_number(-3_000, 0, time_base, 30.0), 0);
    }

    #[test]
    fn mp4_timestamps_map_to_exact_frames() {
        // libx264 in mp4 at 25 fps: 1/12800 time base, 512 ticks per frame.
        let time_base = Rational::new(1, 12_800);
        for frame in 0..500_u64 {
            let pts = frame as i64 * 512;
            assert_eq!(pts_to_frame_number(pts, 0, time_base, 25.0), frame, "pts {pts}");
        }
    }

    #[test]
    fn stream_start_offset_is_subtracted() {
        // MPEG-TS commonly starts around 1.4 s on a 90 kHz clock.
        let time_base = Rational::new(1, 90_000);
        let start = 126_000;
        assert_eq!(pts_to_frame_number(start, start, time_base, 30.0), 0);
        assert_eq!(pts_to_frame_number(start + 3_000 * 29, start, time_base, 30.0), 29);
        assert_eq!(ticks_to_microseconds(start, time_base), 1_400_000);
    }

    #[test]
    fn seek_timestamp_is_microseconds() {
        assert_eq!(frame_number_to_seek_timestamp(50, 25.0), 2_000_000);
    }

    #[test]
    fn zero_rates_are_rejected() {
        assert_eq!(rate_to_fps(Rational::new(0, 0)), None);
        assert_eq!(rate_to_fps(Rational::new(30_000, 1_001)).map(|f| f.round()), Some(30.0));
    }
}
