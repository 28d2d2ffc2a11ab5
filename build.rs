use std::env;
use std::path::PathBuf;

fn warn(message: &str) {
    println!("cargo:warning={message}");
}

fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // ffmpeg-sys-next finds FFmpeg through pkg-config everywhere but Windows.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows"
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        warn("FFMPEG_DIR is not set. Install FFmpeg via vcpkg and set VCPKG_ROOT or FFMPEG_DIR.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if candidate.exists() {
        warn(&format!(
            "Found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to pin it.",
            candidate.display()
        ));
    } else {
        warn(&format!(
            "VCPKG_ROOT is set but {} does not exist.",
            candidate.display()
        ));
    }
}
