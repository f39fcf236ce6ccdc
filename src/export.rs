use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Local};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// `reaction-diffusion-YYYYmmdd-HHMMSS.png` inside `dir`.
pub fn export_file_name(dir: &Path, at: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "reaction-diffusion-{}.png",
        at.format("%Y%m%d-%H%M%S")
    ))
}

/// Writes an RGBA buffer as PNG.
pub fn save_png(path: &Path, width: usize, height: usize, pixels: &[u8]) -> Result<()> {
    ensure!(
        width > 0 && height > 0,
        "nothing to export: display is {width}x{height}"
    );
    let img = RgbaImage::from_raw(width as u32, height as u32, pixels.to_vec())
        .with_context(|| {
            format!(
                "pixel buffer of {} bytes does not match {width}x{height}",
                pixels.len()
            )
        })?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
    }
    img.save(path)
        .with_context(|| format!("could not write {}", path.display()))?;
    info!(path = %path.display(), width, height, "exported image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_has_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let p = export_file_name(Path::new("out"), at);
        assert_eq!(p, Path::new("out").join("reaction-diffusion-20240309-070501.png"));
    }

    #[test]
    fn writes_png_that_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("frame.png");
        let pixels: Vec<u8> = (0..2 * 3).flat_map(|i| [i as u8 * 40, 10, 20, 255]).collect();
        save_png(&path, 2, 3, &pixels).unwrap();
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (2, 3));
        assert_eq!(back.into_raw(), pixels);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_png(&dir.path().join("x.png"), 4, 4, &[0; 8]).unwrap_err();
        assert!(err.to_string().contains("does not match"));
        assert!(save_png(&dir.path().join("y.png"), 0, 4, &[]).is_err());
    }
}
