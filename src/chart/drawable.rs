use std::{
    fs::File,
    path::{Path, PathBuf},
};

use plotters::{
    backend::BitMapBackend,
    coord::Shift,
    drawing::{DrawingArea, IntoDrawingArea},
    style::WHITE,
};
use tracing::info;

use crate::error::{Error, Result};

/// 10x6 inch figure at 100 dpi.
pub const FIGURE_SIZE: (u32, u32) = (1000, 600);

pub trait DrawableChart {
    fn define_chart(
        &self,
        root: &DrawingArea<BitMapBackend, Shift>,
    ) -> std::result::Result<(), Box<dyn std::error::Error>>;

    /// Draws into a hidden sibling of `filepath` and renames it into place, so a failed
    /// draw never leaves a half written image behind.
    fn draw(&self, filepath: &Path) -> Result<()> {
        let partial = partial_path(filepath);
        // surfaces an unwritable location before any drawing happens
        File::create(&partial).map_err(|e| Error::io(filepath, e))?;

        let result = draw_png(self, &partial)
            .and_then(|()| std::fs::rename(&partial, filepath).map_err(|e| Error::io(filepath, e)));
        if result.is_err() {
            std::fs::remove_file(&partial).ok();
        }
        result?;
        info!("saved chart to {}", filepath.display());
        Ok(())
    }
}

fn draw_png<C: DrawableChart + ?Sized>(chart: &C, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| Error::Draw(e.to_string()))?;
    chart
        .define_chart(&root)
        .map_err(|e| Error::Draw(e.to_string()))?;
    root.present().map_err(|e| Error::Draw(e.to_string()))?;
    Ok(())
}

/// `dir/plot.png` -> `dir/.plot.png.partial.png`. The bitmap encoder picks the image
/// format from the extension, so it has to stay `.png`.
fn partial_path(filepath: &Path) -> PathBuf {
    let name = filepath
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart".to_string());
    filepath.with_file_name(format!(".{name}.partial.png"))
}

#[test]
fn partial_path_test() {
    assert_eq!(
        partial_path(Path::new("out/k_runtime.png")),
        Path::new("out/.k_runtime.png.partial.png")
    );
    assert_eq!(
        partial_path(Path::new("plot")),
        Path::new(".plot.partial.png")
    );
}
