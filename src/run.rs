//! End-to-end composition: resolve, compose, finish, write.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec::{Finished, TileSource};
use crate::compose::Compositor;
use crate::config::RunConfig;
use crate::error::ComposeError;
use crate::finish::finish;
use crate::grid::resolve;
use crate::label::{GlyphRenderer, Labeler};
use crate::layout::Size;

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub out: PathBuf,
    pub size: Size,
    pub maxval: u32,
    pub channels: u8,
    /// Blank slots padded into the grid.
    pub blanks: usize,
}

/// Compose `files` per `config` without writing anything.
///
/// `renderer` is only consulted when `config` enables labels.
pub fn render<P: AsRef<Path>>(
    config: &RunConfig,
    files: &[P],
    source: &dyn TileSource,
    renderer: Option<&dyn GlyphRenderer>,
) -> Result<(Finished, usize), ComposeError> {
    config.validate()?;
    let grid = resolve(config.mode, files, config.transpose, config.sort)?;

    info!(
        mode = config.mode.name(),
        rows = grid.shape.rows,
        cols = grid.shape.cols,
        images = grid.inputs().len(),
        transpose = config.transpose,
        sorted = config.sort,
        downsample = config.downsample,
        labels = ?config.label_size,
        eight_bit = config.force_8bit,
        out = %config.out.display(),
        "configuration"
    );
    if grid.blanks > 0 {
        info!(blanks = grid.blanks, "Filling with blanks.");
    }

    let mut compositor = Compositor::new(source).transpose(config.transpose);
    match (config.label_size, renderer) {
        (Some(size), Some(renderer)) => {
            compositor = compositor.labeler(Labeler::new(renderer, size));
        }
        (Some(_), None) => warn!("labels requested without a font renderer, drawing none"),
        (None, _) => {}
    }

    let canvas = compositor.compose(config.mode, &grid)?;
    let finished = finish(canvas, config.downsample, config.force_8bit)?;
    Ok((finished, grid.blanks))
}

/// Compose `files` per `config` and write the result to `config.out`.
///
/// Every check runs before the encoder is called, so a failed run leaves no
/// output file behind.
pub fn run<P: AsRef<Path>>(
    config: &RunConfig,
    files: &[P],
    source: &dyn TileSource,
    renderer: Option<&dyn GlyphRenderer>,
) -> Result<RunSummary, ComposeError> {
    let (finished, blanks) = render(config, files, source, renderer)?;
    let summary = RunSummary {
        out: config.out.clone(),
        size: finished.size(),
        maxval: finished.maxval(),
        channels: finished.channels(),
        blanks,
    };
    finished.save(&config.out)?;
    info!(
        out = %summary.out.display(),
        width = summary.size.width,
        height = summary.size.height,
        "wrote composite"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::codec::MemorySource;
    use crate::compose::testing::{Block, numbered};
    use crate::config::LayoutMode;

    /// Shared buffer the test subscriber writes formatted events into.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Everything logged at `info` and above while `f` runs.
    fn logs_of(f: impl FnOnce()) -> String {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn blank_padding_is_announced() {
        let (src, files) = numbered(3, 10, 10);
        let config = RunConfig::new(LayoutMode::collage(2, 2));
        let logs = logs_of(|| {
            render(&config, &files, &src, None).unwrap();
        });
        let notice = logs
            .lines()
            .find(|l| l.contains("Filling with blanks."))
            .unwrap_or_else(|| panic!("no blank notice in:\n{logs}"));
        assert!(notice.contains("INFO"), "{notice}");
        assert!(notice.contains("blanks=1"), "{notice}");
    }

    #[test]
    fn full_grid_has_no_blank_notice() {
        let (src, files) = numbered(4, 10, 10);
        let config = RunConfig::new(LayoutMode::collage(2, 2));
        let logs = logs_of(|| {
            render(&config, &files, &src, None).unwrap();
        });
        assert!(logs.contains("configuration"), "{logs}");
        assert!(!logs.contains("Filling with blanks."), "{logs}");
    }

    #[test]
    fn render_reports_blanks() {
        let (src, files) = numbered(3, 10, 10);
        let config = RunConfig::new(LayoutMode::collage(2, 2));
        let (finished, blanks) = render(&config, &files, &src, None).unwrap();
        assert_eq!(blanks, 1);
        assert_eq!(finished.size(), Size::new(20, 20));
        assert_eq!(finished.maxval(), 255);
    }

    #[test]
    fn count_mismatch_precedes_decode() {
        // The source is empty: any decode would fail with a different error.
        let src = MemorySource::new();
        let files = ["a.png", "b.png", "c.png", "d.png", "e.png"];
        let config = RunConfig::new(LayoutMode::collage(2, 2));
        assert!(matches!(
            render(&config, &files, &src, None),
            Err(ComposeError::CountMismatch { files: 5, slots: 4, .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_first() {
        let (src, files) = numbered(1, 10, 10);
        let config = RunConfig::new(LayoutMode::collage(1, 1)).labels(4);
        assert!(matches!(
            render(&config, &files, &src, Some(&Block)),
            Err(ComposeError::LabelSizeTooSmall { size: 4, .. })
        ));
    }

    #[test]
    fn downsample_and_labels_together() {
        let (src, files) = numbered(4, 40, 40);
        let config = RunConfig::new(LayoutMode::mosaic(2, 2))
            .downsample(1)
            .labels(10);
        let (finished, _) = render(&config, &files, &src, Some(&Block)).unwrap();
        assert_eq!(finished.size(), Size::new(20, 20));
    }
}
