//! The example sequence
//!
//! Each step prepares one table from the same seeded mixture and hands it
//! off as CSV (plus a PNG raster for binned grids when available). The
//! memory-heavy example only runs when `large_examples` is set.

use std::path::{Path, PathBuf};

use overplot_core::{
    aggregate, aggregate_by_group, density_contours_faceted, get_colormap, raster, sample,
    BinSpec, BinnedGrid, ColorScale, Colormap, ContourSpec, DemoConfig, OverplotError, PointSet,
    Reduction, LARGE_EXAMPLES_ENV,
};
use overplot_io::{write_cells_csv, write_contours_csv, write_points_csv, IoError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Overplot(#[from] OverplotError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type DemoResult<T> = Result<T, DemoError>;

/// Files produced by a run, in the order they were written
#[derive(Debug, Default)]
pub struct Report {
    pub files: Vec<PathBuf>,
    /// Rasters that were requested but not written
    pub skipped_rasters: usize,
}

pub struct Walkthrough<'a> {
    config: &'a DemoConfig,
    colormap: Colormap,
    report: Report,
}

impl<'a> Walkthrough<'a> {
    pub fn new(config: &'a DemoConfig) -> DemoResult<Self> {
        let colormap = get_colormap(&config.binning.colormap).ok_or_else(|| {
            OverplotError::Config(format!("unknown colormap '{}'", config.binning.colormap))
        })?;
        Ok(Self {
            config,
            colormap,
            report: Report::default(),
        })
    }

    /// Run every example and return what was written
    pub fn run(mut self) -> DemoResult<Report> {
        let dir = self.config.output.dir.clone();
        std::fs::create_dir_all(&dir).map_err(|source| DemoError::OutputDir {
            path: dir.clone(),
            source,
        })?;

        let seed = self.config.sampling.seed;
        let points = sample(
            &self.config.sampling.clusters,
            self.config.sampling.points_per_cluster,
            seed,
        )?;
        info!(points = points.len(), clusters = self.config.sampling.clusters.len(), "sampled mixture");

        // Raw scatter, in generation order and shuffled for rendering
        self.points(&dir, "points", &points)?;
        let shuffled = points.shuffled(seed);
        self.points(&dir, "points_shuffled", &shuffled)?;

        let spec = BinSpec::count(1).with_bins(self.config.binning.bins_x, self.config.binning.bins_y);

        let counts = aggregate(&points, &spec)?;
        self.grid(&dir, "count", &counts, self.config.binning.scale)?;

        let mean = aggregate(&points, &spec.with_reduction(Reduction::Mean))?;
        self.grid(&dir, "mean", &mean, ColorScale::Linear)?;

        let sampled = aggregate(&points, &spec.with_reduction(Reduction::Sample { seed }))?;
        self.grid(&dir, "sample", &sampled, ColorScale::Linear)?;

        let first = aggregate(&shuffled, &spec.with_reduction(Reduction::ShuffledFirst))?;
        self.grid(&dir, "shuffled_first", &first, ColorScale::Linear)?;

        for facet in aggregate_by_group(&points, &spec)? {
            let name = format!("facet_{}_count", facet.group);
            self.grid(&dir, &name, &facet.grid, self.config.binning.scale)?;
        }

        // The estimator costs resolution² per point, so feed it a thinned
        // uniform sample taken from the shuffled order
        let thinned: PointSet = shuffled.iter().take(self.config.contour.sample_size).collect();
        let contour_spec = ContourSpec::new(self.config.contour.resolution, self.config.contour.bandwidth);
        let contours = density_contours_faceted(&thinned, &contour_spec)?;
        let path = dir.join("contours.csv");
        write_contours_csv(&contours, &path)?;
        self.report.files.push(path);

        if self.config.large_examples {
            self.large(&dir, &spec)?;
        } else {
            info!(
                variable = LARGE_EXAMPLES_ENV,
                "skipping large example; set the variable to 1 to enable it"
            );
        }

        Ok(self.report)
    }

    fn large(&mut self, dir: &Path, spec: &BinSpec) -> DemoResult<()> {
        let points = sample(
            &self.config.sampling.clusters,
            self.config.sampling.large_points_per_cluster,
            self.config.sampling.seed,
        )?;
        info!(points = points.len(), "sampled large mixture");
        let counts = aggregate(&points, spec)?;
        self.grid(dir, "large_count", &counts, self.config.binning.scale)
    }

    fn points(&mut self, dir: &Path, name: &str, points: &PointSet) -> DemoResult<()> {
        let path = dir.join(format!("{}.csv", name));
        write_points_csv(points, &path)?;
        self.report.files.push(path);
        Ok(())
    }

    fn grid(&mut self, dir: &Path, name: &str, grid: &BinnedGrid, scale: ColorScale) -> DemoResult<()> {
        let path = dir.join(format!("cells_{}.csv", name));
        write_cells_csv(grid, &path)?;
        self.report.files.push(path);

        if !self.config.output.write_raster {
            return Ok(());
        }
        if !raster::is_available() {
            warn!(grid = name, "raster output not compiled in, skipping PNG");
            self.report.skipped_rasters += 1;
            return Ok(());
        }
        let path = dir.join(format!("cells_{}.png", name));
        raster::save_png(grid, &self.colormap, scale, &path)?;
        self.report.files.push(path);
        Ok(())
    }
}
