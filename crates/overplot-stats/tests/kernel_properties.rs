//! Property tests for the binning and KDE kernels on raw column slices

use overplot_stats::{bin2d, kde2d, Bandwidth, BinParams, Bins, Bounds, InputOrder, Reduction};
use proptest::prelude::*;

fn columns() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 0..200)
        .prop_map(|pairs| pairs.into_iter().unzip())
}

proptest! {
    #[test]
    fn prop_assigned_plus_dropped_is_input(
        (x, y) in columns(),
        lo in -60.0f64..0.0,
        hi in 0.0f64..60.0,
        bins in 1usize..30,
    ) {
        let params = BinParams::new(bins).with_bounds(Bounds::square(lo, hi));
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        prop_assert_eq!(grid.assigned + grid.dropped, x.len());
        prop_assert_eq!(grid.total_count() as usize, grid.assigned);

        let inside = x.iter().zip(&y).filter(|(&a, &b)| a >= lo && a <= hi && b >= lo && b <= hi).count();
        prop_assert_eq!(grid.assigned, inside);
    }

    #[test]
    fn prop_cells_sorted_and_in_range((x, y) in columns(), bx in 1usize..20, by in 1usize..20) {
        let params = BinParams::new(Bins::Axes { x: bx, y: by });
        let grid = bin2d(&x, &y, None, InputOrder::Arbitrary, &params).unwrap();

        let keys: Vec<(usize, usize)> = grid.cells().iter().map(|c| (c.row, c.col)).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(keys.iter().all(|&(r, c)| r < grid.bins_y && c < grid.bins_x));
    }

    #[test]
    fn prop_min_le_mean_le_max((x, y) in columns(), bins in 1usize..10) {
        let values: Vec<f64> = x.iter().zip(&y).map(|(a, b)| a * 0.3 - b).collect();
        let run = |reduction| {
            let params = BinParams::new(bins).with_reduction(reduction);
            bin2d(&x, &y, Some(&values), InputOrder::Arbitrary, &params).unwrap()
        };
        let (min, mean, max) = (run(Reduction::Min), run(Reduction::Mean), run(Reduction::Max));

        for cell in mean.cells() {
            let lo = min.get(cell.row, cell.col).unwrap().value;
            let hi = max.get(cell.row, cell.col).unwrap().value;
            prop_assert!(lo <= cell.value + 1e-9 && cell.value <= hi + 1e-9);
        }
    }
}

#[test]
fn test_kde_integrates_to_about_one() {
    // Deterministic spread of points on a ring
    let n = 400;
    let (x, y): (Vec<f64>, Vec<f64>) = (0..n)
        .map(|i| {
            let t = i as f64 / n as f64 * std::f64::consts::TAU;
            let r = 1.0 + 0.5 * ((i * 7 % 11) as f64 / 11.0);
            (r * t.cos(), r * t.sin())
        })
        .unzip();

    let grid = kde2d(&x, &y, 120, Bandwidth::Scott, Some(Bounds::square(-5.0, 5.0))).unwrap();
    let integral = grid.integral();
    assert!((integral - 1.0).abs() < 0.02, "integral {}", integral);
}

#[test]
fn test_kde_wider_bandwidth_flattens_peak() {
    let x = [0.0, 0.1, -0.1, 0.05, 2.0, -2.0];
    let y = [0.0, -0.1, 0.1, 0.05, 2.0, -2.0];
    let bounds = Some(Bounds::square(-3.0, 3.0));

    let narrow = kde2d(&x, &y, 40, Bandwidth::Factor(0.2), bounds).unwrap();
    let wide = kde2d(&x, &y, 40, Bandwidth::Factor(1.5), bounds).unwrap();
    assert!(narrow.max_density() > wide.max_density());
}
