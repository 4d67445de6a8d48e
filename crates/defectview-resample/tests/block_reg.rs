//! Block defect regression test
//!
//! Extreme reductions of full-size inspection maps must keep isolated
//! defects and chip boundaries visible.

use defectview_core::{PixelBuffer, color};
use defectview_resample::{
    BlockDefectParams, ChunkedExecutor, ResampleMethod, Resampler, ScaleGeometry,
};
use defectview_test::{RegParams, fixtures};

#[test]
fn block_reg() {
    let mut rp = RegParams::new("block");

    // --- Test 1: 4000x4000 at 0.19 keeps a single red defect ---
    let (dx, dy) = (2345, 1234);
    let src = fixtures::defect_dot(4000, 4000, dx, dy).expect("defect_dot");
    let scale = 0.19;
    let method = ResampleMethod::for_scale(scale, true);
    rp.compare_values(1.0, flag(method == ResampleMethod::BlockDefect), 0.0);

    let geom = ScaleGeometry::from_scale(4000, 4000, scale).expect("geometry");
    let executor = ChunkedExecutor::default();
    rp.compare_values(1.0, flag(executor.should_chunk(src.pixel_count())), 0.0);
    let out = executor
        .run(&src, &geom, &Resampler::new(method))
        .expect("block defect");
    rp.compare_values(760.0, f64::from(out.width()), 0.0);
    rp.compare_values(760.0, f64::from(out.height()), 0.0);

    let red_cells: Vec<(u32, u32)> = (0..out.height())
        .flat_map(|y| (0..out.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| out.get_rgb(x, y) == Some((255, 0, 0)))
        .collect();
    eprintln!("  red cells: {:?}", red_cells);
    rp.compare_values(1.0, flag(!red_cells.is_empty()), 0.0);
    // the defect must land in the cell covering it
    let cx = (f64::from(dx) * scale).floor();
    let cy = (f64::from(dy) * scale).floor();
    let near = red_cells
        .iter()
        .any(|&(x, y)| (f64::from(x) - cx).abs() <= 1.0 && (f64::from(y) - cy).abs() <= 1.0);
    rp.compare_values(1.0, flag(near), 0.0);
    // everything else stays background
    let background = out
        .data()
        .iter()
        .filter(|&&p| p == fixtures::BACKGROUND)
        .count();
    rp.compare_values(
        (760 * 760 - red_cells.len()) as f64,
        background as f64,
        0.0,
    );

    // --- Test 2: boundary colour wins over a defect in the same block ---
    let blue = color::compose_rgb(0, 0, 255);
    let yellow = color::compose_rgb(255, 255, 0);
    let boundary = color::compose_rgb(0, 255, 0);
    let edge = fixtures::two_color_edge(100, 100, 50, blue, yellow).expect("edge");
    let mut m = edge.to_mut();
    m.set_pixel(49, 49, fixtures::DEFECT_RED).unwrap();
    let edge: PixelBuffer = m.into();
    let geom = ScaleGeometry::from_scale(100, 100, 0.25).unwrap();
    let out = Resampler::new(ResampleMethod::BlockDefect)
        .resample(&edge, &geom)
        .unwrap();
    // cell column 12 spans source columns [48, 52) and contains the edge
    rp.compare_values(1.0, flag(out.get_pixel(12, 12) == Some(boundary)), 0.0);
    rp.compare_values(1.0, flag(out.get_pixel(12, 3) == Some(boundary)), 0.0);
    rp.compare_values(1.0, flag(out.get_pixel(5, 12) == Some(blue)), 0.0);
    rp.compare_values(1.0, flag(out.get_pixel(20, 12) == Some(yellow)), 0.0);

    // --- Test 3: custom boundary colour and enhancement factor ---
    let params = BlockDefectParams::default()
        .with_boundary_color(255, 0, 255)
        .with_enhancement(1.5);
    let out = Resampler::new(ResampleMethod::BlockDefect)
        .with_defect_params(params)
        .resample(&edge, &geom)
        .unwrap();
    let magenta = color::compose_rgb(255, 0, 255);
    rp.compare_values(1.0, flag(out.get_pixel(12, 12) == Some(magenta)), 0.0);

    let dim = fixtures::defect_dots(50, 50, &[(12, 12, color::compose_rgb(120, 10, 10))])
        .expect("defect_dots");
    let geom = ScaleGeometry::from_scale(50, 50, 0.2).unwrap();
    let out = Resampler::new(ResampleMethod::BlockDefect)
        .with_defect_params(params)
        .resample(&dim, &geom)
        .unwrap();
    rp.compare_values(1.0, flag(out.get_rgb(2, 2) == Some((180, 15, 15))), 0.0);

    // --- Test 4: chip grid lines survive 1/4 reduction ---
    let grid = fixtures::chip_grid(800, 800, 80, 3).expect("chip_grid");
    let geom = ScaleGeometry::from_scale(800, 800, 0.25).unwrap();
    let out = Resampler::new(ResampleMethod::BlockDefect)
        .resample(&grid, &geom)
        .unwrap();
    let marked = out.data().iter().filter(|&&p| p == boundary).count();
    eprintln!("  boundary cells at 0.25: {}", marked);
    rp.compare_values(1.0, flag(marked > 0), 0.0);

    assert!(rp.cleanup(), "block regression test failed");
}

fn flag(ok: bool) -> f64 {
    if ok { 1.0 } else { 0.0 }
}
