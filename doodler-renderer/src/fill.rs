//! Four-connected flood fill.

use doodler_core::Point;

use crate::Raster;

/// Flood fill the region connected to `seed` with `fill_rgba`.
///
/// The region is every pixel reachable from the seed through horizontal and
/// vertical neighbours whose value exactly matches the seed's on all four
/// channels. The seed is rounded to the nearest pixel. Uses an explicit stack
/// and a visited bitmap, so large regions cannot overflow the call stack.
///
/// Returns the number of pixels changed; `0` when the seed is out of bounds or
/// already has the fill color.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn flood_fill(raster: &mut Raster, seed: Point, fill_rgba: [u8; 4]) -> usize {
    let width = raster.width() as usize;
    let height = raster.height() as usize;
    let sx = seed.x.round();
    let sy = seed.y.round();
    if !(sx >= 0.0 && sy >= 0.0 && (sx as usize) < width && (sy as usize) < height) {
        tracing::trace!("Flood fill seed ({sx}, {sy}) outside {width}x{height}");
        return 0;
    }
    let (sx, sy) = (sx as usize, sy as usize);

    let fill = Raster::premultiplied(fill_rgba);
    let fill = [fill.red(), fill.green(), fill.blue(), fill.alpha()];
    let data = raster.data_mut();
    let at = |x: usize, y: usize| (y * width + x) * 4;

    let target: [u8; 4] = {
        let i = at(sx, sy);
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    };
    if target == fill {
        return 0;
    }

    let mut visited = vec![false; width * height];
    let mut stack = vec![(sx, sy)];
    let mut filled = 0;

    while let Some((x, y)) = stack.pop() {
        let flat = y * width + x;
        if visited[flat] {
            continue;
        }
        visited[flat] = true;

        let i = flat * 4;
        if data[i..i + 4] != target {
            continue;
        }
        data[i..i + 4].copy_from_slice(&fill);
        filled += 1;

        if x + 1 < width && !visited[flat + 1] {
            stack.push((x + 1, y));
        }
        if x > 0 && !visited[flat - 1] {
            stack.push((x - 1, y));
        }
        if y + 1 < height && !visited[flat + width] {
            stack.push((x, y + 1));
        }
        if y > 0 && !visited[flat - width] {
            stack.push((x, y - 1));
        }
    }

    tracing::trace!("Flood fill from ({sx}, {sy}) changed {filled} pixels");
    filled
}
