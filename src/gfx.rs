// Shape drawing helpers built from Surface primitives: filled rounded
// rectangles for the eye bodies and filled triangles for the eyelid wedges.
// Classic GFX-style integer scanline algorithms (vline corners, hline spans).

use crate::color::Bgra;
use crate::framebuffer::Surface;

/// Fill a rounded rectangle. The radius is clamped to half the shorter side.
pub fn fill_rounded_rect<S: Surface>(
    s: &mut S,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    radius: i32,
    color: Bgra,
) {
    if w <= 0 || h <= 0 {
        return;
    }
    let r = radius.clamp(0, w.min(h) / 2);
    s.fill_rect(x + r, y, w - 2 * r, h, color);
    if r > 0 {
        // Right and left edges, corners included
        fill_circle_quadrants(s, x + w - r - 1, y + r, r, 1, h - 2 * r - 1, color);
        fill_circle_quadrants(s, x + r, y + r, r, 2, h - 2 * r - 1, color);
    }
}

// Fill the right (corners bit 1) or left (bit 2) pair of circle quadrants
// centered at (x0, y0), stretched vertically by delta to cover a rounded
// rectangle's side.
fn fill_circle_quadrants<S: Surface>(
    s: &mut S,
    x0: i32,
    y0: i32,
    r: i32,
    corners: u8,
    delta: i32,
    color: Bgra,
) {
    let mut f = 1 - r;
    let mut ddf_x = 1;
    let mut ddf_y = -2 * r;
    let mut x = 0;
    let mut y = r;
    let mut px = x;
    let mut py = y;
    let delta = delta + 1;

    while x < y {
        if f >= 0 {
            y -= 1;
            ddf_y += 2;
            f += ddf_y;
        }
        x += 1;
        ddf_x += 2;
        f += ddf_x;
        if x < y + 1 {
            if corners & 1 != 0 {
                s.vline(x0 + x, y0 - y, 2 * y + delta, color);
            }
            if corners & 2 != 0 {
                s.vline(x0 - x, y0 - y, 2 * y + delta, color);
            }
        }
        if y != py {
            if corners & 1 != 0 {
                s.vline(x0 + py, y0 - px, 2 * px + delta, color);
            }
            if corners & 2 != 0 {
                s.vline(x0 - py, y0 - px, 2 * px + delta, color);
            }
        }
        px = x;
        py = y;
    }
}

/// Fill a triangle by horizontal scanlines.
pub fn fill_triangle<S: Surface>(
    s: &mut S,
    mut x0: i32,
    mut y0: i32,
    mut x1: i32,
    mut y1: i32,
    mut x2: i32,
    mut y2: i32,
    color: Bgra,
) {
    use std::mem::swap;

    // Sort vertices by y
    if y0 > y1 {
        swap(&mut y0, &mut y1);
        swap(&mut x0, &mut x1);
    }
    if y1 > y2 {
        swap(&mut y2, &mut y1);
        swap(&mut x2, &mut x1);
    }
    if y0 > y1 {
        swap(&mut y0, &mut y1);
        swap(&mut x0, &mut x1);
    }

    if y0 == y2 {
        // Degenerate: all on one scanline
        let mut a = x0;
        let mut b = x0;
        if x1 < a {
            a = x1;
        } else if x1 > b {
            b = x1;
        }
        if x2 < a {
            a = x2;
        } else if x2 > b {
            b = x2;
        }
        s.hline(a, y0, b - a + 1, color);
        return;
    }

    let dx01 = (x1 - x0) as i64;
    let dy01 = (y1 - y0) as i64;
    let dx02 = (x2 - x0) as i64;
    let dy02 = (y2 - y0) as i64;
    let dx12 = (x2 - x1) as i64;
    let dy12 = (y2 - y1) as i64;
    let mut sa: i64 = 0;
    let mut sb: i64 = 0;

    // Upper part: y0 to y1 (inclusive only when the lower edge is flat)
    let last = if y1 == y2 { y1 } else { y1 - 1 };

    let mut y = y0;
    while y <= last {
        let mut a = x0 + (sa / dy01) as i32;
        let mut b = x0 + (sb / dy02) as i32;
        sa += dx01;
        sb += dx02;
        if a > b {
            swap(&mut a, &mut b);
        }
        s.hline(a, y, b - a + 1, color);
        y += 1;
    }

    // Lower part: y1/last+1 to y2
    sa = dx12 * (y - y1) as i64;
    sb = dx02 * (y - y0) as i64;
    while y <= y2 {
        let mut a = x1 + (sa / dy12) as i32;
        let mut b = x0 + (sb / dy02) as i32;
        sa += dx12;
        sb += dx02;
        if a > b {
            swap(&mut a, &mut b);
        }
        s.hline(a, y, b - a + 1, color);
        y += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BGCOLOR, FGCOLOR};
    use crate::framebuffer::MemorySurface;

    #[test]
    fn rounded_rect_with_zero_radius_is_a_rect() {
        let mut s = MemorySurface::new(30, 30);
        s.fill(BGCOLOR);
        fill_rounded_rect(&mut s, 5, 5, 10, 8, 0, FGCOLOR);
        for y in 5..13 {
            for x in 5..15 {
                assert_eq!(s.get(x, y), FGCOLOR, "pixel ({x},{y})");
            }
        }
        assert_eq!(s.get(4, 5), BGCOLOR);
        assert_eq!(s.get(15, 5), BGCOLOR);
    }

    #[test]
    fn rounded_rect_spares_the_corners() {
        let mut s = MemorySurface::new(40, 40);
        s.fill(BGCOLOR);
        fill_rounded_rect(&mut s, 10, 10, 20, 20, 8, FGCOLOR);
        // Center filled, sharp corner pixels left as background
        assert_eq!(s.get(20, 20), FGCOLOR);
        assert_eq!(s.get(10, 10), BGCOLOR);
        assert_eq!(s.get(29, 10), BGCOLOR);
        assert_eq!(s.get(10, 29), BGCOLOR);
        assert_eq!(s.get(29, 29), BGCOLOR);
        // Edge midpoints are filled
        assert_eq!(s.get(10, 20), FGCOLOR);
        assert_eq!(s.get(29, 20), FGCOLOR);
        assert_eq!(s.get(20, 10), FGCOLOR);
    }

    #[test]
    fn rounded_rect_clamps_oversized_radius() {
        let mut s = MemorySurface::new(20, 20);
        s.fill(BGCOLOR);
        fill_rounded_rect(&mut s, 2, 2, 8, 8, 100, FGCOLOR);
        assert_eq!(s.get(6, 6), FGCOLOR);
    }

    #[test]
    fn triangle_fills_interior_and_vertices() {
        let mut s = MemorySurface::new(20, 20);
        s.fill(BGCOLOR);
        fill_triangle(&mut s, 0, 0, 10, 0, 0, 10, FGCOLOR);
        assert_eq!(s.get(0, 0), FGCOLOR);
        assert_eq!(s.get(2, 2), FGCOLOR);
        assert_eq!(s.get(9, 9), BGCOLOR);
        assert_eq!(s.get(12, 0), BGCOLOR);
    }

    #[test]
    fn degenerate_triangle_is_one_scanline() {
        let mut s = MemorySurface::new(20, 20);
        s.fill(BGCOLOR);
        fill_triangle(&mut s, 2, 5, 8, 5, 5, 5, FGCOLOR);
        for x in 2..=8 {
            assert_eq!(s.get(x, 5), FGCOLOR);
        }
        assert_eq!(s.get(5, 6), BGCOLOR);
    }

    #[test]
    fn offscreen_shapes_do_not_panic() {
        let mut s = MemorySurface::new(10, 10);
        fill_rounded_rect(&mut s, -20, -20, 15, 15, 4, FGCOLOR);
        fill_triangle(&mut s, -5, -5, 30, -2, 5, 30, FGCOLOR);
    }
}
