use image::imageops;

use crate::frame::{Dimensions, FrameBuffer, Pixel};

/// Square of side `size` around an annotated point.
///
/// With `start = size / 2` and `end = size - start` the square covers
/// `[x - start, x + end) x [y - start, y + end)`, one pixel larger on the
/// positive side for odd sizes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoiSquare {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl RoiSquare {
    pub fn centered(point: mint::Point2<i32>, size: u32) -> Self {
        let d_start = (size / 2) as i64;
        let d_end = size as i64 - d_start;
        let (x, y) = (point.x as i64, point.y as i64);
        Self {
            left: x - d_start,
            top: y - d_start,
            right: x + d_end,
            bottom: y + d_end,
        }
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top) as u32
    }

    /// Part of the square lying inside a frame, as `(x, y, width, height)`.
    pub fn clip(&self, frame: Dimensions) -> Option<(u32, u32, u32, u32)> {
        let left = self.left.max(0);
        let top = self.top.max(0);
        let right = self.right.min(frame.width as i64);
        let bottom = self.bottom.min(frame.height as i64);
        if left >= right || top >= bottom {
            return None;
        }
        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }

    fn on_outline(&self, x: i64, y: i64, thickness: i64) -> bool {
        x < self.left + thickness
            || x >= self.right - thickness
            || y < self.top + thickness
            || y >= self.bottom - thickness
    }
}

/// Draws the outline of `square` onto `frame`, `thickness` pixels wide on
/// the inside of the square. Parts outside the frame are skipped.
pub fn draw_outline(frame: &mut FrameBuffer, square: &RoiSquare, color: Pixel, thickness: u32) {
    let dims = Dimensions::new(frame.width(), frame.height());
    let Some((x0, y0, w, h)) = square.clip(dims) else {
        return;
    };
    let thickness = thickness as i64;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            if square.on_outline(x as i64, y as i64, thickness) {
                frame.put_pixel(x, y, color);
            }
        }
    }
}

/// Copies the square out of `frame`. The patch always has the full size of
/// the square; pixels outside the frame are black.
pub fn crop_patch(frame: &FrameBuffer, square: &RoiSquare) -> FrameBuffer {
    let dims = Dimensions::new(frame.width(), frame.height());
    let Some((x0, y0, w, h)) = square.clip(dims) else {
        return FrameBuffer::new(square.width(), square.height());
    };

    let visible = imageops::crop_imm(frame, x0, y0, w, h).to_image();
    if w == square.width() && h == square.height() {
        return visible;
    }

    let mut patch = FrameBuffer::new(square.width(), square.height());
    let offset_x = (x0 as i64 - square.left) as u32;
    let offset_y = (y0 as i64 - square.top) as u32;
    for (x, y, pixel) in visible.enumerate_pixels() {
        patch.put_pixel(x + offset_x, y + offset_y, *pixel);
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    fn gradient(width: u32, height: u32) -> FrameBuffer {
        FrameBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 7]))
    }

    #[test]
    fn centering_even_size() {
        let square = RoiSquare::centered(mint::Point2 { x: 100, y: 100 }, 50);
        assert_eq!(
            square,
            RoiSquare {
                left: 75,
                top: 75,
                right: 125,
                bottom: 125
            }
        );
        assert_eq!((square.width(), square.height()), (50, 50));
    }

    #[test]
    fn centering_odd_size_extends_positive_side() {
        let square = RoiSquare::centered(mint::Point2 { x: 10, y: 20 }, 5);
        assert_eq!((square.left, square.right), (8, 13));
        assert_eq!((square.top, square.bottom), (18, 23));
    }

    #[test]
    fn crop_inside_frame_copies_pixels() {
        let frame = gradient(64, 48);
        let square = RoiSquare::centered(mint::Point2 { x: 20, y: 30 }, 10);
        let patch = crop_patch(&frame, &square);

        assert_eq!(patch.dimensions(), (10, 10));
        assert_eq!(*patch.get_pixel(0, 0), Rgb([15, 25, 7]));
        assert_eq!(*patch.get_pixel(9, 9), Rgb([24, 34, 7]));
    }

    #[test]
    fn crop_over_corner_is_padded_black() {
        let frame = gradient(64, 48);
        let square = RoiSquare::centered(mint::Point2 { x: 2, y: 1 }, 10);
        let patch = crop_patch(&frame, &square);

        assert_eq!(patch.dimensions(), (10, 10));
        assert_eq!(*patch.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*patch.get_pixel(2, 3), Rgb([0, 0, 0]));
        // frame pixel (0, 0) lands at (3, 4)
        assert_eq!(*patch.get_pixel(3, 4), Rgb([0, 0, 7]));
        assert_eq!(*patch.get_pixel(9, 9), Rgb([6, 5, 7]));
    }

    #[test]
    fn crop_outside_frame_is_black() {
        let frame = gradient(8, 8);
        let square = RoiSquare::centered(mint::Point2 { x: 100, y: 100 }, 4);
        let patch = crop_patch(&frame, &square);
        assert_eq!(patch.dimensions(), (4, 4));
        assert!(patch.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn outline_marks_border_only() {
        let mut frame = FrameBuffer::new(40, 40);
        let square = RoiSquare::centered(mint::Point2 { x: 20, y: 20 }, 10);
        draw_outline(&mut frame, &square, RED, 2);

        assert_eq!(*frame.get_pixel(15, 15), RED);
        assert_eq!(*frame.get_pixel(16, 20), RED);
        assert_eq!(*frame.get_pixel(24, 24), RED);
        assert_eq!(*frame.get_pixel(23, 20), RED);
        // interior and exterior untouched
        assert_eq!(*frame.get_pixel(17, 17), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(22, 22), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(14, 14), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(25, 25), Rgb([0, 0, 0]));
    }

    #[test]
    fn outline_is_clipped_at_frame_edge() {
        let mut frame = FrameBuffer::new(10, 10);
        let square = RoiSquare::centered(mint::Point2 { x: 9, y: 0 }, 6);
        draw_outline(&mut frame, &square, RED, 2);

        // right and top edges of the square lie outside the frame
        assert_eq!(*frame.get_pixel(6, 0), RED);
        assert_eq!(*frame.get_pixel(7, 0), RED);
        assert_eq!(*frame.get_pixel(8, 0), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(9, 2), RED);
    }
}
