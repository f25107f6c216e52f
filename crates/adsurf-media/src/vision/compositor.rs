//! Perspective compositing of the logo into a destination quadrilateral.

use adsurf_models::{Quad, StableContour};
use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::point::Point as PixelPoint;

use crate::error::{MediaError, MediaResult};
use crate::image_io::Logo;

#[derive(Debug, Clone)]
pub struct Compositor {
    logo: Logo,
}

impl Compositor {
    pub fn new(logo: Logo) -> Self {
        Self { logo }
    }

    pub fn logo(&self) -> &Logo {
        &self.logo
    }

    /// Composite into `frame` using the canonical quad stored for exactly
    /// `frame_index` in `contour`.
    pub fn composite(&self, frame: &mut RgbImage, frame_index: u64, contour: &StableContour) -> MediaResult<()> {
        let quad = contour
            .quad_at(frame_index)
            .ok_or(MediaError::FrameNotInContour(frame_index))?;
        self.composite_quad(frame, quad)
    }

    /// Warp the logo onto `quad` (TL, BL, BR, TR) and blend it into `frame`.
    pub fn composite_quad(&self, frame: &mut RgbImage, quad: &Quad) -> MediaResult<()> {
        let projection = self.projection(quad)?;
        let (width, height) = frame.dimensions();

        match &self.logo {
            Logo::Rgba(logo) => {
                let mut warped = RgbaImage::new(width, height);
                warp_into(logo, &projection, Interpolation::Nearest, Rgba([0, 0, 0, 0]), &mut warped);
                blend_alpha(frame, &warped);
            }
            Logo::Rgb(logo) => {
                let mut warped = RgbImage::new(width, height);
                warp_into(logo, &projection, Interpolation::Nearest, Rgb([0, 0, 0]), &mut warped);
                let mask = quad_mask(quad, width, height)?;
                copy_masked(frame, &warped, &mask);
            }
        }
        Ok(())
    }

    /// Map logo corners (0,0), (0,h-1), (w-1,h-1), (w-1,0) onto `quad`.
    fn projection(&self, quad: &Quad) -> MediaResult<Projection> {
        let w = self.logo.width() as f32 - 1.0;
        let h = self.logo.height() as f32 - 1.0;
        let from = [(0.0, 0.0), (0.0, h), (w, h), (w, 0.0)];
        let to = quad.corners.map(|p| (p.x as f32, p.y as f32));
        Projection::from_control_points(from, to)
            .ok_or_else(|| MediaError::degenerate("perspective transform is not invertible"))
    }
}

/// `out = warped * a + dst * (1 - a)` with `a = alpha / 255`.
fn blend_alpha(frame: &mut RgbImage, warped: &RgbaImage) {
    for (dst, src) in frame.pixels_mut().zip(warped.pixels()) {
        let a = src[3] as u32;
        match a {
            0 => {}
            255 => *dst = Rgb([src[0], src[1], src[2]]),
            _ => {
                for c in 0..3 {
                    dst[c] = ((src[c] as u32 * a + dst[c] as u32 * (255 - a) + 127) / 255) as u8;
                }
            }
        }
    }
}

/// Filled binary mask of the destination quad.
fn quad_mask(quad: &Quad, width: u32, height: u32) -> MediaResult<GrayImage> {
    let mut poly: Vec<PixelPoint<i32>> = Vec::with_capacity(4);
    for p in quad.corners {
        let pt = PixelPoint::new(p.x.round() as i32, p.y.round() as i32);
        if poly.last() != Some(&pt) {
            poly.push(pt);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return Err(MediaError::degenerate("destination quad collapses to a line"));
    }

    let mut mask = GrayImage::new(width, height);
    draw_polygon_mut(&mut mask, &poly, Luma([255]));
    Ok(mask)
}

fn copy_masked(frame: &mut RgbImage, warped: &RgbImage, mask: &GrayImage) {
    for ((dst, src), m) in frame.pixels_mut().zip(warped.pixels()).zip(mask.pixels()) {
        if m[0] > 0 {
            *dst = *src;
        }
    }
}
