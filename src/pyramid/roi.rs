//! Region of interest applied to the base image before the pyramid is built.
use crate::image::ImageF32;
use serde::{Deserialize, Serialize};

/// How the region of interest is chosen from the full image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoiSpec {
    /// Use the whole image.
    #[default]
    Full,
    /// Columns `[w/2 − half_width, w/2 + half_width)`, rows `[top, bottom)`,
    /// clipped to the image.
    CenteredWindow {
        half_width: usize,
        top: usize,
        bottom: usize,
    },
}

impl RoiSpec {
    /// The window used for the dental radiograph setup.
    pub fn radiograph() -> Self {
        RoiSpec::CenteredWindow {
            half_width: 400,
            top: 500,
            bottom: 1400,
        }
    }

    /// Resolve to pixel bounds for an image of `width × height`.
    pub fn resolve(&self, width: usize, height: usize) -> Roi {
        match *self {
            RoiSpec::Full => Roi {
                x0: 0,
                y0: 0,
                w: width,
                h: height,
            },
            RoiSpec::CenteredWindow {
                half_width,
                top,
                bottom,
            } => {
                let cx = width / 2;
                let x0 = cx.saturating_sub(half_width);
                let x1 = (cx + half_width).min(width);
                let y0 = top.min(height);
                let y1 = bottom.clamp(y0, height);
                Roi {
                    x0,
                    y0,
                    w: x1 - x0,
                    h: y1 - y0,
                }
            }
        }
    }
}

/// Resolved crop window in base-image pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x0: usize,
    pub y0: usize,
    pub w: usize,
    pub h: usize,
}

impl Roi {
    /// Top-left corner; add it to cropped coordinates to get image coordinates.
    pub fn offset(&self) -> [f64; 2] {
        [self.x0 as f64, self.y0 as f64]
    }

    pub fn crop(&self, image: &ImageF32) -> ImageF32 {
        image.crop(self.x0, self.y0, self.w, self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_covers_image() {
        let roi = RoiSpec::Full.resolve(30, 20);
        assert_eq!(roi, Roi { x0: 0, y0: 0, w: 30, h: 20 });
        assert_eq!(roi.offset(), [0.0, 0.0]);
    }

    #[test]
    fn centered_window_is_clipped() {
        let roi = RoiSpec::radiograph().resolve(1000, 1200);
        assert_eq!(roi, Roi { x0: 100, y0: 500, w: 800, h: 700 });

        let small = RoiSpec::radiograph().resolve(300, 400);
        assert_eq!(small.x0, 0);
        assert_eq!(small.w, 300);
        assert_eq!(small.h, 0);
    }
}
