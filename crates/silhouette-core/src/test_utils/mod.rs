//! Synthetic people for tests and benchmarks.
//!
//! Figures are flat-shaded: a bright head above a torso and legs, drawn
//! inside a bounding rectangle. Everything here is deterministic given the
//! random number generator passed in.

/// Multi-person frames with a matching background plate.
pub mod scene;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::image::{ImageBuffer, Rect};

/// Leg layout of a synthetic figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stance {
    /// Facing the camera: two legs with a gap between them.
    Front,
    /// Seen from the side: a single central leg column.
    Side,
}

impl Stance {
    /// Dataset label used for this stance.
    #[must_use]
    pub fn label(self) -> u8 {
        match self {
            Self::Front => 0,
            Self::Side => 1,
        }
    }
}

/// Head rectangle of a figure whose bounding box is `rect`.
#[must_use]
pub fn head_rect(rect: Rect) -> Rect {
    let head_h = (rect.height / 5).max(3);
    let head_w = (rect.width * 2 / 5).max(5).min(rect.width);
    Rect::new(rect.x + (rect.width - head_w) / 2, rect.y, head_w, head_h)
}

/// Draw a figure filling the bounding box `rect`.
///
/// The torso spans the full width, so the drawn pixels touch every edge of
/// `rect`.
pub fn draw_person(img: &mut ImageBuffer, rect: Rect, stance: Stance, body_gray: u8, head_gray: u8) {
    let head = head_rect(rect);
    img.fill_rect(head, head_gray);

    let torso_y = rect.y + head.height;
    let torso_h = (rect.height - head.height) / 2;
    img.fill_rect(Rect::new(rect.x, torso_y, rect.width, torso_h), body_gray);

    let legs_y = torso_y + torso_h;
    let legs_h = rect.y + rect.height - legs_y;
    match stance {
        Stance::Front => {
            let leg_w = rect.width / 3;
            img.fill_rect(Rect::new(rect.x, legs_y, leg_w, legs_h), body_gray);
            img.fill_rect(
                Rect::new(rect.x + rect.width - leg_w, legs_y, leg_w, legs_h),
                body_gray,
            );
        }
        Stance::Side => {
            let leg_w = rect.width / 2;
            img.fill_rect(
                Rect::new(rect.x + rect.width / 4, legs_y, leg_w, legs_h),
                body_gray,
            );
        }
    }
}

/// A background-free crop of a single figure, as stored in datasets.
#[must_use]
pub fn person_crop(stance: Stance, width: usize, height: usize) -> ImageBuffer {
    let mut img = ImageBuffer::new(width, height);
    draw_person(&mut img, Rect::new(0, 0, width, height), stance, 160, 230);
    img
}

/// Add zero-mean Gaussian noise with standard deviation `sigma`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc
)]
pub fn add_gaussian_noise<R: Rng + ?Sized>(data: &mut [u8], sigma: f64, rng: &mut R) {
    if sigma <= 0.0 {
        return;
    }
    let normal = Normal::new(0.0, sigma).expect("Invalid noise params");
    for pixel in data {
        let noise = normal.sample(rng).round() as i32;
        *pixel = (i32::from(*pixel) + noise).clamp(0, 255) as u8;
    }
}
