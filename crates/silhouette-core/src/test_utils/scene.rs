#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use rand::Rng;

use super::{Stance, add_gaussian_noise, draw_person, head_rect};
use crate::image::{ImageBuffer, Rect};

/// Minimum free space kept between two figures.
const PERSON_GAP: usize = 8;

/// A figure placed in a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonPlacement {
    /// Bounding box in frame coordinates.
    pub rect: Rect,
    /// Leg layout.
    pub stance: Stance,
    /// Gray level of torso and legs.
    pub body_gray: u8,
    /// Gray level of the head.
    pub head_gray: u8,
}

impl PersonPlacement {
    /// Figure with the default shading (body 160, head 230).
    pub fn new(rect: Rect, stance: Stance) -> Self {
        Self {
            rect,
            stance,
            body_gray: 160,
            head_gray: 230,
        }
    }

    /// Head rectangle in frame coordinates.
    pub fn head(&self) -> Rect {
        head_rect(self.rect)
    }

    /// Head centroid relative to the bounding box.
    pub fn head_center(&self) -> (f64, f64) {
        let head = self.head();
        (
            (head.x - self.rect.x) as f64 + (head.width - 1) as f64 / 2.0,
            (head.y - self.rect.y) as f64 + (head.height - 1) as f64 / 2.0,
        )
    }
}

/// A rendered frame with the empty background it was drawn on.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Frame containing the figures.
    pub frame: ImageBuffer,
    /// The same frame without figures or noise.
    pub background: ImageBuffer,
    /// Figures in insertion order.
    pub people: Vec<PersonPlacement>,
}

/// A builder for multi-person scenes.
pub struct SceneBuilder {
    width: usize,
    height: usize,
    people: Vec<PersonPlacement>,
    background_gray: u8,
    noise_sigma: f64,
}

impl SceneBuilder {
    /// Create a new scene builder with given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            people: Vec::new(),
            background_gray: 20,
            noise_sigma: 0.0,
        }
    }

    /// Set the background gray level (0-255).
    pub fn with_background(mut self, gray: u8) -> Self {
        self.background_gray = gray;
        self
    }

    /// Set the standard deviation of the noise added to the frame.
    pub fn with_noise(mut self, sigma: f64) -> Self {
        self.noise_sigma = sigma;
        self
    }

    /// Add a figure if it fits in the frame and keeps clear of the others.
    pub fn add_person(&mut self, placement: PersonPlacement) -> bool {
        if !placement.rect.fits_within(self.width, self.height) {
            return false;
        }
        let r = placement.rect;
        let clear = self.people.iter().all(|p| {
            let o = p.rect;
            r.x >= o.x + o.width + PERSON_GAP
                || o.x >= r.x + r.width + PERSON_GAP
                || r.y >= o.y + o.height + PERSON_GAP
                || o.y >= r.y + r.height + PERSON_GAP
        });
        if clear {
            self.people.push(placement);
        }
        clear
    }

    /// Add a random figure whose height lies in `height_range`.
    ///
    /// Figures are 2/5 as wide as they are tall. Gives up after 100 rejected
    /// positions.
    pub fn add_random_person<R: Rng>(&mut self, rng: &mut R, height_range: (usize, usize)) -> bool {
        let (min_h, max_h) = height_range;
        for _ in 0..100 {
            let height = rng.gen_range(min_h..=max_h);
            let width = height * 2 / 5;
            if width + 2 >= self.width || height + 2 >= self.height {
                continue;
            }
            let x = rng.gen_range(1..self.width - width - 1);
            let y = rng.gen_range(1..self.height - height - 1);
            let stance = if rng.gen_bool(0.5) {
                Stance::Front
            } else {
                Stance::Side
            };
            if self.add_person(PersonPlacement::new(Rect::new(x, y, width, height), stance)) {
                return true;
            }
        }
        false
    }

    /// Render the frame, then add noise to it (the background stays clean).
    pub fn build<R: Rng>(self, rng: &mut R) -> Scene {
        let mut background = ImageBuffer::new(self.width, self.height);
        background.fill_rect(Rect::new(0, 0, self.width, self.height), self.background_gray);

        let mut frame = background.clone();
        for p in &self.people {
            draw_person(&mut frame, p.rect, p.stance, p.body_gray, p.head_gray);
        }
        add_gaussian_noise(frame.as_mut_slice(), self.noise_sigma, rng);

        Scene {
            frame,
            background,
            people: self.people,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_overlap_rejected() {
        let mut builder = SceneBuilder::new(200, 120);
        let a = PersonPlacement::new(Rect::new(10, 10, 30, 80), Stance::Front);
        assert!(builder.add_person(a));
        let b = PersonPlacement::new(Rect::new(44, 10, 30, 80), Stance::Side);
        assert!(!builder.add_person(b));
        let c = PersonPlacement::new(Rect::new(48, 10, 30, 80), Stance::Side);
        assert!(builder.add_person(c));
        let outside = PersonPlacement::new(Rect::new(180, 10, 30, 80), Stance::Side);
        assert!(!builder.add_person(outside));
    }

    #[test]
    fn test_build_draws_people() {
        let mut builder = SceneBuilder::new(100, 100).with_background(40);
        let p = PersonPlacement::new(Rect::new(20, 10, 30, 80), Stance::Front);
        builder.add_person(p);
        let scene = builder.build(&mut rand::rngs::StdRng::seed_from_u64(1));
        assert_eq!(scene.background.get(25, 50), 40);
        assert_eq!(scene.frame.get(25, 50), 160);
        assert_eq!(scene.frame.get(5, 5), 40);
        let (hx, hy) = p.head_center();
        assert_eq!(scene.frame.get(20 + hx as usize, 10 + hy as usize), 230);
    }
}
