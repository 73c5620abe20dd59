//! Renders task results as PNG images.
//!
//! Colours for escape counts are picked the first time a count is seen and
//! remembered in a [`Palette`] that lives for one render only.

use std::collections::HashMap;

use compute_tasks::{City, EscapeCountGrid, Tour};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Errors raised while rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Encoding or writing the image failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Tour and cities do not fit together
    #[error("invalid tour: {0}")]
    InvalidTour(String),
}

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

const MARGIN: i64 = 10;
const VERTEX_DIAMETER: i64 = 6;

/// Colour assignment for escape counts, scoped to one render.
///
/// Seeded from the iteration limit, so rendering the same grid twice gives
/// the same picture.
#[derive(Debug, Clone)]
pub struct Palette {
    in_set: u32,
    colors: HashMap<u32, Rgb<u8>>,
    rng: StdRng,
}

impl Palette {
    /// Palette where `iteration_limit` maps to black.
    pub fn new(iteration_limit: u32) -> Self {
        Self {
            in_set: iteration_limit,
            colors: HashMap::new(),
            rng: StdRng::seed_from_u64(u64::from(iteration_limit)),
        }
    }

    /// Colour for count `k`.
    pub fn color(&mut self, k: u32) -> Rgb<u8> {
        if k == self.in_set {
            return BLACK;
        }
        let rng = &mut self.rng;
        *self
            .colors
            .entry(k)
            .or_insert_with(|| Rgb(rng.random::<[u8; 3]>()))
    }

    /// Number of counts that have a colour assigned.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no colour has been assigned yet.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// One pixel per cell: `x` is the first grid index, `y` the second.
pub fn render_grid(grid: &EscapeCountGrid) -> RgbImage {
    let n = grid.resolution();
    let mut image = RgbImage::from_pixel(n, n, BLACK);
    let mut palette = Palette::new(grid.iteration_limit());

    for (i, row) in grid.rows().iter().enumerate() {
        for (j, &k) in row.iter().enumerate() {
            image.put_pixel(i as u32, j as u32, palette.color(k));
        }
    }
    image
}

/// Draw the closed tour over `cities` on a `size`×`size` canvas.
///
/// Cities are scaled into a unit square and placed inside a 10 pixel
/// margin. Edges are blue, cities red.
pub fn render_tour(cities: &[City], tour: &Tour, size: u32) -> Result<RgbImage, RenderError> {
    if tour.order.len() != cities.len() {
        return Err(RenderError::InvalidTour(format!(
            "tour visits {} cities, expected {}",
            tour.order.len(),
            cities.len()
        )));
    }
    if let Some(&bad) = tour.order.iter().find(|&&c| c >= cities.len()) {
        return Err(RenderError::InvalidTour(format!("no city {}", bad)));
    }

    let mut image = RgbImage::from_pixel(size, size, WHITE);
    if cities.is_empty() {
        return Ok(image);
    }

    let (min_x, max_x) = bounds(cities.iter().map(|c| c.x));
    let (min_y, max_y) = bounds(cities.iter().map(|c| c.y));
    let side = (max_x - min_x).max(max_y - min_y);
    let side = if side > 0.0 { side } else { 1.0 };
    let field = (i64::from(size) - 2 * MARGIN).max(0) as f64;

    let place = |c: &City| -> (i64, i64) {
        (
            MARGIN + ((c.x - min_x) / side * field) as i64,
            MARGIN + ((c.y - min_y) / side * field) as i64,
        )
    };

    let n = tour.order.len();
    for i in 0..n {
        let from = place(&cities[tour.order[i]]);
        let to = place(&cities[tour.order[(i + 1) % n]]);
        draw_line(&mut image, from, to, BLUE);
    }
    for city in cities {
        fill_disc(&mut image, place(city), VERTEX_DIAMETER, RED);
    }

    Ok(image)
}

/// Set one pixel; out-of-bounds coordinates are clipped.
fn plot(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
        return;
    }
    image.put_pixel(x as u32, y as u32, color);
}

/// Bresenham line from `from` to `to`, both ends included.
fn draw_line(image: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(image, x, y, color);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_disc(image: &mut RgbImage, center: (i64, i64), diameter: i64, color: Rgb<u8>) {
    let r = diameter / 2;
    for y in -r..=r {
        for x in -r..=r {
            if x * x + y * y <= r * r {
                plot(image, center.0 + x, center.1 + y, color);
            }
        }
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
