//! Procedural stacked-box terrain.
//!
//! A layout is generated in three steps:
//!
//! 1. a Poisson-distributed number of rectangular seeds, each with a random
//!    footprint, position and height, is stamped onto a height grid (later
//!    seeds overwrite earlier ones);
//! 2. two diagonal sweeps raise every cell to at least one less than its
//!    neighbours, first from the top-left, then from the bottom-right, so
//!    that 4-adjacent columns never differ by more than one level;
//! 3. each column emits its top box, except border columns which emit the
//!    whole stack since their sides face the room.

use glam::Vec3;
use rand::Rng;
use rand_distr::{Distribution, Exp, ExpError, Poisson, PoissonError};
use thiserror::Error;

use crate::mesh::{shapes, MeshBuilder};

use super::palette::BOX_COLORS;

// ── parameters ────────────────────────────────────────────────────────────

/// Shape of the generated terrain.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Cells along x.
    pub grid_width: usize,
    /// Cells along z.
    pub grid_height: usize,
    /// Tallest seed stack.
    pub max_stacked: u32,
    /// Mean number of seeds.
    pub average_seeds: f64,
    /// Longest side of a seed footprint.
    pub max_seed_size: usize,
    /// Specular strength of every box.
    pub box_specular: f32,
    /// Mean of the exponential shininess distribution.
    pub mean_shininess: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            grid_width: 8,
            grid_height: 6,
            max_stacked: 4,
            average_seeds: 3.7,
            max_seed_size: 4,
            box_specular: 0.125,
            mean_shininess: 6.5,
        }
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("seed footprint up to {size} does not fit a {width}x{height} grid")]
    SeedTooLarge { size: usize, width: usize, height: usize },

    #[error("max_stacked must be at least 1")]
    NoHeight,

    #[error("invalid average seed count: {0}")]
    SeedCount(#[from] PoissonError),

    #[error("invalid mean shininess: {0}")]
    Shininess(#[from] ExpError),
}

impl LayoutParams {
    pub fn validate(&self) -> Result<(), LayoutError> {
        let fits = self.max_seed_size >= 1
            && self.max_seed_size <= self.grid_width
            && self.max_seed_size <= self.grid_height;
        if !fits {
            return Err(LayoutError::SeedTooLarge {
                size: self.max_seed_size,
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.max_stacked == 0 {
            return Err(LayoutError::NoHeight);
        }
        Ok(())
    }
}

// ── height grid ───────────────────────────────────────────────────────────

/// Column heights, row-major with `i` along x and `j` along z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl HeightGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[j * self.width + i]
    }

    pub fn set(&mut self, i: usize, j: usize, value: u32) {
        self.cells[j * self.width + i] = value;
    }

    /// Overwrites a `w` x `h` rectangle whose corner is `(x, y)`.
    pub fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, value: u32) {
        for j in y..y + h {
            for i in x..x + w {
                self.set(i, j, value);
            }
        }
    }

    /// One less than a non-empty neighbour, or 0.
    fn influence(neighbour: u32) -> u32 {
        neighbour.saturating_sub(1)
    }

    /// Raises each cell to the influence of its left and upper neighbours,
    /// walking from the top-left corner.
    pub fn propagate_forward(&mut self) {
        for j in 0..self.height {
            for i in 0..self.width {
                let left = if i == 0 { 0 } else { Self::influence(self.get(i - 1, j)) };
                let up = if j == 0 { 0 } else { Self::influence(self.get(i, j - 1)) };
                let cell = self.get(i, j).max(left).max(up);
                self.set(i, j, cell);
            }
        }
    }

    /// Raises each cell to the influence of its right and lower neighbours,
    /// walking from the bottom-right corner.
    pub fn propagate_backward(&mut self) {
        for j in (0..self.height).rev() {
            for i in (0..self.width).rev() {
                let right = if i + 1 == self.width { 0 } else { Self::influence(self.get(i + 1, j)) };
                let down = if j + 1 == self.height { 0 } else { Self::influence(self.get(i, j + 1)) };
                let cell = self.get(i, j).max(right).max(down);
                self.set(i, j, cell);
            }
        }
    }

    pub fn propagate(&mut self) {
        self.propagate_forward();
        self.propagate_backward();
    }

    pub fn is_border(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i + 1 == self.width || j + 1 == self.height
    }

    /// Largest height difference between 4-adjacent cells.
    pub fn max_step(&self) -> u32 {
        let mut step = 0;
        for j in 0..self.height {
            for i in 0..self.width {
                let h = self.get(i, j);
                if i + 1 < self.width {
                    step = step.max(h.abs_diff(self.get(i + 1, j)));
                }
                if j + 1 < self.height {
                    step = step.max(h.abs_diff(self.get(i, j + 1)));
                }
            }
        }
        step
    }
}

// ── generation ────────────────────────────────────────────────────────────

/// One unit cube of the terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxPlacement {
    /// Cell `(i, level, j)`; the cube spans `cell..cell + 1`.
    pub cell: [u32; 3],
    pub color: [u8; 4],
    pub shininess: f32,
}

impl BoxPlacement {
    pub fn mesh(&self) -> MeshBuilder {
        let min = Vec3::from(self.cell.map(|c| c as f32));
        shapes::with_parameters(shapes::cube(min, min + Vec3::ONE), self.color, self.shininess)
    }
}

#[derive(Debug, Clone)]
pub struct BoxLayout {
    pub grid: HeightGrid,
    pub boxes: Vec<BoxPlacement>,
}

impl BoxLayout {
    pub fn generate<R: Rng + ?Sized>(params: &LayoutParams, rng: &mut R) -> Result<Self, LayoutError> {
        let mut grid = seed_grid(params, rng)?;
        grid.propagate();
        let boxes = emit_boxes(&grid, params, rng)?;
        Ok(Self { grid, boxes })
    }

    /// All boxes as one mesh.
    pub fn mesh(&self) -> MeshBuilder {
        let mut mesh = MeshBuilder::new();
        for b in &self.boxes {
            // Every cube carries the same attribute set, so this cannot fail.
            if let Err(err) = mesh.append(&b.mesh()) {
                log::error!("dropping box at {:?}: {err}", b.cell);
            }
        }
        mesh
    }
}

/// Stamps the random seeds onto an empty grid.
pub fn seed_grid<R: Rng + ?Sized>(params: &LayoutParams, rng: &mut R) -> Result<HeightGrid, LayoutError> {
    params.validate()?;
    let count = Poisson::new(params.average_seeds)?.sample(rng) as usize;

    let mut grid = HeightGrid::new(params.grid_width, params.grid_height);
    for _ in 0..count {
        let w = rng.gen_range(1..=params.max_seed_size);
        let h = rng.gen_range(1..=params.max_seed_size);
        let x = rng.gen_range(0..=params.grid_width - w);
        let y = rng.gen_range(0..=params.grid_height - h);
        let stack = rng.gen_range(1..=params.max_stacked);
        grid.fill(x, y, w, h, stack);
    }
    log::debug!("stamped {count} seeds");
    Ok(grid)
}

/// Emits the visible cubes of a propagated grid.
pub fn emit_boxes<R: Rng + ?Sized>(
    grid: &HeightGrid,
    params: &LayoutParams,
    rng: &mut R,
) -> Result<Vec<BoxPlacement>, LayoutError> {
    let shininess = Exp::new(1.0 / params.mean_shininess)?;
    let mut boxes = Vec::new();
    for j in 0..grid.height() {
        for i in 0..grid.width() {
            let h = grid.get(i, j);
            if h == 0 {
                continue;
            }
            let bottom = if grid.is_border(i, j) { 0 } else { h - 1 };
            for k in bottom..h {
                let color = BOX_COLORS[rng.gen_range(0..BOX_COLORS.len())];
                boxes.push(BoxPlacement {
                    cell: [i as u32, k, j as u32],
                    color: color.with_specular(params.box_specular),
                    shininess: shininess.sample(rng),
                });
            }
        }
    }
    Ok(boxes)
}
