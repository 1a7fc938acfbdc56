use std::ops::Add;

use glam::{Vec3, Vec4};
use thiserror::Error;

/// Per-vertex attribute arrays of a mesh under construction.
///
/// Every non-empty attribute array has the same length (the vertex count).
/// Positions are stored either plain (`positions`) or homogeneous
/// (`positions_h`), never both. `indices` is optional; without it the
/// vertices are drawn in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuilder {
    pub positions: Vec<Vec3>,
    pub positions_h: Vec<Vec4>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<[u8; 4]>,
    pub shininess: Vec<f32>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshValidationError {
    #[error("attribute `{attribute}` has {found} entries, expected {expected}")]
    InconsistentLength {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("mesh defines both plain and homogeneous positions")]
    MixedPositions,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the attribute invariants and returns the vertex count.
    pub fn validate(&self) -> Result<usize, MeshValidationError> {
        if !self.positions.is_empty() && !self.positions_h.is_empty() {
            return Err(MeshValidationError::MixedPositions);
        }

        let sizes = [
            ("positions", self.positions.len()),
            ("positions_h", self.positions_h.len()),
            ("normals", self.normals.len()),
            ("colors", self.colors.len()),
            ("shininess", self.shininess.len()),
        ];
        let expected = sizes.iter().map(|&(_, n)| n).max().unwrap_or(0);

        match sizes.iter().find(|&&(_, n)| n != 0 && n != expected) {
            Some(&(attribute, found)) => Err(MeshValidationError::InconsistentLength {
                attribute,
                expected,
                found,
            }),
            None => Ok(expected),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.validate().unwrap_or(0)
    }

    fn is_homogeneous(&self) -> bool {
        self.positions.is_empty() && !self.positions_h.is_empty()
    }

    /// Concatenates `other` after `self`.
    ///
    /// Attributes present on one side only are zero-filled on the other.
    /// Plain positions are promoted to homogeneous (`w = 1`) when either side
    /// is homogeneous. If either side has indices, the result is indexed: an
    /// unindexed side gets sequential indices and the second side's indices
    /// are offset by the first side's vertex count.
    pub fn concat(&self, other: &MeshBuilder) -> Result<MeshBuilder, MeshValidationError> {
        let n1 = self.validate()?;
        let n2 = other.validate()?;

        let mut out = MeshBuilder::new();

        if self.is_homogeneous() || other.is_homogeneous() {
            let promote = |m: &MeshBuilder| -> Vec<Vec4> {
                if m.is_homogeneous() {
                    m.positions_h.clone()
                } else {
                    m.positions.iter().map(|p| p.extend(1.0)).collect()
                }
            };
            out.positions_h = join(&promote(self), n1, &promote(other), n2);
        } else {
            out.positions = join(&self.positions, n1, &other.positions, n2);
        }

        out.normals = join(&self.normals, n1, &other.normals, n2);
        out.colors = join(&self.colors, n1, &other.colors, n2);
        out.shininess = join(&self.shininess, n1, &other.shininess, n2);

        if !self.indices.is_empty() || !other.indices.is_empty() {
            let offset = n1 as u32;
            out.indices = sequential_or(&self.indices, n1)
                .chain(sequential_or(&other.indices, n2).map(|i| i + offset))
                .collect();
        }

        Ok(out)
    }

    /// In-place form of [`concat`](Self::concat) (`+=`).
    pub fn append(&mut self, other: &MeshBuilder) -> Result<(), MeshValidationError> {
        *self = self.concat(other)?;
        Ok(())
    }

    /// Index list to draw with; sequential when the builder is unindexed.
    pub fn draw_indices(&self) -> Vec<u32> {
        sequential_or(&self.indices, self.vertex_count()).collect()
    }
}

/// Joins two attribute arrays of expected lengths `n1` and `n2`. An empty side
/// is zero-filled unless both are empty.
fn join<T: Copy + Default>(a: &[T], n1: usize, b: &[T], n2: usize) -> Vec<T> {
    if a.is_empty() && b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![T::default(); n1 + n2];
    out[..a.len()].copy_from_slice(a);
    out[n1..n1 + b.len()].copy_from_slice(b);
    out
}

fn sequential_or(indices: &[u32], vertex_count: usize) -> Box<dyn Iterator<Item = u32> + '_> {
    if indices.is_empty() {
        Box::new(0..vertex_count as u32)
    } else {
        Box::new(indices.iter().copied())
    }
}

impl Add<&MeshBuilder> for &MeshBuilder {
    type Output = Result<MeshBuilder, MeshValidationError>;

    fn add(self, rhs: &MeshBuilder) -> Self::Output {
        self.concat(rhs)
    }
}

impl Add for MeshBuilder {
    type Output = Result<MeshBuilder, MeshValidationError>;

    fn add(self, rhs: MeshBuilder) -> Self::Output {
        self.concat(&rhs)
    }
}
