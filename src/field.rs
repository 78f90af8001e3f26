//! Dense per-pixel grids used for the priority image and the auxiliary
//! per-pixel state of priority strategies

use crate::errors::{InvalidRange, OutOfBounds};
use crate::{Coord, Dims, Error};

/// A grid of one value per pixel
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T> {
    dims: Dims,
    data: Vec<T>,
}

/// Per-pixel scalar values, eg. priorities or confidences
pub type ScalarField = Field<f32>;
/// Per-pixel 2D vectors, eg. isophotes or boundary normals
pub type VectorField = Field<[f32; 2]>;
/// Per-pixel flags, eg. the fill front
pub type BinaryField = Field<bool>;

impl<T: Clone> Field<T> {
    pub fn new(dims: Dims, value: T) -> Self {
        Self {
            dims,
            data: vec![value; dims.pixel_count()],
        }
    }

    /// Sets every pixel back to `value`
    pub fn fill(&mut self, value: T) {
        for v in self.data.iter_mut() {
            *v = value.clone();
        }
    }
}

impl<T> Field<T> {
    /// Wraps an existing row-major buffer, which must have exactly one value
    /// per pixel
    pub fn from_vec(dims: Dims, data: Vec<T>) -> Result<Self, Error> {
        if data.len() != dims.pixel_count() {
            return Err(Error::InvalidRange(InvalidRange {
                min: dims.pixel_count() as f32,
                max: dims.pixel_count() as f32,
                value: data.len() as f32,
                name: "field-length",
            }));
        }

        Ok(Self { dims, data })
    }

    #[inline]
    pub fn dims(&self) -> Dims {
        self.dims
    }

    #[inline]
    pub fn get(&self, coord: Coord) -> &T {
        &self.data[coord.to_flat(self.dims)]
    }

    #[inline]
    pub fn get_mut(&mut self, coord: Coord) -> &mut T {
        let idx = coord.to_flat(self.dims);
        &mut self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, coord: Coord, value: T) {
        *self.get_mut(coord) = value;
    }

    /// Bounds checked access
    pub fn try_get(&self, coord: Coord) -> Result<&T, Error> {
        if self.dims.contains(coord) {
            Ok(self.get(coord))
        } else {
            Err(Error::OutOfBounds(OutOfBounds::Coord(coord, self.dims)))
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Every pixel with its value, in raster order
    pub fn enumerate(&self) -> impl Iterator<Item = (Coord, &T)> + '_ {
        let dims = self.dims;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (Coord::from_flat(i, dims), v))
    }
}

impl BinaryField {
    /// Number of pixels that are set
    pub fn count(&self) -> usize {
        self.data.iter().filter(|b| **b).count()
    }

    /// Coordinates of the set pixels, in raster order
    pub fn set_coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.enumerate().filter(|(_, b)| **b).map(|(c, _)| c)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_vec_checks_len() {
        assert!(Field::from_vec(Dims::new(2, 2), vec![0.0f32; 3]).is_err());

        let f = Field::from_vec(Dims::new(2, 2), vec![0.0f32, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(*f.get(Coord::new(1, 1)), 3.0);
        assert!(f.try_get(Coord::new(2, 0)).is_err());
    }

    #[test]
    fn binary_field_counts_set_pixels() {
        let mut f = BinaryField::new(Dims::new(3, 3), false);
        f.set(Coord::new(2, 0), true);
        f.set(Coord::new(0, 2), true);

        assert_eq!(f.count(), 2);
        assert_eq!(
            f.set_coords().collect::<Vec<_>>(),
            vec![Coord::new(2, 0), Coord::new(0, 2)]
        );
    }
}
