use crate::errors::OutOfBounds;
use crate::field::{BinaryField, Field};
use crate::{Coord, Dims, Error, Region};

/// Classification of a single mask pixel
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelState {
    /// Missing content that needs to be synthesized
    Hole,
    /// Known content, usable both as ground truth and as a copy source
    Valid,
    /// Don't care, neither filled nor copied from
    Unknown,
}

/// Which neighbors of a pixel are considered adjacent
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::Four
    }
}

const FOUR_NEIGHBORS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
const EIGHT_NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl Connectivity {
    #[inline]
    pub(crate) fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Self::Four => &FOUR_NEIGHBORS,
            Self::Eight => &EIGHT_NEIGHBORS,
        }
    }
}

/// How grayscale mask images map to pixel states
#[derive(Copy, Clone, Debug)]
pub enum MaskConvention {
    /// Values below the threshold are holes, everything else is valid
    Threshold(u8),
    /// Exact values for holes and valid pixels, anything else is unknown
    Exact { hole: u8, valid: u8 },
}

impl Default for MaskConvention {
    fn default() -> Self {
        Self::Threshold(128)
    }
}

/// Hole/valid classification of every pixel of the image being inpainted
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    states: Field<PixelState>,
    connectivity: Connectivity,
}

impl Mask {
    /// Creates a mask of the given size with every pixel valid
    pub fn new(dims: Dims) -> Self {
        Self {
            states: Field::new(dims, PixelState::Valid),
            connectivity: Connectivity::default(),
        }
    }

    /// Creates a mask by classifying every pixel with `f`
    pub fn from_fn<F: FnMut(Coord) -> PixelState>(dims: Dims, mut f: F) -> Self {
        let mut mask = Self::new(dims);
        for coord in Region::whole(dims).coords() {
            mask.states.set(coord, f(coord));
        }
        mask
    }

    /// Builds a mask from a grayscale image
    pub fn from_luma_image(img: &image::GrayImage, convention: MaskConvention) -> Self {
        let dims = Dims::new(img.width(), img.height());
        Self::from_fn(dims, |c| {
            let v = img.get_pixel(c.x, c.y)[0];
            match convention {
                MaskConvention::Threshold(t) => {
                    if v < t {
                        PixelState::Hole
                    } else {
                        PixelState::Valid
                    }
                }
                MaskConvention::Exact { hole, valid } => {
                    if v == hole {
                        PixelState::Hole
                    } else if v == valid {
                        PixelState::Valid
                    } else {
                        PixelState::Unknown
                    }
                }
            }
        })
    }

    /// Writes holes as black, valid pixels as white and unknown as gray
    pub fn to_luma_image(&self) -> image::GrayImage {
        let dims = self.dims();
        image::GrayImage::from_fn(dims.width, dims.height, |x, y| {
            let v = match self.state(Coord::new(x, y)) {
                PixelState::Hole => 0,
                PixelState::Valid => 255,
                PixelState::Unknown => 128,
            };
            image::Luma([v])
        })
    }

    /// Changes the adjacency used for boundary queries
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub(crate) fn set_connectivity(&mut self, connectivity: Connectivity) {
        self.connectivity = connectivity;
    }

    #[inline]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    #[inline]
    pub fn dims(&self) -> Dims {
        self.states.dims()
    }

    #[inline]
    pub(crate) fn state(&self, coord: Coord) -> PixelState {
        *self.states.get(coord)
    }

    /// Returns the state of a pixel
    pub fn get(&self, coord: Coord) -> Result<PixelState, Error> {
        self.states.try_get(coord).map(|s| *s)
    }

    pub fn is_hole(&self, coord: Coord) -> Result<bool, Error> {
        Ok(self.get(coord)? == PixelState::Hole)
    }

    pub fn is_valid(&self, coord: Coord) -> Result<bool, Error> {
        Ok(self.get(coord)? == PixelState::Valid)
    }

    #[inline]
    pub(crate) fn hole_at(&self, coord: Coord) -> bool {
        self.state(coord) == PixelState::Hole
    }

    #[inline]
    pub(crate) fn valid_at(&self, coord: Coord) -> bool {
        self.state(coord) == PixelState::Valid
    }

    /// True if every pixel of the region that lies inside the image is valid
    pub fn is_valid_region(&self, region: &Region) -> bool {
        match region.crop(self.dims()) {
            Some(cropped) => cropped.coords().all(|c| self.valid_at(c)),
            None => true,
        }
    }

    fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        let dims = self.dims();
        self.connectivity
            .offsets()
            .iter()
            .filter_map(move |(dx, dy)| coord.offset(*dx, *dy).to_unsigned(dims))
    }

    pub(crate) fn has_valid_neighbor(&self, coord: Coord) -> bool {
        self.neighbors(coord).any(|n| self.valid_at(n))
    }

    /// True if any adjacent pixel is a hole
    pub fn has_hole_neighbor(&self, coord: Coord) -> Result<bool, Error> {
        self.get(coord)?;
        Ok(self.neighbors(coord).any(|n| self.hole_at(n)))
    }

    /// True if the pixel is a hole with at least one valid neighbor
    #[inline]
    pub fn is_boundary(&self, coord: Coord) -> bool {
        self.hole_at(coord) && self.has_valid_neighbor(coord)
    }

    /// Finds the fill front inside `region`. The returned field has the size
    /// of `region` cropped to the image, and is indexed relative to the
    /// cropped region's corner.
    pub fn find_boundary(&self, region: &Region) -> Result<BinaryField, Error> {
        let cropped = region
            .crop(self.dims())
            .ok_or_else(|| Error::OutOfBounds(OutOfBounds::Region(*region, self.dims())))?;

        let mut boundary = BinaryField::new(Dims::new(cropped.width, cropped.height), false);
        for coord in cropped.coords() {
            if self.is_boundary(coord) {
                boundary.set(
                    Coord::new(coord.x - cropped.x as u32, coord.y - cropped.y as u32),
                    true,
                );
            }
        }

        Ok(boundary)
    }

    pub fn set_valid(&mut self, coord: Coord) -> Result<(), Error> {
        self.set(coord, PixelState::Valid)
    }

    pub fn set_hole(&mut self, coord: Coord) -> Result<(), Error> {
        self.set(coord, PixelState::Hole)
    }

    pub fn set(&mut self, coord: Coord, state: PixelState) -> Result<(), Error> {
        self.states.try_get(coord)?;
        self.states.set(coord, state);
        Ok(())
    }

    fn pixels_in_region(&self, region: &Region, state: PixelState) -> Vec<Coord> {
        region
            .crop(self.dims())
            .map(|r| r.coords().filter(|c| self.state(*c) == state).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the valid pixels inside `region`, in raster order
    pub fn valid_pixels_in_region(&self, region: &Region) -> Vec<Coord> {
        self.pixels_in_region(region, PixelState::Valid)
    }

    /// Snapshot of the hole pixels inside `region`, in raster order
    pub fn hole_pixels_in_region(&self, region: &Region) -> Vec<Coord> {
        self.pixels_in_region(region, PixelState::Hole)
    }

    pub fn count_hole_pixels(&self, region: &Region) -> usize {
        region
            .crop(self.dims())
            .map(|r| r.coords().filter(|c| self.hole_at(*c)).count())
            .unwrap_or(0)
    }

    pub fn count_valid_pixels(&self, region: &Region) -> usize {
        region
            .crop(self.dims())
            .map(|r| r.coords().filter(|c| self.valid_at(*c)).count())
            .unwrap_or(0)
    }

    /// Number of hole pixels in the whole mask
    pub fn hole_count(&self) -> usize {
        self.states
            .as_slice()
            .iter()
            .filter(|s| **s == PixelState::Hole)
            .count()
    }

    pub fn has_holes(&self) -> bool {
        self.states.as_slice().iter().any(|s| *s == PixelState::Hole)
    }
}
