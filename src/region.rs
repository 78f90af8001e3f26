use crate::Dims;

/// A pixel location inside an image
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub(crate) fn to_flat(self, dims: Dims) -> usize {
        self.y as usize * dims.width as usize + self.x as usize
    }

    #[inline]
    pub(crate) fn from_flat(flat: usize, dims: Dims) -> Self {
        let y = flat / dims.width as usize;
        let x = flat - y * dims.width as usize;
        Self::new(x as u32, y as u32)
    }

    #[inline]
    pub fn to_signed(self) -> SignedCoord {
        SignedCoord {
            x: self.x as i32,
            y: self.y as i32,
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> SignedCoord {
        SignedCoord {
            x: self.x as i32 + dx,
            y: self.y as i32 + dy,
        }
    }
}

/// A pixel location that may lie outside of an image, for neighbors and
/// offsets
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SignedCoord {
    pub x: i32,
    pub y: i32,
}

impl SignedCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the unsigned coordinate if it lies inside `dims`
    #[inline]
    pub fn to_unsigned(self, dims: Dims) -> Option<Coord> {
        if self.x >= 0 && self.y >= 0 && (self.x as u32) < dims.width && (self.y as u32) < dims.height
        {
            Some(Coord::new(self.x as u32, self.y as u32))
        } else {
            None
        }
    }
}

/// An axis aligned rectangle of pixels. The corner may be negative for
/// patches anchored close to the image edge, use `crop` before touching pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The square patch of side `2 * radius + 1` centered on `center`
    pub fn centered(center: Coord, radius: u32) -> Self {
        let side = radius * 2 + 1;
        Self {
            x: center.x as i32 - radius as i32,
            y: center.y as i32 - radius as i32,
            width: side,
            height: side,
        }
    }

    /// The region covering a whole image
    pub fn whole(dims: Dims) -> Self {
        Self::new(0, 0, dims.width, dims.height)
    }

    #[inline]
    pub fn corner(&self) -> SignedCoord {
        SignedCoord::new(self.x, self.y)
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if every pixel of the region lies inside `dims`
    pub fn is_inside(&self, dims: Dims) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= dims.width as i32
            && self.bottom() <= dims.height as i32
    }

    #[inline]
    pub fn contains(&self, coord: SignedCoord) -> bool {
        coord.x >= self.x && coord.y >= self.y && coord.x < self.right() && coord.y < self.bottom()
    }

    /// Intersection of two regions, `None` if they don't overlap
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return None;
        }

        Some(Region::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }

    /// The part of the region that lies inside the image
    pub fn crop(&self, dims: Dims) -> Option<Region> {
        self.intersect(&Region::whole(dims))
    }

    /// Grows the region by `amount` pixels on every side
    pub fn dilate(&self, amount: u32) -> Region {
        Region::new(
            self.x - amount as i32,
            self.y - amount as i32,
            self.width + amount * 2,
            self.height + amount * 2,
        )
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Every non-negative pixel of the region, in raster order
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let right = self.right().max(x0);
        let bottom = self.bottom().max(y0);

        (y0..bottom).flat_map(move |y| (x0..right).map(move |x| Coord::new(x as u32, y as u32)))
    }

    /// Every (x, y) offset from the corner, in raster order
    pub fn offsets(&self) -> impl Iterator<Item = (u32, u32)> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |dy| (0..width).map(move |dx| (dx, dy)))
    }
}
