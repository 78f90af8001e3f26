use crate::{Coord, Dims, Mask, Region};
use rstar::{RTree, AABB};
use std::borrow::Cow;

/// Which source patches a target patch is compared against
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchScope {
    /// Every source patch in the image
    Image,
    /// Source patches centered within `radius` pixels (chessboard distance)
    /// of the target. Falls back to the whole image when there are none.
    Local { radius: u32 },
}

impl Default for SearchScope {
    fn default() -> Self {
        SearchScope::Image
    }
}

/// A fully valid patch that can be copied from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SourcePatch {
    pub center: Coord,
    /// The full window, always inside the image
    pub region: Region,
}

/// Every source patch discovered so far.
///
/// Holes only ever shrink, so a patch that is valid stays valid for the rest
/// of the run and the collection only ever grows. Patches keep the order
/// they were discovered in, which is raster order within each refresh.
pub struct SourcePatchCollection {
    dims: Dims,
    patch_radius: u32,
    patches: Vec<SourcePatch>,
    // index into `patches` for every center pixel that holds a patch
    slots: Vec<Option<u32>>,
    centers: RTree<[i32; 2]>,
}

impl SourcePatchCollection {
    pub fn new(dims: Dims, patch_radius: u32) -> Self {
        Self {
            dims,
            patch_radius,
            patches: Vec::new(),
            slots: vec![None; dims.pixel_count()],
            centers: RTree::new(),
        }
    }

    pub fn clear(&mut self) {
        self.patches.clear();
        for s in self.slots.iter_mut() {
            *s = None;
        }
        self.centers = RTree::new();
    }

    #[inline]
    pub fn patch_radius(&self) -> u32 {
        self.patch_radius
    }

    /// Scans every center in `search_region` and returns the patches that
    /// lie entirely inside the image and entirely on valid pixels
    pub fn find_source_patches_in_region(&self, mask: &Mask, search_region: &Region) -> Vec<SourcePatch> {
        let search = match search_region.crop(self.dims) {
            Some(s) => s,
            None => return Vec::new(),
        };

        search
            .coords()
            .filter_map(|center| {
                let region = Region::centered(center, self.patch_radius);
                if region.is_inside(self.dims) && mask.is_valid_region(&region) {
                    Some(SourcePatch { center, region })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Merges patches into the collection, already known patches are
    /// skipped. Returns the number of patches that were new.
    pub fn add_patches<I: IntoIterator<Item = SourcePatch>>(&mut self, patches: I) -> usize {
        let mut added = 0;
        for patch in patches {
            let slot = &mut self.slots[patch.center.to_flat(self.dims)];
            if slot.is_some() {
                continue;
            }

            *slot = Some(self.patches.len() as u32);
            self.centers
                .insert([patch.center.x as i32, patch.center.y as i32]);
            self.patches.push(patch);
            added += 1;
        }
        added
    }

    /// Discovers the patches that may have become valid after the pixels in
    /// `changed` were filled. Only windows overlapping `changed` can have
    /// changed validity, so the scan is limited to their centers.
    pub fn refresh(&mut self, mask: &Mask, changed: &Region) -> usize {
        let found = self.find_source_patches_in_region(mask, &changed.dilate(self.patch_radius));
        self.add_patches(found)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn contains(&self, center: Coord) -> bool {
        self.dims.contains(center) && self.slots[center.to_flat(self.dims)].is_some()
    }

    pub fn patches(&self) -> &[SourcePatch] {
        &self.patches
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourcePatch> {
        self.patches.iter()
    }

    /// Patches whose centers lie within `radius` (chessboard distance) of
    /// `center`, in collection order
    pub fn patches_near(&self, center: Coord, radius: u32) -> Vec<SourcePatch> {
        let (cx, cy, r) = (center.x as i32, center.y as i32, radius as i32);
        let envelope = AABB::from_corners([cx - r, cy - r], [cx + r, cy + r]);

        let mut indices: Vec<u32> = self
            .centers
            .locate_in_envelope(&envelope)
            .filter_map(|p| {
                let c = Coord::new(p[0] as u32, p[1] as u32);
                self.slots[c.to_flat(self.dims)]
            })
            .collect();
        indices.sort_unstable();

        indices
            .into_iter()
            .map(|i| self.patches[i as usize])
            .collect()
    }

    /// The patches a target centered on `center` is compared against
    pub fn candidates(&self, center: Coord, scope: SearchScope) -> Cow<'_, [SourcePatch]> {
        match scope {
            SearchScope::Image => Cow::Borrowed(&self.patches),
            SearchScope::Local { radius } => {
                let near = self.patches_near(center, radius);
                if near.is_empty() {
                    Cow::Borrowed(&self.patches)
                } else {
                    Cow::Owned(near)
                }
            }
        }
    }
}
