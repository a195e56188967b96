// src/dirty.rs

//! Dirty region tracking between frames.
//!
//! Producers call [`DirtyRegionTracker::invalidate`] from any thread; the render loop is the
//! single consumer and drains the pending set once per frame with
//! [`DirtyRegionTracker::take_dirty`]. Merging is best-effort: the union of the pending
//! rectangles is always a superset of everything invalidated since the last take.

use log::{trace, warn};
use std::sync::{Mutex, MutexGuard};

/// Pending rectangles beyond this collapse into their bounding box.
///
/// A bounding box wider or taller than `u32::MAX` can't be represented; the region then keeps
/// its rectangles separate and may exceed this count.
pub const MAX_DIRTY_RECTS: usize = 16;

/// Axis-aligned rectangle in window-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering a whole `width` x `height` window.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    // Edges are computed in i64 so rectangles near i32::MAX don't wrap.
    fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    fn from_edges(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        let extent = |v: i64| v.clamp(0, i64::from(u32::MAX)) as u32;
        Self::new(clamp(left), clamp(top), extent(right - left), extent(bottom - top))
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// True if the rectangles overlap or share an edge.
    pub fn touches(&self, other: &Rect) -> bool {
        i64::from(self.x) <= other.right()
            && i64::from(other.x) <= self.right()
            && i64::from(self.y) <= other.bottom()
            && i64::from(other.y) <= self.bottom()
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.is_empty()
            || (self.x <= other.x
                && self.y <= other.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Smallest rectangle containing both. Empty operands are ignored.
    ///
    /// An extent beyond `u32::MAX` saturates, so the result may not contain both operands;
    /// use [`Rect::try_union`] where coverage matters.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::from_edges(
            i64::from(self.x.min(other.x)),
            i64::from(self.y.min(other.y)),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Smallest rectangle containing both, or `None` when its extent doesn't fit in `u32`.
    pub fn try_union(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() {
            return Some(*other);
        }
        if other.is_empty() {
            return Some(*self);
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let width = u32::try_from(self.right().max(other.right()) - i64::from(left)).ok()?;
        let height = u32::try_from(self.bottom().max(other.bottom()) - i64::from(top)).ok()?;
        Some(Self::new(left, top, width, height))
    }

    /// Overlapping area, or `None` when the rectangles are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = i64::from(self.x.max(other.x));
        let top = i64::from(self.y.max(other.y));
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (left < right && top < bottom).then(|| Self::from_edges(left, top, right, bottom))
    }
}

/// A set of rectangles that need repainting. Rectangles may overlap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirtyRegion {
    rects: Vec<Rect>,
}

impl DirtyRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Bounding box of every rectangle, `None` if empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|acc, r| acc.union(&r))
    }

    /// True if some rectangle of the region fully contains `rect`.
    pub fn covers(&self, rect: &Rect) -> bool {
        rect.is_empty() || self.rects.iter().any(|r| r.contains(rect))
    }

    /// Adds `rect`, folding it into the first rectangle it touches.
    ///
    /// Merges only happen when the merged box is representable, so every added rectangle
    /// stays covered.
    pub fn add(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        for existing in self.rects.iter_mut().filter(|r| r.touches(&rect)) {
            if let Some(merged) = existing.try_union(&rect) {
                *existing = merged;
                return;
            }
        }
        if self.rects.len() >= MAX_DIRTY_RECTS {
            match self.rects.iter().try_fold(rect, |acc, r| acc.try_union(r)) {
                Some(bounds) => {
                    trace!(
                        "Dirty region exceeded {} rects; collapsing to bounding box",
                        MAX_DIRTY_RECTS
                    );
                    self.rects.clear();
                    self.rects.push(bounds);
                    return;
                }
                None => trace!("Dirty region bounding box out of range; keeping rects apart"),
            }
        }
        self.rects.push(rect);
    }

    /// Returns the region restricted to `bounds`, dropping rectangles outside it.
    pub fn clipped_to(&self, bounds: &Rect) -> DirtyRegion {
        DirtyRegion {
            rects: self
                .rects
                .iter()
                .filter_map(|r| r.intersection(bounds))
                .collect(),
        }
    }
}

impl FromIterator<Rect> for DirtyRegion {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        let mut region = DirtyRegion::new();
        for rect in iter {
            region.add(rect);
        }
        region
    }
}

/// Thread-safe accumulator of invalidated rectangles.
#[derive(Debug, Default)]
pub struct DirtyRegionTracker {
    pending: Mutex<DirtyRegion>,
}

impl DirtyRegionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DirtyRegion> {
        // A panicking producer cannot leave the region half-updated, so the data is still usable.
        self.pending.lock().unwrap_or_else(|poisoned| {
            warn!("Dirty region mutex poisoned; recovering pending set");
            poisoned.into_inner()
        })
    }

    pub fn invalidate(&self, rect: Rect) {
        trace!("Invalidate {:?}", rect);
        self.lock().add(rect);
    }

    /// Returns and clears the accumulated region in one step.
    pub fn take_dirty(&self) -> DirtyRegion {
        std::mem::take(&mut *self.lock())
    }

    pub fn is_dirty(&self) -> bool {
        !self.lock().is_empty()
    }
}
