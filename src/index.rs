use std::fmt;
use std::hash::Hash;

pub type DefaultIx = u32;

/// Width of the arena indices a tree uses for its parent/child links.
///
/// # Safety
///
/// `new` and `index` must round-trip every value in `0..=max().index()`.
pub unsafe trait IndexType: Copy + Default + Hash + Ord + fmt::Debug + Send + Sync + 'static {
    fn new(x: usize) -> Self;
    fn index(&self) -> usize;
    fn max() -> Self;
}

unsafe impl IndexType for u32 {
    #[inline(always)]
    fn new(x: usize) -> Self {
        x as u32
    }
    #[inline(always)]
    fn index(&self) -> usize {
        *self as usize
    }
    #[inline(always)]
    fn max() -> Self {
        ::std::u32::MAX
    }
}

unsafe impl IndexType for u16 {
    #[inline(always)]
    fn new(x: usize) -> Self {
        x as u16
    }
    #[inline(always)]
    fn index(&self) -> usize {
        *self as usize
    }
    #[inline(always)]
    fn max() -> Self {
        ::std::u16::MAX
    }
}

unsafe impl IndexType for usize {
    #[inline(always)]
    fn new(x: usize) -> Self {
        x
    }
    #[inline(always)]
    fn index(&self) -> usize {
        *self
    }
    #[inline(always)]
    fn max() -> Self {
        ::std::usize::MAX
    }
}

/// Node identifier.
///
/// Slot 0 of every arena is the sentinel, slot 1 the pseudo-root.
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct NodeIndex<Ix = DefaultIx>(Ix);

impl<Ix: IndexType> NodeIndex<Ix> {
    #[inline]
    pub fn new(x: usize) -> Self {
        NodeIndex(IndexType::new(x))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.index()
    }

    #[inline]
    pub fn end() -> Self {
        NodeIndex(IndexType::max())
    }

    /// The shared "none" placeholder of an arena.
    #[inline]
    pub fn sentinel() -> Self {
        NodeIndex::new(0)
    }

    /// The node whose left child is the real root.
    #[inline]
    pub fn pseudo_root() -> Self {
        NodeIndex::new(1)
    }

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.index() == 0
    }

    /// Neither the sentinel nor the pseudo-root.
    #[inline]
    pub fn is_value(self) -> bool {
        self.index() > 1
    }
}

impl<Ix: fmt::Debug> fmt::Debug for NodeIndex<Ix> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NodeIndex({:?})", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reserved_slots_are_classified() {
        assert!(NodeIndex::<u32>::sentinel().is_sentinel());
        assert!(!NodeIndex::<u32>::pseudo_root().is_value());
        assert!(NodeIndex::<u32>::new(2).is_value());
        assert_eq!(NodeIndex::<u16>::end().index(), u16::MAX as usize);
    }
}
