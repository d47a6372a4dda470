//! Material selection state
//!
//! A small discrete state machine shared by the control panel and the
//! target registry: which material family is active, and which matcap
//! texture to use when the matcap family is selected. The selector never
//! touches the GPU; applying a selection to loaded objects is the
//! registry's job.

/// The two switchable material families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Holographic,
    Matcap,
}

/// Material resolved onto an individual mesh node.
///
/// Nodes start out `Baked` (their MTL appearance) and stay that way if a
/// target's exclusion predicate matches them; otherwise selection rewrites
/// the slot. Exactly one variant is active per node at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMaterial {
    Baked,
    Holographic,
    Matcap(usize),
}

/// Current material choice plus the matcap index, clamped against the
/// number of matcap textures the library was built with.
#[derive(Debug, Clone, Copy)]
pub struct MaterialSelector {
    kind: MaterialKind,
    matcap_index: usize,
    matcap_count: usize,
}

impl MaterialSelector {
    pub fn new(matcap_count: usize) -> Self {
        let mut selector = Self {
            kind: MaterialKind::Holographic,
            matcap_index: 0,
            matcap_count,
        };
        // Matcap 1 is the default pick once the user switches families.
        selector.set_matcap_index(1);
        selector
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: MaterialKind) {
        self.kind = kind;
    }

    pub fn matcap_index(&self) -> usize {
        self.matcap_index
    }

    pub fn matcap_count(&self) -> usize {
        self.matcap_count
    }

    /// Sets the matcap index, clamping out-of-range input to the nearest
    /// valid slot instead of failing.
    pub fn set_matcap_index(&mut self, index: i32) {
        let last = self.matcap_count.saturating_sub(1) as i32;
        self.matcap_index = index.clamp(0, last.max(0)) as usize;
    }

    /// The node material this selection resolves to.
    pub fn resolve(&self) -> NodeMaterial {
        match self.kind {
            MaterialKind::Holographic => NodeMaterial::Holographic,
            MaterialKind::Matcap => NodeMaterial::Matcap(self.matcap_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcap_index_clamps_to_library_size() {
        let mut selector = MaterialSelector::new(4);
        selector.set_matcap_index(99);
        assert_eq!(selector.matcap_index(), 3);
        selector.set_matcap_index(-7);
        assert_eq!(selector.matcap_index(), 0);
    }

    #[test]
    fn empty_library_pins_index_to_zero() {
        let mut selector = MaterialSelector::new(0);
        selector.set_matcap_index(5);
        assert_eq!(selector.matcap_index(), 0);
    }

    #[test]
    fn resolve_follows_kind() {
        let mut selector = MaterialSelector::new(4);
        selector.set_matcap_index(2);
        assert_eq!(selector.resolve(), NodeMaterial::Holographic);
        selector.set_kind(MaterialKind::Matcap);
        assert_eq!(selector.resolve(), NodeMaterial::Matcap(2));
    }
}
