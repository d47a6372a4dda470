//! Scene management
//!
//! The [`Scene`] is the single mutation point the control panel and the
//! application loop share: it owns the target registry, the material
//! selector, the effect parameters, and the frame clock, and keeps them
//! consistent. Any selector change is immediately re-applied to every
//! loaded target, and targets that finish loading later pick up whatever
//! the selector says at that moment.

pub mod clock;
pub mod object;
pub mod registry;
pub mod vertex;

pub use clock::FrameClock;
pub use object::{DrawMesh, Mesh, MeshNode, Object, ObjectLayouts};
pub use registry::{Placement, TargetId, TargetOverview, TargetRegistry};
pub use vertex::Vertex3D;

use crate::fx::{GradientColors, HolographicParams};
use crate::material::{MaterialKind, MaterialSelector};

pub struct Scene {
    registry: TargetRegistry,
    selector: MaterialSelector,
    /// Parameters of the holographic effect, shared by every node it is
    /// applied to.
    pub holographic: HolographicParams,
    /// Background gradient colors.
    pub gradient: GradientColors,
    clock: FrameClock,
}

impl Scene {
    pub fn new(matcap_count: usize) -> Self {
        Self {
            registry: TargetRegistry::new(),
            selector: MaterialSelector::new(matcap_count),
            holographic: HolographicParams::default(),
            gradient: GradientColors::default(),
            clock: FrameClock::new(),
        }
    }

    pub fn add_target(&mut self, name: &str, placement: Placement) -> TargetId {
        self.registry.register(name, placement)
    }

    pub fn add_target_with_exclusion(
        &mut self,
        name: &str,
        placement: Placement,
        exclude: impl Fn(&str) -> bool + Send + 'static,
    ) -> TargetId {
        self.registry.register_with_exclusion(name, placement, exclude)
    }

    /// Switches the active material family and pushes the change to every
    /// loaded target.
    pub fn set_material_kind(&mut self, kind: MaterialKind) {
        self.selector.set_kind(kind);
        self.registry.apply_selection(&self.selector);
    }

    /// Picks a matcap texture. Re-applies the selection unconditionally;
    /// re-assigning an unchanged material is cheap and idempotent.
    pub fn set_matcap_index(&mut self, index: i32) {
        self.selector.set_matcap_index(index);
        self.registry.apply_selection(&self.selector);
    }

    pub fn selector(&self) -> &MaterialSelector {
        &self.selector
    }

    pub fn set_visible(&mut self, id: TargetId, visible: bool) {
        self.registry.set_visible(id, visible);
    }

    pub fn complete_load(&mut self, id: TargetId, nodes: Vec<MeshNode>) {
        let selector = self.selector;
        self.registry.complete_load(id, nodes, &selector);
    }

    pub fn fail_load(&mut self, id: TargetId) {
        self.registry.fail_load(id);
    }

    pub fn target_overview(&self) -> Vec<TargetOverview> {
        self.registry.overview()
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TargetRegistry {
        &mut self.registry
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Advances the scene by one frame: samples the clock and drives spin
    /// animation. Returns the elapsed session time in seconds.
    pub fn tick(&mut self) -> f32 {
        let elapsed = self.clock.tick();
        self.registry.update(elapsed);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::NodeMaterial;

    fn node(name: &str) -> MeshNode {
        MeshNode::new(name, Mesh::new(vec![], vec![], vec![]), [1.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn selector_change_before_load_reaches_late_targets() {
        let mut scene = Scene::new(4);
        let id = scene.add_target("ship", Placement::new());

        scene.set_material_kind(MaterialKind::Matcap);
        scene.set_matcap_index(3);
        scene.complete_load(id, vec![node("Hull")]);

        let object = scene.registry().get(id).unwrap();
        assert_eq!(object.nodes[0].material, NodeMaterial::Matcap(3));
    }

    #[test]
    fn selector_change_after_load_reaches_loaded_targets() {
        let mut scene = Scene::new(4);
        let id = scene.add_target("ship", Placement::new());
        scene.complete_load(id, vec![node("Hull")]);

        scene.set_material_kind(MaterialKind::Matcap);
        let object = scene.registry().get(id).unwrap();
        assert_eq!(
            object.nodes[0].material,
            NodeMaterial::Matcap(scene.selector().matcap_index())
        );
    }

    #[test]
    fn matcap_index_out_of_range_is_clamped_not_rejected() {
        let mut scene = Scene::new(4);
        scene.set_matcap_index(100);
        assert_eq!(scene.selector().matcap_index(), 3);
    }
}
