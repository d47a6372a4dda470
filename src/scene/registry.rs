//! Target registry
//!
//! Tracks every model the scene wants, loaded or not. Each target walks the
//! state machine `Pending -> Loaded | Failed` exactly once, driven by the
//! loader's completion events. Desired state (visibility, material
//! selection) is stored on the target itself so it survives targets that
//! have not loaded yet: completion consults the registry's current state
//! rather than whatever was true when the load started, and every operation
//! on an absent target degrades to a no-op.

use cgmath::{Rad, Vector3, Zero};

use crate::material::MaterialSelector;

use super::object::{MeshNode, Object, ObjectLayouts};

/// Node-name predicate excluding nodes from material replacement.
pub type ExcludeNode = Box<dyn Fn(&str) -> bool + Send>;

/// Handle to a registered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

/// Sinusoidal idle rotation around Y.
#[derive(Debug, Clone, Copy)]
pub struct Spin {
    pub speed: f32,
    pub phase: f32,
}

/// Where and how a target sits in the scene.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub translation: Vector3<f32>,
    pub scale: f32,
    pub spin: Option<Spin>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            translation: Vector3::zero(),
            scale: 1.0,
            spin: None,
        }
    }
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.translation = Vector3::new(x, y, z);
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn spinning(mut self, speed: f32, phase: f32) -> Self {
        self.spin = Some(Spin { speed, phase });
        self
    }
}

enum TargetState {
    Pending,
    Loaded(Object),
    Failed,
}

struct Target {
    name: String,
    state: TargetState,
    desired_visible: bool,
    exclude: Option<ExcludeNode>,
    placement: Placement,
}

/// One row of the registry overview consumed by the control panel.
pub struct TargetOverview {
    pub id: TargetId,
    pub name: String,
    pub visible: bool,
    pub loaded: bool,
}

#[derive(Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, placement: Placement) -> TargetId {
        self.register_target(name, placement, None)
    }

    /// Registers a target whose matching nodes keep their baked material
    /// when a selection is applied.
    pub fn register_with_exclusion(
        &mut self,
        name: &str,
        placement: Placement,
        exclude: impl Fn(&str) -> bool + Send + 'static,
    ) -> TargetId {
        self.register_target(name, placement, Some(Box::new(exclude)))
    }

    fn register_target(
        &mut self,
        name: &str,
        placement: Placement,
        exclude: Option<ExcludeNode>,
    ) -> TargetId {
        self.targets.push(Target {
            name: name.to_string(),
            state: TargetState::Pending,
            desired_visible: true,
            exclude,
            placement,
        });
        TargetId(self.targets.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_loaded(&self, id: TargetId) -> bool {
        matches!(
            self.targets.get(id.0).map(|t| &t.state),
            Some(TargetState::Loaded(_))
        )
    }

    pub fn name(&self, id: TargetId) -> Option<&str> {
        self.targets.get(id.0).map(|t| t.name.as_str())
    }

    /// Snapshot of all targets for UI display, loaded or not.
    pub fn overview(&self) -> Vec<TargetOverview> {
        self.targets
            .iter()
            .enumerate()
            .map(|(index, target)| TargetOverview {
                id: TargetId(index),
                name: target.name.clone(),
                visible: target.desired_visible,
                loaded: matches!(target.state, TargetState::Loaded(_)),
            })
            .collect()
    }

    /// Sets a target's visibility. Works before the target has loaded; the
    /// stored intent is applied the instant the load completes.
    pub fn set_visible(&mut self, id: TargetId, visible: bool) {
        let Some(target) = self.targets.get_mut(id.0) else {
            return;
        };
        target.desired_visible = visible;
        if let TargetState::Loaded(object) = &mut target.state {
            object.visible = visible;
        }
    }

    /// Completes a pending load, building the object and applying the
    /// *current* selector and visibility state in one step. Duplicate
    /// completions and completions for failed targets are ignored.
    pub fn complete_load(
        &mut self,
        id: TargetId,
        nodes: Vec<MeshNode>,
        selector: &MaterialSelector,
    ) {
        let Some(target) = self.targets.get_mut(id.0) else {
            return;
        };
        if !matches!(target.state, TargetState::Pending) {
            log::warn!("ignoring duplicate load completion for '{}'", target.name);
            return;
        }

        let mut object = Object::new(&target.name, nodes);
        object.set_transform_trs(
            target.placement.translation,
            Rad(0.0),
            target.placement.scale,
        );
        Self::apply_to_object(&mut object, target.exclude.as_ref(), selector);
        object.visible = target.desired_visible;
        target.state = TargetState::Loaded(object);
        log::info!("target '{}' loaded", target.name);
    }

    /// Marks a pending load as failed; the target stays absent for the rest
    /// of the session and all operations on it are no-ops.
    pub fn fail_load(&mut self, id: TargetId) {
        let Some(target) = self.targets.get_mut(id.0) else {
            return;
        };
        if matches!(target.state, TargetState::Pending) {
            target.state = TargetState::Failed;
        }
    }

    /// Re-applies the selector to every loaded target. Idempotent.
    pub fn apply_selection(&mut self, selector: &MaterialSelector) {
        for target in &mut self.targets {
            let exclude = target.exclude.as_ref();
            if let TargetState::Loaded(object) = &mut target.state {
                Self::apply_to_object(object, exclude, selector);
            }
        }
    }

    fn apply_to_object(
        object: &mut Object,
        exclude: Option<&ExcludeNode>,
        selector: &MaterialSelector,
    ) {
        let assigned = selector.resolve();
        for node in &mut object.nodes {
            if exclude.is_some_and(|f| f(&node.name)) {
                continue;
            }
            node.material = assigned;
        }
    }

    /// Advances spin animations.
    pub fn update(&mut self, elapsed: f32) {
        for target in &mut self.targets {
            let placement = target.placement;
            if let (TargetState::Loaded(object), Some(spin)) = (&mut target.state, placement.spin) {
                let angle = (elapsed * spin.speed + spin.phase).sin();
                object.set_transform_trs(placement.translation, Rad(angle), placement.scale);
            }
        }
    }

    pub fn loaded_objects(&self) -> impl Iterator<Item = &Object> {
        self.targets.iter().filter_map(|t| match &t.state {
            TargetState::Loaded(object) => Some(object),
            _ => None,
        })
    }

    pub fn loaded_objects_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.targets.iter_mut().filter_map(|t| match &mut t.state {
            TargetState::Loaded(object) => Some(object),
            _ => None,
        })
    }

    pub fn get(&self, id: TargetId) -> Option<&Object> {
        match self.targets.get(id.0).map(|t| &t.state) {
            Some(TargetState::Loaded(object)) => Some(object),
            _ => None,
        }
    }

    /// Creates GPU resources for objects that loaded since the last frame
    /// and syncs every transform.
    pub fn prepare_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &ObjectLayouts,
    ) {
        for object in self.loaded_objects_mut() {
            if !object.has_gpu_resources() {
                object.init_gpu_resources(device, queue, layouts);
            }
            object.update_transform(queue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{MaterialKind, NodeMaterial};
    use crate::scene::object::Mesh;

    fn node(name: &str) -> MeshNode {
        MeshNode::new(name, Mesh::new(vec![], vec![], vec![]), [0.8, 0.8, 0.8, 1.0])
    }

    fn matcap_selector(index: i32) -> MaterialSelector {
        let mut selector = MaterialSelector::new(4);
        selector.set_kind(MaterialKind::Matcap);
        selector.set_matcap_index(index);
        selector
    }

    #[test]
    fn visibility_set_before_load_applies_at_completion() {
        let mut registry = TargetRegistry::new();
        let id = registry.register("ship", Placement::new());
        registry.set_visible(id, false);

        registry.complete_load(id, vec![node("Hull")], &MaterialSelector::new(4));
        assert!(!registry.get(id).unwrap().visible);
    }

    #[test]
    fn visibility_order_is_irrelevant() {
        let selector = MaterialSelector::new(4);

        let mut before = TargetRegistry::new();
        let id_before = before.register("ship", Placement::new());
        before.set_visible(id_before, false);
        before.complete_load(id_before, vec![node("Hull")], &selector);

        let mut after = TargetRegistry::new();
        let id_after = after.register("ship", Placement::new());
        after.complete_load(id_after, vec![node("Hull")], &selector);
        after.set_visible(id_after, false);

        assert_eq!(
            before.get(id_before).unwrap().visible,
            after.get(id_after).unwrap().visible
        );
    }

    #[test]
    fn completion_applies_current_selector_not_a_default() {
        let mut registry = TargetRegistry::new();
        let id = registry.register("ship", Placement::new());

        // Selection changes while the load is still in flight.
        let selector = matcap_selector(2);
        registry.complete_load(id, vec![node("Hull"), node("Wing")], &selector);

        for n in &registry.get(id).unwrap().nodes {
            assert_eq!(n.material, NodeMaterial::Matcap(2));
        }
    }

    #[test]
    fn reverse_load_order_with_floor_exclusion() {
        // Three targets complete in reverse order; the selector was set to
        // matcap 2 before any of them finished. The third target's floor
        // nodes keep their baked material.
        let selector = matcap_selector(2);
        let mut registry = TargetRegistry::new();
        let first = registry.register("movie", Placement::new());
        let second = registry.register("classic", Placement::new());
        let third = registry.register_with_exclusion("tumbler", Placement::new(), |name| {
            name.contains("Floor")
        });

        registry.complete_load(third, vec![node("Body"), node("Floor_Plane")], &selector);
        registry.complete_load(second, vec![node("Chassis")], &selector);
        registry.complete_load(first, vec![node("Hull")], &selector);

        for id in [first, second] {
            for n in &registry.get(id).unwrap().nodes {
                assert_eq!(n.material, NodeMaterial::Matcap(2));
            }
        }
        let tumbler = registry.get(third).unwrap();
        assert_eq!(tumbler.nodes[0].material, NodeMaterial::Matcap(2));
        assert_eq!(tumbler.nodes[1].material, NodeMaterial::Baked);
    }

    #[test]
    fn applying_the_same_selection_twice_is_idempotent() {
        let selector = matcap_selector(1);
        let mut registry = TargetRegistry::new();
        let id = registry.register("ship", Placement::new());
        registry.complete_load(id, vec![node("Hull")], &selector);

        registry.apply_selection(&selector);
        let once: Vec<NodeMaterial> =
            registry.get(id).unwrap().nodes.iter().map(|n| n.material).collect();
        registry.apply_selection(&selector);
        let twice: Vec<NodeMaterial> =
            registry.get(id).unwrap().nodes.iter().map(|n| n.material).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn selection_change_reapplies_to_loaded_targets() {
        let mut selector = MaterialSelector::new(4);
        let mut registry = TargetRegistry::new();
        let id = registry.register("ship", Placement::new());
        registry.complete_load(id, vec![node("Hull")], &selector);
        assert_eq!(registry.get(id).unwrap().nodes[0].material, NodeMaterial::Holographic);

        selector.set_kind(MaterialKind::Matcap);
        registry.apply_selection(&selector);
        assert_eq!(
            registry.get(id).unwrap().nodes[0].material,
            NodeMaterial::Matcap(selector.matcap_index())
        );
    }

    #[test]
    fn duplicate_completion_is_ignored() {
        let selector = matcap_selector(0);
        let mut registry = TargetRegistry::new();
        let id = registry.register("ship", Placement::new());

        registry.complete_load(id, vec![node("Hull")], &selector);
        registry.complete_load(id, vec![node("Hull"), node("Extra")], &selector);
        assert_eq!(registry.get(id).unwrap().nodes.len(), 1);
    }

    #[test]
    fn failed_targets_stay_absent_and_noop() {
        let selector = MaterialSelector::new(4);
        let mut registry = TargetRegistry::new();
        let id = registry.register("ship", Placement::new());

        registry.fail_load(id);
        assert!(!registry.is_loaded(id));

        // Late completion cannot resurrect a failed target; other
        // operations quietly do nothing.
        registry.complete_load(id, vec![node("Hull")], &selector);
        registry.set_visible(id, false);
        registry.apply_selection(&selector);
        assert!(registry.get(id).is_none());
        assert_eq!(registry.loaded_objects().count(), 0);
    }

    #[test]
    fn spin_targets_track_elapsed_time() {
        let selector = MaterialSelector::new(4);
        let mut registry = TargetRegistry::new();
        let id = registry.register("ship", Placement::new().spinning(0.3, 2.0));
        registry.complete_load(id, vec![node("Hull")], &selector);

        let before = registry.get(id).unwrap().transform;
        registry.update(5.0);
        let spun = registry.get(id).unwrap().transform;
        assert_ne!(before, spun);
    }
}
