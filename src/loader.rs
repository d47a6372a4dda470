//! Asynchronous model loading
//!
//! Models are parsed off the render thread, one worker thread per request.
//! Workers never touch shared state; each posts a single [`LoadEvent`]
//! through an mpsc channel, and the application drains the channel at the
//! top of every frame. The scene therefore only ever mutates on the render
//! thread, load-order included.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use thiserror::Error;

use crate::scene::{Mesh, MeshNode, TargetId};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse OBJ file '{path}': {source}")]
    Obj {
        path: PathBuf,
        source: tobj::LoadError,
    },
    #[error("OBJ file '{path}' contains no meshes")]
    Empty { path: PathBuf },
}

/// Outcome of one load request.
pub struct LoadEvent {
    pub target: TargetId,
    pub result: Result<Vec<MeshNode>, LoadError>,
}

/// Spawns loader threads and collects their completions.
pub struct AssetLoader {
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Requests a load. Returns immediately; the result arrives through
    /// [`AssetLoader::drain`] on a later frame.
    pub fn request(&self, target: TargetId, path: impl Into<PathBuf>) {
        let path = path.into();
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = load_obj_nodes(&path);
            // Send fails only when the application already shut down.
            let _ = sender.send(LoadEvent { target, result });
        });
    }

    /// All completions that arrived since the last drain.
    pub fn drain(&self) -> Vec<LoadEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses an OBJ file into named mesh nodes, carrying each node's MTL
/// diffuse color (with dissolve as alpha) as its baked appearance.
pub fn load_obj_nodes(path: &Path) -> Result<Vec<MeshNode>, LoadError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| LoadError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    if models.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let materials = materials.unwrap_or_else(|_| {
        log::debug!("no MTL file for '{}', using default colors", path.display());
        Vec::new()
    });

    let mut nodes = Vec::with_capacity(models.len());
    for (i, model) in models.into_iter().enumerate() {
        let name = if model.name.is_empty() {
            format!("node_{}", i)
        } else {
            model.name
        };

        let baked_color = model
            .mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(|mtl| {
                let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
                [
                    diffuse[0],
                    diffuse[1],
                    diffuse[2],
                    mtl.dissolve.unwrap_or(1.0),
                ]
            })
            .unwrap_or([0.8, 0.8, 0.8, 1.0]);

        let positions = model.mesh.positions;
        let indices = model.mesh.indices;
        let normals = if model.mesh.normals.is_empty() {
            Mesh::calculate_vertex_normals(&positions, &indices)
        } else {
            model.mesh.normals
        };

        nodes.push(MeshNode::new(
            name,
            Mesh::new(positions, normals, indices),
            baked_color,
        ));
    }

    log::info!("parsed '{}': {} nodes", path.display(), nodes.len());
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Placement, TargetRegistry};
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_reports_an_error_event() {
        let mut registry = TargetRegistry::new();
        let target = registry.register("missing", Placement::new());

        let loader = AssetLoader::new();
        loader.request(target, "/definitely/not/here.obj");

        // The worker posts exactly one event for the request.
        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(loader.drain());
            if !events.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, target);
        assert!(events[0].result.is_err());
    }

    #[test]
    fn obj_without_normals_gets_computed_ones() {
        let path = write_temp(
            "holoscene_no_normals.obj",
            "o Tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        );
        let nodes = load_obj_nodes(&path).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "Tri");
        assert_eq!(nodes[0].mesh.vertex_count(), 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn nodes_keep_their_obj_object_names() {
        let path = write_temp(
            "holoscene_two_objects.obj",
            concat!(
                "o Body\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
                "o Floor_Plane\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 4 5 6\n",
            ),
        );
        let nodes = load_obj_nodes(&path).unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["Body", "Floor_Plane"]);
        std::fs::remove_file(path).ok();
    }
}
