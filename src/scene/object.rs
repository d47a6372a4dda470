//! Scene objects
//!
//! An [`Object`] is one loaded model: a flat list of named [`MeshNode`]s
//! (the traversable leaf renderables material selection operates on), a TRS
//! transform, and a visibility flag. GPU buffers are created lazily once a
//! device exists, so objects can be built and manipulated device-free.

use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::material::NodeMaterial;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::vertex::Vertex3D;

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;

        let mut vertices = Vec::with_capacity(positions.len() / 3);
        for i in 0..positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            });
        }

        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Area-weighted vertex normals for meshes whose OBJ carries none.
    pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len() / 3];

        for triangle in indices.chunks_exact(3) {
            let vertex = |i: usize| {
                let base = triangle[i] as usize * 3;
                Vector3::new(positions[base], positions[base + 1], positions[base + 2])
            };
            let face_normal = (vertex(1) - vertex(0)).cross(vertex(2) - vertex(0));
            for &index in triangle {
                accumulated[index as usize] += face_normal;
            }
        }

        let mut normals = Vec::with_capacity(positions.len());
        for normal in accumulated {
            let normal = if normal.magnitude2() > 0.0 {
                normal.normalize()
            } else {
                Vector3::unit_y()
            };
            normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
        }
        normals
    }

    fn init_gpu_buffers(&mut self, device: &wgpu::Device) {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }
}

/// GPU uniform data for a node's baked appearance.
///
/// Must match the `NodeColor` struct in `baked.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BakedColorUniform {
    pub color: [f32; 4],
}

struct NodeGpuResources {
    // The bind group keeps the underlying uniform buffer alive.
    baked_bind_group: wgpu::BindGroup,
}

/// A named leaf renderable inside an object.
///
/// Material selection rewrites `material`; `baked_color` keeps the MTL
/// appearance so excluded nodes render unchanged.
pub struct MeshNode {
    pub name: String,
    pub mesh: Mesh,
    pub baked_color: [f32; 4],
    pub material: NodeMaterial,
    gpu: Option<NodeGpuResources>,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, mesh: Mesh, baked_color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            mesh,
            baked_color,
            material: NodeMaterial::Baked,
            gpu: None,
        }
    }

    pub fn baked_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.baked_bind_group)
    }
}

/// Bind group layouts for per-object and per-node uniforms, shared by every
/// object in the scene.
pub struct ObjectLayouts {
    pub transform: BindGroupLayoutWithDesc,
    pub baked: BindGroupLayoutWithDesc,
}

impl ObjectLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let transform = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Transform Bind Group");
        let baked = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Baked Color Bind Group");
        Self { transform, baked }
    }
}

struct ObjectGpuResources {
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub nodes: Vec<MeshNode>,
    pub transform: Matrix4<f32>,
    pub visible: bool,
    gpu: Option<ObjectGpuResources>,
}

impl Object {
    pub fn new(name: impl Into<String>, nodes: Vec<MeshNode>) -> Self {
        Self {
            name: name.into(),
            nodes,
            transform: Matrix4::identity(),
            visible: true,
            gpu: None,
        }
    }

    /// Rebuilds the transform from translation, Y rotation, and uniform
    /// scale. Order matters: T * R * S.
    pub fn set_transform_trs(&mut self, translation: Vector3<f32>, rotation_y: Rad<f32>, scale: f32) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_y(rotation_y);
        let s = Matrix4::from_scale(scale);
        self.transform = t * r * s;
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.transform_bind_group)
    }

    /// Creates mesh buffers, the transform uniform, and per-node baked
    /// color uniforms. Safe to call once per object, any time after load.
    pub fn init_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &ObjectLayouts,
    ) {
        if self.gpu.is_some() {
            return;
        }

        for node in &mut self.nodes {
            node.mesh.init_gpu_buffers(device);

            let baked_ubo = UniformBuffer::new(device);
            baked_ubo.update_content(
                queue,
                BakedColorUniform {
                    color: node.baked_color,
                },
            );
            let baked_bind_group = BindGroupBuilder::new(&layouts.baked)
                .resource(baked_ubo.binding_resource())
                .create(device, "Baked Color Bind Group");
            node.gpu = Some(NodeGpuResources { baked_bind_group });
        }

        // cgmath matrices are column-major, which is what the GPU expects.
        let transform_data: &[f32; 16] = self.transform.as_ref();
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Uniform Buffer"),
            contents: bytemuck::cast_slice(transform_data),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let transform_bind_group = BindGroupBuilder::new(&layouts.transform)
            .resource(transform_buffer.as_entire_binding())
            .create(device, "Transform Bind Group");

        self.gpu = Some(ObjectGpuResources {
            transform_buffer,
            transform_bind_group,
        });
    }

    /// Syncs the current transform to the GPU if resources exist.
    pub fn update_transform(&self, queue: &wgpu::Queue) {
        if let Some(gpu) = &self.gpu {
            let transform_data: &[f32; 16] = self.transform.as_ref();
            queue.write_buffer(&gpu.transform_buffer, 0, bytemuck::cast_slice(transform_data));
        }
    }
}

/// Render-pass extension for drawing meshes.
pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };
        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_interleaves_positions_and_normals() {
        let mesh = Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        );
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
    }

    #[test]
    fn calculated_normals_face_out_of_the_winding() {
        // Counter-clockwise triangle in the XY plane faces +Z.
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = Mesh::calculate_vertex_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals.len(), positions.len());
        for vertex in normals.chunks(3) {
            assert!((vertex[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn new_nodes_start_with_their_baked_material() {
        let node = MeshNode::new("Body", Mesh::new(vec![], vec![], vec![]), [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(node.material, NodeMaterial::Baked);
    }
}
