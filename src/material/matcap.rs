//! Matcap texture library
//!
//! A matcap fakes lighting by baking a normal-to-color mapping into a
//! texture sampled with the view-space normal. The library owns one GPU
//! texture and bind group per matcap; the selector picks between them by
//! index at draw time.
//!
//! Textures come from PNG files when assets are available, or from a
//! deterministic procedural synthesizer so the viewer runs self-contained.

use std::path::Path;

use cgmath::{InnerSpace, Vector3};
use thiserror::Error;

use crate::gfx::resources::texture_resource::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

/// Number of built-in procedural matcap styles.
pub const PROCEDURAL_STYLES: usize = 4;

#[derive(Debug, Error)]
pub enum MatcapError {
    #[error("failed to read matcap file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode matcap image: {0}")]
    Image(#[from] image::ImageError),
}

/// Synthesizes the RGBA8 pixels of one procedural matcap style.
///
/// The sphere normal is reconstructed from the pixel position and shaded
/// with a fixed key light plus a specular lobe, tinted per style. Pure and
/// deterministic, so the styles can be checked without a device.
pub fn matcap_pixels(style: usize, size: u32) -> Vec<u8> {
    // (tint, specular color, shininess) per style: studio gray, warm
    // bronze, cool steel, toxic green.
    const PALETTE: [([f32; 3], [f32; 3], f32); PROCEDURAL_STYLES] = [
        ([0.62, 0.62, 0.64], [1.0, 1.0, 1.0], 24.0),
        ([0.55, 0.36, 0.18], [1.0, 0.85, 0.6], 12.0),
        ([0.25, 0.35, 0.55], [0.8, 0.9, 1.0], 48.0),
        ([0.12, 0.5, 0.2], [0.6, 1.0, 0.6], 32.0),
    ];
    let (tint, spec_color, shininess) = PALETTE[style % PROCEDURAL_STYLES];

    let light = Vector3::new(-0.35, 0.5, 0.8).normalize();
    let half = (light + Vector3::unit_z()).normalize();

    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for py in 0..size {
        for px in 0..size {
            let x = (px as f32 + 0.5) / size as f32 * 2.0 - 1.0;
            let y = 1.0 - (py as f32 + 0.5) / size as f32 * 2.0;
            let r2 = x * x + y * y;

            // Outside the sphere: extend the rim normal so bilinear taps at
            // grazing angles stay well-defined.
            let normal = if r2 > 1.0 {
                let inv = 1.0 / r2.sqrt();
                Vector3::new(x * inv, y * inv, 0.0)
            } else {
                Vector3::new(x, y, (1.0 - r2).sqrt())
            };

            let diffuse = normal.dot(light).max(0.0);
            let specular = normal.dot(half).max(0.0).powf(shininess);
            for channel in 0..3 {
                let value = tint[channel] * (0.25 + 0.75 * diffuse) + spec_color[channel] * specular;
                pixels.push((value.clamp(0.0, 1.0) * 255.0) as u8);
            }
            pixels.push(255);
        }
    }
    pixels
}

/// GPU-resident matcap collection.
pub struct MatcapLibrary {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_groups: Vec<wgpu::BindGroup>,
}

impl MatcapLibrary {
    fn layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Matcap Bind Group")
    }

    /// Builds the library from the built-in procedural styles.
    pub fn procedural(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let size = 128;
        let sets = (0..PROCEDURAL_STYLES)
            .map(|style| (size, size, matcap_pixels(style, size)))
            .collect();
        Self::from_pixel_sets(device, queue, sets)
    }

    /// Builds the library from PNG files, one matcap per path.
    pub fn from_files<P: AsRef<Path>>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        paths: &[P],
    ) -> Result<Self, MatcapError> {
        let mut sets = Vec::with_capacity(paths.len());
        for path in paths {
            let decoded = image::open(path.as_ref())?.into_rgba8();
            let (width, height) = decoded.dimensions();
            sets.push((width, height, decoded.into_raw()));
        }
        Ok(Self::from_pixel_sets(device, queue, sets))
    }

    fn from_pixel_sets(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sets: Vec<(u32, u32, Vec<u8>)>,
    ) -> Self {
        let bind_group_layout = Self::layout(device);
        let bind_groups = sets
            .into_iter()
            .enumerate()
            .map(|(index, (width, height, pixels))| {
                let texture = TextureResource::create_rgba_texture(
                    device,
                    queue,
                    width,
                    height,
                    &pixels,
                    &format!("Matcap {}", index),
                );
                BindGroupBuilder::new(&bind_group_layout)
                    .texture(&texture.view)
                    .sampler(&texture.sampler)
                    .create(device, &format!("Matcap {} Bind Group", index))
            })
            .collect();

        Self {
            bind_group_layout,
            bind_groups,
        }
    }

    pub fn count(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Bind group for a matcap slot; out-of-range indices clamp to the last
    /// slot rather than panicking mid-frame.
    pub fn bind_group(&self, index: usize) -> &wgpu::BindGroup {
        let last = self.bind_groups.len() - 1;
        &self.bind_groups[index.min(last)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_buffers_have_expected_layout() {
        for style in 0..PROCEDURAL_STYLES {
            let pixels = matcap_pixels(style, 32);
            assert_eq!(pixels.len(), 32 * 32 * 4);
            // Alpha is fully opaque everywhere.
            assert!(pixels.chunks(4).all(|px| px[3] == 255));
        }
    }

    #[test]
    fn styles_are_distinct() {
        let a = matcap_pixels(0, 32);
        let b = matcap_pixels(1, 32);
        assert_ne!(a, b);
    }

    #[test]
    fn lit_hemisphere_is_brighter_than_unlit() {
        let size = 64u32;
        let pixels = matcap_pixels(0, size);
        let luma = |px: u32, py: u32| {
            let i = ((py * size + px) * 4) as usize;
            pixels[i] as u32 + pixels[i + 1] as u32 + pixels[i + 2] as u32
        };
        // Key light sits up-left of the sphere.
        assert!(luma(size / 4, size / 4) > luma(3 * size / 4, 3 * size / 4));
    }
}
