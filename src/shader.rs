//! Loading WGSL from disk and turning wgpu validation failures into errors

use std::{borrow::Cow, path::Path};

use anyhow::{anyhow, Context};
use log::info;

pub async fn load_shader(
    device: &wgpu::Device,
    path: &Path,
) -> anyhow::Result<wgpu::ShaderModule> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read shader `{}`", path.display()))?;

    let label = path.display().to_string();
    let module = validated(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label.as_str()),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        })
    })
    .await
    .with_context(|| format!("Failed to compile shader `{label}`"))?;

    info!("Loaded shader `{label}`");
    Ok(module)
}

/// Runs `create` inside a validation error scope
pub async fn validated<T>(
    device: &wgpu::Device,
    create: impl FnOnce() -> T,
) -> anyhow::Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();

    match device.pop_error_scope().await {
        Some(error) => Err(anyhow!("{error}")),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use std::mem::offset_of;

    use naga::{
        valid::{Capabilities, ValidationFlags, Validator},
        AddressSpace, Module, ShaderStage, TypeInner,
    };

    use super::*;
    use crate::physics::SimParams;

    fn parse(name: &str) -> Module {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("assets/shaders")
            .join(name);
        let source = std::fs::read_to_string(&path).unwrap();
        let module = naga::front::wgsl::parse_str(&source)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(&source)));

        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|e| panic!("{name}: {e:?}"));
        module
    }

    fn entry_points(module: &Module) -> Vec<(&str, ShaderStage)> {
        module
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage))
            .collect()
    }

    /// `(group, binding, name)` of every bound global
    fn bindings(module: &Module) -> Vec<(u32, u32, &str)> {
        module
            .global_variables
            .iter()
            .filter_map(|(_, var)| {
                let binding = var.binding.as_ref()?;
                Some((binding.group, binding.binding, var.name.as_deref()?))
            })
            .collect()
    }

    #[test]
    fn compute_kernel_matches_host() {
        let module = parse("compute_particles.wgsl");
        assert_eq!(entry_points(&module), [("main", ShaderStage::Compute)]);
        assert_eq!(
            module.entry_points[0].workgroup_size,
            [crate::physics::PARTICLES_PER_WORKGROUP, 1, 1]
        );
        assert_eq!(
            bindings(&module),
            [(0, 0, "positions"), (0, 1, "velocities"), (0, 2, "params")]
        );

        let (_, params) = module
            .global_variables
            .iter()
            .find(|(_, var)| var.space == AddressSpace::Uniform)
            .unwrap();
        let TypeInner::Struct { members, span } = &module.types[params.ty].inner else {
            panic!("uniform is not a struct");
        };
        assert_eq!(*span as usize, std::mem::size_of::<SimParams>());

        let layout: Vec<_> = members
            .iter()
            .map(|m| (m.name.as_deref().unwrap(), m.offset as usize))
            .collect();
        assert_eq!(
            layout,
            [
                ("attractor", offset_of!(SimParams, attractor)),
                ("dt", offset_of!(SimParams, dt)),
                ("damping", offset_of!(SimParams, damping)),
                ("gravity", offset_of!(SimParams, gravity)),
                ("acceleration_cap", offset_of!(SimParams, acceleration_cap)),
            ]
        );
    }

    #[test]
    fn vertex_stage_reads_positions() {
        let module = parse("particles.vert.wgsl");
        assert_eq!(entry_points(&module), [("vertex", ShaderStage::Vertex)]);
        assert_eq!(bindings(&module), [(0, 0, "positions")]);
    }

    #[test]
    fn fragment_stage_reads_colors() {
        let module = parse("base.frag.wgsl");
        assert_eq!(entry_points(&module), [("fragment", ShaderStage::Fragment)]);
        assert_eq!(bindings(&module), [(0, 1, "colors")]);
    }
}
