use std::sync::Arc;

use anyhow::{bail, Context};
use log::info;
use winit::window::Window;

pub struct GpuContext<'a> {
    pub surface: wgpu::Surface<'a>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl<'a> GpuContext<'a> {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let window_size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .context("Failed to find an appropriate adapter")?;

        let adapter_info = adapter.get_info();
        info!(
            "Using adapter `{}` ({:?})",
            adapter_info.name, adapter_info.backend
        );

        // Particles are read from storage buffers in the vertex stage
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel
            .flags
            .contains(wgpu::DownlevelFlags::VERTEX_STORAGE | wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            bail!("Adapter `{}` lacks compute or vertex storage support", adapter_info.name);
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("Failed to create Device")?;

        let mut config = surface
            .get_default_config(&adapter, window_size.width, window_size.height)
            .context("Surface is not supported by the adapter")?;
        // Colors are written as stored, without sRGB encoding
        let formats = surface.get_capabilities(&adapter).formats;
        if let Some(format) = non_srgb_format(&formats) {
            config.format = format;
            config.view_formats = vec![];
        }

        // Frame pacing is done on the CPU
        config.present_mode = wgpu::PresentMode::AutoNoVsync;
        surface.configure(&device, &config);
        info!("Surface format {:?}", config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn reconfigure_surface(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.reconfigure_surface();
    }
}

/// First surface format without hardware sRGB encoding
pub fn non_srgb_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats.iter().copied().find(|format| !format.is_srgb())
}
