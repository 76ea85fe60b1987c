//! Adapter discovery and (platform, device) index selection.
//!
//! The harness is steered by two non-negative indices, so adapters are
//! grouped by backend in order of first appearance: the platform index picks
//! the backend group, the device index picks an adapter within it.

use pollster::block_on;
use tracing::info;
use wgpu::{
    Adapter, Backend, Backends, Device, DeviceDescriptor, Features, Instance, InstanceDescriptor,
    Limits, Queue,
};

use spmv_core::ExecError;

pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    adapter_name: String,
}

impl GpuContext {
    pub fn new(platform: u32, device_index: u32) -> Result<Self, ExecError> {
        block_on(Self::new_async(platform, device_index))
    }

    async fn new_async(platform: u32, device_index: u32) -> Result<Self, ExecError> {
        let instance = Instance::new(&InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let adapters = instance.enumerate_adapters(Backends::all());
        if adapters.is_empty() {
            return Err(ExecError::Device("no GPU adapters found".into()));
        }

        let groups = group_by_backend(adapters);
        let platform_count = groups.len();
        let (backend, devices) =
            groups
                .into_iter()
                .nth(platform as usize)
                .ok_or_else(|| {
                    ExecError::Device(format!(
                        "platform index {platform} out of range ({platform_count} available)"
                    ))
                })?;

        let device_count = devices.len();
        let adapter = devices.into_iter().nth(device_index as usize).ok_or_else(|| {
            ExecError::Device(format!(
                "device index {device_index} out of range ({device_count} available on {backend:?})"
            ))
        })?;

        let adapter_info = adapter.get_info();
        info!(
            backend = ?adapter_info.backend,
            device = %adapter_info.name,
            "selected adapter"
        );

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("spmv harness device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|err| ExecError::Device(err.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter_name: adapter_info.name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn limits(&self) -> Limits {
        self.device.limits()
    }
}

fn group_by_backend(adapters: Vec<Adapter>) -> Vec<(Backend, Vec<Adapter>)> {
    let mut groups: Vec<(Backend, Vec<Adapter>)> = Vec::new();
    for adapter in adapters {
        let backend = adapter.get_info().backend;
        match groups.iter_mut().find(|(b, _)| *b == backend) {
            Some((_, members)) => members.push(adapter),
            None => groups.push((backend, vec![adapter])),
        }
    }
    groups
}
