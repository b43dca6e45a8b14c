use bevy::render::settings::WgpuLimits;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("particle store needs {requested} bytes, device allows {limit}")]
    BufferTooLarge { requested: u64, limit: u64 },
    #[error("simulation needs {requested} workgroups per dispatch, device allows {limit}")]
    TooManyWorkgroups { requested: u32, limit: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// The subset of device limits the particle store has to fit in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_storage_bytes: u64,
    pub max_workgroups: u32,
}

impl From<&WgpuLimits> for DeviceLimits {
    fn from(limits: &WgpuLimits) -> Self {
        Self {
            max_storage_bytes: (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size),
            max_workgroups: limits.max_compute_workgroups_per_dimension,
        }
    }
}

impl DeviceLimits {
    pub fn check(&self, store_bytes: u64, workgroups: u32) -> Result<(), DeviceError> {
        if store_bytes > self.max_storage_bytes {
            return Err(DeviceError::BufferTooLarge {
                requested: store_bytes,
                limit: self.max_storage_bytes,
            });
        }
        if workgroups > self.max_workgroups {
            return Err(DeviceError::TooManyWorkgroups {
                requested: workgroups,
                limit: self.max_workgroups,
            });
        }
        Ok(())
    }
}
