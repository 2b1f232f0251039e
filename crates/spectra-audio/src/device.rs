use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, SampleFormat, StreamConfig};
use spectra_foundation::AudioError;

pub struct DeviceManager {
    host: Host,
}

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
}

/// An activated input endpoint: the opened device plus its negotiated
/// 2-channel f32 stream configuration and discovered sample rate.
pub struct ActiveInput {
    pub device: Device,
    pub config: StreamConfig,
    pub sample_rate: u32,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    pub fn host_id(&self) -> cpal::HostId {
        self.host.id()
    }

    /// Lists active input endpoints, marking the host default.
    pub fn enumerate_devices(&self) -> Vec<DeviceInfo> {
        let default_name = self
            .host
            .default_input_device()
            .and_then(|d| d.name().ok());

        let mut devices = Vec::new();
        if let Ok(inputs) = self.host.input_devices() {
            for (index, device) in inputs.enumerate() {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        index,
                        is_default: Some(&name) == default_name.as_ref(),
                        name,
                    });
                }
            }
        }
        devices
    }

    /// Opens the input endpoint at `index`, or the host default when `None`.
    pub fn open_device(&self, index: Option<usize>) -> Result<Device, AudioError> {
        match index {
            None => self
                .host
                .default_input_device()
                .ok_or(AudioError::DeviceNotFound { name: None }),
            Some(index) => {
                let devices: Vec<Device> = self
                    .host
                    .input_devices()
                    .map_err(|e| AudioError::Fatal(format!("Failed to enumerate devices: {e}")))?
                    .collect();
                let count = devices.len();
                devices
                    .into_iter()
                    .nth(index)
                    .ok_or(AudioError::EndpointIndexOutOfRange { index, count })
            }
        }
    }

    /// Activates `index` and negotiates a 2-channel f32 stream.
    ///
    /// The pipeline consumes f32 stereo frames only; devices that cannot
    /// deliver that format are rejected rather than converted.
    pub fn activate(&self, index: Option<usize>) -> Result<ActiveInput, AudioError> {
        let device = self.open_device(index)?;
        if let Ok(name) = device.name() {
            tracing::info!(
                "Selected input endpoint: {} (host: {:?})",
                name,
                self.host_id()
            );
        }

        let config = negotiate_stereo_f32(&device)?;
        let sample_rate = config.sample_rate;
        tracing::info!(
            sample_rate,
            channels = config.channels,
            "Stream format: 2-channel IEEE float"
        );

        Ok(ActiveInput {
            device,
            config,
            sample_rate,
        })
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

fn negotiate_stereo_f32(device: &Device) -> Result<StreamConfig, AudioError> {
    // Prefer the default config when it already fits.
    if let Ok(default_config) = device.default_input_config() {
        if default_config.channels() >= 2 && default_config.sample_format() == SampleFormat::F32 {
            return Ok(StreamConfig {
                channels: 2,
                sample_rate: default_config.sample_rate(),
                buffer_size: cpal::BufferSize::Default,
            });
        }
    }

    // Otherwise search the supported ranges for a stereo f32 layout.
    let configs = device.supported_input_configs()?;
    for range in configs {
        if range.channels() >= 2 && range.sample_format() == SampleFormat::F32 {
            let config = range.with_max_sample_rate();
            return Ok(StreamConfig {
                channels: 2,
                sample_rate: config.sample_rate(),
                buffer_size: cpal::BufferSize::Default,
            });
        }
    }

    Err(AudioError::FormatNotSupported {
        format: "no 2-channel f32 input configuration".to_string(),
    })
}
