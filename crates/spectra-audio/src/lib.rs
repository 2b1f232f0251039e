pub mod capture;
pub mod device;
pub mod frame;
pub mod frame_buffer;

// Public API
pub use capture::CaptureThread;
pub use device::{ActiveInput, DeviceInfo, DeviceManager};
pub use frame::AudioFrame;
pub use frame_buffer::{BatchChannels, FrameBuffer};
