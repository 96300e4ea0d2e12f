// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use thiserror::Error;

/// Every way the bootstrap can fail. None of these are recoverable: the
/// pipeline stops at the first one and hands it to the caller.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not load the Vulkan loader: {0}")]
    DriverLoad(#[source] ash::LoadingError),

    #[error("validation layers requested, but not available: {0}")]
    UnsupportedLayer(String),

    #[error("{0} is needed but not supported")]
    MissingRequiredExtension(String),

    #[error("failed to create instance: {0}")]
    InstanceCreationFailed(#[source] vk::Result),

    #[error("failed to set up debug messenger: {0}")]
    DebugMessengerFailed(#[source] vk::Result),

    #[error("failed to create window surface: {0}")]
    SurfaceCreationFailed(String),

    #[error("window system error: {0}")]
    WindowSystem(String),

    #[error("failed to find GPUs with Vulkan support")]
    NoVulkanCapableGpu,

    #[error("failed to find a suitable GPU")]
    NoSuitableGpu,

    #[error("queue families on {0} are incomplete")]
    IncompleteQueueFamilies(String),

    #[error("failed to create logical device: {0}")]
    LogicalDeviceCreationFailed(#[source] vk::Result),

    #[error("failed to create swap chain: {0}")]
    SwapchainCreationFailed(#[source] vk::Result),

    #[error("failed to create image view for swap chain image {index}: {result}")]
    ImageViewCreationFailed {
        index: usize,
        #[source]
        result: vk::Result,
    },

    #[error("driver query failed while {stage}: {result}")]
    Query {
        stage: &'static str,
        #[source]
        result: vk::Result,
    },
}

impl BootstrapError {
    pub(crate) fn query(stage: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |result| Self::Query { stage, result }
    }
}

pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;
