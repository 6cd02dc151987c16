pub use canvas::SurfaceCanvas;
pub use circle::{CircleInstance, CircleRenderer};
pub use error::GraphicsError;
pub use instance::Instance;
pub use swapchain::Swapchain;
use types::*;

macro_rules! include_shader {
    ($filename:expr) => {
        include_bytes!(concat!(env!("OUT_DIR"), "/", $filename, ".spv"))
    };
}

mod canvas;
mod circle;
mod error;
mod instance;
mod swapchain;

/// Forwards validation layer messages to `log`.
mod debug {
    use erupt::vk;

    pub fn create_info() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'static> {
        vk::DebugUtilsMessengerCreateInfoEXTBuilder::new()
            .message_severity(message_severity(log::max_level()))
            .message_type(vk::DebugUtilsMessageTypeFlagsEXT::all())
            .pfn_user_callback(Some(callback))
    }

    fn message_severity(filter: log::LevelFilter) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        let error = vk::DebugUtilsMessageSeverityFlagsEXT::ERROR_EXT;
        let warning = error | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING_EXT;
        match filter {
            log::LevelFilter::Off => vk::DebugUtilsMessageSeverityFlagsEXT::empty(),
            log::LevelFilter::Error => error,
            log::LevelFilter::Warn => warning,
            log::LevelFilter::Info => warning | vk::DebugUtilsMessageSeverityFlagsEXT::INFO_EXT,
            log::LevelFilter::Debug | log::LevelFilter::Trace => {
                vk::DebugUtilsMessageSeverityFlagsEXT::all()
            }
        }
    }

    fn level(severity: vk::DebugUtilsMessageSeverityFlagBitsEXT) -> log::Level {
        if severity >= vk::DebugUtilsMessageSeverityFlagBitsEXT::ERROR_EXT {
            log::Level::Error
        } else if severity >= vk::DebugUtilsMessageSeverityFlagBitsEXT::WARNING_EXT {
            log::Level::Warn
        } else if severity >= vk::DebugUtilsMessageSeverityFlagBitsEXT::INFO_EXT {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }

    unsafe extern "system" fn callback(
        severity: vk::DebugUtilsMessageSeverityFlagBitsEXT,
        _: vk::DebugUtilsMessageTypeFlagsEXT,
        p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
        _: *mut std::ffi::c_void,
    ) -> vk::Bool32 {
        let message = std::ffi::CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();
        log::log!(target: "vulkan", level(severity), "{}", message);
        vk::FALSE
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn severity_follows_log_filter() {
            assert!(message_severity(log::LevelFilter::Off).is_empty());
            assert_eq!(
                message_severity(log::LevelFilter::Error),
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR_EXT
            );
            assert!(!message_severity(log::LevelFilter::Warn)
                .contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO_EXT));
            assert_eq!(
                message_severity(log::LevelFilter::Trace),
                vk::DebugUtilsMessageSeverityFlagsEXT::all()
            );
        }

        #[test]
        fn validation_errors_log_as_errors() {
            assert_eq!(
                level(vk::DebugUtilsMessageSeverityFlagBitsEXT::ERROR_EXT),
                log::Level::Error
            );
            assert_eq!(
                level(vk::DebugUtilsMessageSeverityFlagBitsEXT::VERBOSE_EXT),
                log::Level::Debug
            );
        }
    }
}

mod types {
    use erupt::vk;

    #[derive(Debug, Default, Copy, Clone)]
    pub struct SwapchainInfo {
        pub(super) surface: vk::SurfaceKHR,
        pub(super) surface_caps: vk::SurfaceCapabilitiesKHR,
        pub(super) surface_format: vk::SurfaceFormatKHR,
        pub(super) present_mode: vk::PresentModeKHR,
        pub(super) extent: vk::Extent2D,
    }

    #[derive(Debug, Default, Copy, Clone)]
    pub struct QueueInfo {
        pub(super) family: u32,
        pub(super) queue: vk::Queue,
    }

    #[derive(Debug, Default, Copy, Clone)]
    pub struct RenderInfo {
        pub(super) render_pass: vk::RenderPass,
        pub(super) extent: vk::Extent2D,
    }
}
