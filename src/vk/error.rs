use erupt::vk;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum GraphicsError {
    Vulkan(vk::Result),
    Loader(String),
    Allocation(String),
    Shader(std::io::Error),
    Window(winit::error::OsError),
    NoCapableDevice,
    NoSurfaceFormat,
    Unmapped,
}

impl GraphicsError {
    pub(super) fn loader(err: impl fmt::Debug) -> Self {
        GraphicsError::Loader(format!("{:?}", err))
    }

    pub(super) fn allocation(err: impl fmt::Debug) -> Self {
        GraphicsError::Allocation(format!("{:?}", err))
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::Vulkan(result) => write!(f, "vulkan call failed: {}", result),
            GraphicsError::Loader(err) => write!(f, "failed to load vulkan: {}", err),
            GraphicsError::Allocation(err) => write!(f, "device memory allocation failed: {}", err),
            GraphicsError::Shader(err) => write!(f, "invalid shader module: {}", err),
            GraphicsError::Window(err) => write!(f, "failed to open window: {}", err),
            GraphicsError::NoCapableDevice => f.write_str("no device can present to the window"),
            GraphicsError::NoSurfaceFormat => f.write_str("surface reports no formats"),
            GraphicsError::Unmapped => f.write_str("host-visible buffer is not mapped"),
        }
    }
}

impl Error for GraphicsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GraphicsError::Shader(err) => Some(err),
            GraphicsError::Window(err) => Some(err),
            _ => None,
        }
    }
}

impl From<vk::Result> for GraphicsError {
    fn from(result: vk::Result) -> Self {
        GraphicsError::Vulkan(result)
    }
}

impl From<std::io::Error> for GraphicsError {
    fn from(err: std::io::Error) -> Self {
        GraphicsError::Shader(err)
    }
}

impl From<winit::error::OsError> for GraphicsError {
    fn from(err: winit::error::OsError) -> Self {
        GraphicsError::Window(err)
    }
}
