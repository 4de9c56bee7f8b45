/*!
# GFX Engine

Frame recording and batched draw submission for immediate-mode 2D/3D
rendering.

Application code records geometry and pipeline state into a `Frame` every
tick; a `Graphics` backend then executes the frame in one pass, issuing the
fewest native state changes it can.

## Architecture

- **Material**: compiled program + attribute layout + uniform values, shared as `Arc<Material>`
- **Frame**: ordered task list; consecutive draws with the same material are merged into one draw call
- **FrameCacheVertices**: CPU-side reusable vertex/index blob, recorded with the same API as a frame
- **Graphics**: backend contract (`draw`, `create_material`, `create_cache_vertices`, `resize`)
- **GraphicsDevice**: native API surface driven by `DeviceGraphics`, the generic state-diffing backend
- **RecordingDevice**: headless device recording every native call

Backend implementations provide concrete `GraphicsDevice` types.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod color;
pub mod image;
pub mod material;
pub mod frame;
pub mod graphics;

// Main gfx namespace module
pub mod gfx {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logging hub)
    pub use crate::engine::Engine;

    // Value types
    pub use crate::color::Color;
    pub use crate::image::{Image, ImageFormat};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{format_entry, DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Material sub-module
    pub mod material {
        pub use crate::material::*;
    }

    // Frame recording sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Backend sub-module
    pub mod graphics {
        pub use crate::graphics::*;
    }
}

// Re-export math library at crate root
pub use glam;
