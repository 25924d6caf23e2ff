//! Application state shared by every handler.

use streamvault_core::Config;
use streamvault_processing::VideoPipeline;

pub struct AppState {
    pub config: Config,
    pub pipeline: VideoPipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: VideoPipeline) -> Self {
        Self { config, pipeline }
    }
}
