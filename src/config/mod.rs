pub mod load;
pub mod presets;
pub mod save;
pub mod types;

pub use load::load_settings;
pub use presets::{
    DEFAULT_BATCH_SUFFIX, compressed_output_path, create_config_from_settings,
    create_default_config, create_fast_config, create_preset_config, create_quality_config,
    create_quick_preview_config, default_output_path, output_path_in, retarget_output,
};
pub use save::{add_recent_path, save_settings};
pub use types::{
    CompressionConfig, Config, MAX_GRID_DIMENSION, MAX_RECENT_PATHS, Preset, ProcessingConfig,
    UserSettings, parse_grid,
};
