/// Constants used throughout the lampsmith codebase
// Cache file kept next to the generator scripts
pub const CACHE_FILE_NAME: &str = ".lamp_build_cache.json";

// Subdirectory receiving the exported meshes
pub const OUTPUT_DIR_NAME: &str = "STLs";

// Generator scripts are Python run inside the host application
pub const SCRIPT_EXTENSION: &str = "py";
pub const OUTPUT_EXTENSION: &str = "stl";

// Script names matching this pattern are treated as generators
pub const SCRIPT_NAME_PATTERN: &str = r"^(lamp_.*|.*_lamp_.*|simple_.*lamp.*)\.py$";
pub const BASE_SCRIPT_NAME: &str = "lamp_base.py";

// Output name inference
pub const SCRIPT_PREFIX: &str = "lamp_";
pub const SCRIPT_INFIX: &str = "_lamp";
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_shade";
pub const OUTPUT_MARKER_TOKENS: &[&str] = &["shade", "base"];

// Host application
pub const HOST_PATH_VAR: &str = "BLENDER_PATH";
pub const HOST_BINARY_NAME: &str = "blender";
pub const HOST_BACKGROUND_FLAG: &str = "--background";
pub const HOST_SCRIPT_FLAG: &str = "--python";

// Streaming hash buffer size
pub const HASH_CHUNK_SIZE: usize = 8192;
