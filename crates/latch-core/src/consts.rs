/// Untimed kernel invocations before measurement starts.
pub const DEFAULT_WARMUPS: usize = 100;

/// Timed kernel invocations.
pub const DEFAULT_RUNS: usize = 500;

/// Keypoint budget handed to the detector.
pub const DEFAULT_KEYPOINT_BUDGET: usize = 5000;

/// Image loaded when no input is given.
pub const DEFAULT_INPUT: &str = "test.jpg";

/// Keypoints closer than this to any image edge are dropped before marshalling.
/// Covers the rotated sampling window at unit scale.
pub const DEFAULT_BORDER_MARGIN: f32 = 36.0;

/// 64-bit words per descriptor (512 bits).
pub const DESCRIPTOR_WORDS: usize = 8;

/// Bytes per descriptor in accelerator memory.
pub const DESCRIPTOR_BYTES: usize = DESCRIPTOR_WORDS * 8;

/// Entries in the triplet table; one descriptor bit per entry.
pub const TRIPLET_COUNT: usize = DESCRIPTOR_WORDS * 64;

/// `u16` channels per triplet table entry.
pub const TRIPLET_CHANNELS: usize = 4;

/// Side of the square sampling window warped around each keypoint.
pub const LATCH_WINDOW: usize = 32;

/// Half side of the mini-patches compared inside the window (7x7 patches).
pub const LATCH_PATCH_HALF: usize = 3;

/// Keypoint size that maps to a unit sampling scale (ORB level-0 patch size).
pub const LATCH_REFERENCE_SIZE: f32 = 31.0;

/// Default ORB detector parameters.
pub const DEFAULT_ORB_SCALE_FACTOR: f32 = 1.2;
pub const DEFAULT_ORB_LEVELS: usize = 8;
pub const DEFAULT_ORB_EDGE_THRESHOLD: usize = 31;
pub const DEFAULT_ORB_FIRST_LEVEL: usize = 0;
pub const DEFAULT_ORB_WTA_K: usize = 2;
pub const DEFAULT_ORB_PATCH_SIZE: usize = 31;
pub const DEFAULT_ORB_FAST_THRESHOLD: u8 = 20;

/// Harris detector free parameter.
pub const HARRIS_K: f32 = 0.04;

/// Side of the window over which the Harris structure tensor is summed.
pub const HARRIS_BLOCK_SIZE: usize = 7;

/// Minimum pixel count (h*w) to detect pyramid levels in parallel.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Magic bytes at the start of a descriptor dump file.
pub const DUMP_MAGIC: &[u8; 8] = b"LATCHDSC";

/// Current descriptor dump format version.
pub const DUMP_VERSION: u32 = 1;
