use crate::consts::{LATCH_PATCH_HALF, LATCH_WINDOW, TRIPLET_CHANNELS, TRIPLET_COUNT};
use crate::error::{LatchError, Result};

/// Version tag of the built-in triplet table.
pub const LATCH_TABLE_VERSION: &str = "latch-512-v1";

const TABLE_SEED: u64 = 0x4c41_5443_485f_3531;

/// Lowest window coordinate at which a full mini-patch fits.
const POINT_MIN: u64 = LATCH_PATCH_HALF as u64;
/// Number of valid mini-patch centres along one window axis.
const POINT_SPAN: u64 = (LATCH_WINDOW - 2 * LATCH_PATCH_HALF) as u64;

/// One table entry: `[anchor, companion_a, companion_b, reserved]`.
pub type Triplet = [u16; TRIPLET_CHANNELS];

/// Built-in sampling triplets, fixed at compile time.
static LATCH_TRIPLETS: [Triplet; TRIPLET_COUNT] = generate_triplets(TABLE_SEED);

const fn splitmix64(state: u64) -> (u64, u64) {
    let next = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = next;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    (z ^ (z >> 31), next)
}

const fn random_point(state: u64) -> (u16, u64) {
    let (bits, next) = splitmix64(state);
    let x = POINT_MIN + bits % POINT_SPAN;
    let y = POINT_MIN + (bits >> 32) % POINT_SPAN;
    (pack_point(x as u8, y as u8), next)
}

const fn generate_triplets(seed: u64) -> [Triplet; TRIPLET_COUNT] {
    let mut table = [[0u16; TRIPLET_CHANNELS]; TRIPLET_COUNT];
    let mut state = seed;
    let mut i = 0;
    while i < TRIPLET_COUNT {
        let (anchor, s) = random_point(state);
        state = s;
        let mut first = anchor;
        while first == anchor {
            let (p, s) = random_point(state);
            first = p;
            state = s;
        }
        let mut second = anchor;
        while second == anchor || second == first {
            let (p, s) = random_point(state);
            second = p;
            state = s;
        }
        table[i] = [anchor, first, second, 0];
        i += 1;
    }
    table
}

/// Pack a window coordinate into one table channel.
pub const fn pack_point(x: u8, y: u8) -> u16 {
    x as u16 | ((y as u16) << 8)
}

/// Unpack a table channel into `(x, y)` window coordinates.
pub const fn unpack_point(packed: u16) -> (usize, usize) {
    ((packed & 0xff) as usize, (packed >> 8) as usize)
}

/// Immutable, versioned triplet table shared by every kernel invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantTable {
    version: String,
    entries: Vec<Triplet>,
}

impl ConstantTable {
    /// Build a table from explicit entries (e.g. a small synthetic table).
    pub fn new(version: impl Into<String>, entries: Vec<Triplet>) -> Result<Self> {
        if entries.is_empty() {
            return Err(LatchError::InvalidConfig(
                "triplet table must have at least one entry".into(),
            ));
        }
        Ok(Self {
            version: version.into(),
            entries,
        })
    }

    /// The built-in 512-entry LATCH table.
    pub fn latch() -> Self {
        Self {
            version: LATCH_TABLE_VERSION.to_string(),
            entries: LATCH_TRIPLETS.to_vec(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entries(&self) -> &[Triplet] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `u16` elements (entries * 4).
    pub fn element_count(&self) -> usize {
        self.entries.len() * TRIPLET_CHANNELS
    }

    pub fn byte_len(&self) -> usize {
        self.element_count() * std::mem::size_of::<u16>()
    }
}
