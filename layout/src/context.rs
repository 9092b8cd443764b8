//! Per-pass hardware parameters.
//!
//! Built with the bon builder for explicit configuration, or from environment
//! variables. The context is owned by one pass and passed by reference.

use bon::bon;

/// Hardware parameters the layout passes lower against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    /// Hardware generation the code targets.
    pub hardware_generation: u32,
    /// Shape of one tile register, `(sublanes, lanes)`.
    pub target_shape: [usize; 2],
    /// Shape of the matrix unit.
    pub mxu_shape: [usize; 2],
    /// Scratch memory available to relayouts, in sublanes. Zero disables the memory path.
    pub max_sublanes_in_scratch: usize,
}

#[bon]
impl RewriteContext {
    #[builder]
    pub fn new(
        #[builder(default = 4)] hardware_generation: u32,
        #[builder(default = [8, 128])] target_shape: [usize; 2],
        #[builder(default = [128, 128])] mxu_shape: [usize; 2],
        #[builder(default = 0)] max_sublanes_in_scratch: usize,
    ) -> Self {
        Self { hardware_generation, target_shape, mxu_shape, max_sublanes_in_scratch }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `TESSEL_HW_GENERATION` - Hardware generation (default: 4)
    /// * `TESSEL_TARGET_SUBLANES` - Tile register sublanes (default: 8)
    /// * `TESSEL_TARGET_LANES` - Tile register lanes (default: 128)
    /// * `TESSEL_MXU_ROWS` / `TESSEL_MXU_COLS` - Matrix unit shape (default: 128x128)
    /// * `TESSEL_SCRATCH_SUBLANES` - Scratch budget in sublanes (default: 0)
    pub fn from_env() -> Self {
        fn var<T: std::str::FromStr>(name: &str, default: T) -> T {
            std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
        }

        Self {
            hardware_generation: var("TESSEL_HW_GENERATION", 4),
            target_shape: [var("TESSEL_TARGET_SUBLANES", 8), var("TESSEL_TARGET_LANES", 128)],
            mxu_shape: [var("TESSEL_MXU_ROWS", 128), var("TESSEL_MXU_COLS", 128)],
            max_sublanes_in_scratch: var("TESSEL_SCRATCH_SUBLANES", 0),
        }
    }

    pub fn sublanes(&self) -> usize {
        self.target_shape[0]
    }

    pub fn lanes(&self) -> usize {
        self.target_shape[1]
    }
}

impl Default for RewriteContext {
    fn default() -> Self {
        Self::builder().build()
    }
}
