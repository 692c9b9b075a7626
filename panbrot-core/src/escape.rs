use crate::complex::Complex;
use crate::error::CoreError;

/// Outcome of one bounded call to [`advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// `|z|` exceeded the bailout radius on the update with this 0-based
    /// index within the call.
    Diverged(u32),

    /// Every update in the call stayed inside the bailout radius.
    Bounded,
}

/// Iterate `z ← z² + c` at most `max_steps` times, testing `|z|² > bailout_sq`
/// after each update.
///
/// Returns the last `z` together with the outcome. The function touches
/// nothing but its arguments, so chunks of one orbit can be evaluated on
/// whichever thread happens to dequeue the point: feeding the returned `z`
/// back in continues the orbit exactly where it stopped.
#[inline]
pub fn advance(mut z: Complex, c: Complex, max_steps: u32, bailout_sq: f64) -> (Complex, Escape) {
    for n in 0..max_steps {
        z = z.square() + c;
        if z.norm_sq() > bailout_sq {
            return (z, Escape::Diverged(n));
        }
    }
    (z, Escape::Bounded)
}

/// Parameters controlling chunked evaluation.
///
/// The cached `escape_radius_sq` field is recomputed on deserialization so a
/// config file only ever carries the radius itself.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct EscapeParams {
    /// Bailout radius; a point whose modulus exceeds it has escaped.
    pub escape_radius: f64,

    /// Iterations per evaluator call. Bounds how long a worker runs before
    /// it can observe a stop request.
    pub chunk_size: u32,

    /// Global iteration ceiling. A point still bounded after this many
    /// steps is treated as inside the set.
    pub max_steps: u32,

    #[serde(skip)]
    escape_radius_sq: f64,
}

impl<'de> serde::Deserialize<'de> for EscapeParams {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            #[serde(default = "default_escape_radius")]
            escape_radius: f64,
            #[serde(default = "default_chunk_size")]
            chunk_size: u32,
            #[serde(default = "default_max_steps")]
            max_steps: u32,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            escape_radius: raw.escape_radius,
            chunk_size: raw.chunk_size,
            max_steps: raw.max_steps,
            escape_radius_sq: raw.escape_radius * raw.escape_radius,
        })
    }
}

fn default_escape_radius() -> f64 {
    EscapeParams::DEFAULT_ESCAPE_RADIUS
}

fn default_chunk_size() -> u32 {
    EscapeParams::DEFAULT_CHUNK_SIZE
}

fn default_max_steps() -> u32 {
    EscapeParams::DEFAULT_MAX_STEPS
}

impl EscapeParams {
    pub const DEFAULT_ESCAPE_RADIUS: f64 = 2.0;
    pub const DEFAULT_CHUNK_SIZE: u32 = 1024;
    pub const DEFAULT_MAX_STEPS: u32 = Self::DEFAULT_CHUNK_SIZE * 8;

    pub fn new(escape_radius: f64, chunk_size: u32, max_steps: u32) -> crate::Result<Self> {
        let params = Self {
            escape_radius,
            chunk_size,
            max_steps,
            escape_radius_sq: escape_radius * escape_radius,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-check every field, e.g. after deserializing from a config file.
    pub fn validate(&self) -> crate::Result<()> {
        if self.escape_radius <= 0.0 || !self.escape_radius.is_finite() {
            return Err(CoreError::InvalidEscapeRadius(self.escape_radius));
        }
        if self.chunk_size < 1 {
            return Err(CoreError::InvalidChunkSize(self.chunk_size));
        }
        if self.max_steps < 1 {
            return Err(CoreError::InvalidMaxSteps(self.max_steps));
        }
        Ok(())
    }

    /// Pre-computed squared escape radius for the inner loop.
    #[inline]
    pub fn escape_radius_sq(&self) -> f64 {
        self.escape_radius_sq
    }

    /// Iteration budget for the next call on a point that has already
    /// consumed `steps`: a full chunk, cut short so the total never passes
    /// the ceiling.
    #[inline]
    pub fn budget(&self, steps: u32) -> u32 {
        self.chunk_size.min(self.max_steps.saturating_sub(steps))
    }
}

impl Default for EscapeParams {
    fn default() -> Self {
        Self {
            escape_radius: Self::DEFAULT_ESCAPE_RADIUS,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            max_steps: Self::DEFAULT_MAX_STEPS,
            escape_radius_sq: Self::DEFAULT_ESCAPE_RADIUS * Self::DEFAULT_ESCAPE_RADIUS,
        }
    }
}
