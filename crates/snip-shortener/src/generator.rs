use uuid::Uuid;

/// Default code length: the first hyphen-delimited segment of a
/// canonical UUID.
const DEFAULT_LENGTH: usize = 8;

/// Produces candidate short codes.
///
/// Implementations are pure generators with no storage access; they do
/// not guarantee uniqueness. A collision surfaces from the backend as
/// `CodeTaken`, at which point the caller generates a fresh candidate
/// and retries.
pub trait CodeGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

/// Derives codes from a random v4 UUID truncated to a short prefix.
#[derive(Debug, Clone)]
pub struct UuidPrefixGenerator {
    length: usize,
}

impl UuidPrefixGenerator {
    pub fn new() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }

    /// A generator producing codes of the given length, capped at the
    /// 32 hex digits a UUID provides.
    pub fn with_length(length: usize) -> Self {
        Self {
            length: length.clamp(1, 32),
        }
    }
}

impl Default for UuidPrefixGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for UuidPrefixGenerator {
    fn generate(&self) -> String {
        let mut code = Uuid::new_v4().simple().to_string();
        code.truncate(self.length);
        code
    }
}
