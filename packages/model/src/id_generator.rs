use uuid::Uuid;

/// Sequential id generator for block nodes
///
/// Ids have the shape `<seed>-<n>`. A fresh generator draws its seed from a
/// random uuid, so ids minted in different sessions never collide; tests use
/// [`IdGenerator::from_seed`] for predictable output.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self::from_seed(uuid[..8].to_string())
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Skip past an id that already exists in a loaded document
    pub fn reserve(&mut self, existing: &str) {
        let counter = existing
            .strip_prefix(self.seed.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse::<u64>().ok());

        if let Some(n) = counter {
            self.count = self.count.max(n);
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
