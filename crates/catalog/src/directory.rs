use std::collections::HashMap;

use forgemfg_core::CustomerId;

/// Opaque customer-code resolution owned by the directory collaborator.
pub trait CustomerDirectory {
    fn resolve(&self, code: &str) -> Option<CustomerId>;
}

/// Per-request snapshot of directory resolutions.
///
/// Built fresh from the collaborator for each request or editing session,
/// never held as a process-wide singleton, so a long-running process cannot
/// serve stale mappings.
#[derive(Debug, Default)]
pub struct DirectoryLookup {
    by_code: HashMap<String, CustomerId>,
}

impl DirectoryLookup {
    /// Resolve `codes` against the directory and capture the results.
    pub fn from_directory<'a, D, I>(directory: &D, codes: I) -> Self
    where
        D: CustomerDirectory + ?Sized,
        I: IntoIterator<Item = &'a str>,
    {
        let mut by_code = HashMap::new();
        for code in codes {
            if let Some(id) = directory.resolve(code) {
                by_code.insert(code.to_string(), id);
            }
        }
        Self { by_code }
    }

    pub fn get(&self, code: &str) -> Option<CustomerId> {
        self.by_code.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
