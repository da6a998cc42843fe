// ABOUTME: Script resolvers supplying source text for CallScript by name

use cap_std::fs::Dir;
use std::collections::HashMap;
use std::path::Path;

/// Maps a script name to Jyro source. Consulted only by the `CallScript`
/// builtin; an engine without a resolver simply fails those calls.
pub trait ScriptResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Fixed set of named scripts, handy for hosts that embed their script
/// library and for tests.
#[derive(Default)]
pub struct InMemoryScriptResolver {
    scripts: HashMap<String, String>,
}

impl InMemoryScriptResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, source: &str) -> &mut Self {
        self.scripts.insert(name.to_string(), source.to_string());
        self
    }
}

impl ScriptResolver for InMemoryScriptResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.scripts.get(name).cloned()
    }
}

/// Resolves `name` to `<dir>/<name>.jyro` inside a capability-sandboxed
/// directory. Absolute names and `..` traversals never leave the root: the
/// capability `Dir` rejects them by construction, and we refuse them up
/// front for a cleaner miss.
pub struct DirScriptResolver {
    root: Dir,
}

impl DirScriptResolver {
    pub const EXTENSION: &'static str = "jyro";

    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = Dir::open_ambient_dir(path, cap_std::ambient_authority())?;
        Ok(DirScriptResolver { root })
    }
}

impl ScriptResolver for DirScriptResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        if name.starts_with('/') || name.starts_with('\\') || name.contains("..") {
            return None;
        }
        let file = format!("{}.{}", name, Self::EXTENSION);
        self.root.read_to_string(file).ok()
    }
}
