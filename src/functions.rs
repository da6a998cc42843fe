// ABOUTME: Host-function trait, invocation context, and the function registry

use crate::cancel::CancellationToken;
use crate::error::ExecError;
use crate::limiter::ResourceLimiter;
use crate::resolver::ScriptResolver;
use crate::signature::FunctionSignature;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Frozen name→function table a `LinkedProgram` executes against.
pub type FunctionTable = HashMap<String, Arc<dyn JyroFunction>>;

/// A function implemented by the host (or the bundled standard library) and
/// callable by name from a script.
///
/// Implementations must be thread-safe: one function instance is shared by
/// every execution the host runs, possibly concurrently.
pub trait JyroFunction: Send + Sync {
    fn signature(&self) -> &FunctionSignature;

    /// Arguments have already passed [`FunctionSignature::validate_args`];
    /// implementations may still reject values (e.g. a negative index) by
    /// returning an error.
    fn execute(&self, args: &[Value], ctx: &mut FunctionContext<'_>) -> Result<Value, ExecError>;
}

/// Execution state lent to a host function for the duration of one call.
pub struct FunctionContext<'a> {
    pub(crate) root: &'a mut Value,
    pub(crate) limiter: &'a mut ResourceLimiter,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) functions: &'a FunctionTable,
    pub(crate) resolver: Option<&'a dyn ScriptResolver>,
}

impl FunctionContext<'_> {
    /// The `Data` root, including any mutations the script has already made.
    pub fn data(&self) -> &Value {
        &*self.root
    }

    pub fn data_mut(&mut self) -> &mut Value {
        &mut *self.root
    }

    /// Long-running host functions should poll this and bail out early.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Ordered collection of registered functions. Registration order is kept so
/// the linker can report duplicate names (last writer wins) as warnings.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    entries: Vec<Arc<dyn JyroFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, function: Arc<dyn JyroFunction>) {
        self.entries.push(function);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn JyroFunction>> {
        self.entries.iter()
    }

    /// Folds registrations into a frozen table, reporting the names that were
    /// registered more than once.
    pub fn build_table(&self) -> (FunctionTable, Vec<String>) {
        let mut table = FunctionTable::new();
        let mut duplicates = Vec::new();
        for function in &self.entries {
            let name = function.signature().name.clone();
            if table.insert(name.clone(), Arc::clone(function)).is_some() {
                duplicates.push(name);
            }
        }
        (table, duplicates)
    }
}
