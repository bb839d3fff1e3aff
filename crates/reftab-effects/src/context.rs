//! Context resolution: turning a context name and a reference name into the
//! path of a reference file.

use crate::error::ContextError;
use std::path::{Path, PathBuf};

/// A resolved context that can locate the references it assigns.
pub trait ContextHandle {
    fn name(&self) -> &str;

    /// Path of the file holding `reference`.
    fn locate_reference(&self, reference: &str) -> Result<PathBuf, ContextError>;
}

/// Resolves context names into handles. Resolution must not mutate state
/// visible to other callers.
pub trait ContextResolver {
    type Handle: ContextHandle;

    fn resolve(&self, name: &str) -> Result<Self::Handle, ContextError>;
}

impl<T: ContextResolver + ?Sized> ContextResolver for &T {
    type Handle = T::Handle;

    fn resolve(&self, name: &str) -> Result<Self::Handle, ContextError> {
        (**self).resolve(name)
    }
}

/// Resolver over a flat local directory of reference files.
///
/// Every context resolves to the same directory; the context name is only
/// validated and carried for diagnostics.
#[derive(Debug, Clone)]
pub struct ReferenceCache {
    root: PathBuf,
}

impl ReferenceCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContextResolver for ReferenceCache {
    type Handle = CachedContext;

    fn resolve(&self, name: &str) -> Result<CachedContext, ContextError> {
        if !is_plain_file_name(name) {
            return Err(ContextError::InvalidName(name.to_string()));
        }
        Ok(CachedContext {
            name: name.to_string(),
            root: self.root.clone(),
        })
    }
}

/// A context resolved by [`ReferenceCache`].
#[derive(Debug, Clone)]
pub struct CachedContext {
    name: String,
    root: PathBuf,
}

impl ContextHandle for CachedContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn locate_reference(&self, reference: &str) -> Result<PathBuf, ContextError> {
        let reference = reference.trim().to_lowercase();
        let not_found = || ContextError::NotFound {
            context: self.name.clone(),
            reference: reference.clone(),
        };
        if !is_plain_file_name(&reference) {
            return Err(not_found());
        }
        let path = self.root.join(&reference);
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found())
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}
