//! Fully-qualified type and method names.
//!
//! Identifiers follow the JVM naming scheme the trained networks were built
//! from: a type is `Ljava/lang/String`, a method is the type followed by a
//! dot and the method signature, `Ljava/lang/String.trim()Ljava/lang/String;`.
//! Names are interned as `Arc<str>` so clones are cheap.

use std::fmt;
use std::sync::Arc;

/// A fully-qualified receiver type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Wraps a fully-qualified type identifier.
    pub fn new(identifier: &str) -> Self {
        Self(Arc::from(identifier))
    }

    /// The raw identifier.
    pub fn identifier(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully-qualified method name.
///
/// The declaring type is everything before the first `.`; the signature is
/// everything after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodName(Arc<str>);

impl MethodName {
    /// Wraps a fully-qualified method identifier.
    pub fn new(identifier: &str) -> Self {
        Self(Arc::from(identifier))
    }

    /// The raw identifier.
    pub fn identifier(&self) -> &str {
        &self.0
    }

    /// The declaring type part of the identifier.
    pub fn declaring_type(&self) -> TypeName {
        match self.0.find('.') {
            Some(position) => TypeName::new(&self.0[..position]),
            None => TypeName::new(""),
        }
    }

    /// The signature part of the identifier (method name plus descriptor).
    pub fn signature(&self) -> &str {
        match self.0.find('.') {
            Some(position) => &self.0[position + 1..],
            None => &self.0,
        }
    }

    /// Rewrites the declaring type to `receiver`, keeping the signature.
    pub fn rebase(&self, receiver: &TypeName) -> MethodName {
        MethodName(Arc::from(format!(
            "{}.{}",
            receiver.identifier(),
            self.signature()
        )))
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
