//! Node identifiers and sentinel states recognized inside call networks.
//!
//! Trained networks carry four semantic singleton nodes addressed by the
//! identifiers below; every other node is a per-method node whose identifier
//! is a fully-qualified method name and whose outcomes are the true/false
//! states.

/// Identifier of the enclosing-method context node.
pub const CONTEXT_NODE: &str = "context";

/// Identifier of the call-group node (one outcome per usage pattern).
pub const CALL_GROUPS_NODE: &str = "patterns";

/// Identifier of the definition node.
pub const DEFINITION_NODE: &str = "definition";

/// Identifier of the definition-kind node.
pub const DEFINITION_KIND_NODE: &str = "kind";

/// Conventional first outcome of the singleton nodes. Selectable like any
/// other state.
pub const DUMMY_STATE: &str = "dummy";

/// Outcome of a per-method node meaning "this method is called".
pub const TRUE_STATE: &str = "true";

/// Outcome of a per-method node meaning "this method is not called".
pub const FALSE_STATE: &str = "false";

/// Identifier substituted when the enclosing method is not known.
pub const UNKNOWN_METHOD: &str = "LUnknown.unknown()V";

/// Identifier substituted when no defining method was observed.
pub const DUMMY_METHOD: &str = "LDummy.dummy()V";

/// Identifier of the no-method sentinel carried by trained networks.
///
/// Rebased onto the receiver type and pinned to false when a call set is
/// observed; filtered verbatim from definition recommendations.
pub const NO_METHOD: &str = "LNone.none()V";

/// Null-object method identifier, excluded from observed-call views.
pub const NULL_METHOD: &str = "Lnull.null()V";
