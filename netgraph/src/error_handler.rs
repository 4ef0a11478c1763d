//! Unified error handling for `netgraph`.
//!
//! This module exposes a single top-level error type [`NetGraphError`] for the whole
//! library and groups domain-specific errors in nested enums: [`DocumentError`] for
//! raw document parsing, [`SchemaError`] for schema compilation and [`ConfigError`]
//! for profile definitions.
//!
//! Lookup misses, missing keys and unresolved pointers are *not* errors: they are
//! reported through `Option` returns and tracing events.
//!
//! All messages include the prefix `[NetGraph]` to simplify attribution in logs.

use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, NetGraphError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `netgraph` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum NetGraphError {
    /// The raw document could not be read; no node was created.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A schema definition could not be compiled.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A profile definition could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/* ------------------------------------------------------------------------- */
/* Document errors                                                           */
/* ------------------------------------------------------------------------- */

/// Fatal document parse failures.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input was empty or whitespace only.
    #[error("[NetGraph] document is empty")]
    Empty,

    /// Input exceeded the configured `max_document_bytes`.
    #[error("[NetGraph] document is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Input size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// XML syntax error or structural problem (unclosed or stray tags).
    #[error("[NetGraph] malformed XML at byte {position}: {reason}")]
    Xml {
        /// Byte offset reported by the reader.
        position: u64,
        /// Human-readable reason.
        reason: String,
    },

    /// JSON syntax error (after trailing-comma cleanup).
    #[error("[NetGraph] malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/* ------------------------------------------------------------------------- */
/* Schema errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors raised while compiling a schema definition against a hook registry.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Entity type names must be non-empty.
    #[error("[NetGraph] entity type name must not be empty")]
    EmptyTypeName,

    /// A pointer names a hook that was never registered.
    #[error("[NetGraph] `{type_name}` references unknown {kind} hook `{name}`")]
    UnknownHook {
        /// Entity type declaring the pointer.
        type_name: String,
        /// Hook family (`value`, `transform`, `target`).
        kind: &'static str,
        /// Hook name as written in the definition.
        name: String,
    },

    /// A pointer declares no target strategy.
    #[error("[NetGraph] pointer #{index} of `{type_name}` declares no target")]
    MissingTarget {
        /// Entity type declaring the pointer.
        type_name: String,
        /// Pointer position within the entity's link list.
        index: usize,
    },

    /// A pointer declares several target strategies.
    #[error("[NetGraph] pointer #{index} of `{type_name}` declares more than one target strategy")]
    AmbiguousTarget {
        /// Entity type declaring the pointer.
        type_name: String,
        /// Pointer position within the entity's link list.
        index: usize,
    },

    /// A pointer declares several value strategies (`value`, `value_fn`, `transform`).
    #[error("[NetGraph] pointer #{index} of `{type_name}` declares more than one value strategy")]
    AmbiguousValue {
        /// Entity type declaring the pointer.
        type_name: String,
        /// Pointer position within the entity's link list.
        index: usize,
    },

    /// A pointer reads no value at all.
    #[error("[NetGraph] pointer #{index} of `{type_name}` reads no value: set `from`, `value` or `value_fn`")]
    MissingValue {
        /// Entity type declaring the pointer.
        type_name: String,
        /// Pointer position within the entity's link list.
        index: usize,
    },

    /// A transform hook needs a `from` path to read raw values.
    #[error("[NetGraph] pointer #{index} of `{type_name}` has a transform but no `from` path")]
    TransformWithoutPath {
        /// Entity type declaring the pointer.
        type_name: String,
        /// Pointer position within the entity's link list.
        index: usize,
    },
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors raised while loading a profile definition.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Profile file could not be read.
    #[error("[NetGraph] cannot read profile {path}: {source}")]
    Io {
        /// Path as given by the caller.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Profile YAML did not deserialize.
    #[error("[NetGraph] invalid profile YAML: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// Profile deserialized but failed validation.
    #[error("[NetGraph] invalid profile: {0}")]
    Invalid(String),
}
