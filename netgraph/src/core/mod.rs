//! Cross-cutting pieces shared by the builder and the exporters.

pub mod summary;
