//! Composition plan, overlay compositing and the end-to-end pipeline.

/// Premultiplied overlay compositing.
pub mod composite;
/// Run orchestration: render, mix, mux.
pub mod pipeline;
/// Per-run composition plan.
pub mod plan;
