use crate::block::Document;

/// A single read-only pass over a document that produces one output artifact.
///
/// Implementors take their configuration at construction time and must not
/// keep any state between calls to `render`.
pub trait Render {
    type Artifact;

    fn render(&self, doc: &Document) -> Self::Artifact;
}
