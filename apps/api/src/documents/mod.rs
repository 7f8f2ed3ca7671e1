// Document types: the registry binding each type to its prompt builder and signature
// layout, plus typed access to the free-form field map.

pub mod fields;
pub mod registry;

pub use registry::DocumentRegistry;
