pub mod document;
pub mod organization;
pub mod template;
