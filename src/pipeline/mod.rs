pub mod safety;
pub mod extraction;
pub mod rag;
pub mod plan;
