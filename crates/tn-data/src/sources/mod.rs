pub mod memory;

pub use memory::MemoryTaxonomy;
