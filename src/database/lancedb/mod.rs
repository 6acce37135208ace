// LanceDB vector database module
// Persists embedding records and answers cosine nearest-neighbour queries

pub mod vector_store;

pub use vector_store::VectorStore;
