// All extraction functionality is in pubchunks-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod output;
pub mod settings;

// Re-export core types for convenience
pub use pubchunks_core::*;
