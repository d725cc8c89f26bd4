// Rules module - the (publisher, section) → extraction rule registry
// This file coordinates the rule system but actual implementations are in:
// - registry.rs: RuleRegistry, rule types and YAML rule files
// - profiles.rs: Built-in per-publisher rule tables

pub mod profiles;
pub mod registry;

pub use registry::*;
