//! Deterministic drafting pipeline.
//!
//! Every request flows through:
//! 1. `Categorizer::categorize()` — weighted phrase matching, no LLM
//! 2. `ContentGenerator::generate()` — ordered rule lists over extracted context
//!    (or `TemplateSet::render()` under the template strategy)
//! 3. `naturalize()` — grammar, redundancy and flow cleanup
//! 4. `StyleTransformer::apply()` — tone passes
//! 5. `QualityChecker::run()` — warnings and gating booleans
//!
//! `RefinementOrchestrator::refine()` optionally sends the result to the
//! generation client and keeps the candidate only if it survives the same
//! checks plus the severity gate.

pub mod checks;
pub mod context;
pub mod eval;
pub mod generator;
pub mod naturalize;
pub mod processor;
pub mod refine;
pub mod rules;
pub mod style;
pub mod template;
pub mod types;
