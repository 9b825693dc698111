//! # Preprocessor Chain
//!
//! Ordered text-to-text rewriters applied to the whole music string before
//! tokenization. Each stage sees the output of the previous one; the chain
//! output is what the token dispatcher splits on whitespace.
//!
//! ## Standard Order
//! 1. [`ReplacementPreprocessor`] - user token map (L-system style rewriting)
//! 2. [`InstructionPreprocessor`] - `{key args}` macro expansion
//! 3. [`CollectedNotesPreprocessor`] - `(C E G)q` expansion
//! 4. [`UppercasePreprocessor`] - case normalization outside protected spans
//! 5. [`ParenSpacesPreprocessor`] - escapes spaces inside parentheses
//! 6. [`MicrotonePreprocessor`] - `M<frequency>` pitch-wheel expansion
//! 7. [`FunctionPreprocessor`] - preprocess-time `:name(args)` expansion
//!
//! The order is load-bearing: collected-note groups must be expanded before
//! uppercasing (the uppercase stage protects paren spans, and group members
//! must not be protected), paren escaping must run after both, and the
//! microtone stage matches the uppercased `M`.
//!
//! Unknown instruction keys and unknown function names pass through
//! unchanged so a later sub-grammar can still claim the token.

mod collected;
mod functions;
mod instruction;
mod microtone;
mod parens;
mod replacement;
mod uppercase;

pub use collected::CollectedNotesPreprocessor;
pub use functions::{FunctionPreprocessor, PreprocessorFunction};
pub use instruction::{Instruction, InstructionPreprocessor};
pub use microtone::MicrotonePreprocessor;
pub use parens::ParenSpacesPreprocessor;
pub use replacement::ReplacementPreprocessor;
pub use uppercase::UppercasePreprocessor;

use crate::context::ParserContext;
use crate::error::StaccatoError;

/// A text-to-text rewrite pass applied before tokenization.
pub trait Preprocessor {
    fn preprocess(&self, text: &str, ctx: &mut ParserContext)
        -> Result<String, StaccatoError>;
}

/// A fixed-order sequence of preprocessors.
pub struct PreprocessorChain {
    stages: Vec<Box<dyn Preprocessor>>,
}

impl PreprocessorChain {
    /// The standard seven-stage chain with empty replacement, instruction,
    /// and function registries.
    pub fn standard() -> Self {
        Self::empty()
            .with(ReplacementPreprocessor::new())
            .with(InstructionPreprocessor::new())
            .with(CollectedNotesPreprocessor)
            .with(UppercasePreprocessor)
            .with(ParenSpacesPreprocessor)
            .with(MicrotonePreprocessor)
            .with(FunctionPreprocessor::new())
    }

    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with(mut self, stage: impl Preprocessor + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run every stage in order.
    pub fn run(&self, text: &str, ctx: &mut ParserContext) -> Result<String, StaccatoError> {
        let mut current = text.to_string();
        for stage in &self.stages {
            current = stage.preprocess(&current, ctx)?;
        }
        log::trace!("preprocessed: {}", current);
        Ok(current)
    }
}

impl Default for PreprocessorChain {
    fn default() -> Self {
        Self::standard()
    }
}
