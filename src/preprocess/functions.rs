//! Preprocess-time function expansion.
//!
//! Some `:name(args)` calls are resolved during preprocessing into literal
//! music-string text (distinct from the sub-grammar-time function calls,
//! which are delivered to the sink as events). A call whose name is not in
//! the registry passes through unchanged so the function sub-grammar can
//! claim it later.

use std::collections::HashMap;

use super::Preprocessor;
use crate::context::ParserContext;
use crate::error::StaccatoError;
use crate::lexical::unescape_spaces;

/// A function expanded at preprocess time.
pub trait PreprocessorFunction {
    /// Uppercase name this function registers under.
    fn name(&self) -> &str;
    /// Expand a call into literal text, or `None` when the arguments do not
    /// apply (the call then passes through unchanged).
    fn apply(&self, args: &str, ctx: &ParserContext) -> Option<String>;
}

pub struct FunctionPreprocessor {
    functions: HashMap<String, Box<dyn PreprocessorFunction>>,
}

impl FunctionPreprocessor {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn with(mut self, function: impl PreprocessorFunction + 'static) -> Self {
        self.functions
            .insert(function.name().to_uppercase(), Box::new(function));
        self
    }

    fn expand_token(&self, token: &str, ctx: &ParserContext) -> Option<String> {
        let rest = token.strip_prefix(':')?;
        let open = rest.find('(')?;
        let close = rest.rfind(')')?;
        if close <= open {
            return None;
        }
        let name = rest[..open].to_uppercase();
        let function = self.functions.get(&name)?;
        let args = unescape_spaces(&rest[open + 1..close]);
        function.apply(&args, ctx)
    }
}

impl Default for FunctionPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for FunctionPreprocessor {
    fn preprocess(
        &self,
        text: &str,
        ctx: &mut ParserContext,
    ) -> Result<String, StaccatoError> {
        if self.functions.is_empty() {
            return Ok(text.to_string());
        }
        let out: Vec<String> = text
            .split(' ')
            .map(|token| {
                self.expand_token(token, ctx)
                    .unwrap_or_else(|| token.to_string())
            })
            .collect();
        Ok(out.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Repeats its argument twice, the simplest possible expansion.
    struct Twice;

    impl PreprocessorFunction for Twice {
        fn name(&self) -> &str {
            "TWICE"
        }

        fn apply(&self, args: &str, _ctx: &ParserContext) -> Option<String> {
            if args.is_empty() {
                return None;
            }
            Some(format!("{} {}", args, args))
        }
    }

    fn run(text: &str) -> String {
        FunctionPreprocessor::new()
            .with(Twice)
            .preprocess(text, &mut ParserContext::bare())
            .unwrap()
    }

    #[test]
    fn test_registered_function_expands() {
        assert_eq!(run(":TWICE(Cq) Dq"), "Cq Cq Dq");
    }

    #[test]
    fn test_escaped_spaces_restored_in_args() {
        let input = format!(":TWICE(Cq{}Eq)", crate::lexical::SPACE_ESCAPE);
        assert_eq!(run(&input), "Cq Eq Cq Eq");
    }

    #[test]
    fn test_unknown_function_passes_through() {
        assert_eq!(run(":PW(64,0)"), ":PW(64,0)");
    }

    #[test]
    fn test_inapplicable_args_pass_through() {
        assert_eq!(run(":TWICE()"), ":TWICE()");
    }

    #[test]
    fn test_non_function_tokens_untouched() {
        assert_eq!(run("Cq :x Dq"), "Cq :x Dq");
    }
}
