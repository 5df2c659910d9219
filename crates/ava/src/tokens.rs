use std::sync::LazyLock;
use tiktoken_rs::CoreBPE;

static TOKENIZER: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        tracing::warn!(error = %e, "cl100k_base tokenizer unavailable, using character estimate");
        None
    }
});

/// Estimated prompt size in model tokens.
pub fn count_tokens(text: &str) -> usize {
    match TOKENIZER.as_ref() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => text.chars().count().div_ceil(4),
    }
}

/// Render an integer with comma thousands separators (12345 -> "12,345").
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Token estimate for one prompt against one model's limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBudget {
    pub model: String,
    pub tokens: usize,
    pub limit: usize,
}

impl TokenBudget {
    pub fn measure(text: &str, model: &str, limit: usize) -> Self {
        Self {
            model: model.to_string(),
            tokens: count_tokens(text),
            limit,
        }
    }

    pub fn is_over(&self) -> bool {
        self.tokens > self.limit
    }

    pub fn excess(&self) -> usize {
        self.tokens.saturating_sub(self.limit)
    }

    /// One sentence for upload replies saying whether the content fits.
    pub fn status_line(&self) -> String {
        if self.is_over() {
            format!(
                "This is {} tokens over the limit, so actions that send it to {} won't run. Switch to a model with a larger token limit to use them.",
                format_thousands(self.excess()),
                self.model
            )
        } else {
            "This is within the token limit.".to_string()
        }
    }

    pub fn capacity_message(&self) -> String {
        format!(
            "The data is c.{} tokens, which is {} too many tokens for {}. Please select a model that allows more tokens and try again.",
            format_thousands(self.tokens),
            format_thousands(self.excess()),
            self.model
        )
    }
}
