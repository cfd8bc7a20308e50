/// A single-turn request to the hosted model.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Standing instructions; sent as the system prompt when non-empty.
    pub system: String,
    /// The question plus whatever context it needs.
    pub prompt: String,
    pub max_tokens: u32,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens,
        }
    }
}
