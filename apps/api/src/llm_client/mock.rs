//! Test doubles for the provider seam.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    ActiveProvider, GenerationRequest, PromptKind, ProviderError, ProviderFactory, ProviderKind,
    TextGenerator,
};

/// Returns a canned reply and remembers every request it served.
pub struct MockGenerator {
    kind: ProviderKind,
    model: String,
    reply: String,
    pub calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    pub fn replying(kind: ProviderKind, text: &str) -> Self {
        MockGenerator {
            kind,
            model: kind.default_model().to_string(),
            reply: text.to_string(),
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Builds mocks that sign their output with the provider they stand for,
/// and records each provider it was asked for.
#[derive(Default)]
pub struct MockFactory {
    pub built: Mutex<Vec<ProviderKind>>,
    pub fail_with: Option<String>,
}

impl MockFactory {
    pub fn failing(message: &str) -> Self {
        MockFactory {
            built: Mutex::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn built(&self) -> Vec<ProviderKind> {
        self.built.lock().unwrap().clone()
    }
}

/// Reply a mock built by [`MockFactory`] gives for `kind`.
pub fn signed_reply(provider: ProviderKind, kind: PromptKind) -> String {
    match kind {
        PromptKind::TailoredResume => {
            format!("# Sam Lee\n\nsam@example.com | 555-0100\n\nTailored by {provider}.")
        }
        PromptKind::CoverLetter => format!("Dear Hiring Manager,\n\nWritten by {provider}.\n\nSam Lee"),
        PromptKind::ConnectionTest => "OK".to_string(),
    }
}

struct SignedGenerator {
    kind: ProviderKind,
    model: String,
    fail_with: Option<String>,
}

#[async_trait]
impl TextGenerator for SignedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        match &self.fail_with {
            Some(message) => Err(ProviderError::Quota(message.clone())),
            None => Ok(signed_reply(self.kind, request.kind)),
        }
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }
}

impl ProviderFactory for MockFactory {
    fn build(&self, active: &ActiveProvider) -> Result<Box<dyn TextGenerator>, ProviderError> {
        self.built.lock().unwrap().push(active.kind);
        Ok(Box::new(SignedGenerator {
            kind: active.kind,
            model: active.model.clone(),
            fail_with: self.fail_with.clone(),
        }))
    }
}
