//! services/api/src/adapters/inference.rs
//!
//! Adapter for an OpenAI-compatible chat-completions backend. It implements the
//! `ExamGenerationService` and `ResourceAnalysisService` ports from the core crate.
//!
//! Every fragment of a request goes into a single user message, in order.
//! Inline binary content (images and PDFs) travels as an `image_url` part
//! holding a base64 data URL, which Gemini's OpenAI-compatible endpoint accepts
//! for both.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use exam_forge_core::{
    domain::{Exam, ExamConfig, Resource},
    ports::{ExamGenerationService, PortError, PortResult, ResourceAnalysisService},
    request::{
        build_analysis_request, build_exam_request, ContentFragment, InferenceRequest,
        EXAM_SCHEMA_NAME,
    },
    response::{analysis_outcome, parse_exam},
};
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct OpenAiInferenceAdapter {
    client: Client<OpenAIConfig>,
    exam_model: String,
    analysis_model: String,
}

impl OpenAiInferenceAdapter {
    pub fn new(client: Client<OpenAIConfig>, exam_model: String, analysis_model: String) -> Self {
        Self {
            client,
            exam_model,
            analysis_model,
        }
    }

    /// Sends one request and returns the raw text of the first choice.
    /// An answer with no content comes back as an empty string.
    async fn complete(&self, model: &str, request: InferenceRequest) -> PortResult<String> {
        debug!(
            model,
            fragments = request.fragments.len(),
            structured = request.output_schema.is_some(),
            "Sending inference request"
        );

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(
                user_message_parts(&request.fragments),
            ))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(vec![ChatCompletionRequestMessage::User(message)]);
        if let Some(schema) = request.output_schema {
            args.response_format(json_schema_format(schema));
        }
        let chat_request = args
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::inference(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Maps request fragments onto chat content parts, preserving order.
pub fn user_message_parts(fragments: &[ContentFragment]) -> Vec<ChatCompletionRequestUserMessageContentPart> {
    fragments
        .iter()
        .filter_map(|fragment| match fragment {
            ContentFragment::Text(text) => Some(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText { text: text.clone() },
            )),
            ContentFragment::InlineData { .. } => fragment.data_url().map(|url| {
                ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url,
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                )
            }),
        })
        .collect()
}

/// Optional question fields rule out strict mode, which would demand every
/// property be listed as required.
fn json_schema_format(schema: serde_json::Value) -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            name: EXAM_SCHEMA_NAME.to_string(),
            description: Some("A practice exam generated from study resources.".to_string()),
            schema: Some(schema),
            strict: Some(false),
        },
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl ExamGenerationService for OpenAiInferenceAdapter {
    async fn generate_exam(&self, resources: &[Resource], config: &ExamConfig) -> PortResult<Exam> {
        let request = build_exam_request(resources, config)?;
        let raw = self.complete(&self.exam_model, request).await?;
        let exam = parse_exam(&raw)?;
        info!(
            exam_id = %exam.id,
            questions = exam.questions.len(),
            "Exam generated from {} resource(s)",
            resources.len()
        );
        Ok(exam)
    }
}

#[async_trait]
impl ResourceAnalysisService for OpenAiInferenceAdapter {
    async fn analyze_resource(&self, resource: &Resource) -> String {
        let request = build_analysis_request(resource);
        analysis_outcome(self.complete(&self.analysis_model, request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_keep_fragment_order_and_inline_data_as_data_urls() {
        let parts = user_message_parts(&[
            ContentFragment::InlineData {
                mime_type: "application/pdf".into(),
                data: "JVBERi0=".into(),
            },
            ContentFragment::Text("Context Material (File: a.pdf, Category: TEXTBOOK)".into()),
        ]);

        assert_eq!(parts.len(), 2);
        match &parts[0] {
            ChatCompletionRequestUserMessageContentPart::ImageUrl(image) => {
                assert_eq!(image.image_url.url, "data:application/pdf;base64,JVBERi0=");
            }
            _ => panic!("inline data should become an image_url part"),
        }
        assert!(matches!(
            &parts[1],
            ChatCompletionRequestUserMessageContentPart::Text(t) if t.text.starts_with("Context Material")
        ));
    }

    #[test]
    fn schema_format_carries_exam_schema() {
        let schema = exam_forge_core::request::exam_output_schema();
        match json_schema_format(schema.clone()) {
            ResponseFormat::JsonSchema { json_schema } => {
                assert_eq!(json_schema.name, EXAM_SCHEMA_NAME);
                assert_eq!(json_schema.schema, Some(schema));
            }
            _ => panic!("expected a json_schema response format"),
        }
    }
}
