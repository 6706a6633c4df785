//! crates/exam_forge_core/src/request.rs
//!
//! Builds backend-independent inference requests: an ordered list of content
//! fragments plus, for exam generation, the JSON schema the answer must follow.

use serde_json::{json, Value};

use crate::domain::{ExamConfig, QuestionType, Resource};
use crate::ports::{PortError, PortResult};

pub const EXAM_SCHEMA_NAME: &str = "practice_exam";

pub const ANALYSIS_INSTRUCTION: &str =
    "Briefly analyze this study material. Summarize key concepts and identify possible exam topics. Be concise.";

/// One piece of request content, in the order the backend should read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFragment {
    /// Base64 payload with its media type.
    InlineData { mime_type: String, data: String },
    Text(String),
}

impl ContentFragment {
    /// The payload as a `data:` URL, for backends that take binary content by URL.
    pub fn data_url(&self) -> Option<String> {
        match self {
            ContentFragment::InlineData { mime_type, data } => {
                Some(format!("data:{};base64,{}", mime_type, data))
            }
            ContentFragment::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub fragments: Vec<ContentFragment>,
    /// Present only when a structured JSON answer is required.
    pub output_schema: Option<Value>,
}

/// Fragments for one resource: inline data followed by a label for binary
/// content, a single labelled text fragment otherwise.
pub fn resource_fragments(resource: &Resource) -> Vec<ContentFragment> {
    if resource.is_binary {
        vec![
            ContentFragment::InlineData {
                mime_type: resource.mime_type.clone(),
                data: resource.content.clone(),
            },
            ContentFragment::Text(format!(
                "Context Material (File: {}, Category: {})",
                resource.name, resource.category
            )),
        ]
    } else {
        vec![ContentFragment::Text(format!(
            "Context Material [{}]: {}\nContent:\n{}",
            resource.category, resource.name, resource.content
        ))]
    }
}

pub fn build_exam_request(resources: &[Resource], config: &ExamConfig) -> PortResult<InferenceRequest> {
    if resources.is_empty() {
        return Err(PortError::InvalidInput(
            "Please add at least one resource!".to_string(),
        ));
    }

    let mut fragments: Vec<ContentFragment> =
        resources.iter().flat_map(resource_fragments).collect();
    fragments.push(ContentFragment::Text(exam_instructions(config)));

    Ok(InferenceRequest {
        fragments,
        output_schema: Some(exam_output_schema()),
    })
}

pub fn build_analysis_request(resource: &Resource) -> InferenceRequest {
    let mut fragments = resource_fragments(resource);
    fragments.push(ContentFragment::Text(ANALYSIS_INSTRUCTION.to_string()));
    InferenceRequest {
        fragments,
        output_schema: None,
    }
}

pub fn exam_instructions(config: &ExamConfig) -> String {
    let focus = config.focus_topics.trim();
    let focus = if focus.is_empty() { "Comprehensive" } else { focus };

    format!(
        r#"You are an elite academic board examiner. Generate a comprehensive practice exam based strictly on the provided resources.

Difficulty: {difficulty}
Questions: {count}
Focus: {focus}

CRITICAL INSTRUCTIONS:
1. Cross-reference 'TEXTBOOK' facts with 'SPECIFICATION' standards.
2. Emulate 'SAMPLE' phrasing/structure.
3. MANDATORY: Include a diverse mix of the following question types:
   - multiple_choice: Standard 4-option questions. Provide 'options'.
   - true_false: Questions where the answer is either True or False. Provide 'options'.
   - fill_blank: A sentence with one or more underscores representing missing terms.
   - matching: Two columns of items to be paired. Provide 'matchingPairs'.
   - ordering: A list of items that must be placed in a specific logical sequence (chronological, process steps, size, etc.). Provide 'orderedItems' in the CORRECT sequence.
   - short_answer: Concise written responses.
   - essay: Long-form analysis.
4. Provide detailed 'explanation' and 'correctAnswer' for every question.
5. Output valid JSON matching the schema precisely."#,
        difficulty = config.difficulty,
        count = config.question_count.get(),
        focus = focus,
    )
}

/// JSON schema of the exam object the backend must return.
pub fn exam_output_schema() -> Value {
    let question_types: Vec<&str> = QuestionType::ALL.iter().map(|t| t.as_str()).collect();

    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "title": { "type": "string" },
            "description": { "type": "string" },
            "durationMinutes": { "type": "number" },
            "totalMarks": { "type": "number" },
            "questions": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "text": { "type": "string" },
                        "type": { "type": "string", "enum": question_types },
                        "options": { "type": "array", "items": { "type": "string" } },
                        "matchingPairs": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "left": { "type": "string" },
                                    "right": { "type": "string" }
                                },
                                "required": ["left", "right"]
                            }
                        },
                        "orderedItems": { "type": "array", "items": { "type": "string" } },
                        "correctAnswer": { "type": "string" },
                        "explanation": { "type": "string" },
                        "marks": { "type": "number" },
                        "sourceReference": { "type": "string" }
                    },
                    "required": ["id", "text", "type", "correctAnswer", "marks"]
                }
            }
        },
        "required": ["id", "title", "description", "questions", "totalMarks"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, QuestionCount, ResourceCategory};
    use uuid::Uuid;

    fn text_resource(category: ResourceCategory, name: &str, content: &str) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            category,
            content: content.to_string(),
            mime_type: "text/plain".to_string(),
            name: name.to_string(),
            is_binary: false,
        }
    }

    fn image_resource() -> Resource {
        Resource {
            id: Uuid::new_v4(),
            category: ResourceCategory::Sample,
            content: "iVBORw0KGgo=".to_string(),
            mime_type: "image/png".to_string(),
            name: "page1.png".to_string(),
            is_binary: true,
        }
    }

    #[test]
    fn binary_resource_emits_inline_data_then_label() {
        let fragments = resource_fragments(&image_resource());
        assert_eq!(
            fragments,
            vec![
                ContentFragment::InlineData {
                    mime_type: "image/png".to_string(),
                    data: "iVBORw0KGgo=".to_string(),
                },
                ContentFragment::Text("Context Material (File: page1.png, Category: SAMPLE)".to_string()),
            ]
        );
        assert_eq!(
            fragments[0].data_url().as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
    }

    #[test]
    fn text_resource_embeds_category_name_and_content() {
        let fragments = resource_fragments(&text_resource(ResourceCategory::Textbook, "Ch 1", "Cells divide."));
        assert_eq!(
            fragments,
            vec![ContentFragment::Text(
                "Context Material [TEXTBOOK]: Ch 1\nContent:\nCells divide.".to_string()
            )]
        );
    }

    #[test]
    fn exam_request_keeps_resource_order_and_ends_with_instructions() {
        let resources = vec![
            text_resource(ResourceCategory::Specification, "Spec", "Know mitosis."),
            image_resource(),
        ];
        let config = ExamConfig {
            question_count: QuestionCount::new(15).unwrap(),
            difficulty: Difficulty::Hard,
            focus_topics: String::new(),
        };

        let request = build_exam_request(&resources, &config).unwrap();

        assert_eq!(request.fragments.len(), 4);
        assert!(matches!(&request.fragments[0], ContentFragment::Text(t) if t.contains("[SPECIFICATION]")));
        assert!(matches!(&request.fragments[1], ContentFragment::InlineData { .. }));
        let ContentFragment::Text(instructions) = &request.fragments[3] else {
            panic!("last fragment should be the instructions");
        };
        assert!(instructions.contains("Difficulty: Hard"));
        assert!(instructions.contains("Questions: 15"));
        assert!(instructions.contains("Focus: Comprehensive"));
        assert!(request.output_schema.is_some());
    }

    #[test]
    fn exam_request_rejects_empty_resources() {
        let result = build_exam_request(&[], &ExamConfig::default());
        assert!(matches!(result, Err(PortError::InvalidInput(_))));
    }

    #[test]
    fn schema_lists_every_question_type() {
        let schema = exam_output_schema();
        let types = &schema["properties"]["questions"]["items"]["properties"]["type"]["enum"];
        assert_eq!(types.as_array().map(Vec::len), Some(7));
    }

    #[test]
    fn schema_leaves_duration_optional() {
        let schema = exam_output_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(required, ["id", "title", "description", "questions", "totalMarks"]);
        assert!(schema["properties"]["durationMinutes"].is_object());
    }

    #[test]
    fn analysis_request_has_no_schema() {
        let request = build_analysis_request(&image_resource());
        assert!(request.output_schema.is_none());
        assert_eq!(
            request.fragments.last(),
            Some(&ContentFragment::Text(ANALYSIS_INSTRUCTION.to_string()))
        );
    }
}
