use crate::config::Config;
use crate::error::{AppError, Result};
use crate::generation::{
    ContentRequest, GeneratedVideo, GenerationProvider, ResponsePart, VideoOperation, VideoRequest,
};
use async_trait::async_trait;
use gemini_rust::{Blob, Content, Gemini, GenerationConfig, Message, Part, Role};
use serde::{Deserialize, Serialize};
use url::Url;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google provider: Gemini for images, Veo long-running jobs for video.
pub struct GeminiProvider {
    client: Gemini,
    http: reqwest::Client,
    api_key: String,
    base_url: Url,
    video_model: String,
}

impl GeminiProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(API_BASE)?;
        // gemini-rust needs the image model as an absolute URL
        let image_model = base_url.join(&qualified_model(&config.image_model))?;

        let client = Gemini::with_model_and_base_url(
            &config.gemini_api_key,
            image_model.to_string(),
            base_url.clone(),
        )
        .map_err(|e| AppError::config(format!("Gemini client setup failed: {}", e)))?;

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            base_url,
            video_model: qualified_model(&config.video_model),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    /// Sends the product image and instruction as one multimodal message.
    async fn generate_content(&self, request: ContentRequest) -> Result<Vec<ResponsePart>> {
        let blob = Blob {
            mime_type: request.image.mime_type,
            data: request.image.data,
        };

        let image_part = Part::InlineData {
            inline_data: blob,
        };

        let text_part = Part::Text {
            text: request.prompt,
            thought: None,
            thought_signature: None,
        };

        let content = Content {
            role: Some(Role::User),
            parts: Some(vec![image_part, text_part]),
        };

        let message = Message {
            role: Role::User,
            content,
        };

        let generation_config = GenerationConfig {
            response_modalities: Some(
                request
                    .modalities
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            ),
            ..Default::default()
        };

        let response = self.client
            .generate_content()
            .with_messages(vec![message])
            .with_generation_config(generation_config)
            .execute()
            .await
            .map_err(|e| AppError::generation(format!("API request failed: {:?}", e)))?;

        let mut parts = Vec::new();
        if let Some(candidate) = response.candidates.first() {
            if let Some(content_parts) = &candidate.content.parts {
                for part in content_parts {
                    match part {
                        Part::InlineData { inline_data, .. } => {
                            parts.push(ResponsePart::InlineData {
                                mime_type: inline_data.mime_type.clone(),
                                data: inline_data.data.clone(),
                            })
                        }
                        Part::Text { text, thought, .. } => {
                            if !thought.unwrap_or(false) {
                                parts.push(ResponsePart::Text(text.clone()));
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        Ok(parts)
    }

    async fn submit_video(&self, request: VideoRequest) -> Result<VideoOperation> {
        let url = self.endpoint(&format!("{}:predictLongRunning", self.video_model))?;
        let body = PredictRequest {
            instances: vec![VideoInstance {
                prompt: &request.prompt,
                image: InlineImage {
                    bytes_base64_encoded: &request.image_data,
                    mime_type: &request.image_mime_type,
                },
            }],
            parameters: VideoParameters {
                aspect_ratio: &request.aspect_ratio,
                sample_count: request.number_of_videos,
            },
        };

        let response = self.http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::video(format!("submit request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::video(format!("submit returned HTTP {}: {}", status, detail)));
        }

        let operation: OperationResponse = response
            .json()
            .await
            .map_err(|e| AppError::video(format!("invalid operation response: {}", e)))?;
        Ok(operation.into())
    }

    async fn get_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        let url = self.endpoint(&operation.name)?;

        let response = self.http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::video(format!("status request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::video(format!("status returned HTTP {}", status)));
        }

        let operation: OperationResponse = response
            .json()
            .await
            .map_err(|e| AppError::video(format!("invalid operation response: {}", e)))?;
        Ok(operation.into())
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>> {
        let url = authorized_url(locator, &self.api_key)
            .map_err(|e| AppError::VideoDownload(format!("bad locator: {}", e)))?;

        let response = self.http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::VideoDownload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::VideoDownload(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::VideoDownload(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn qualified_model(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{}", name)
    }
}

/// Appends the API key as the `key` query parameter.
pub fn authorized_url(locator: &str, api_key: &str) -> Result<Url> {
    let mut url = Url::parse(locator)?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<VideoInstance<'a>>,
    parameters: VideoParameters<'a>,
}

#[derive(Serialize)]
struct VideoInstance<'a> {
    prompt: &'a str,
    image: InlineImage<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineImage<'a> {
    bytes_base64_encoded: &'a str,
    mime_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters<'a> {
    aspect_ratio: &'a str,
    sample_count: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResult>,
    error: Option<OperationError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Deserialize, Debug)]
struct GeneratedSample {
    video: Option<VideoFile>,
}

#[derive(Deserialize, Debug)]
struct VideoFile {
    uri: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl From<OperationResponse> for VideoOperation {
    fn from(op: OperationResponse) -> Self {
        let videos = op
            .response
            .and_then(|r| r.generate_video_response)
            .map(|r| r.generated_samples)
            .unwrap_or_default()
            .into_iter()
            .map(|sample| GeneratedVideo {
                uri: sample.video.and_then(|v| v.uri),
            })
            .collect();

        VideoOperation {
            name: op.name,
            done: op.done,
            videos,
            error: op.error.map(|e| format!("(code {}) {}", e.code, e.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_carries_key() {
        let url = authorized_url("https://host/files/abc:download?alt=media", "secret").unwrap();
        assert_eq!(url.as_str(), "https://host/files/abc:download?alt=media&key=secret");

        let url = authorized_url("http://video/1", "k").unwrap();
        assert_eq!(url.query(), Some("key=k"));
    }

    #[test]
    fn provider_builds_from_model_names() {
        let config = Config::builder()
            .with_api_key("test-key")
            .with_image_model("gemini-2.5-flash-image-preview")
            .with_video_model("models/veo-2.0-generate-001")
            .build()
            .unwrap();
        let provider = GeminiProvider::new(&config).unwrap();
        assert_eq!(provider.video_model, "models/veo-2.0-generate-001");
        assert_eq!(
            provider.endpoint("operations/abc").unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/operations/abc"
        );
    }

    #[test]
    fn model_names_are_qualified_once() {
        assert_eq!(qualified_model("veo-2.0-generate-001"), "models/veo-2.0-generate-001");
        assert_eq!(qualified_model("models/veo-3"), "models/veo-3");
    }

    #[test]
    fn finished_operation_exposes_video_uris() {
        let json = r#"{
            "name": "models/veo-2.0-generate-001/operations/abc",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": "https://host/v.mp4?alt=media" } }]
                }
            }
        }"#;
        let op: VideoOperation = serde_json::from_str::<OperationResponse>(json).unwrap().into();
        assert!(op.done);
        assert_eq!(op.videos.len(), 1);
        assert_eq!(op.videos[0].uri.as_deref(), Some("https://host/v.mp4?alt=media"));
        assert_eq!(op.error, None);
    }

    #[test]
    fn pending_operation_defaults_to_not_done() {
        let json = r#"{"name": "operations/x"}"#;
        let op: VideoOperation = serde_json::from_str::<OperationResponse>(json).unwrap().into();
        assert!(!op.done);
        assert!(op.videos.is_empty());
    }

    #[test]
    fn operation_error_is_kept() {
        let json =
            r#"{"name": "operations/x", "done": true, "error": {"code": 3, "message": "blocked"}}"#;
        let op: VideoOperation = serde_json::from_str::<OperationResponse>(json).unwrap().into();
        assert_eq!(op.error.as_deref(), Some("(code 3) blocked"));
    }

    #[test]
    fn submit_body_matches_wire_format() {
        let body = PredictRequest {
            instances: vec![VideoInstance {
                prompt: "animate",
                image: InlineImage {
                    bytes_base64_encoded: "IMG1",
                    mime_type: "image/png",
                },
            }],
            parameters: VideoParameters {
                aspect_ratio: "9:16",
                sample_count: 1,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["instances"][0]["image"]["bytesBase64Encoded"], "IMG1");
        assert_eq!(value["parameters"]["aspectRatio"], "9:16");
        assert_eq!(value["parameters"]["sampleCount"], 1);
    }
}
