//! Stage definitions for the three-step generation chain.
//!
//! Each stage pairs a workflow template with the parameters the caller
//! supplies. Stage output feeds the next stage's input: the generated
//! image becomes the multiview reference, and the three labeled views
//! become the mesh stage's inputs.

use std::collections::HashMap;

/// A fully-parameterized request for one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageRequest {
    /// Generate a single image from a text prompt.
    TextToImage {
        prompt: String,
        negative_prompt: String,
    },

    /// Generate front/back/left views from a reference image.
    Multiview {
        /// Server-side path of the reference image.
        reference_image: String,
        prompt: String,
    },

    /// Generate a textured GLB mesh from three view images.
    Mesh {
        front_image: String,
        back_image: String,
        left_image: String,
    },
}

impl StageRequest {
    /// Name of the workflow template this stage renders.
    pub fn template_name(&self) -> &'static str {
        match self {
            StageRequest::TextToImage { .. } => "text_to_image",
            StageRequest::Multiview { .. } => "multiview",
            StageRequest::Mesh { .. } => "mesh",
        }
    }

    /// Placeholder substitutions for the template.
    pub fn params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        match self {
            StageRequest::TextToImage {
                prompt,
                negative_prompt,
            } => {
                params.insert("prompt".to_string(), prompt.clone());
                params.insert("negative_prompt".to_string(), negative_prompt.clone());
            }
            StageRequest::Multiview {
                reference_image,
                prompt,
            } => {
                params.insert("reference_image".to_string(), reference_image.clone());
                params.insert("prompt".to_string(), prompt.clone());
            }
            StageRequest::Mesh {
                front_image,
                back_image,
                left_image,
            } => {
                params.insert("front_image".to_string(), front_image.clone());
                params.insert("back_image".to_string(), back_image.clone());
                params.insert("left_image".to_string(), left_image.clone());
            }
        }
        params
    }
}
