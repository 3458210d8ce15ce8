//! Static catalog of Replicate models offered to clients.

use serde::Serialize;

/// Model used when neither the request nor the configuration names one.
pub const DEFAULT_MODEL_ID: &str = "black-forest-labs/flux-schnell";

/// A model entry as presented to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// The curated model list, in display order.
pub const MODEL_CATALOG: &[ModelInfo] = &[
    ModelInfo {
        id: DEFAULT_MODEL_ID,
        name: "FLUX.1 Schnell",
        description: "Fast image generation with FLUX.1",
    },
    ModelInfo {
        id: "black-forest-labs/flux-dev",
        name: "FLUX.1 Dev",
        description: "High-quality image generation with FLUX.1",
    },
    ModelInfo {
        id: "stability-ai/sdxl",
        name: "Stable Diffusion XL",
        description: "High-quality text-to-image generation",
    },
    ModelInfo {
        id: "stability-ai/stable-diffusion",
        name: "Stable Diffusion",
        description: "Classic Stable Diffusion model",
    },
];
