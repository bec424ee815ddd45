//! Built-in preset fragments, grouped by category. Each group also carries the
//! discovery defaults (topics, seed term, flavors) the editor uses when the
//! user asks for more words in that category.

use serde::Serialize;

use crate::lookup::discover::Flavor;
use crate::studio::document::Category;

#[derive(Debug, Clone, Serialize)]
pub struct LibraryItem {
    pub label: &'static str,
    pub value: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryCategory {
    pub id: Category,
    pub label: &'static str,
    pub topics: &'static str,
    pub search_term: &'static str,
    pub discover_flavors: &'static [Flavor],
    pub items: &'static [LibraryItem],
}

const fn item(label: &'static str, value: &'static str, description: &'static str) -> LibraryItem {
    LibraryItem {
        label,
        value,
        description,
        weight: None,
    }
}

const fn weighted(
    label: &'static str,
    value: &'static str,
    description: &'static str,
    weight: f64,
) -> LibraryItem {
    LibraryItem {
        label,
        value,
        description,
        weight: Some(weight),
    }
}

const ML_TRG: &[Flavor] = &[Flavor::Ml, Flavor::Trg];
const ML_TRG_SYN: &[Flavor] = &[Flavor::Ml, Flavor::Trg, Flavor::Syn];
const ML_TRG_ADJ: &[Flavor] = &[Flavor::Ml, Flavor::Trg, Flavor::Adj];

pub static LIBRARY: &[LibraryCategory] = &[
    LibraryCategory {
        id: Category::Style,
        label: "Art & Aesthetic",
        topics: "art,design,illustration",
        search_term: "art style",
        discover_flavors: ML_TRG_SYN,
        items: &[
            item("Cyberpunk", "cyberpunk aesthetic", "Neon, high-tech, low-life"),
            item("Ukiyo-e", "ukiyo-e woodblock style", "Flat perspective, woodblock texture"),
            item("Isometric", "isometric 3D render", "Parallel projection, clean geometry"),
            item("Watercolor", "watercolor painting", "Soft bleeding pigments, paper grain"),
            item("Film Noir", "film noir style", "High-contrast, moody shadows"),
            item("Baroque", "baroque painting", "Ornate, dramatic contrast"),
            weighted("Photoreal", "ultra photoreal", "High fidelity realism", 1.2),
        ],
    },
    LibraryCategory {
        id: Category::Lighting,
        label: "Lighting",
        topics: "cinematography,photography,lighting",
        search_term: "lighting",
        discover_flavors: ML_TRG_ADJ,
        items: &[
            weighted("Golden Hour", "golden hour sunlight", "Warm, soft sun", 1.1),
            item("Cinematic", "cinematic lighting", "Movie-like contrast"),
            item("Volumetric", "volumetric god rays", "Visible light beams"),
            item("Softbox", "softbox studio lighting", "Diffused, even light"),
            item("Chiaroscuro", "chiaroscuro", "Strong light-dark contrast"),
            item("Neon Rim", "neon rim lighting", "Bright edge separation"),
        ],
    },
    LibraryCategory {
        id: Category::Camera,
        label: "Camera & Lens",
        topics: "photography,camera,lens",
        search_term: "camera lens",
        discover_flavors: ML_TRG,
        items: &[
            item("35mm", "35mm lens", "Natural perspective"),
            item("85mm", "85mm portrait lens", "Flattering compression"),
            item("Macro", "macro shot", "Extreme close-up details"),
            item("Wide", "wide angle lens", "Expansive framing"),
            item("Drone", "drone aerial view", "High perspective"),
            item("Shallow DoF", "shallow depth of field, bokeh", "Subject pop"),
        ],
    },
    LibraryCategory {
        id: Category::Composition,
        label: "Composition",
        topics: "composition,photography,design",
        search_term: "composition",
        discover_flavors: ML_TRG,
        items: &[
            item("Rule of Thirds", "rule of thirds composition", "Balanced framing"),
            item("Centered", "centered composition", "Iconic symmetry"),
            item("Leading Lines", "leading lines", "Guides the eye"),
            item("Negative Space", "strong negative space", "Minimal breathing room"),
        ],
    },
    LibraryCategory {
        id: Category::Mood,
        label: "Mood & Tone",
        topics: "mood,emotion,atmosphere",
        search_term: "mood",
        discover_flavors: ML_TRG_SYN,
        items: &[
            item("Ethereal", "ethereal atmosphere", "Light, heavenly"),
            item("Ominous", "ominous atmosphere", "Threatening, dark"),
            item("Serene", "serene atmosphere", "Calm, peaceful"),
            item("Melancholic", "melancholic mood", "Quiet, pensive"),
        ],
    },
    LibraryCategory {
        id: Category::Materials,
        label: "Materials",
        topics: "materials,texture,surfaces",
        search_term: "material texture",
        discover_flavors: ML_TRG_ADJ,
        items: &[
            item("Obsidian", "obsidian surface, glossy black", "Volcanic glass"),
            item("Porcelain", "porcelain texture, fine cracks", "Ceramic smoothness"),
            item("Brushed Metal", "brushed metal, subtle scratches", "Industrial finish"),
            item("Smoke", "wisps of smoke, translucent", "Gaseous forms"),
        ],
    },
    LibraryCategory {
        id: Category::Color,
        label: "Color & Grade",
        topics: "color,grading,cinema",
        search_term: "color palette",
        discover_flavors: ML_TRG,
        items: &[
            item("Teal & Orange", "teal and orange color grading", "Blockbuster look"),
            item("Monochrome", "black and white, monochrome", "Noir vibe"),
            item("Pastel", "soft pastel palette", "Gentle colors"),
            item("High Saturation", "high saturation, vibrant colors", "Punchy look"),
        ],
    },
    LibraryCategory {
        id: Category::Scene,
        label: "Scene & World",
        topics: "landscape,architecture,environment",
        search_term: "environment",
        discover_flavors: ML_TRG_ADJ,
        items: &[
            item("Desert", "in a vast desert landscape", "Sand, heat haze"),
            item("Rainy City", "rain-soaked city streets", "Reflections, wet asphalt"),
            item("Fog", "dense fog, atmospheric perspective", "Mystery depth"),
            item("Ancient Ruins", "ancient ruins, weathered stone", "History and decay"),
        ],
    },
    LibraryCategory {
        id: Category::PostProcess,
        label: "Post & Detail",
        topics: "detail,render,texture",
        search_term: "high detail",
        discover_flavors: ML_TRG_ADJ,
        items: &[
            weighted("Ultra Detail", "intricate detail, sharp textures", "Micro detail", 1.2),
            item("Film Grain", "subtle film grain", "Analog texture"),
            item("HDR", "HDR, high dynamic range", "Punchy highlights"),
            item("Motion Blur", "cinematic motion blur", "Action feel"),
        ],
    },
];
