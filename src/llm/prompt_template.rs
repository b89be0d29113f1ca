//! 提示词模板
//!
//! 构建发送给 LLM 的对话消息

use strum_macros::{Display, EnumString};

/// 默认指令: 将简单提示词改写为 FLUX 双编码器 (CLIP-L / T5-XXL) 的 JSON
pub const DEFAULT_INSTRUCTIONS: &str = r#"You are an expert prompt engineer for the FLUX text-to-image model, which uses two text encoders: CLIP-L and T5-XXL. Your task is to take a users simple prompt and rewrite it into an optimized JSON object that leverages the unique strengths of each encoder.  ## Instructions:  1.  **For the `"CLIP_L"` property:** This prompt should focus on the **core subjects, objects, visual style, and overall composition**. It works best with descriptive keywords and phrases, separated by commas. Focus on *what* to see. 2.  **For the `"T5XXL"` property:** This prompt must be a **detailed, grammatically correct sentence** that describes the scene in a more narrative way. It excels at understanding complex relationships between objects, specific actions, and intricate details. Focus on *how* everything comes together in the scene.  ## Example:  **User Prompt:** `a knight fighting a dragon`  **Your Output:** {   "CLIP_L": "epic fantasy painting, a knight in shining armor, a fearsome red dragon, castle in the background, dramatic lighting, highly detailed, cinematic",   "T5XXL": "A cinematic, highly detailed fantasy painting of a knight in shining armor bravely fighting a fearsome red dragon in front of a distant castle under a dramatically lit sky." }  ## Constraints:  - Your final response must **only** be the raw JSON object. - Do not include any explanations, markdown formatting, or any other text.  ---  Now, process the following prompt: "{prompt}""#;

/// 指令中的占位符
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const CAPTION_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Try your best to give the best response possible to the user.";

const CAPTION_INSTRUCTIONS: &str = r#"Create a detailed visually descriptive caption of this description, which will be used as a prompt for a text to image AI system (caption only, no instructions like "create an image").Remove any mention of digital artwork or artwork style. Give detailed visual descriptions of the character(s), including ethnicity, skin tone, expression etc. Imagine using keywords for a still for someone who has aphantasia. Describe the image style, e.g. any photographic or art styles / techniques utilized. Make sure to fully describe all aspects of the cinematography, with abundant technical details and visual descriptions. If there is more than one image, combine the elements and characters from all of the images creatively into a single cohesive composition with a single background, inventing an interaction between the characters. Be creative in combining the characters into a single cohesive scene. Focus on two primary characters (or one) and describe an interesting interaction between them, such as a hug, a kiss, a fight, giving an object, an emotional reaction / interaction. If there is more than one background in the images, pick the most appropriate one. Your output is only the caption itself, no comments or extra formatting. The caption is in a single long paragraph. If you feel the images are inappropriate, invent a new scene / characters inspired by these. Additionally, incorporate a specific movie director's visual style and describe the lighting setup in detail, including the type, color, and placement of light sources to create the desired mood and atmosphere. Always frame the scene, including details about the film grain, color grading, and any artifacts or characteristics specific. Compress the output to be concise while retaining key visual details. MAX OUTPUT SIZE no more than 250 characters."#;

/// 少样本对话 (user, assistant 交替)
const FEW_SHOT: [(Role, &str); 8] = [
    (
        Role::User,
        "An image generation prompt is a single paragraph summary to describe the subject and style of an image. It includes a description of the kind of image, the subject of the image, and some description of the image medium and style in the form of short keyword.\n\nCreate an image generation prompt for the subject \"a creepy creature shadow in the dark in a dimly lit tunnel\" in the style \"digital art illustration with intricate details\".",
    ),
    (
        Role::Assistant,
        "Image Description: A digitally crafted illustration portrays a chilling scene within a dimly lit, cavernous tunnel. The dominant subject of the image is a mysterious creature, its form subtly discernible only as a menacing shadow on the walls of the tunnel. Its elongated silhouette suggests a serpentine creature with sharp protrusions and an ominous aura. The creature's eyes, a pair of glowing orbs, appear eerily human-like yet alien. The tunnel is riddled with intricate details that enhance the eerie atmosphere: dust particles floating lazily in the feeble light, ancient and crumbling stone, water droplets sparkling on the damp walls, and a hauntingly beautiful, bioluminescent fungi growing in the shadows. The dimly lit environment is highlighted by strategically placed light sources that create dramatic chiaroscuro effects, casting an unsettling and atmospheric glow on the scene. Digital Art Illustration with Intricate Details (Dark, Atmospheric, Suspenseful)",
    ),
    (
        Role::User,
        "Now compile the description and style into a single paragraph summary",
    ),
    (
        Role::Assistant,
        "Digital art illustration featuring a dark, atmospheric, and suspenseful scene within a dimly lit, cavernous tunnel. The subject of the image is a mysterious creature, depicted only as a menacing shadow on the walls, with elongated silhouette and sharp protrusions. The creature's eyes, a pair of glowing orbs, appear eerily human-like yet alien. The tunnel is adorned with intricate details, such as dust particles, ancient crumbling stone, water droplets, and a hauntingly beautiful bioluminescent fungi growing in the shadows. Dramatic chiaroscuro effects are created through strategically placed light sources, casting an unsettling and atmospheric glow on the scene.",
    ),
    (
        Role::User,
        "create a detailed summary without the title or style",
    ),
    (
        Role::Assistant,
        "A dimly lit, cavernous tunnel is the setting for this chilling digital illustration. A mysterious creature lurks in the shadows, its elongated silhouette suggestive of a serpentine creature with sharp protrusions and an ominous aura. The creature's eyes, a pair of glowing orbs, appear eerily human-like yet alien. The tunnel is riddled with intricate details that enhance the eerie atmosphere: dust particles floating lazily in the feeble light, ancient and crumbling stone, water droplets sparkling on the damp walls, and a hauntingly beautiful, bioluminescent fungi growing in the shadows. Dramatic chiaroscuro effects are created through strategically placed light sources, casting an unsettling and atmospheric glow on the scene.",
    ),
    (
        Role::User,
        "Generate a prompt from \"magical garden, sitting on a blue_bench, Disney Princess in pink_dress, blonde_hair, portrait, Pixar, Disney style, photorealistic, high details, detailed skin, pores, freckles\"",
    ),
    (
        Role::Assistant,
        "In a captivating, Pixar-inspired, Disney-style, photorealistic portrait, a magical garden unfolds as a breathtaking backdrop. The subject of the image is a Disney Princess, dressed elegantly in a pink gown with flowing fabric, sitting serenely on a blue bench. The princess boasts long, blonde hair and a radiant smile. The garden is meticulously detailed, with vibrant, enchanted flora and fauna, as well as whimsical details like sparkling fairy lights and a picturesque waterfall. The princess is highlighted against the lush, detailed foliage, with a focus on the high-definition details of her porcelain skin, visible freckles, and the intricacies of her elegant gown. The image is rendered in the captivating, photorealistic style that exemplifies both the Disney and Pixar brands, capturing the princess's timeless beauty and the magic of her enchanting surroundings.",
    ),
];

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 对话消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// 将用户文本填入指令
///
/// 指令中含有 `{prompt}` 时替换所有占位符, 否则拼接在指令后
pub fn render_request(instructions: &str, text: &str) -> String {
    if instructions.contains(PROMPT_PLACEHOLDER) {
        instructions.replace(PROMPT_PLACEHOLDER, text)
    } else {
        format!("{instructions} {text}")
    }
}

/// 构建对话消息
pub fn build_messages(text: &str, apply_instructions: bool, instructions: &str) -> Vec<Message> {
    if !apply_instructions {
        return vec![
            Message::new(Role::System, CAPTION_SYSTEM_PROMPT),
            Message::new(
                Role::User,
                format!("{CAPTION_INSTRUCTIONS}\nDescription : {text}"),
            ),
        ];
    }

    let mut messages = Vec::with_capacity(FEW_SHOT.len() + 2);
    messages.push(Message::new(Role::System, SYSTEM_PROMPT));
    messages.extend(
        FEW_SHOT
            .iter()
            .map(|(role, content)| Message::new(*role, *content)),
    );
    messages.push(Message::new(Role::User, render_request(instructions, text)));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_request() {
        assert_eq!(render_request("Rewrite: {prompt}", "a cat"), "Rewrite: a cat");
        assert_eq!(
            render_request("{prompt} and {prompt}", "dog"),
            "dog and dog"
        );
        assert_eq!(render_request("Describe", "a cat"), "Describe a cat");
        assert_eq!(render_request("", "a cat"), " a cat");
    }

    #[test]
    fn test_default_instructions_have_placeholder() {
        assert!(DEFAULT_INSTRUCTIONS.contains(PROMPT_PLACEHOLDER));
        assert!(DEFAULT_INSTRUCTIONS.ends_with("\"{prompt}\""));
    }

    #[test]
    fn test_build_messages_with_instructions() {
        let messages = build_messages("a knight", true, "Rewrite: {prompt}");
        assert_eq!(messages.len(), 10);
        assert_eq!(messages[0], Message::new(Role::System, "You are a helpful assistant."));
        assert_eq!(messages[9], Message::new(Role::User, "Rewrite: a knight"));

        // 少样本对话 user/assistant 交替
        for (i, message) in messages[1..9].iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(message.role, expected);
        }
    }

    #[test]
    fn test_build_messages_caption() {
        let messages = build_messages("a knight", false, "ignored {prompt}");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.ends_with("\nDescription : a knight"));
        assert!(!messages[1].content.contains("ignored"));
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::System.to_string(), "system");
    }
}
