use base64::Engine as _;

use crate::llm::types::{ChatMessage, ContentPart, ImageUrl, MessageContent};

pub const DEFAULT_PROMPT: &str = "\
Can you solve the coding question in the image?
Please always follow these steps:
1. Ask clarifying questions
2. Explain your thoughts, include question type (binary search, BFS, DP, etc.).
3. Implementation in Python (Always use the best practice e.g. O(1), O(n), and avoid O(n^2), O(2^n), etc.)
4. Test cases
5. Explanation and Time/Space Complexity";

/// `data:` URL carrying a PNG inline.
pub fn png_data_url(png_bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes);
    format!("data:image/png;base64,{encoded}")
}

/// One user message: the prompt text followed by the screenshot.
pub fn build_vision_messages(prompt: &str, png_bytes: &[u8]) -> Vec<ChatMessage> {
    vec![ChatMessage::user(MessageContent::Parts(vec![
        ContentPart::Text {
            text: prompt.to_string(),
        },
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: png_data_url(png_bytes),
            },
        },
    ]))]
}
