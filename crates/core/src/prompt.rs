//! Model instruction builders.
//!
//! Every builder is a pure string template over its inputs. The presentation prompt takes its
//! numeric limits from [`crate::constants`], the same values the validator enforces.

use crate::constants::{
    BULLET_CHARS, BULLET_COUNT, IMAGE_PROMPT_CHARS, KEY_POINT_COUNT, PRESENTATION_SUBTITLE_CHARS,
    PRESENTATION_TITLE_CHARS, SCRIPT_CHARS, SLIDE_TITLE_CHARS, TIP_COUNT,
};

fn span(range: &std::ops::RangeInclusive<usize>) -> String {
    format!("{}-{}", range.start(), range.end())
}

/// Builds the instruction text for generating a deck of exactly `num_slides` slides on `topic`.
pub fn build_presentation_prompt(topic: &str, num_slides: usize) -> String {
    let noun = if num_slides == 1 { "slide" } else { "slides" };
    let sequence_rule = if num_slides == 1 {
        "The single slide MUST have type \"title\"".to_owned()
    } else {
        format!(
            "Slide types: slide-1 MUST be \"title\", slide-{} MUST be \"conclusion\", every slide in between MUST be \"content\"",
            num_slides
        )
    };

    format!(
        r#"You are an expert presentation designer and content strategist. Create a professional, engaging {n}-{noun} presentation based on the user's request.

USER REQUEST: "{topic}"

CRITICAL REQUIREMENTS:
1. Generate EXACTLY {n} {noun} (no more, no less), with ids "slide-1" to "slide-{n}" in order
2. {sequence_rule}
3. Presentation title: {title} characters; subtitle: {subtitle} characters
4. Each slide title: {slide_title} characters
5. Include {bullet_count} bullets per slide, each {bullet_chars} characters (fit in 2 lines max)
6. imagePrompt: {image_prompt} characters describing style, composition and mood of a supporting image
7. Use professional, data-driven language

SPEAKER NOTES:
- script: {script} characters, natural and conversational, as if speaking directly to the audience
- duration: realistic speaking time formatted like "1min 30s", "2min" or "45s"
- tips: {tips} delivery tips
- keyPoints: {key_points} key points to emphasise

RESPONSE FORMAT: Return ONLY raw JSON. No markdown, no code fences, no text before or after the JSON:
{{
  "title": "Presentation Title",
  "subtitle": "Tagline or Brief Description",
  "slides": [
    {{
      "id": "slide-1",
      "type": "title",
      "title": "Main Topic",
      "bullets": ["Key point 1", "Key point 2", "Key point 3"],
      "speakerNotes": {{
        "script": "Welcome everyone...",
        "duration": "1min 30s",
        "tips": ["Make eye contact"],
        "keyPoints": ["Establish credibility", "Set expectations"]
      }},
      "imagePrompt": "Description of an image for this slide"
    }}
  ]
}}

Remember: EXACTLY {n} {noun}. Invalid JSON will cause failure."#,
        n = num_slides,
        noun = noun,
        topic = topic,
        sequence_rule = sequence_rule,
        title = span(&PRESENTATION_TITLE_CHARS),
        subtitle = span(&PRESENTATION_SUBTITLE_CHARS),
        slide_title = span(&SLIDE_TITLE_CHARS),
        bullet_count = span(&BULLET_COUNT),
        bullet_chars = span(&BULLET_CHARS),
        image_prompt = span(&IMAGE_PROMPT_CHARS),
        script = span(&SCRIPT_CHARS),
        tips = span(&TIP_COUNT),
        key_points = span(&KEY_POINT_COUNT),
    )
}

/// Builds a prompt asking the model to refine a slide's image description.
pub fn build_image_prompt(slide_title: &str, image_prompt: &str) -> String {
    format!(
        r#"Generate a professional presentation slide image for:

SLIDE: "{}"
REQUIREMENTS: "{}"

Make it: professional, clean, modern, suitable for business presentations
Style: minimalist with strong visual hierarchy
Color palette: use complementary colors, ensure good contrast
Resolution: 1920x1080

Return ONLY the image description prompt suitable for image generation APIs."#,
        slide_title, image_prompt
    )
}

/// Builds a prompt asking the model for a palette and typography matching a brand description.
pub fn build_brand_kit_prompt(brand: &str) -> String {
    format!(
        r##"Analyze this brand description and suggest a professional color palette and typography:

BRAND: "{}"

Return ONLY valid JSON:
{{
  "colors": {{
    "primary": "#RRGGBB",
    "secondary": "#RRGGBB",
    "accent": "#RRGGBB",
    "background": "#RRGGBB",
    "text": "#RRGGBB"
  }},
  "fonts": {{
    "heading": "Font Name",
    "body": "Font Name"
  }}
}}"##,
        brand
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_prompt_states_exact_count() {
        let prompt = build_presentation_prompt("Edge computing", 7);
        assert!(prompt.contains("EXACTLY 7 slides"));
        assert!(prompt.contains("7-slides presentation"));
        assert!(prompt.contains("\"Edge computing\""));
        assert!(prompt.contains("slide-7 MUST be \"conclusion\""));
    }

    #[test]
    fn test_presentation_prompt_singular() {
        let prompt = build_presentation_prompt("Tea", 1);
        assert!(prompt.contains("EXACTLY 1 slide "));
        assert!(prompt.contains("single slide MUST have type \"title\""));
    }

    #[test]
    fn test_presentation_prompt_carries_validator_bounds() {
        let prompt = build_presentation_prompt("Edge computing", 5);
        assert!(prompt.contains("Include 3-5 bullets per slide, each 5-120 characters"));
        assert!(prompt.contains("imagePrompt: 20-300 characters"));
        assert!(prompt.contains("script: 100-1000 characters"));
        assert!(prompt.contains("no code fences"));
    }

    #[test]
    fn test_presentation_prompt_is_deterministic() {
        assert_eq!(
            build_presentation_prompt("Solar", 4),
            build_presentation_prompt("Solar", 4)
        );
    }

    #[test]
    fn test_presentation_prompt_example_is_valid_json_shape() {
        let prompt = build_presentation_prompt("Solar", 4);
        let start = prompt.find("{\n").expect("example start");
        let end = prompt.rfind('}').expect("example end");
        let example: serde_json::Value =
            serde_json::from_str(&prompt[start..=end]).expect("example parses");
        assert_eq!(example["slides"][0]["type"], "title");
    }

    #[test]
    fn test_brand_kit_prompt_embeds_brand() {
        let prompt = build_brand_kit_prompt("Playful fintech for students");
        assert!(prompt.contains("BRAND: \"Playful fintech for students\""));
        assert!(prompt.contains("\"primary\""));
    }

    #[test]
    fn test_image_prompt_embeds_slide_and_requirements() {
        let prompt = build_image_prompt("Market outlook", "Rising line chart in teal");
        assert!(prompt.contains("SLIDE: \"Market outlook\""));
        assert!(prompt.contains("REQUIREMENTS: \"Rising line chart in teal\""));
        assert!(prompt.contains("Resolution: 1920x1080"));
        assert!(prompt.ends_with("suitable for image generation APIs."));
    }
}
