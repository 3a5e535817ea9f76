//! Form parameters and the instructions sent to the image model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lettering style applied to the thumbnail text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum TextStyle {
    /// Ultra-bold white letters with a heavy black outline.
    #[default]
    MrBeast,
    /// Glowing neon sign.
    Neon,
    /// Letters made of fire.
    Fiery,
    /// Wide, elegant film-poster lettering.
    Cinematic,
    /// Extruded, reflective gold.
    #[serde(rename = "3D Gold")]
    Gold3D,
}

impl TextStyle {
    /// All styles, in the order they are offered.
    pub const ALL: [TextStyle; 5] = [
        Self::MrBeast,
        Self::Neon,
        Self::Fiery,
        Self::Cinematic,
        Self::Gold3D,
    ];

    /// Display name, also used inside the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MrBeast => "MrBeast",
            Self::Neon => "Neon",
            Self::Fiery => "Fiery",
            Self::Cinematic => "Cinematic",
            Self::Gold3D => "3D Gold",
        }
    }

    /// Short description shown next to the style name.
    pub fn tagline(&self) -> &'static str {
        match self {
            Self::MrBeast => "Punchy & viral",
            Self::Neon => "Bright & modern",
            Self::Fiery => "Intense & energetic",
            Self::Cinematic => "Elegant & epic",
            Self::Gold3D => "Luxury & prestige",
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Self::MrBeast => {
                "ultra-bold condensed sans-serif (Impact-like), solid white fill, very thick black \
                 outline and a hard black drop shadow, tilted slightly for energy"
            }
            Self::Neon => {
                "a glowing neon sign: rounded sans-serif in a saturated electric blue or hot pink \
                 with a strong outer bloom"
            }
            Self::Fiery => {
                "letters made of fire in orange, red and yellow, with embers and heat distortion \
                 around an aggressive bold typeface"
            }
            Self::Cinematic => {
                "a wide, elegant sans-serif (Bebas Neue-like), subtle light-gray to white gradient, \
                 soft dark glow, perfectly horizontal"
            }
            Self::Gold3D => {
                "realistic reflective gold with visible 3D extrusion, lit by a dramatic key light \
                 for strong highlights and shadows"
            }
        }
    }
}

/// Facial expression pushed onto the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// Amplify whatever emotion the photo already shows.
    #[default]
    Default,
    /// Jaw-dropped shock.
    Shocked,
    /// Euphoric joy.
    Happy,
    /// Fear.
    Scared,
    /// Intense anger.
    Angry,
}

impl Expression {
    /// All expressions, in the order they are offered.
    pub const ALL: [Expression; 5] = [
        Self::Default,
        Self::Shocked,
        Self::Happy,
        Self::Scared,
        Self::Angry,
    ];

    /// Name used in the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Shocked => "Shocked",
            Self::Happy => "Happy",
            Self::Scared => "Scared",
            Self::Angry => "Angry",
        }
    }
}

/// Where the subject sits in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum SubjectPosition {
    /// Centered.
    #[default]
    Center,
    /// Left third.
    Left,
    /// Right third.
    Right,
    /// Before/after split: original on the left, transformed on the right.
    #[serde(rename = "Split-screen")]
    SplitScreen,
}

impl SubjectPosition {
    /// All positions, in the order they are offered.
    pub const ALL: [SubjectPosition; 4] =
        [Self::Center, Self::Left, Self::Right, Self::SplitScreen];

    /// Name used in the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "Center",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::SplitScreen => "Split-screen",
        }
    }
}

macro_rules! impl_choice_parsing {
    ($ty:ty, $what:literal) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                Self::ALL
                    .into_iter()
                    .find(|v| normalize(v.as_str()) == wanted)
                    .ok_or_else(|| {
                        let options: Vec<_> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown {} '{}' (expected one of: {})", $what, s, options.join(", "))
                    })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_choice_parsing!(TextStyle, "text style");
impl_choice_parsing!(Expression, "expression");
impl_choice_parsing!(SubjectPosition, "subject position");

/// Case-insensitive comparison key that ignores spaces, dashes and underscores.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// The text fields of the thumbnail form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailParams {
    /// Video title, used only as thematic context.
    pub video_title: String,
    /// Short text rendered on the thumbnail (required).
    pub thumbnail_text: String,
    /// Lettering style.
    pub text_style: TextStyle,
    /// Things the model must avoid.
    pub negative_prompt: String,
    /// Expression to exaggerate.
    pub expression: Expression,
    /// Props or places to add to the scene.
    pub extra_elements: String,
    /// Outfit for the subject.
    pub clothing_style: String,
    /// Additional people in the background.
    pub other_people: String,
    /// Subject placement.
    pub subject_position: SubjectPosition,
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder
    } else {
        trimmed
    }
}

/// Builds the instruction sent alongside the subject image.
pub fn generation_prompt(params: &ThumbnailParams) -> String {
    let text = params.thumbnail_text.trim().to_uppercase();
    let title = or_placeholder(&params.video_title, "Not provided");
    let extras = or_placeholder(&params.extra_elements, "None");
    let clothing = or_placeholder(&params.clothing_style, "Keep original");
    let people = or_placeholder(&params.other_people, "None");
    let negative = or_placeholder(&params.negative_prompt, "None");
    let style = params.text_style;
    let expression = params.expression.as_str();
    let position = params.subject_position.as_str();

    let expression_step = if params.expression == Expression::Default {
        "Keep the emotion visible in the photo and amplify it dramatically: wide eyes, open mouth, \
         intense feeling."
            .to_string()
    } else {
        format!(
            "Change the facial expression to a hyper-exaggerated '{expression}' look while keeping \
             the same person."
        )
    };

    let clothing_step = if params.clothing_style.trim().is_empty() {
        "Keep the subject's clothes but make them more vibrant.".to_string()
    } else {
        format!("Dress the subject in: {clothing}.")
    };

    let people_step = if params.other_people.trim().is_empty() {
        String::new()
    } else {
        format!(
            "\n- Add these people in the background or midground without stealing focus: {people}. \
             Apply the default appearance rule to each of them."
        )
    };

    let position_step = match params.subject_position {
        SubjectPosition::Center => "Place the subject in the middle of the frame.".to_string(),
        SubjectPosition::Left | SubjectPosition::Right => format!(
            "Place the subject on the {} side of the frame.",
            position.to_lowercase()
        ),
        SubjectPosition::SplitScreen => "Split the frame vertically. Left: the original subject \
             over a calm 'before' background. Right: the fully transformed subject over a chaotic, \
             exciting 'after' background."
            .to_string(),
    };

    format!(
        "You are an expert designer of viral, high click-through YouTube thumbnails in the MrBeast \
style. Produce a single 1280x720 JPEG from the provided photo and the choices below.

Hard rules:
- Preserve the subject's facial identity exactly. Never replace their face with someone else's.
- Default appearance for new people: unless the user specifies otherwise under Other people or \
Clothing, every newly generated person is depicted realistically and has ebony skin.
- The only text on the image is \"{text}\".

Choices:
- Video theme (context only, do not write it on the image): \"{title}\"
- Thumbnail text: \"{text}\"
- Text style: \"{style_name}\"
- Expression: \"{expression}\"
- Extra elements: \"{extras}\"
- Clothing: \"{clothing}\"
- Other people: \"{people}\"
- Subject position: \"{position}\"
- Avoid: \"{negative}\"

Steps:
1. Cut the subject out cleanly. {expression_step} {clothing_step} Add a thick white or \
light-yellow glow around the cutout and enlarge the subject slightly so it dominates.
2. Build a new dynamic 1280x720 background that matches the video theme and the extra \
elements: explosions, flying money, hyper-saturated scenery or bold patterns.{people_step}
3. {position_step}
4. Write \"{text}\" as {style_directive}.
5. Push saturation, contrast and sharpness across the whole image until it looks almost \
unreal. Nothing from the avoid list may appear.

Return only the final image.",
        style_name = style.as_str(),
        style_directive = style.directive(),
    )
}

/// Builds the instruction for editing an existing thumbnail.
///
/// The request carries two images after the text: the untouched subject
/// (identity reference) and the thumbnail to edit.
pub fn modification_prompt(instruction: &str) -> String {
    format!(
        "You are an expert YouTube thumbnail editor. Edit an existing thumbnail according to the \
request below and return a single 1280x720 JPEG.

Two images follow. Image 1 is the original subject and is only a reference for their face. \
Image 2 is the thumbnail to edit. The subject's facial identity from Image 1 must be preserved \
exactly.

Request: \"{}\"

1. Work out what should change in Image 2: background, text, colors, added or removed elements.
2. Apply those changes to Image 2 only, keeping the edited subject in place.
3. Keep the hyper-saturated, high-contrast MrBeast look and finish with a sharp, vivid master.

Return only the edited image.",
        instruction.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ThumbnailParams::default();
        assert_eq!(params.text_style, TextStyle::MrBeast);
        assert_eq!(params.expression, Expression::Default);
        assert_eq!(params.subject_position, SubjectPosition::Center);
        assert!(params.thumbnail_text.is_empty());
    }

    #[test]
    fn test_choice_parsing_is_lenient() {
        assert_eq!("3d gold".parse::<TextStyle>().unwrap(), TextStyle::Gold3D);
        assert_eq!("3D_Gold".parse::<TextStyle>().unwrap(), TextStyle::Gold3D);
        assert_eq!(
            "split screen".parse::<SubjectPosition>().unwrap(),
            SubjectPosition::SplitScreen
        );
        assert_eq!("SHOCKED".parse::<Expression>().unwrap(), Expression::Shocked);

        let err = "comic".parse::<TextStyle>().unwrap_err();
        assert!(err.contains("MrBeast"));
    }

    #[test]
    fn test_generation_prompt_embeds_every_field() {
        let params = ThumbnailParams {
            video_title: "I survived 50 hours in a ghost town".into(),
            thumbnail_text: "50 hours left".into(),
            text_style: TextStyle::Neon,
            negative_prompt: "blurry text".into(),
            expression: Expression::Scared,
            extra_elements: "a pile of cash".into(),
            clothing_style: "space suit".into(),
            other_people: "a SWAT team".into(),
            subject_position: SubjectPosition::Left,
        };
        let prompt = generation_prompt(&params);

        assert!(prompt.contains("\"50 HOURS LEFT\""));
        assert!(prompt.contains("I survived 50 hours in a ghost town"));
        assert!(prompt.contains("\"Neon\""));
        assert!(prompt.contains("glowing neon sign"));
        assert!(prompt.contains("'Scared'"));
        assert!(prompt.contains("a pile of cash"));
        assert!(prompt.contains("Dress the subject in: space suit."));
        assert!(prompt.contains("a SWAT team"));
        assert!(prompt.contains("left side"));
        assert!(prompt.contains("\"blurry text\""));
    }

    #[test]
    fn test_generation_prompt_placeholders_for_empty_fields() {
        let params = ThumbnailParams {
            thumbnail_text: "wow".into(),
            ..Default::default()
        };
        let prompt = generation_prompt(&params);

        assert!(prompt.contains("\"Not provided\""));
        assert!(prompt.contains("Clothing: \"Keep original\""));
        assert!(prompt.contains("Other people: \"None\""));
        assert!(prompt.contains("Avoid: \"None\""));
        assert!(prompt.contains("amplify it dramatically"));
        assert!(!prompt.contains("Add these people"));
    }

    #[test]
    fn test_generation_prompt_states_default_appearance_rule() {
        let params = ThumbnailParams {
            thumbnail_text: "crowd goes wild".into(),
            ..Default::default()
        };
        let prompt = generation_prompt(&params);
        assert!(prompt.contains("Default appearance for new people"));
        assert!(prompt.contains("unless the user specifies otherwise under Other people or Clothing"));

        let with_people = generation_prompt(&ThumbnailParams {
            other_people: "a marching band".into(),
            ..params
        });
        assert!(with_people.contains("a marching band. Apply the default appearance rule"));
    }

    #[test]
    fn test_split_screen_prompt() {
        let params = ThumbnailParams {
            thumbnail_text: "before after".into(),
            subject_position: SubjectPosition::SplitScreen,
            ..Default::default()
        };
        assert!(generation_prompt(&params).contains("Split the frame vertically"));
    }

    #[test]
    fn test_modification_prompt_quotes_instruction() {
        let prompt = modification_prompt("  make the background molten lava ");
        assert!(prompt.contains("Request: \"make the background molten lava\""));
        assert!(prompt.contains("Image 1"));
    }
}
