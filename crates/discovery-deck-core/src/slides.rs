//! Slide catalog for the AI Discovery workshop.
//! Slides are immutable once a session starts; the deck is an ordered, fixed-length sequence.

use serde::Serialize;

/// Interactive widget embedded in a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlideWidget {
    ChatDemo,
}

/// One slide: title, body lines, and optional image / widget / comparison table.
#[derive(Debug, Clone, Serialize)]
pub struct Slide {
    pub title: String,
    pub body: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<SlideWidget>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub table: bool,
}

impl Slide {
    fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.lines().map(str::to_string).collect(),
            image: None,
            widget: None,
            table: false,
        }
    }

    fn with_image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    fn with_widget(mut self, widget: SlideWidget) -> Self {
        self.widget = Some(widget);
        self
    }

    fn with_table(mut self) -> Self {
        self.table = true;
        self
    }

    /// Body lines classified for rendering.
    pub fn lines(&self) -> impl Iterator<Item = SlideLine<'_>> {
        self.body.iter().map(|l| SlideLine::classify(l))
    }
}

/// How a single body line is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideLine<'a> {
    Bullet(&'a str),
    Link { text: &'a str, url: &'a str },
    Url(&'a str),
    Text(&'a str),
}

impl<'a> SlideLine<'a> {
    /// Bullets win over links; a line mentioning `http` is a markdown link if it has
    /// `[text](http…)`, otherwise the whole trimmed line is taken as a URL.
    pub fn classify(line: &'a str) -> Self {
        if let Some(rest) = line.strip_prefix('•') {
            return SlideLine::Bullet(rest.trim());
        }
        if line.contains("http") {
            if let Some((text, url)) = markdown_link(line) {
                return SlideLine::Link { text, url };
            }
            return SlideLine::Url(line.trim());
        }
        SlideLine::Text(line)
    }
}

fn markdown_link(line: &str) -> Option<(&str, &str)> {
    let open = line.find('[')?;
    let close = open + line[open..].find("](")?;
    let text = &line[open + 1..close];
    if text.is_empty() || text.contains(']') {
        return None;
    }
    let url_start = close + 2;
    let url_len = line[url_start..].find(|c: char| c == ')' || c.is_whitespace())?;
    let url = &line[url_start..url_start + url_len];
    if !(url.starts_with("http://") || url.starts_with("https://")) || !line[url_start + url_len..].starts_with(')') {
        return None;
    }
    Some((text, url))
}

/// Row of the "Subscription vs API" comparison table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComparisonRow {
    pub feature: &'static str,
    pub subscription: &'static str,
    pub api: &'static str,
}

pub const COMPARISON_HEADERS: [&str; 3] = ["Feature", "Subscription", "API"];

pub const COMPARISON_ROWS: &[ComparisonRow] = &[
    ComparisonRow { feature: "Access", subscription: "ChatGPT website/app", api: "Code, integrations, workflows" },
    ComparisonRow { feature: "Best for", subscription: "Individuals", api: "Businesses, automation" },
    ComparisonRow { feature: "Pricing", subscription: "Flat monthly", api: "Pay per token (usage-based)" },
    ComparisonRow { feature: "Analogy", subscription: "Netflix subscription", api: "Building your own app w/ Netflix engine" },
];

/// Selectable use case offered on the Practical Applications slide.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UseCaseOption {
    pub id: &'static str,
    pub description: &'static str,
}

pub const USE_CASE_OPTIONS: &[UseCaseOption] = &[
    UseCaseOption { id: "HR", description: "resume screening, policy summarization, interview prep" },
    UseCaseOption { id: "Education", description: "auto-grading, personalized learning, content creation" },
    UseCaseOption { id: "Personal productivity", description: "email drafting, scheduling, brainstorming" },
];

pub fn is_known_option(id: &str) -> bool {
    USE_CASE_OPTIONS.iter().any(|o| o.id == id)
}

/// The full deck plus the positions that carry behavior.
#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    pub slides: Vec<Slide>,
    /// Leaving this slide fires the summary-priming call.
    pub demo_index: usize,
    /// Slide whose notes field is captured as icebreaker notes.
    pub notes_index: usize,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.slides.len().saturating_sub(1)
    }
}

impl Default for Deck {
    fn default() -> Self {
        default_deck()
    }
}

pub const DEMO_SLIDE_INDEX: usize = 4;
pub const NOTES_SLIDE_INDEX: usize = 0;

pub fn default_deck() -> Deck {
    let slides = vec![
        Slide::new(
            "Icebreaker",
            "• What comes to mind when you hear \"Artificial Intelligence\"?\n\
             • Any personal experiences or thoughts about AI?\n\
             • Let's get comfortable sharing and exploring together.",
        ),
        Slide::new(
            "AI Landscape",
            "AI → Machine Learning → Deep Learning → Generative AI\n\
             Examples:\n\
             • AI: Rule-based systems like spam filters\n\
             • ML: Predictive models like recommendation engines\n\
             • DL: Neural nets powering image recognition\n\
             • GenAI: Creates text, images, code (e.g., ChatGPT)",
        )
        .with_image("/aiuniverse.jpeg"),
        Slide::new(
            "Practical Applications",
            "HR: resume screening, policy summarization, interview prep\n\
             Education: auto-grading, personalized learning, content creation\n\
             Personal productivity: email drafting, scheduling, brainstorming",
        ),
        Slide::new(
            "ChatGPT: Subscription vs API",
            "Here's how ChatGPT can be used depending on your needs:\n\
             \n\
             • Subscription: use ChatGPT in the web/app — great for individuals.\n\
             • API: connect the same model into custom tools — great for teams & automation.\n\
             \n\
             See ChatGPT here:\n\
             [ChatGPT](https://chat.openai.com)",
        )
        .with_table(),
        Slide::new(
            "Live Demo: ChatGPT API",
            "Try a simple HR prompt (e.g., \"Draft a polite rejection email\" or \"Summarize this policy paragraph\").",
        )
        .with_widget(SlideWidget::ChatDemo),
        Slide::new(
            "Closing & Next Steps",
            "Which areas excite you most for work/life?\n\
             Sample path:\n\
             • Session 1: ChatGPT for productivity & HR use cases\n\
             • Session 2: Docs, email automation, chatbots\n\
             • Session 3: Intro to data & ML (concepts > code)\n\
             • Session 4+: Custom projects (resume scanner, policy Q&A bot)",
        ),
    ];
    Deck {
        slides,
        demo_index: DEMO_SLIDE_INDEX,
        notes_index: NOTES_SLIDE_INDEX,
    }
}
