//! Offline keyword-heuristic responder.
//!
//! Answers every task from keyword rules over the example text. It needs no
//! credentials, so `fashionbench run` works out of the box and the suite has
//! a stable reference score.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use fashionbench_core::model::{Answer, AnswerShape, Example, FieldValue, TaskKind};
use fashionbench_core::traits::{ModelInfo, RespondRequest, Responder};

static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£]\d+(?:,\d{3})*(?:\.\d{2})?").expect("valid price pattern")
});
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcode\s+(\w+)").expect("valid code pattern"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url pattern"));
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%").expect("valid percent pattern"));

const TRENDS: &[(&[&str], &str)] = &[
    (&["barbiecore", "pink"], "Barbiecore and Y2K pink aesthetic revival"),
    (&["loafer", "mini bag"], "Chunky loafers, mini bags, long coats"),
    (&["dopamine"], "Dopamine dressing and maximalist color trend"),
    (&["quiet luxury"], "Quiet luxury and stealth wealth aesthetic"),
    (
        &["sustainable"],
        "90s minimalism, sustainability, and gender-neutral fashion",
    ),
    (&["balletcore"], "Balletcore, clean girl aesthetic, cozy cardio"),
    (&["streetwear"], "Luxury streetwear fusion, sneaker culture"),
];
const DEFAULT_TREND: &str = "Contemporary fashion trend";

const STYLES: &[(&[&str], &str)] = &[
    (
        &["blazer", "trousers", "professional", "tote", "corporate"],
        "Corporate/Professional",
    ),
    (
        &["leather jacket", "distressed", "combat boots", "grunge", "band t-shirt"],
        "Grunge/Rock",
    ),
    (
        &["floral", "maxi dress", "basket bag", "bohemian", "woven"],
        "Bohemian/Boho",
    ),
    (
        &["hoodie", "joggers", "sneakers", "athleisure", "sporty"],
        "Athleisure/Sporty",
    ),
    (
        &["cashmere", "quiet luxury", "minimalist", "tailored wool"],
        "Quiet Luxury/Minimalist",
    ),
    (
        &["streetwear", "baggy jeans", "nike", "puffer", "urban"],
        "Streetwear/Urban",
    ),
    (
        &["coquette", "pastel", "ribbon", "pearl", "feminine"],
        "Coquette/Feminine",
    ),
    (
        &["hypebeast", "cargo pants", "bucket hat", "chains"],
        "Hypebeast/Streetwear",
    ),
    (
        &["linen", "espadrilles", "coastal", "resort", "straw hat"],
        "Coastal/Resort",
    ),
    (
        &["tweed", "classic", "timeless", "kitten heels"],
        "Classic/Timeless",
    ),
];
const DEFAULT_STYLE: &str = "Contemporary/Mixed";

/// Caption templates; every listed keyword must be present.
const CAPTIONS: &[(&[&str], &str)] = &[
    (
        &["blazer", "jeans"],
        "Elevated casual perfection: tailored blazer meets classic denim. Sophisticated yet comfortable.",
    ),
    (
        &["floral", "midi"],
        "Spring blooms in this dreamy floral midi. Effortless elegance with garden party charm.",
    ),
    (
        &["sneakers", "white"],
        "Statement sneakers that steal the show. Clean, bold, endlessly wearable.",
    ),
    (
        &["little black dress"],
        "That LBD energy: timeless, confident, unforgettable. When the dress speaks volumes.",
    ),
    (
        &["lbd"],
        "That LBD energy: timeless, confident, unforgettable. When the dress speaks volumes.",
    ),
    (
        &["sweater", "leggings"],
        "Cozy season done right: wrapped in comfort without sacrificing style.",
    ),
    (
        &["pencil skirt", "blouse"],
        "Boardroom ready: polished power dressing meets feminine sophistication.",
    ),
    (
        &["vintage"],
        "Sustainable style wins: this vintage treasure proves pre-loved is best. Thrifted, not bought.",
    ),
    (
        &["thrifted"],
        "Sustainable style wins: this vintage treasure proves pre-loved is best. Thrifted, not bought.",
    ),
    (
        &["linen", "summer"],
        "Sun-soaked sophistication: breezy linens for endless summer days. Vacation mode on.",
    ),
    (
        &["coat", "bold"],
        "That compliment magnet: when your coat steals the spotlight. Bold moves, big impact.",
    ),
    (
        &["loungewear"],
        "Elevated lounging: staying in never looked this chic. Cozy, coordinated, completely stylish.",
    ),
];

/// hashtag -> (meaning, category, purpose)
const HASHTAGS: &[(&str, [&str; 3])] = &[
    (
        "#ootd",
        ["Outfit Of The Day", "outfit_sharing", "showcase daily outfit choice"],
    ),
    (
        "#grwm",
        ["Get Ready With Me", "lifestyle_content", "document preparation routine"],
    ),
    (
        "#tryonhaul",
        ["Try On Haul", "shopping_content", "show purchased items being worn"],
    ),
    (
        "#iykyk",
        ["If You Know You Know", "insider_reference", "subtle flex or insider knowledge"],
    ),
    (
        "#dupealert",
        ["Dupe Alert", "budget_fashion", "share affordable alternative"],
    ),
    (
        "#ootw",
        ["Outfit Of The Week", "outfit_sharing", "showcase weekly outfit choices"],
    ),
    (
        "#ltk",
        ["LikeToKnowIt", "affiliate_marketing", "monetize through affiliate links"],
    ),
    (
        "#shein",
        ["SHEIN brand", "brand_tag", "tag fast fashion retailer"],
    ),
    (
        "#thriftflip",
        ["Thrift Flip", "sustainable_fashion", "show thrifted item upcycle"],
    ),
    (
        "#wiwtd",
        ["What I Wore Today", "outfit_sharing", "share outfit for specific day"],
    ),
];
const UNKNOWN_HASHTAG: [&str; 3] = ["Unknown hashtag", "general", "social media engagement"];

const BRANDS: &[&str] = &[
    "Zara",
    "Reformation",
    "Nike",
    "Levi's",
    "H&M",
    "Jacquemus",
    "Chanel",
    "Mango",
    "Bottega Veneta",
    "Skims",
];

const DISCLOSURES: &[&str] = &["#ad", "#gifted", "#sponsored", "paid partnership", "partnering"];

/// A responder that answers from keyword rules, without a model.
#[derive(Debug, Default, Clone)]
pub struct SimulatedResponder;

impl SimulatedResponder {
    pub fn new() -> Self {
        Self
    }

    /// The heuristic answer for one example.
    pub fn answer(&self, task: TaskKind, example: &Example, shape: &AnswerShape) -> Answer {
        match task {
            TaskKind::TrendDetection => {
                let trend = first_match(TRENDS, &example.text.to_lowercase(), false)
                    .unwrap_or(DEFAULT_TREND);
                match shape {
                    AnswerShape::List => Answer::List(
                        trend
                            .split(", ")
                            .flat_map(|part| part.split(" and "))
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect(),
                    ),
                    _ => Answer::from(trend),
                }
            }
            TaskKind::StyleClassification => {
                let description = example
                    .attributes
                    .get("description")
                    .unwrap_or(&example.text)
                    .to_lowercase();
                Answer::from(first_match(STYLES, &description, false).unwrap_or(DEFAULT_STYLE))
            }
            TaskKind::FashionWriting => Answer::Text(rewrite_caption(example)),
            TaskKind::HashtagUnderstanding => explain_hashtag(example),
            TaskKind::ProductExtraction => extract_product(&example.text),
            TaskKind::AffiliateDetection => detect_affiliate(&example.text),
        }
    }
}

/// First label whose keywords match. With `all`, every keyword must be present.
fn first_match<'a>(rules: &[(&[&str], &'a str)], text: &str, all: bool) -> Option<&'a str> {
    rules
        .iter()
        .find(|(keywords, _)| {
            if all {
                keywords.iter().all(|k| text.contains(k))
            } else {
                keywords.iter().any(|k| text.contains(k))
            }
        })
        .map(|(_, label)| *label)
}

fn rewrite_caption(example: &Example) -> String {
    let context = example
        .attributes
        .get("context")
        .unwrap_or(&example.text)
        .to_lowercase();
    if let Some(caption) = first_match(CAPTIONS, &context, true) {
        return caption.to_string();
    }
    let original = example
        .attributes
        .get("original")
        .map(String::as_str)
        .unwrap_or("this look");
    let style = example
        .attributes
        .get("style")
        .map(String::as_str)
        .unwrap_or("professional");
    format!("Transformed from '{original}' into elevated fashion content with {style} vibes.")
}

fn explain_hashtag(example: &Example) -> Answer {
    let hashtag = example
        .attributes
        .get("hashtag")
        .unwrap_or(&example.text)
        .trim()
        .to_lowercase();
    let [meaning, category, purpose] = HASHTAGS
        .iter()
        .find(|(tag, _)| *tag == hashtag)
        .map(|(_, entry)| *entry)
        .unwrap_or(UNKNOWN_HASHTAG);
    Answer::Fields(BTreeMap::from([
        ("meaning".to_string(), FieldValue::from(meaning)),
        ("category".to_string(), FieldValue::from(category)),
        ("purpose".to_string(), FieldValue::from(purpose)),
    ]))
}

fn extract_product(text: &str) -> Answer {
    let mut fields = BTreeMap::new();
    let lower = text.to_lowercase();

    if let Some(brand) = BRANDS.iter().find(|b| text.contains(*b)) {
        fields.insert("brand".to_string(), FieldValue::from(*brand));
    }
    if let Some(price) = PRICE.find(text) {
        fields.insert("price".to_string(), FieldValue::from(price.as_str()));
    }
    if let Some(code) = CODE.captures(text).and_then(|c| c.get(1)) {
        fields.insert("discount_code".to_string(), FieldValue::from(code.as_str()));
    }
    if lower.contains("link") || text.contains("http") {
        fields.insert("link_mentioned".to_string(), FieldValue::Bool(true));
        if let Some(url) = URL.find(text) {
            fields.insert("link".to_string(), FieldValue::from(url.as_str()));
        }
    }
    if lower.contains("ltk") {
        let platform = if text.contains("LTK") { "LTK" } else { "ShopLTK" };
        fields.insert("affiliate_platform".to_string(), FieldValue::from(platform));
    }

    Answer::Fields(fields)
}

fn detect_affiliate(text: &str) -> Answer {
    let lower = text.to_lowercase();
    let mut has_affiliate = false;
    let mut platform = None;
    let mut kind: Option<&str> = None;
    let mut code = None;
    let mut discount = None;
    let mut disclosures = Vec::new();
    let mut indicators = Vec::new();

    if lower.contains("ltk") || lower.contains("liketoknow") {
        has_affiliate = true;
        platform = Some(if lower.contains("shop.ltk") {
            "ShopLTK"
        } else {
            "LTK"
        });
    }

    if lower.contains("amazon") && (lower.contains("storefront") || lower.contains("finds")) {
        has_affiliate = true;
        platform = Some("Amazon");
        kind = Some("affiliate_storefront");
    }

    if let Some(found) = CODE.captures(text).and_then(|c| c.get(1)) {
        has_affiliate = true;
        kind = kind.or(Some("discount_code"));
        code = Some(found.as_str().to_string());
        discount = PERCENT
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|pct| format!("{}%", pct.as_str()));
    }

    for keyword in DISCLOSURES {
        if lower.contains(keyword) {
            disclosures.push(keyword.to_string());
        }
    }
    if !disclosures.is_empty() {
        has_affiliate = true;
        kind = Some("sponsored");
    }

    if has_affiliate && (lower.contains("partnering") || lower.contains("partnership")) {
        kind = Some("brand_partnership");
    }

    if !has_affiliate
        && ["thrifted", "no links", "just sharing"]
            .iter()
            .any(|k| lower.contains(k))
    {
        kind = Some("organic");
    }

    if lower.contains("link") || lower.contains("swipe up") || lower.contains("tap to shop") {
        has_affiliate = true;
        if lower.contains("link") {
            indicators.push("link in bio".to_string());
        }
    }

    let mut fields = BTreeMap::from([(
        "has_affiliate".to_string(),
        FieldValue::Bool(has_affiliate),
    )]);
    if let Some(platform) = platform {
        fields.insert("platform".to_string(), FieldValue::from(platform));
    }
    if let Some(kind) = kind {
        fields.insert("type".to_string(), FieldValue::from(kind));
    }
    if let Some(code) = code {
        fields.insert("code".to_string(), FieldValue::Text(code));
    }
    if let Some(discount) = discount {
        fields.insert("discount".to_string(), FieldValue::Text(discount));
    }
    if !disclosures.is_empty() {
        fields.insert("disclosures".to_string(), FieldValue::List(disclosures));
    }
    if !indicators.is_empty() {
        fields.insert("indicators".to_string(), FieldValue::List(indicators));
    }

    Answer::Fields(fields)
}

#[async_trait]
impl Responder for SimulatedResponder {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn respond(&self, request: &RespondRequest) -> anyhow::Result<Answer> {
        let answer = self.answer(request.task, &request.example, &request.shape);
        debug!(task = %request.task, example = request.example.id, "simulated answer");
        Ok(answer)
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "simulated".into(),
            name: "Keyword Heuristics".into(),
            provider: "simulated".into(),
            max_context: 0,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(task: TaskKind, text: &str, expected: Answer) -> Example {
        Example::new(1, text, expected, task)
    }

    fn field<'a>(answer: &'a Answer, key: &str) -> Option<&'a FieldValue> {
        match answer {
            Answer::Fields(fields) => fields.get(key),
            _ => None,
        }
    }

    #[test]
    fn trend_keywords() {
        let sim = SimulatedResponder::new();
        let ex = example(
            TaskKind::TrendDetection,
            "Everyone is wearing hot pink on the runway",
            Answer::from("Barbiecore"),
        );
        assert_eq!(
            sim.answer(TaskKind::TrendDetection, &ex, &AnswerShape::Text),
            Answer::from("Barbiecore and Y2K pink aesthetic revival")
        );

        let ex = example(TaskKind::TrendDetection, "Chunky loafer season", Answer::from("x"));
        let Answer::List(items) = sim.answer(TaskKind::TrendDetection, &ex, &AnswerShape::List)
        else {
            panic!("expected list");
        };
        assert_eq!(items, vec!["Chunky loafers", "mini bags", "long coats"]);
    }

    #[test]
    fn style_rules_in_order() {
        let sim = SimulatedResponder::new();
        let ex = example(
            TaskKind::StyleClassification,
            "Cream cashmere sweater with tailored wool trousers",
            Answer::from("Quiet Luxury"),
        );
        // "trousers" matches the corporate rule first.
        assert_eq!(
            sim.answer(TaskKind::StyleClassification, &ex, &AnswerShape::Text),
            Answer::from("Corporate/Professional")
        );

        let ex = example(TaskKind::StyleClassification, "A denim jumpsuit", Answer::from("x"));
        assert_eq!(
            sim.answer(TaskKind::StyleClassification, &ex, &AnswerShape::Text),
            Answer::from("Contemporary/Mixed")
        );
    }

    #[test]
    fn writing_templates_and_fallback() {
        let sim = SimulatedResponder::new();
        let ex = example(
            TaskKind::FashionWriting,
            "Navy blazer over light wash jeans",
            Answer::from("x"),
        );
        let Answer::Text(caption) = sim.answer(TaskKind::FashionWriting, &ex, &AnswerShape::Text)
        else {
            panic!("expected text");
        };
        assert!(caption.starts_with("Elevated casual perfection"));

        let ex = example(TaskKind::FashionWriting, "Red beret", Answer::from("x"))
            .with_attribute("original", "new hat")
            .with_attribute("style", "playful");
        assert_eq!(
            sim.answer(TaskKind::FashionWriting, &ex, &AnswerShape::Text),
            Answer::from(
                "Transformed from 'new hat' into elevated fashion content with playful vibes."
            )
        );
    }

    #[test]
    fn hashtag_lookup() {
        let sim = SimulatedResponder::new();
        let ex = example(TaskKind::HashtagUnderstanding, "mirror selfie", Answer::from("x"))
            .with_attribute("hashtag", "#GRWM");
        let answer = sim.answer(TaskKind::HashtagUnderstanding, &ex, &AnswerShape::Text);
        assert_eq!(field(&answer, "meaning"), Some(&FieldValue::from("Get Ready With Me")));

        let ex = example(TaskKind::HashtagUnderstanding, "#nope", Answer::from("x"));
        let answer = sim.answer(TaskKind::HashtagUnderstanding, &ex, &AnswerShape::Text);
        assert_eq!(field(&answer, "category"), Some(&FieldValue::from("general")));
    }

    #[test]
    fn product_fields() {
        let answer = extract_product(
            "Obsessed with this Zara blazer, only $89.99! Use code STYLE20, link in bio https://shop.ltk/abc",
        );
        assert_eq!(field(&answer, "brand"), Some(&FieldValue::from("Zara")));
        assert_eq!(field(&answer, "price"), Some(&FieldValue::from("$89.99")));
        assert_eq!(field(&answer, "discount_code"), Some(&FieldValue::from("STYLE20")));
        assert_eq!(field(&answer, "link_mentioned"), Some(&FieldValue::Bool(true)));
        assert_eq!(
            field(&answer, "link"),
            Some(&FieldValue::from("https://shop.ltk/abc"))
        );
        assert_eq!(field(&answer, "affiliate_platform"), Some(&FieldValue::from("ShopLTK")));
    }

    #[test]
    fn affiliate_signals() {
        let answer = detect_affiliate("Use code EMMA15 for 15% off! #ad");
        assert_eq!(field(&answer, "has_affiliate"), Some(&FieldValue::Bool(true)));
        assert_eq!(field(&answer, "type"), Some(&FieldValue::from("sponsored")));
        assert_eq!(field(&answer, "code"), Some(&FieldValue::from("EMMA15")));
        assert_eq!(field(&answer, "discount"), Some(&FieldValue::from("15%")));
        assert_eq!(
            field(&answer, "disclosures"),
            Some(&FieldValue::List(vec!["#ad".into()]))
        );

        let answer = detect_affiliate("Thrifted this jacket, just sharing the love");
        assert_eq!(field(&answer, "has_affiliate"), Some(&FieldValue::Bool(false)));
        assert_eq!(field(&answer, "type"), Some(&FieldValue::from("organic")));

        let answer = detect_affiliate("My Amazon storefront finds are up");
        assert_eq!(field(&answer, "platform"), Some(&FieldValue::from("Amazon")));
        assert_eq!(
            field(&answer, "type"),
            Some(&FieldValue::from("affiliate_storefront"))
        );
    }

    #[tokio::test]
    async fn respond_uses_request_shape() {
        let sim = SimulatedResponder::new();
        let ex = example(
            TaskKind::TrendDetection,
            "Dopamine colors everywhere",
            Answer::from("dopamine dressing"),
        );
        let request = RespondRequest::new("simulated", TaskKind::TrendDetection, ex);
        let answer = sim.respond(&request).await.unwrap();
        assert_eq!(
            answer,
            Answer::from("Dopamine dressing and maximalist color trend")
        );
    }
}
