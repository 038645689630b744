//! Prompt templates for the generative endpoints. All of them ask for JSON
//! output; the provider is also told via responseMimeType, but models still
//! fence their replies now and then, so callers strip fences where needed.

pub const REPAIR: &str = r#"You are a professional repair specialist. Analyze the image and reply following this JSON schema:
{
  "item_name": "product name",
  "damage_check": "condition assessment",
  "repair_plan": "proposed repair",
  "repair_cost": 3000,
  "current_value": 1000,
  "future_value": 5000,
  "profit_message": "expected gain from repairing",
  "is_worth_repairing": true,
  "is_safe": true,
  "safety_reason": "why the item is or is not safe to use"
}"#;

pub const LISTING: &str = r#"You are a listing assistant for a flea-market app. Analyze the image and reply with sellable listing details following this JSON schema:
{
  "title": "catchy product name (40 characters or less)",
  "description": "appealing, search-friendly description (around 200 characters) covering condition and features",
  "category": "best-fitting category name",
  "tags": ["tag1", "tag2", "tag3"],
  "suggested_price": 5000
}"#;

pub fn description(product_name: &str) -> String {
    format!(
        "Write an appealing, concise sales description for the product \"{product_name}\" \
         in 200 characters or less. Do not use Markdown. \
         Reply as JSON in the form {{\"description\": \"...\"}}."
    )
}

pub fn moderation(content: &str) -> String {
    format!(
        "Judge whether the following message is abusive or violent. \
         Reply as JSON in the form {{\"result\": \"SAFE\"}}, using \"UNSAFE\" if the message \
         is problematic and \"SAFE\" otherwise. Message: \"{content}\""
    )
}
