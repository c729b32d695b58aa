use serde_json::{json, Map, Value};

use crate::input::ProvidedFields;

const FIELD_DESCRIPTIONS: [(&str, &str); 7] = [
    ("itemName", "The full name of the menu item."),
    (
        "description",
        "A creative and appealing description for a customer browsing a delivery app. Listing \
         out cuisine, ingredients, and preparation.",
    ),
    (
        "category",
        "The menu category (e.g., 'Appetizer', 'Main Course', 'Dessert', 'Side Dish', \
         'Beverage').",
    ),
    (
        "dietaryTags",
        "A list of suggested dietary tags (e.g., 'Vegetarian', 'Vegan', 'Gluten-Free', 'Spicy', \
         'Low-Carb').",
    ),
    (
        "allergenWarnings",
        "A list of potential allergens present (e.g., 'Contains Nuts', 'Contains Dairy', \
         'Contains Shellfish').",
    ),
    (
        "suggestedPairings",
        "Suggestions for items that would pair well with this dish to encourage upselling.",
    ),
    (
        "seoKeywords",
        "A list of keywords for search engine optimization (e.g., 'cheesy pizza', 'spicy \
         chicken sandwich', 'healthy salad').",
    ),
];

const ARRAY_FIELDS: [&str; 4] = [
    "dietaryTags",
    "allergenWarnings",
    "suggestedPairings",
    "seoKeywords",
];

fn is_caller_provided(field: &str, provided: ProvidedFields) -> bool {
    (field == "itemName" && provided.item_name)
        || (field == "description" && provided.description)
}

/// Compute the result schema the generation service must satisfy.
///
/// Caller-provided fields are removed from both the property set and
/// the required list; the service is never asked to invent text the
/// user already wrote. Everything else is always required.
pub fn response_schema(provided: ProvidedFields) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (field, description) in FIELD_DESCRIPTIONS {
        if is_caller_provided(field, provided) {
            continue;
        }
        let property = if ARRAY_FIELDS.contains(&field) {
            json!({
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": description,
            })
        } else {
            json!({
                "type": "STRING",
                "description": description,
            })
        };
        properties.insert(field.to_string(), property);
        required.push(Value::String(field.to_string()));
    }

    json!({
        "type": "OBJECT",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
    })
}
