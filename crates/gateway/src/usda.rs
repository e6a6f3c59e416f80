use async_trait::async_trait;
use chowbot_core::errors::{GatewayError, Provider};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use crate::http::{build_client, get_json};
use crate::NutritionProvider;

const SEARCH_URL: &str = "https://api.nal.usda.gov/fdc/v1/foods/search";
const FOOD_URL: &str = "https://api.nal.usda.gov/fdc/v1/food";
const NOT_PROVIDED: &str = "未提供";

/// Top search hit from FoodData Central.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoodMatch {
    pub fdc_id: u64,
    pub description: String,
}

/// One `foodNutrients` entry. The search and detail endpoints disagree on
/// field names, so every known spelling is accepted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientEntry {
    nutrient_name: Option<String>,
    name: Option<String>,
    nutrient: Option<NutrientRef>,
    value: Option<f64>,
    amount: Option<f64>,
    unit_name: Option<String>,
    unit: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutrientRef {
    name: Option<String>,
    unit_name: Option<String>,
}

impl NutrientEntry {
    pub fn named(name: &str, value: f64, unit: &str) -> Self {
        Self {
            nutrient_name: Some(name.to_string()),
            value: Some(value),
            unit_name: Some(unit.to_string()),
            ..Self::default()
        }
    }

    fn label(&self) -> &str {
        self.nutrient_name
            .as_deref()
            .or(self.name.as_deref())
            .or_else(|| self.nutrient.as_ref().and_then(|nutrient| nutrient.name.as_deref()))
            .unwrap_or("")
            .trim()
    }

    fn quantity(&self) -> Option<f64> {
        self.value.or(self.amount)
    }

    fn unit_label(&self) -> &str {
        self.unit_name
            .as_deref()
            .or(self.unit.as_deref())
            .or_else(|| self.nutrient.as_ref().and_then(|nutrient| nutrient.unit_name.as_deref()))
            .unwrap_or("")
    }
}

/// Formatted per-100g nutrition summary for one food.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NutritionFacts {
    pub description: String,
    pub energy: String,
    pub protein: String,
    pub carbohydrate: String,
    pub fat: String,
    pub fiber: String,
    pub sodium: String,
}

impl NutritionFacts {
    pub fn from_nutrients(description: impl Into<String>, nutrients: &[NutrientEntry]) -> Self {
        Self {
            description: description.into(),
            energy: format_nutrient(nutrients, "Energy", Some("kcal")),
            protein: format_nutrient(nutrients, "Protein", Some("g")),
            carbohydrate: format_nutrient(nutrients, "Carbohydrate, by difference", Some("g")),
            fat: format_nutrient(nutrients, "Total lipid (fat)", Some("g")),
            fiber: format_nutrient(nutrients, "Fiber, total dietary", Some("g")),
            sodium: format_nutrient(nutrients, "Sodium, Na", Some("mg")),
        }
    }

    pub fn render(&self) -> String {
        [
            format!("食物：{}", self.description),
            format!("熱量：{}", self.energy),
            format!("蛋白質：{}", self.protein),
            format!("碳水：{}", self.carbohydrate),
            format!("脂肪：{}", self.fat),
            format!("膳食纖維：{}", self.fiber),
            format!("鈉：{}", self.sodium),
        ]
        .join("\n")
    }
}

/// `{qty:.1}{unit}` for the first entry called `name`, converting between mg
/// and g when a target unit is given. Energy entries in kcal are preferred over kJ.
pub fn format_nutrient(nutrients: &[NutrientEntry], name: &str, target_unit: Option<&str>) -> String {
    let mut matching = nutrients.iter().filter(|entry| entry.label() == name);
    let entry = match target_unit {
        Some(target) => nutrients
            .iter()
            .find(|entry| entry.label() == name && entry.unit_label().eq_ignore_ascii_case(target))
            .or_else(|| matching.next()),
        None => matching.next(),
    };

    let Some(entry) = entry else {
        return NOT_PROVIDED.to_string();
    };
    let Some(quantity) = entry.quantity() else {
        return NOT_PROVIDED.to_string();
    };

    let (quantity, unit) = match target_unit {
        Some(target) => convert_unit(quantity, entry.unit_label(), target),
        None => (quantity, entry.unit_label().to_string()),
    };
    format!("{quantity:.1}{unit}")
}

fn convert_unit(quantity: f64, unit: &str, target: &str) -> (f64, String) {
    if unit == target {
        return (quantity, unit.to_string());
    }
    match (unit.to_lowercase().as_str(), target.to_lowercase().as_str()) {
        ("mg", "g") => (quantity / 1000.0, target.to_string()),
        ("g", "mg") => (quantity * 1000.0, target.to_string()),
        _ => (quantity, unit.to_string()),
    }
}

pub struct UsdaClient {
    client: Client,
    api_key: SecretString,
}

impl UsdaClient {
    pub fn new(api_key: Option<&str>, timeout_secs: u64) -> Result<Self, GatewayError> {
        let api_key = api_key.map(str::trim).filter(|key| !key.is_empty()).ok_or_else(|| {
            GatewayError::configuration(Provider::Usda, "USDA_API_KEY is not set (gateway.usda_api_key)")
        })?;

        Ok(Self {
            client: build_client(Provider::Usda, timeout_secs)?,
            api_key: SecretString::from(api_key.to_string()),
        })
    }
}

#[async_trait]
impl NutritionProvider for UsdaClient {
    async fn search_food(&self, query: &str) -> Result<FoodMatch, GatewayError> {
        let params = [
            ("api_key", self.api_key.expose_secret().to_string()),
            ("query", query.to_string()),
            ("pageSize", "1".to_string()),
        ];
        let response: Value = get_json(&self.client, Provider::Usda, SEARCH_URL, &params).await?;
        parse_search(&response, query)
    }

    async fn food_nutrients(&self, fdc_id: u64) -> Result<Vec<NutrientEntry>, GatewayError> {
        let params = [("api_key", self.api_key.expose_secret().to_string())];
        let url = format!("{FOOD_URL}/{fdc_id}");
        let response: FoodDetailResponse = get_json(&self.client, Provider::Usda, &url, &params).await?;
        Ok(response.food_nutrients)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodDetailResponse {
    #[serde(default)]
    food_nutrients: Vec<NutrientEntry>,
}

pub(crate) fn parse_search(response: &Value, query: &str) -> Result<FoodMatch, GatewayError> {
    let first = response
        .get("foods")
        .and_then(Value::as_array)
        .and_then(|foods| foods.first())
        .ok_or_else(|| GatewayError::not_found(Provider::Usda, format!("no food matched `{query}`")))?;

    let fdc_id = first.get("fdcId").and_then(Value::as_u64).ok_or_else(|| {
        GatewayError::invalid_response(Provider::Usda, "search result has no fdcId")
    })?;
    let description = first
        .get("description")
        .and_then(Value::as_str)
        .filter(|description| !description.is_empty())
        .unwrap_or(query)
        .to_string();

    Ok(FoodMatch { fdc_id, description })
}

#[cfg(test)]
mod tests {
    use chowbot_core::errors::GatewayErrorKind;
    use serde_json::json;

    use super::{format_nutrient, parse_search, NutrientEntry, NutritionFacts, UsdaClient};

    #[test]
    fn construction_requires_api_key() {
        let kind = UsdaClient::new(None, 20).err().map(|error| error.kind);
        assert_eq!(kind, Some(GatewayErrorKind::Configuration));
    }

    #[test]
    fn empty_search_is_not_found() {
        let kind = parse_search(&json!({"foods": []}), "banana").err().map(|error| error.kind);
        assert_eq!(kind, Some(GatewayErrorKind::NotFound));
    }

    #[test]
    fn search_falls_back_to_query_for_description() {
        let found = parse_search(&json!({"foods": [{"fdcId": 1105314}]}), "banana").ok();
        assert_eq!(found.map(|found| (found.fdc_id, found.description)), Some((1105314, "banana".to_string())));
    }

    #[test]
    fn nutrients_convert_units_and_report_missing() {
        let nutrients = vec![
            NutrientEntry::named("Energy", 372.0, "kJ"),
            NutrientEntry::named("Energy", 89.0, "KCAL"),
            NutrientEntry::named("Protein", 1090.0, "mg"),
            NutrientEntry::named("Sodium, Na", 0.001, "g"),
        ];
        assert_eq!(format_nutrient(&nutrients, "Energy", Some("kcal")), "89.0KCAL");
        assert_eq!(format_nutrient(&nutrients, "Protein", Some("g")), "1.1g");
        assert_eq!(format_nutrient(&nutrients, "Sodium, Na", Some("mg")), "1.0mg");
        assert_eq!(format_nutrient(&nutrients, "Total lipid (fat)", Some("g")), "未提供");
    }

    #[test]
    fn detail_entries_accept_nested_nutrient_shape() {
        let entries: Vec<NutrientEntry> = serde_json::from_value(json!([
            {"nutrient": {"name": "Protein", "unitName": "g"}, "amount": 31.0}
        ]))
        .unwrap_or_default();
        let facts = NutritionFacts::from_nutrients("Chicken breast", &entries);
        assert_eq!(facts.protein, "31.0g");
        assert!(facts.render().starts_with("食物：Chicken breast\n熱量：未提供"));
    }
}
