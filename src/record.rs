use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::parser::categorize::{categorize, categorize_legacy, Category};
use crate::parser::resolve::{coerce_float, coerce_int};

/// Two-level categorized spec structure: category -> canonical key -> raw
/// value. Built once from the flat extractor output; a key lands in exactly
/// one category.
#[derive(Debug, Clone, Default)]
pub struct CategorizedSpecs {
    map: BTreeMap<Category, BTreeMap<String, String>>,
}

impl CategorizedSpecs {
    /// Categorize a flat field map. The fixed per-key tables take precedence
    /// over the keyword rules so well-known fields always land in their
    /// historical section; everything else falls through to the keyword
    /// categorizer, defaulting to the general bucket.
    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        let mut map: BTreeMap<Category, BTreeMap<String, String>> = BTreeMap::new();
        for (key, value) in fields {
            let category = match categorize_legacy(&key) {
                Category::Legacy => categorize(&key),
                known => known,
            };
            map.entry(category).or_default().insert(key, value);
        }
        Self { map }
    }

    /// Flat lookup across all categories.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .values()
            .find_map(|fields| fields.get(key))
            .map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&Category, &BTreeMap<String, String>)> {
        self.map.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.map.values().all(BTreeMap::is_empty)
    }

    pub fn field_count(&self) -> usize {
        self.map.values().map(BTreeMap::len).sum()
    }

    /// Serialized blob stored alongside the typed columns.
    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        for (category, fields) in &self.map {
            if !fields.is_empty() {
                out.insert(category.as_str().to_string(), json!(fields));
            }
        }
        Value::Object(out)
    }
}

/// Typed scalar fields parsed out of the categorized specs for storage.
/// Absence means "not observed", never zero.
#[derive(Debug, Clone, Default)]
pub struct DerivedSpecs {
    pub total_cores: Option<i64>,
    pub performance_cores: Option<i64>,
    pub efficiency_cores: Option<i64>,
    pub total_threads: Option<i64>,

    pub max_turbo_frequency: Option<f64>,
    pub base_frequency: Option<f64>,
    pub performance_core_max_frequency: Option<f64>,
    pub efficiency_core_max_frequency: Option<f64>,
    pub performance_core_base_frequency: Option<f64>,
    pub efficiency_core_base_frequency: Option<f64>,
    pub turbo_boost_max_frequency: Option<f64>,

    pub processor_base_power: Option<f64>,
    pub maximum_turbo_power: Option<f64>,
    pub minimum_assured_power: Option<f64>,
    pub tdp: Option<f64>,
    pub configurable_tdp_up: Option<f64>,
    pub configurable_tdp_down: Option<f64>,

    pub lithography: Option<String>,

    pub cache_size: Option<f64>,
    pub smart_cache: Option<f64>,
    pub l1_cache: Option<String>,
    pub l2_cache: Option<String>,
    pub l3_cache: Option<f64>,

    pub max_memory_size: Option<i64>,
    pub memory_channels: Option<i64>,
    pub memory_types: Option<String>,
    pub memory_speed: Option<i64>,

    pub gpu_name: Option<String>,
    pub graphics_max_frequency: Option<f64>,
    pub graphics_base_frequency: Option<f64>,
    pub xe_cores: Option<i64>,
    pub execution_units: Option<i64>,

    pub npu_name: Option<String>,
    pub npu_tops: Option<i64>,
    pub overall_tops: Option<i64>,

    pub socket: Option<String>,
    pub max_operating_temperature: Option<i64>,
    pub package_size: Option<String>,
    pub tjunction: Option<i64>,

    pub code_name: Option<String>,
    pub product_collection: Option<String>,
    pub vertical_segment: Option<String>,
    pub launch_date: Option<String>,
    pub instruction_set: Option<String>,
}

impl DerivedSpecs {
    /// Parse the typed fields out of the categorized structure. Numeric
    /// coercion is permissive: the first embedded number wins, anything else
    /// is absent.
    ///
    /// Legacy-architecture fallback: product generations that predate the
    /// performance/efficiency core split report only a total count. In that
    /// case all cores are taken as performance cores with zero efficiency
    /// cores, and the general turbo/base frequencies are mirrored into the
    /// performance-core slots when those are absent.
    pub fn from_specs(specs: &CategorizedSpecs) -> Self {
        let text = |key: &str| specs.get(key).map(str::to_string);
        let int = |key: &str| coerce_int(specs.get(key));
        let float = |key: &str| coerce_float(specs.get(key));

        let total_cores = int("total_cores");
        let mut performance_cores = int("performance_cores");
        let mut efficiency_cores = int("efficiency_cores");

        let max_turbo_frequency = float("max_turbo_frequency");
        let base_frequency = float("base_frequency");
        let mut performance_core_max_frequency = float("performance_core_max_frequency");
        let mut performance_core_base_frequency = float("performance_core_base_frequency");

        let legacy_architecture =
            total_cores.is_some() && performance_cores.is_none() && efficiency_cores.is_none();
        if legacy_architecture {
            performance_cores = total_cores;
            efficiency_cores = Some(0);
            if performance_core_max_frequency.is_none() {
                performance_core_max_frequency = max_turbo_frequency;
            }
            if performance_core_base_frequency.is_none() {
                performance_core_base_frequency = base_frequency;
            }
        }

        Self {
            total_cores,
            performance_cores,
            efficiency_cores,
            total_threads: int("total_threads"),

            max_turbo_frequency,
            base_frequency,
            performance_core_max_frequency,
            efficiency_core_max_frequency: float("efficiency_core_max_frequency"),
            performance_core_base_frequency,
            efficiency_core_base_frequency: float("efficiency_core_base_frequency"),
            turbo_boost_max_frequency: float("turbo_boost_max_frequency"),

            processor_base_power: float("processor_base_power"),
            maximum_turbo_power: float("maximum_turbo_power"),
            minimum_assured_power: float("minimum_assured_power"),
            tdp: float("tdp"),
            configurable_tdp_up: float("configurable_tdp_up"),
            configurable_tdp_down: float("configurable_tdp_down"),

            lithography: text("lithography"),

            cache_size: float("cache_size"),
            smart_cache: float("smart_cache"),
            l1_cache: text("l1_cache"),
            l2_cache: text("l2_cache"),
            l3_cache: float("l3_cache"),

            max_memory_size: int("max_memory_size"),
            memory_channels: int("memory_channels"),
            memory_types: text("memory_types"),
            memory_speed: int("memory_speed"),

            gpu_name: text("gpu_name"),
            graphics_max_frequency: float("graphics_max_frequency"),
            graphics_base_frequency: float("graphics_base_frequency"),
            xe_cores: int("xe_cores"),
            execution_units: int("execution_units"),

            npu_name: text("npu_name"),
            npu_tops: int("npu_tops"),
            overall_tops: int("overall_tops"),

            socket: text("socket"),
            max_operating_temperature: int("max_operating_temperature"),
            package_size: text("package_size"),
            tjunction: int("tjunction"),

            code_name: specs
                .get("code_name")
                .and_then(crate::parser::resolve::clean_code_name),
            product_collection: text("product_collection"),
            vertical_segment: text("vertical_segment"),
            launch_date: text("launch_date"),
            instruction_set: text("instruction_set"),
        }
    }
}

/// One assembled hardware product record. Immutable after assembly; the store
/// either accepts it once or rejects it as a duplicate of its url.
#[derive(Debug, Clone)]
pub struct SpecRecord {
    pub url: String,
    pub name: String,
    pub specs: CategorizedSpecs,
    pub derived: DerivedSpecs,
    pub price: Option<String>,
    pub availability: Option<String>,
    pub description: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl SpecRecord {
    pub fn assemble(
        url: &str,
        name: String,
        specs: CategorizedSpecs,
        price: Option<String>,
        availability: Option<String>,
        description: Option<String>,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        let derived = DerivedSpecs::from_specs(&specs);
        Self {
            url: url.to_string(),
            name,
            specs,
            derived,
            price,
            availability,
            description,
            scraped_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn each_key_in_exactly_one_category() {
        let specs = CategorizedSpecs::from_fields(fields(&[
            ("total_cores", "8"),
            ("memory_channels", "2"),
            ("lithography", "Intel 7"),
            ("mystery_field", "x"),
        ]));
        for key in ["total_cores", "memory_channels", "lithography", "mystery_field"] {
            let holders = specs
                .categories()
                .filter(|(_, f)| f.contains_key(key))
                .count();
            assert_eq!(holders, 1, "{key} must live in exactly one category");
        }
    }

    #[test]
    fn known_keys_use_fixed_tables() {
        let specs = CategorizedSpecs::from_fields(fields(&[
            ("code_name", "Raptor Lake"),
            ("lithography", "Intel 7"),
            ("socket", "LGA1700"),
        ]));
        let holder = |key: &str| {
            specs
                .categories()
                .find(|(_, f)| f.contains_key(key))
                .map(|(c, _)| *c)
                .unwrap()
        };
        assert_eq!(holder("code_name"), Category::Essentials);
        assert_eq!(holder("lithography"), Category::CoreSpecs);
        assert_eq!(holder("socket"), Category::Expansion);
    }

    #[test]
    fn unknown_keys_fall_back_to_keyword_rules() {
        let specs = CategorizedSpecs::from_fields(fields(&[
            ("deep_learning_boost", "Yes"),
            ("mystery_field", "x"),
        ]));
        let holder = |key: &str| {
            specs
                .categories()
                .find(|(_, f)| f.contains_key(key))
                .map(|(c, _)| *c)
                .unwrap()
        };
        assert_eq!(holder("mystery_field"), Category::General);
    }

    #[test]
    fn legacy_core_fallback() {
        let specs = CategorizedSpecs::from_fields(fields(&[
            ("total_cores", "8"),
            ("max_turbo_frequency", "5.1 GHz"),
            ("base_frequency", "3.4 GHz"),
        ]));
        let derived = DerivedSpecs::from_specs(&specs);
        assert_eq!(derived.performance_cores, Some(8));
        assert_eq!(derived.efficiency_cores, Some(0));
        assert_eq!(derived.performance_core_max_frequency, Some(5.1));
        assert_eq!(derived.performance_core_base_frequency, Some(3.4));
    }

    #[test]
    fn no_fallback_when_split_present() {
        let specs = CategorizedSpecs::from_fields(fields(&[
            ("total_cores", "14"),
            ("performance_cores", "6"),
            ("efficiency_cores", "8"),
            ("max_turbo_frequency", "5.0"),
        ]));
        let derived = DerivedSpecs::from_specs(&specs);
        assert_eq!(derived.performance_cores, Some(6));
        assert_eq!(derived.efficiency_cores, Some(8));
        assert_eq!(derived.performance_core_max_frequency, None);
    }

    #[test]
    fn fallback_does_not_clobber_observed_frequencies() {
        let specs = CategorizedSpecs::from_fields(fields(&[
            ("total_cores", "4"),
            ("max_turbo_frequency", "4.4"),
            ("performance_core_max_frequency", "4.2"),
        ]));
        let derived = DerivedSpecs::from_specs(&specs);
        assert_eq!(derived.performance_core_max_frequency, Some(4.2));
    }

    #[test]
    fn absence_is_none_not_zero() {
        let derived = DerivedSpecs::from_specs(&CategorizedSpecs::default());
        assert_eq!(derived.total_cores, None);
        assert_eq!(derived.processor_base_power, None);
        assert_eq!(derived.performance_cores, None);
    }

    #[test]
    fn code_name_cleaned_at_assembly() {
        let specs =
            CategorizedSpecs::from_fields(fields(&[("code_name", "Products formerly Arrow Lake:")]));
        let derived = DerivedSpecs::from_specs(&specs);
        assert_eq!(derived.code_name.as_deref(), Some("Arrow Lake"));
    }

    #[test]
    fn blob_omits_empty_categories() {
        let specs = CategorizedSpecs::from_fields(fields(&[("total_cores", "8")]));
        let blob = specs.to_json();
        assert!(blob.get("cpu_specifications").is_some());
        assert!(blob.get("memory_specifications").is_none());
    }
}
