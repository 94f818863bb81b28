use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::Html;

/// Fixed catalog of (canonical key, pattern) pairs applied to the flattened
/// page text. This is the safety net for page generations that predate any
/// structured spec markup; the pattern set is deliberately literal and
/// power-focused. Capture group 1 is the stored value.
const PATTERNS: &[(&str, &str)] = &[
    // Core counts
    ("total_cores", r"total cores\s*(\d+)"),
    ("performance_cores", r"(?:# of )?performance[- ]cores?\s*(\d+)"),
    ("efficiency_cores", r"(?:# of )?(?:low power )?efficient?[- ]cores?\s*(\d+)"),
    ("total_threads", r"total threads\s*(\d+)"),
    // Frequencies
    ("max_turbo_frequency", r"max turbo frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("base_frequency", r"(?:processor )?base frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("performance_core_max_frequency", r"performance[- ]core max turbo frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("efficiency_core_max_frequency", r"(?:low power )?efficient?[- ]core max turbo frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("performance_core_base_frequency", r"performance[- ]core base frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("efficiency_core_base_frequency", r"(?:low power )?efficient?[- ]core base frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("turbo_boost_max_frequency", r"intel.*?turbo boost max.*?frequency.*?(\d+(?:\.\d+)?)\s*ghz"),
    // Power figures
    ("processor_base_power", r"processor base power\s*(\d+(?:\.\d+)?)\s*w"),
    ("maximum_turbo_power", r"maximum turbo power\s*(\d+(?:\.\d+)?)\s*w"),
    ("minimum_assured_power", r"minimum assured power\s*(\d+(?:\.\d+)?)\s*w"),
    ("tdp", r"tdp\s*(\d+(?:\.\d+)?)\s*w"),
    ("configurable_tdp_up", r"configurable tdp[- ]up\s*(\d+(?:\.\d+)?)\s*w"),
    ("configurable_tdp_down", r"configurable tdp[- ]down\s*(\d+(?:\.\d+)?)\s*w"),
    // Cache
    ("cache_size", r"cache\s*(\d+(?:\.\d+)?)\s*mb"),
    ("smart_cache", r"(?:intel )?smart cache\s*(\d+(?:\.\d+)?)\s*mb"),
    ("l1_cache", r"l1 cache\s*(\d+(?:\.\d+)?)\s*(?:mb|kb)"),
    ("l2_cache", r"l2 cache\s*(\d+(?:\.\d+)?)\s*(?:mb|kb)"),
    ("l3_cache", r"l3 cache\s*(\d+(?:\.\d+)?)\s*mb"),
    // Process node: loose label match; validated by the lithography resolver
    ("lithography", r"(?:cpu\s+)?lithography\s*[:\s]+([^\n\r<>]+)"),
    // Memory
    ("max_memory_size", r"max memory.*?(\d+)\s*gb"),
    ("memory_channels", r"max.*?memory channels\s*(\d+)"),
    ("memory_types", r"memory types\s*([^\n\r]+(?:ddr|lpddr)[^\n\r]*)"),
    ("memory_speed", r"(?:up to )?(\d+)\s*mt/s"),
    // Graphics
    ("gpu_name", r"gpu name.*?([^\n\r]+(?:arc|uhd|iris|graphics)[^\n\r]*)"),
    ("graphics_max_frequency", r"graphics.*?max.*?frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("graphics_base_frequency", r"graphics.*?base.*?frequency\s*(\d+(?:\.\d+)?)\s*ghz"),
    ("xe_cores", r"xe[- ]cores\s*(\d+)"),
    ("execution_units", r"execution units\s*(\d+)"),
    // AI / NPU
    ("npu_name", r"npu name.*?([^\n\r]+ai boost[^\n\r]*)"),
    ("npu_tops", r"npu.*?peak tops.*?(\d+)"),
    ("overall_tops", r"overall peak tops.*?(\d+)"),
    ("ai_boost", r"intel.*?ai boost.*?(\d+)"),
    // Package and thermal
    ("socket", r"sockets? supported\s*([a-z0-9]+)"),
    ("max_operating_temperature", r"max operating temperature\s*(\d+)\s*°?c"),
    ("package_size", r"package size\s*([0-9.x]+mm)"),
    ("tjunction", r"t.*?junction\s*(\d+)\s*°?c"),
    // Product information
    ("instruction_set", r"instruction set\s*([0-9]+-bit)"),
    ("launch_date", r"launch date\s*([q\d'/\-\s]+)"),
    ("code_name", r"code name.*?([^\n\r]+)"),
    ("product_collection", r"product collection\s*([^\n\r]+)"),
    ("vertical_segment", r"vertical segment\s*([^\n\r]+)"),
    // Named boolean features: the matched phrase is the stored value
    ("speed_shift", r"(intel.*?speed shift)"),
    ("turbo_boost", r"(intel.*?turbo boost)"),
    ("enhanced_speedstep", r"(enhanced intel speedstep)"),
    ("thermal_monitoring", r"(thermal monitoring)"),
    ("configurable_tdp", r"(configurable tdp)"),
];

static CATALOG: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .map(|(key, pattern)| {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .multi_line(true)
                .build()
                .unwrap();
            (*key, re)
        })
        .collect()
});

/// Legacy whole-text strategy: run the pattern catalog against the flattened
/// page text. Only recovers the specific named fields above.
pub fn extract(doc: &Html) -> BTreeMap<String, String> {
    let text = flatten_text(doc);
    extract_from_text(&text)
}

pub fn extract_from_text(text: &str) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();
    for (key, re) in CATALOG.iter() {
        if let Some(caps) = re.captures(text) {
            let value = caps[1].trim().to_string();
            if !value.is_empty() {
                specs.insert(key.to_string(), value);
            }
        }
    }
    specs
}

/// Flatten the document to text with line breaks between nodes, so patterns
/// bounded by `[^\n\r]` stop at element boundaries the way they stop at line
/// ends in rendered text.
pub fn flatten_text(doc: &Html) -> String {
    doc.root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
