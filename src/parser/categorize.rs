use std::fmt;

/// Fixed closed set of semantic buckets a canonical key can land in.
///
/// `General` is the categorizer default; `Legacy` is the overflow bucket for
/// regex-recovered keys that match none of the fixed per-key tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Essentials,
    CoreSpecs,
    Memory,
    Graphics,
    Npu,
    Expansion,
    Package,
    AdvancedTech,
    Security,
    Supplemental,
    General,
    Legacy,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Essentials => "essentials",
            Category::CoreSpecs => "cpu_specifications",
            Category::Memory => "memory_specifications",
            Category::Graphics => "gpu_specifications",
            Category::Npu => "npu_specifications",
            Category::Expansion => "expansion_options",
            Category::Package => "package_specifications",
            Category::AdvancedTech => "advanced_technologies",
            Category::Security => "security_reliability",
            Category::Supplemental => "supplemental_information",
            Category::General => "general",
            Category::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assign a canonical key to a category by keyword membership.
///
/// Rules run in a fixed priority order; the first match wins so a key is only
/// ever assigned once. Pure function.
pub fn categorize(key: &str) -> Category {
    const RULES: &[(&[&str], Category)] = &[
        (&["core", "thread", "frequency", "turbo", "cache"], Category::CoreSpecs),
        (&["memory", "ddr", "lpddr", "channel"], Category::Memory),
        (&["gpu", "graphics", "display", "resolution", "xe"], Category::Graphics),
        (&["npu", "ai", "tops", "neural"], Category::Npu),
        (&["power", "tdp", "watt", "temperature"], Category::Package),
        (&["pci", "thunderbolt", "usb", "expansion"], Category::Expansion),
        (&["security", "encryption", "trust", "guard"], Category::Security),
    ];

    for (keywords, category) in RULES {
        if keywords.iter().any(|kw| key.contains(kw)) {
            return *category;
        }
    }
    Category::General
}

/// Re-home a key recovered by the legacy regex strategy into its proper
/// section, using the fixed per-key tables the page family has always used.
/// Keys outside every table land in `Legacy`.
pub fn categorize_legacy(key: &str) -> Category {
    const TABLES: &[(&[&str], Category)] = &[
        (
            &["product_collection", "vertical_segment", "launch_date", "code_name", "instruction_set"],
            Category::Essentials,
        ),
        (
            &[
                "total_cores", "performance_cores", "efficiency_cores", "total_threads",
                "max_turbo_frequency", "base_frequency", "performance_core_max_frequency",
                "efficiency_core_max_frequency", "performance_core_base_frequency",
                "efficiency_core_base_frequency", "turbo_boost_max_frequency",
                "cache_size", "smart_cache", "l1_cache", "l2_cache", "l3_cache", "lithography",
            ],
            Category::CoreSpecs,
        ),
        (
            &["max_memory_size", "memory_channels", "memory_types", "memory_speed"],
            Category::Memory,
        ),
        (
            &["gpu_name", "graphics_max_frequency", "graphics_base_frequency", "xe_cores", "execution_units"],
            Category::Graphics,
        ),
        (&["npu_name", "npu_tops", "overall_tops", "ai_boost"], Category::Npu),
        (&["socket"], Category::Expansion),
        (
            &[
                "processor_base_power", "maximum_turbo_power", "minimum_assured_power",
                "tdp", "configurable_tdp_up", "configurable_tdp_down",
                "max_operating_temperature", "package_size", "tjunction",
            ],
            Category::Package,
        ),
        (
            &["speed_shift", "turbo_boost", "enhanced_speedstep", "thermal_monitoring", "configurable_tdp"],
            Category::AdvancedTech,
        ),
    ];

    for (keys, category) in TABLES {
        if keys.contains(&key) {
            return *category;
        }
    }
    Category::Legacy
}
