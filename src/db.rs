use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use tracing::{info, warn};

use crate::record::SpecRecord;

const DB_PATH: &str = "data/cpu_specs.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(parent) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cpu_specs (
            id INTEGER PRIMARY KEY,
            url  TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,

            -- Core counts
            total_cores INTEGER,
            performance_cores INTEGER,
            efficiency_cores INTEGER,
            total_threads INTEGER,

            -- Frequencies (GHz)
            max_turbo_frequency REAL,
            base_frequency REAL,
            performance_core_max_frequency REAL,
            efficiency_core_max_frequency REAL,
            performance_core_base_frequency REAL,
            efficiency_core_base_frequency REAL,
            turbo_boost_max_frequency REAL,

            -- Power (W)
            processor_base_power REAL,
            maximum_turbo_power REAL,
            minimum_assured_power REAL,
            tdp REAL,
            configurable_tdp_up REAL,
            configurable_tdp_down REAL,

            -- Process technology
            lithography TEXT,

            -- Caches
            cache_size REAL,
            smart_cache REAL,
            l1_cache TEXT,
            l2_cache TEXT,
            l3_cache REAL,

            -- Memory
            max_memory_size INTEGER,
            memory_channels INTEGER,
            memory_types TEXT,
            memory_speed INTEGER,

            -- Graphics
            gpu_name TEXT,
            graphics_max_frequency REAL,
            graphics_base_frequency REAL,
            xe_cores INTEGER,
            execution_units INTEGER,

            -- NPU
            npu_name TEXT,
            npu_tops INTEGER,
            overall_tops INTEGER,

            -- Package and thermal
            socket TEXT,
            max_operating_temperature INTEGER,
            package_size TEXT,
            tjunction INTEGER,

            -- Product information
            code_name TEXT,
            product_collection TEXT,
            vertical_segment TEXT,
            launch_date TEXT,
            instruction_set TEXT,

            -- Commerce metadata
            price TEXT,
            availability TEXT,
            description TEXT,

            -- Everything else, keyed by category
            additional_specs TEXT,

            scraped_at TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            scraper_version TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_specs_name ON cpu_specs(name);
        CREATE INDEX IF NOT EXISTS idx_specs_power ON cpu_specs(processor_base_power);
        CREATE INDEX IF NOT EXISTS idx_specs_cores ON cpu_specs(total_cores);
        CREATE INDEX IF NOT EXISTS idx_specs_lithography ON cpu_specs(lithography);
        CREATE INDEX IF NOT EXISTS idx_specs_collection ON cpu_specs(product_collection);
        ",
    )?;
    Ok(())
}

/// Insert one assembled record. Returns `Ok(false)` when a record with the
/// same url already exists; the stored row is never modified in that case.
pub fn insert(conn: &Connection, record: &SpecRecord) -> Result<bool> {
    let d = &record.derived;
    let result = conn.execute(
        "INSERT INTO cpu_specs (
            url, name,
            total_cores, performance_cores, efficiency_cores, total_threads,
            max_turbo_frequency, base_frequency,
            performance_core_max_frequency, efficiency_core_max_frequency,
            performance_core_base_frequency, efficiency_core_base_frequency,
            turbo_boost_max_frequency,
            processor_base_power, maximum_turbo_power, minimum_assured_power,
            tdp, configurable_tdp_up, configurable_tdp_down,
            lithography,
            cache_size, smart_cache, l1_cache, l2_cache, l3_cache,
            max_memory_size, memory_channels, memory_types, memory_speed,
            gpu_name, graphics_max_frequency, graphics_base_frequency,
            xe_cores, execution_units,
            npu_name, npu_tops, overall_tops,
            socket, max_operating_temperature, package_size, tjunction,
            code_name, product_collection, vertical_segment, launch_date,
            instruction_set,
            price, availability, description,
            additional_specs, scraped_at, scraper_version
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
            ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
            ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38, ?39, ?40,
            ?41, ?42, ?43, ?44, ?45, ?46, ?47, ?48, ?49, ?50,
            ?51, ?52
        )",
        rusqlite::params![
            record.url, record.name,
            d.total_cores, d.performance_cores, d.efficiency_cores, d.total_threads,
            d.max_turbo_frequency, d.base_frequency,
            d.performance_core_max_frequency, d.efficiency_core_max_frequency,
            d.performance_core_base_frequency, d.efficiency_core_base_frequency,
            d.turbo_boost_max_frequency,
            d.processor_base_power, d.maximum_turbo_power, d.minimum_assured_power,
            d.tdp, d.configurable_tdp_up, d.configurable_tdp_down,
            d.lithography,
            d.cache_size, d.smart_cache, d.l1_cache, d.l2_cache, d.l3_cache,
            d.max_memory_size, d.memory_channels, d.memory_types, d.memory_speed,
            d.gpu_name, d.graphics_max_frequency, d.graphics_base_frequency,
            d.xe_cores, d.execution_units,
            d.npu_name, d.npu_tops, d.overall_tops,
            d.socket, d.max_operating_temperature, d.package_size, d.tjunction,
            d.code_name, d.product_collection, d.vertical_segment, d.launch_date,
            d.instruction_set,
            record.price, record.availability, record.description,
            record.specs.to_json().to_string(),
            record.scraped_at.to_rfc3339(),
            env!("CARGO_PKG_VERSION"),
        ],
    );

    match result {
        Ok(_) => {
            info!(name = %record.name, "inserted record");
            Ok(true)
        }
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            warn!(url = %record.url, "duplicate record not inserted");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn count(conn: &Connection) -> Result<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM cpu_specs", [], |row| row.get(0))?;
    Ok(n)
}

#[derive(Debug, Default)]
pub struct PowerStats {
    pub cpus_with_power_data: i64,
    pub avg_base_power: Option<f64>,
    pub min_base_power: Option<f64>,
    pub max_base_power: Option<f64>,
    pub avg_turbo_power: Option<f64>,
    pub min_turbo_power: Option<f64>,
    pub max_turbo_power: Option<f64>,
    pub core_distribution: Vec<(i64, i64)>,
    pub process_distribution: Vec<(String, i64)>,
}

/// Aggregate power statistics over the stored records. Aggregates cover only
/// rows with a base power value; the distributions skip absent values.
pub fn power_statistics(conn: &Connection) -> Result<PowerStats> {
    let mut stats = conn.query_row(
        "SELECT
            COUNT(*),
            AVG(processor_base_power), MIN(processor_base_power), MAX(processor_base_power),
            AVG(maximum_turbo_power), MIN(maximum_turbo_power), MAX(maximum_turbo_power)
         FROM cpu_specs
         WHERE processor_base_power IS NOT NULL",
        [],
        |row| {
            Ok(PowerStats {
                cpus_with_power_data: row.get(0)?,
                avg_base_power: row.get(1)?,
                min_base_power: row.get(2)?,
                max_base_power: row.get(3)?,
                avg_turbo_power: row.get(4)?,
                min_turbo_power: row.get(5)?,
                max_turbo_power: row.get(6)?,
                core_distribution: Vec::new(),
                process_distribution: Vec::new(),
            })
        },
    )?;

    let mut stmt = conn.prepare(
        "SELECT total_cores, COUNT(*) FROM cpu_specs
         WHERE total_cores IS NOT NULL
         GROUP BY total_cores ORDER BY total_cores",
    )?;
    stats.core_distribution = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT lithography, COUNT(*) FROM cpu_specs
         WHERE lithography IS NOT NULL
         GROUP BY lithography ORDER BY COUNT(*) DESC",
    )?;
    stats.process_distribution = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(stats)
}

#[derive(Debug)]
pub struct CpuSummary {
    pub name: String,
    pub url: String,
    pub total_cores: Option<i64>,
    pub performance_cores: Option<i64>,
    pub efficiency_cores: Option<i64>,
    pub processor_base_power: Option<f64>,
    pub maximum_turbo_power: Option<f64>,
    pub lithography: Option<String>,
}

/// Case-insensitive substring search over product names.
pub fn find_by_name(conn: &Connection, pattern: &str) -> Result<Vec<CpuSummary>> {
    let mut stmt = conn.prepare(
        "SELECT name, url, total_cores, performance_cores, efficiency_cores,
                processor_base_power, maximum_turbo_power, lithography
         FROM cpu_specs
         WHERE name LIKE ?1
         ORDER BY name",
    )?;
    let rows = stmt
        .query_map([format!("%{}%", pattern)], |row| {
            Ok(CpuSummary {
                name: row.get(0)?,
                url: row.get(1)?,
                total_cores: row.get(2)?,
                performance_cores: row.get(3)?,
                efficiency_cores: row.get(4)?,
                processor_base_power: row.get(5)?,
                maximum_turbo_power: row.get(6)?,
                lithography: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[derive(Debug, Serialize)]
pub struct ModelingRecord {
    pub name: String,
    pub total_cores: Option<i64>,
    pub performance_cores: Option<i64>,
    pub efficiency_cores: Option<i64>,
    pub max_turbo_frequency: Option<f64>,
    pub base_frequency: Option<f64>,
    pub performance_core_max_frequency: Option<f64>,
    pub efficiency_core_max_frequency: Option<f64>,
    pub processor_base_power: Option<f64>,
    pub maximum_turbo_power: Option<f64>,
    pub minimum_assured_power: Option<f64>,
    pub lithography: Option<String>,
    pub cache_size: Option<f64>,
    pub memory_channels: Option<i64>,
    pub memory_speed: Option<i64>,
    pub graphics_max_frequency: Option<f64>,
    pub xe_cores: Option<i64>,
    pub npu_tops: Option<i64>,
    pub overall_tops: Option<i64>,
    pub max_operating_temperature: Option<i64>,
    pub vertical_segment: Option<String>,
    pub launch_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportMetadata {
    pub exported_at: String,
    pub total_records: usize,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ModelingExport {
    pub metadata: ExportMetadata,
    pub data: Vec<ModelingRecord>,
}

/// Extract the modeling-relevant subset of the store. Rows missing either a
/// base power value or a core count carry no modeling signal and are skipped.
pub fn export_for_modeling(conn: &Connection) -> Result<ModelingExport> {
    let mut stmt = conn.prepare(
        "SELECT name, total_cores, performance_cores, efficiency_cores,
                max_turbo_frequency, base_frequency,
                performance_core_max_frequency, efficiency_core_max_frequency,
                processor_base_power, maximum_turbo_power, minimum_assured_power,
                lithography, cache_size, memory_channels, memory_speed,
                graphics_max_frequency, xe_cores, npu_tops, overall_tops,
                max_operating_temperature, vertical_segment, launch_date
         FROM cpu_specs
         WHERE processor_base_power IS NOT NULL AND total_cores IS NOT NULL
         ORDER BY name",
    )?;
    let data = stmt
        .query_map([], |row| {
            Ok(ModelingRecord {
                name: row.get(0)?,
                total_cores: row.get(1)?,
                performance_cores: row.get(2)?,
                efficiency_cores: row.get(3)?,
                max_turbo_frequency: row.get(4)?,
                base_frequency: row.get(5)?,
                performance_core_max_frequency: row.get(6)?,
                efficiency_core_max_frequency: row.get(7)?,
                processor_base_power: row.get(8)?,
                maximum_turbo_power: row.get(9)?,
                minimum_assured_power: row.get(10)?,
                lithography: row.get(11)?,
                cache_size: row.get(12)?,
                memory_channels: row.get(13)?,
                memory_speed: row.get(14)?,
                graphics_max_frequency: row.get(15)?,
                xe_cores: row.get(16)?,
                npu_tops: row.get(17)?,
                overall_tops: row.get(18)?,
                max_operating_temperature: row.get(19)?,
                vertical_segment: row.get(20)?,
                launch_date: row.get(21)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelingExport {
        metadata: ExportMetadata {
            exported_at: chrono::Utc::now().to_rfc3339(),
            total_records: data.len(),
            description: "Intel CPU power specifications for SoC power prediction modeling"
                .to_string(),
        },
        data,
    })
}

/// Repair rows whose typed code_name column is empty by re-reading the stored
/// category blob. Rows inserted by earlier versions kept the raw marketing
/// form there; only the code_name column is ever rewritten.
pub fn backfill_code_names(conn: &Connection) -> Result<usize> {
    let candidates: Vec<(i64, String)> = {
        let mut stmt = conn.prepare(
            "SELECT id, additional_specs FROM cpu_specs
             WHERE (code_name IS NULL OR code_name = '')
               AND additional_specs IS NOT NULL",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let tx = conn.unchecked_transaction()?;
    let mut updated = 0usize;
    {
        let mut stmt = tx.prepare("UPDATE cpu_specs SET code_name = ?1 WHERE id = ?2")?;
        for (id, blob) in candidates {
            if let Some(code_name) = code_name_from_blob(&blob) {
                stmt.execute(rusqlite::params![code_name, id])?;
                updated += 1;
            }
        }
    }
    tx.commit()?;
    info!(updated, "backfilled code names");
    Ok(updated)
}

/// Search the category blob for a code_name entry, most likely section first.
fn code_name_from_blob(blob: &str) -> Option<String> {
    const SECTIONS: &[&str] = &["general", "essentials", "cpu_specifications"];
    let parsed: serde_json::Value = serde_json::from_str(blob).ok()?;
    for section in SECTIONS {
        if let Some(raw) = parsed.get(section).and_then(|s| s.get("code_name")) {
            if let Some(cleaned) = raw.as_str().and_then(crate::parser::resolve::clean_code_name) {
                return Some(cleaned);
            }
        }
    }
    None
}

pub fn url_exists(conn: &Connection, url: &str) -> Result<bool> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM cpu_specs WHERE url = ?1", [url], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CategorizedSpecs, SpecRecord};
    use std::collections::BTreeMap;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn record(url: &str, name: &str, fields: &[(&str, &str)]) -> SpecRecord {
        let fields: BTreeMap<String, String> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SpecRecord::assemble(
            url,
            name.to_string(),
            CategorizedSpecs::from_fields(fields),
            None,
            None,
            None,
            chrono::Utc::now(),
        )
    }

    #[test]
    fn insert_then_duplicate() {
        let conn = test_conn();
        let r = record(
            "https://www.intel.com/us/en/sku/1/x.html",
            "Intel Core i5-12400",
            &[("total_cores", "6"), ("processor_base_power", "65 W")],
        );
        assert!(insert(&conn, &r).unwrap());
        assert_eq!(count(&conn).unwrap(), 1);

        // Same url again: rejected, store unchanged
        let again = record(
            "https://www.intel.com/us/en/sku/1/x.html",
            "Intel Core i5-12400 (rescrape)",
            &[("total_cores", "99")],
        );
        assert!(!insert(&conn, &again).unwrap());
        assert_eq!(count(&conn).unwrap(), 1);
        let rows = find_by_name(&conn, "12400").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_cores, Some(6));
    }

    #[test]
    fn search_is_substring_match() {
        let conn = test_conn();
        insert(&conn, &record("u1", "Intel Core i7-14700K", &[])).unwrap();
        insert(&conn, &record("u2", "Intel Core i5-14600K", &[])).unwrap();
        insert(&conn, &record("u3", "Intel Xeon w5-2465X", &[])).unwrap();

        assert_eq!(find_by_name(&conn, "14").unwrap().len(), 2);
        assert_eq!(find_by_name(&conn, "Xeon").unwrap().len(), 1);
        assert_eq!(find_by_name(&conn, "ryzen").unwrap().len(), 0);
    }

    #[test]
    fn statistics_over_store() {
        let conn = test_conn();
        insert(
            &conn,
            &record("u1", "A", &[
                ("total_cores", "8"),
                ("processor_base_power", "65"),
                ("lithography", "Intel 7"),
            ]),
        )
        .unwrap();
        insert(
            &conn,
            &record("u2", "B", &[
                ("total_cores", "8"),
                ("processor_base_power", "125"),
                ("lithography", "Intel 7"),
            ]),
        )
        .unwrap();
        insert(&conn, &record("u3", "C", &[("total_cores", "4")])).unwrap();

        let stats = power_statistics(&conn).unwrap();
        assert_eq!(stats.cpus_with_power_data, 2);
        assert_eq!(stats.min_base_power, Some(65.0));
        assert_eq!(stats.max_base_power, Some(125.0));
        assert_eq!(stats.avg_base_power, Some(95.0));
        assert_eq!(stats.core_distribution, vec![(4, 1), (8, 2)]);
        assert_eq!(stats.process_distribution, vec![("Intel 7".to_string(), 2)]);
    }

    #[test]
    fn export_skips_rows_without_modeling_signal() {
        let conn = test_conn();
        insert(
            &conn,
            &record("u1", "Complete", &[
                ("total_cores", "8"),
                ("processor_base_power", "65"),
            ]),
        )
        .unwrap();
        insert(&conn, &record("u2", "No power", &[("total_cores", "8")])).unwrap();
        insert(
            &conn,
            &record("u3", "No cores", &[("processor_base_power", "65")]),
        )
        .unwrap();

        let export = export_for_modeling(&conn).unwrap();
        assert_eq!(export.data.len(), 1);
        assert_eq!(export.metadata.total_records, 1);
        assert_eq!(export.data[0].name, "Complete");
    }

    #[test]
    fn backfill_reads_category_blob() {
        let conn = test_conn();
        insert(
            &conn,
            &record("u1", "A", &[("code_name", "Products formerly Lunar Lake")]),
        )
        .unwrap();
        // Simulate a row from an earlier version that never parsed code_name
        conn.execute("UPDATE cpu_specs SET code_name = NULL", [])
            .unwrap();

        assert_eq!(backfill_code_names(&conn).unwrap(), 1);
        let code: Option<String> = conn
            .query_row("SELECT code_name FROM cpu_specs WHERE url = 'u1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(code.as_deref(), Some("Lunar Lake"));

        // Second run finds nothing left to repair
        assert_eq!(backfill_code_names(&conn).unwrap(), 0);
    }

    #[test]
    fn url_presence_check() {
        let conn = test_conn();
        insert(&conn, &record("u1", "A", &[])).unwrap();
        assert!(url_exists(&conn, "u1").unwrap());
        assert!(!url_exists(&conn, "u2").unwrap());
    }
}
