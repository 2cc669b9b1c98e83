// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline runs over synthetic catalogs.

use skyscan_cli::{Pipeline, PipelineConfig};
use skyscan_cluster::OrbitRegime;
use skyscan_core::{CatalogEntry, ObjectCategory, TlePair};
use skyscan_features::tle::line_checksum;

fn make_tle(norad: u32, incl_deg: f64, ecc: f64, mm_rev_day: f64) -> TlePair {
    let body1 =
        format!("1 {norad:05}U 98067A   24001.50000000  .00000000  00000-0  00000-0 0  999");
    let ecc_digits = {
        let formatted = format!("{ecc:.7}");
        formatted[2..].to_string()
    };
    let body2 = format!(
        "2 {norad:05} {incl_deg:8.4} {:8.4} {ecc_digits} {:8.4} {:8.4} {mm_rev_day:11.8}{:5}",
        120.0, 90.0, 10.0, 12
    );
    TlePair {
        line1: format!("{body1}{}", line_checksum(&body1)),
        line2: format!("{body2}{}", line_checksum(&body2)),
    }
}

fn entry(norad: u32, name: &str, tle: Option<TlePair>) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        norad_id: norad,
        country: "US".to_string(),
        launch_date: "2020-01-01".to_string(),
        tle,
    }
}

/// Two dense orbital families, one planted deviant, two strays, one record
/// without elements.
fn synthetic_catalog() -> Vec<CatalogEntry> {
    let mut entries = Vec::new();

    // Sun-synchronous-like family around 14.2 rev/day.
    for i in 0..30u32 {
        let jitter = f64::from(i);
        entries.push(entry(
            1000 + i,
            &format!("STARLINK-{}", 1000 + i),
            Some(make_tle(
                1000 + i,
                97.5 + 0.03 * jitter,
                0.001 + 0.00001 * jitter,
                14.19 + 0.002 * jitter,
            )),
        ));
    }
    // Deviant family member: same geometry, mean motion well off the pack.
    entries.push(entry(
        1999,
        "COSMOS 1408 DEB",
        Some(make_tle(1999, 97.9, 0.0012, 14.85)),
    ));

    // Navigation-like family around 2.2 rev/day.
    for i in 0..30u32 {
        let jitter = f64::from(i);
        entries.push(entry(
            2000 + i,
            &format!("NAVSTAR {}", 40 + i),
            Some(make_tle(
                2000 + i,
                54.8 + 0.03 * jitter,
                0.01 + 0.00001 * jitter,
                2.19 + 0.002 * jitter,
            )),
        ));
    }

    // Strays far from both families.
    entries.push(entry(
        3001,
        "STRAY ROCKET R/B",
        Some(make_tle(3001, 20.0, 0.05, 8.0)),
    ));
    entries.push(entry(3002, "STRAY 2", Some(make_tle(3002, 150.0, 0.3, 10.0))));

    // No element pair; must be skipped, not failed.
    entries.push(entry(4000, "NO ELEMENTS", None));

    entries
}

fn lowered_density_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.dbscan.min_points = 5;
    config
}

#[test]
fn sparse_catalog_under_default_density_is_all_noise() {
    let entries = vec![
        entry(1, "SAT A", Some(make_tle(1, 98.0, 0.001, 14.2))),
        entry(2, "SAT B", Some(make_tle(2, 98.1, 0.001, 14.21))),
        entry(3, "SAT C", Some(make_tle(3, 55.0, 0.01, 2.2))),
        entry(4, "SAT D", Some(make_tle(4, 55.1, 0.01, 2.21))),
        entry(5, "SAT E DEB", Some(make_tle(5, 20.0, 0.05, 8.0))),
        entry(6, "NO ELEMENTS", None),
    ];

    let pipeline = Pipeline::new(PipelineConfig::default()).expect("defaults are valid");
    let output = pipeline.run(&entries).expect("run should succeed");

    assert_eq!(output.population.len(), 5);
    assert_eq!(output.skipped_entries, 1);
    assert!(output.population.iter().all(|r| r.cluster == -1));
    assert!(output
        .population
        .iter()
        .all(|r| r.regime == OrbitRegime::Unclassified));
    assert!(output.population.iter().all(|r| r.anomaly_score.is_none()));
    assert_eq!(output.anomaly_count(), 0);
    assert!(output.metrics.is_none());
    assert!(output.regimes.is_empty());
    assert!(output.explanations.is_empty());

    // The lone rate row is the noise population itself.
    assert_eq!(output.cluster_rates.len(), 1);
    assert_eq!(output.cluster_rates[0].cluster, -1);
    assert_eq!(output.cluster_rates[0].total_count, 5);
    assert_eq!(output.cluster_rates[0].rate_percent, 0.0);
}

#[test]
fn dense_families_cluster_into_labeled_regimes() {
    let pipeline = Pipeline::new(lowered_density_config()).expect("config is valid");
    let output = pipeline
        .run(&synthetic_catalog())
        .expect("run should succeed");

    assert_eq!(output.population.len(), 62);
    assert_eq!(output.skipped_entries, 1);
    assert_eq!(output.cluster_count(), 2);
    assert_eq!(output.noise_count(), 2);

    let regimes = &output.regimes;
    assert_eq!(regimes.len(), 2);
    assert_eq!(regimes[0].cluster, 0);
    assert_eq!(regimes[0].size, 31);
    assert_eq!(regimes[0].regime, OrbitRegime::Leo);
    assert!((regimes[0].mean_mean_motion - 14.24).abs() < 0.1);
    assert_eq!(regimes[1].cluster, 1);
    assert_eq!(regimes[1].size, 30);
    assert_eq!(regimes[1].regime, OrbitRegime::Meo);

    let metrics = output.metrics.as_ref().expect("metrics are defined");
    assert!(metrics.silhouette > 0.8);
    assert!(metrics.davies_bouldin >= 0.0);
    assert!(metrics.calinski_harabasz > 0.0);
    assert_eq!(metrics.evaluated_points, 61);
    assert_eq!(metrics.evaluated_clusters, 2);
}

#[test]
fn planted_deviant_is_flagged_and_explained() {
    let pipeline = Pipeline::new(lowered_density_config()).expect("config is valid");
    let output = pipeline
        .run(&synthetic_catalog())
        .expect("run should succeed");

    let deviant = output
        .population
        .iter()
        .find(|r| r.norad_id == 1999)
        .expect("deviant is analyzed");
    assert_eq!(deviant.cluster, 0);
    assert!(deviant.anomaly.is_anomaly());
    assert!(deviant.anomaly_score.is_some());

    // Every cluster member is scored; noise rows never are.
    for record in &output.population {
        assert_eq!(record.anomaly_score.is_some(), record.cluster >= 0);
    }
    assert!(output.anomaly_count() >= 1);
    assert!(output.anomaly_count() <= 6);

    let explanation = output
        .explanations
        .iter()
        .find(|e| e.norad_id == 1999)
        .expect("deviant is explained");
    assert_eq!(explanation.category, ObjectCategory::Debris);
    assert_eq!(explanation.regime, OrbitRegime::Leo);
    assert!(explanation
        .summary
        .contains("COSMOS 1408 DEB (NORAD 1999) in Cluster 0 [LEO]"));
    assert!(explanation
        .summary
        .contains("unusual orbital drift within its group (debris)."));
    let deviation = explanation.deviation.expect("cluster mean is known");
    assert!(deviation > 0.5);
}

#[test]
fn rate_tables_cover_the_full_population() {
    let pipeline = Pipeline::new(lowered_density_config()).expect("config is valid");
    let output = pipeline
        .run(&synthetic_catalog())
        .expect("run should succeed");

    let total: usize = output.category_rates.iter().map(|r| r.total_count).sum();
    assert_eq!(total, 62);

    let debris = output
        .category_rates
        .iter()
        .find(|r| r.category == ObjectCategory::Debris)
        .expect("debris row exists");
    assert_eq!(debris.total_count, 1);
    assert_eq!(debris.anomaly_count, 1);
    assert!((debris.rate_percent - 100.0).abs() < 1e-12);

    let rocket = output
        .category_rates
        .iter()
        .find(|r| r.category == ObjectCategory::RocketBody)
        .expect("rocket body row exists");
    assert_eq!(rocket.total_count, 1);
    assert_eq!(rocket.anomaly_count, 0);

    assert_eq!(output.cluster_rates.len(), 3);
    assert_eq!(output.cluster_rates[0].cluster, -1);
    assert_eq!(output.cluster_rates[0].total_count, 2);
    assert_eq!(output.cluster_rates[0].rate_percent, 0.0);
    assert_eq!(output.cluster_rates[1].cluster, 0);
    assert_eq!(output.cluster_rates[1].total_count, 31);
    assert!(output.cluster_rates[1].anomaly_count >= 1);
    assert_eq!(output.cluster_rates[2].cluster, 1);
    assert_eq!(output.cluster_rates[2].total_count, 30);
}

#[test]
fn reruns_reproduce_every_label_and_score() {
    let entries = synthetic_catalog();
    let pipeline = Pipeline::new(lowered_density_config()).expect("config is valid");
    let first = pipeline.run(&entries).expect("first run should succeed");
    let second = pipeline.run(&entries).expect("second run should succeed");

    assert_eq!(first.population, second.population);
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.explanations, second.explanations);
    assert_eq!(first.category_rates, second.category_rates);
    assert_eq!(first.cluster_rates, second.cluster_rates);
}

#[test]
fn stage_records_follow_the_execution_order() {
    let pipeline = Pipeline::new(lowered_density_config()).expect("config is valid");
    let output = pipeline
        .run(&synthetic_catalog())
        .expect("run should succeed");

    let stages: Vec<&str> = output.stages.iter().map(|s| s.stage.as_ref()).collect();
    assert_eq!(
        stages,
        vec![
            "extract",
            "normalize",
            "cluster",
            "evaluate",
            "classify_regimes",
            "detect_anomalies",
            "explain",
            "aggregate",
        ]
    );
}
