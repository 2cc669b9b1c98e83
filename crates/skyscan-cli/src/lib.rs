// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_anomaly::{AnomalyConfig, ClusterAnomalyDetector};
use skyscan_cluster::{
    ClusterRegime, Dbscan, DbscanConfig, OrbitRegime, RegimeClassifier, RegimeThresholds,
};
use skyscan_core::{
    classify_object_name, AnomalyFlag, CatalogEntry, NoopProgressSink, ObjectCategory,
    PipelineStage, ProgressSink, ScanError, StageDiagnostics,
};
use skyscan_eval::{clustering_metrics, ClusteringMetrics};
use skyscan_features::{FeatureConfig, FeatureExtractor, StandardScaler};
use skyscan_report::{
    aggregate_rates, explain_anomalies, AnomalyExplanation, CategoryRate, ClusterRate,
};

/// End-to-end analysis settings; one knob block per stage.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub dbscan: DbscanConfig,
    pub regimes: RegimeThresholds,
    pub anomaly: AnomalyConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        self.features.validate()?;
        self.dbscan.validate()?;
        self.regimes.validate()?;
        self.anomaly.validate()
    }
}

/// One catalog object after the full analysis.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PopulationRecord {
    pub name: String,
    pub norad_id: u32,
    pub country: String,
    pub launch_date: String,
    pub category: ObjectCategory,
    pub inclination_deg: f64,
    pub eccentricity: f64,
    pub mean_motion_rev_day: f64,
    pub cluster: i32,
    pub regime: OrbitRegime,
    pub anomaly: AnomalyFlag,
    pub anomaly_score: Option<f64>,
}

/// Everything a run produces, ready for report writers.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutput {
    pub population: Vec<PopulationRecord>,
    pub metrics: Option<ClusteringMetrics>,
    pub regimes: Vec<ClusterRegime>,
    pub explanations: Vec<AnomalyExplanation>,
    pub category_rates: Vec<CategoryRate>,
    pub cluster_rates: Vec<ClusterRate>,
    /// Catalog entries dropped for missing or unparseable element pairs.
    pub skipped_entries: usize,
    /// One record per executed stage, in execution order.
    pub stages: Vec<StageDiagnostics>,
}

impl PipelineOutput {
    pub fn cluster_count(&self) -> usize {
        self.regimes.len()
    }

    pub fn noise_count(&self) -> usize {
        self.population.iter().filter(|r| r.cluster < 0).count()
    }

    pub fn anomaly_count(&self) -> usize {
        self.population
            .iter()
            .filter(|r| r.anomaly.is_anomaly())
            .count()
    }
}

/// Runs the eight analysis stages in their fixed order.
///
/// Each stage consumes the previous stage's output immutably, so a rerun over
/// the same catalog with the same config reproduces every label, score, and
/// flag exactly.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, entries: &[CatalogEntry]) -> Result<PipelineOutput, ScanError> {
        self.run_with_progress(entries, &NoopProgressSink)
    }

    pub fn run_with_progress(
        &self,
        entries: &[CatalogEntry],
        sink: &dyn ProgressSink,
    ) -> Result<PipelineOutput, ScanError> {
        let mut stages = Vec::with_capacity(PipelineStage::ALL.len());
        let report = |stage: PipelineStage, detail: &str| {
            let position = PipelineStage::ALL
                .iter()
                .position(|s| *s == stage)
                .unwrap_or(0);
            sink.on_stage_complete(
                stage,
                (position + 1) as f32 / PipelineStage::ALL.len() as f32,
                detail,
            );
        };

        let extractor = FeatureExtractor::new(self.config.features.clone())?;
        let population = extractor.extract(entries)?;
        report(
            PipelineStage::Extract,
            &format!("accepted={}, skipped={}", population.accepted.len(), population.skipped),
        );
        stages.push(population.diagnostics.clone());

        let (_, normalized, scale_diag) = StandardScaler::fit_transform(&population.matrix)?;
        report(PipelineStage::Normalize, "");
        stages.push(scale_diag);

        let clustering = Dbscan::new(self.config.dbscan)?.fit(&normalized)?;
        let assignments = clustering.assignments;
        report(
            PipelineStage::Cluster,
            &format!(
                "clusters={}, noise={}",
                assignments.cluster_count(),
                assignments.noise_count()
            ),
        );
        stages.push(clustering.diagnostics);

        let evaluation = clustering_metrics(&normalized, &assignments)?;
        report(
            PipelineStage::Evaluate,
            if evaluation.metrics.is_some() {
                "metrics=defined"
            } else {
                "metrics=undefined"
            },
        );
        stages.push(evaluation.diagnostics);

        let mean_motions: Vec<f64> = population
            .features
            .iter()
            .map(|f| f.mean_motion_rev_day)
            .collect();
        let labeling =
            RegimeClassifier::new(self.config.regimes)?.label(&mean_motions, &assignments)?;
        report(
            PipelineStage::ClassifyRegimes,
            &format!("labeled_clusters={}", labeling.clusters.len()),
        );
        stages.push(labeling.diagnostics.clone());

        // Scores come from the raw feature rows; normalization is for the
        // clustering geometry only.
        let detection =
            ClusterAnomalyDetector::new(self.config.anomaly)?.detect(&population.matrix, &assignments)?;
        report(
            PipelineStage::DetectAnomalies,
            &format!("flagged={}", detection.flagged_count()),
        );
        stages.push(detection.diagnostics.clone());

        let explanation_report = explain_anomalies(
            entries,
            &population.accepted,
            &population.features,
            &assignments,
            &labeling,
            &detection,
        )?;
        report(
            PipelineStage::Explain,
            &format!("explanations={}", explanation_report.explanations.len()),
        );
        stages.push(explanation_report.diagnostics.clone());

        let categories: Vec<ObjectCategory> = population
            .accepted
            .iter()
            .map(|&index| classify_object_name(&entries[index].name))
            .collect();
        let rates = aggregate_rates(&categories, &assignments, &detection.flags)?;
        report(
            PipelineStage::Aggregate,
            &format!(
                "categories={}, clusters={}",
                rates.by_category.len(),
                rates.by_cluster.len()
            ),
        );
        stages.push(rates.diagnostics.clone());

        let mut records = Vec::with_capacity(population.accepted.len());
        for (row, &entry_index) in population.accepted.iter().enumerate() {
            let entry = &entries[entry_index];
            let cluster = assignments.label(row);
            records.push(PopulationRecord {
                name: entry.name.clone(),
                norad_id: entry.norad_id,
                country: entry.country.clone(),
                launch_date: entry.launch_date.clone(),
                category: categories[row],
                inclination_deg: population.features[row].inclination_deg,
                eccentricity: population.features[row].eccentricity,
                mean_motion_rev_day: population.features[row].mean_motion_rev_day,
                cluster,
                regime: labeling.regime_of(cluster).unwrap_or_default(),
                anomaly: detection.flags[row],
                anomaly_score: detection.scores[row],
            });
        }

        Ok(PipelineOutput {
            population: records,
            metrics: evaluation.metrics,
            regimes: labeling.clusters,
            explanations: explanation_report.explanations,
            category_rates: rates.by_category,
            cluster_rates: rates.by_cluster,
            skipped_entries: population.skipped,
            stages,
        })
    }
}

/// Parses a JSON pipeline config, tolerating omitted blocks.
pub fn config_from_json(raw: &str) -> Result<PipelineConfig, ScanError> {
    let config: PipelineConfig = serde_json::from_str(raw)
        .map_err(|err| ScanError::invalid_input(format!("invalid config JSON: {err}")))?;
    config.validate()?;
    Ok(config)
}

/// Parses a catalog JSON array into entries.
pub fn catalog_from_json(raw: &str) -> Result<Vec<CatalogEntry>, ScanError> {
    serde_json::from_str(raw)
        .map_err(|err| ScanError::invalid_input(format!("invalid catalog JSON: {err}")))
}

/// CLI namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = (
        skyscan_core::crate_name(),
        skyscan_features::crate_name(),
        skyscan_cluster::crate_name(),
        skyscan_eval::crate_name(),
        skyscan_anomaly::crate_name(),
        skyscan_report::crate_name(),
    );
    "skyscan-cli"
}
