use crate::detection::DetectorOutcome;
use crate::models::{BoundingBox, ClassCatalog, WeightedDetection};
use crate::pipeline::Analysis;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// How urgently a defect class needs attention, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Critical,
    High,
    Medium,
    Low,
}

impl Criticality {
    /// Critical and high defects count towards `critical_defects`
    pub fn is_severe(self) -> bool {
        matches!(self, Criticality::Critical | Criticality::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Criticality::Critical => "critical",
            Criticality::High => "high",
            Criticality::Medium => "medium",
            Criticality::Low => "low",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criticality per class name; classes not listed are medium
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalityTable {
    levels: BTreeMap<String, Criticality>,
}

impl CriticalityTable {
    pub fn new(levels: BTreeMap<String, Criticality>) -> Self {
        Self { levels }
    }

    /// Defaults with the given overrides applied on top
    pub fn with_overrides(overrides: &BTreeMap<String, Criticality>) -> Self {
        let mut table = Self::default();
        table
            .levels
            .extend(overrides.iter().map(|(name, level)| (name.clone(), *level)));
        table
    }

    pub fn level(&self, class_name: &str) -> Criticality {
        self.levels.get(class_name).copied().unwrap_or(Criticality::Medium)
    }
}

impl Default for CriticalityTable {
    fn default() -> Self {
        let levels = [
            ("Burn Mark", Criticality::High),
            ("Coating_defects", Criticality::Medium),
            ("Crack", Criticality::Critical),
            ("EROSION", Criticality::High),
        ]
        .into_iter()
        .map(|(name, level)| (name.to_string(), level))
        .collect();
        Self { levels }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One reported defect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defect {
    pub id: usize,
    pub class_name: String,
    pub center: Point,
    pub size: f32,
    pub criticality: Criticality,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub detector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefectReport {
    pub defects_found: usize,
    pub critical_defects: usize,
    pub defects: Vec<Defect>,
    pub analysis_id: String,
    pub timestamp: String,
    pub model_used: String,
    pub detectors: Vec<DetectorOutcome>,
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

impl DefectReport {
    /// Format an analysis for the caller, most critical defects first.
    ///
    /// Defect ids are the 1-based selection rank from deduplication, so they
    /// are not consecutive after sorting.
    pub fn build(
        analysis: &Analysis,
        catalog: &ClassCatalog,
        table: &CriticalityTable,
        at: OffsetDateTime,
    ) -> Result<Self> {
        let mut defects: Vec<Defect> = analysis
            .detections
            .iter()
            .enumerate()
            .map(|(i, det)| Self::defect(i + 1, det, catalog, table))
            .collect();

        defects.sort_by(|a, b| {
            a.criticality
                .cmp(&b.criticality)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });

        let id_format =
            time::format_description::parse("ANL_[year][month][day]_[hour][minute][second]")?;

        Ok(Self {
            defects_found: defects.len(),
            critical_defects: defects.iter().filter(|d| d.criticality.is_severe()).count(),
            defects,
            analysis_id: at.format(&id_format)?,
            timestamp: at.format(&Rfc3339)?,
            model_used: "ensemble".to_string(),
            detectors: analysis.outcomes.clone(),
        })
    }

    fn defect(
        id: usize,
        det: &WeightedDetection,
        catalog: &ClassCatalog,
        table: &CriticalityTable,
    ) -> Defect {
        let class_name = catalog
            .name(det.class_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("class_{}", det.class_id));
        let (cx, cy) = det.bbox.center();

        Defect {
            id,
            criticality: table.level(&class_name),
            class_name,
            center: Point {
                x: round1(cx),
                y: round1(cy),
            },
            size: round1(det.bbox.size()),
            confidence: det.confidence,
            bbox: det.bbox,
            detector: det.detector.clone(),
        }
    }
}

impl fmt::Display for DefectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Defect Analysis {} ===", self.analysis_id)?;
        writeln!(
            f,
            "Defects found: {} ({} critical or high)",
            self.defects_found, self.critical_defects
        )?;

        if self.defects.is_empty() {
            writeln!(f, "No defects detected.")?;
        } else {
            writeln!(f)?;
            for d in &self.defects {
                writeln!(
                    f,
                    "  {:>2}. {} [{}] at ({:.1}, {:.1}) size {:.1} - confidence: {:.3} \
                     (detector: {})",
                    d.id,
                    d.class_name,
                    d.criticality,
                    d.center.x,
                    d.center.y,
                    d.size,
                    d.confidence,
                    d.detector
                )?;
            }
        }

        let failed: Vec<&str> = self
            .detectors
            .iter()
            .filter(|o| o.is_failure())
            .map(DetectorOutcome::detector)
            .collect();
        if !failed.is_empty() {
            writeln!(f)?;
            writeln!(f, "Detectors that failed: {}", failed.join(", "))?;
        }

        Ok(())
    }
}
