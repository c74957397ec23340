//! JSON snapshots the CLI works on: the competitor registry, one event
//! with its trios and results, and stored score records.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use engine::dto::{CreateCompetitorRequest, register_all};
use engine::models::{Competitor, Prova, ScoreRecord};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct SnapshotReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SnapshotReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }

    pub fn into_result(self) -> Result<()> {
        self.log_warnings();
        if self.errors.is_empty() {
            return Ok(());
        }
        bail!("Snapshot is invalid:\n  {}", self.errors.join("\n  "))
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Cannot parse {}", path.display()))
}

pub async fn load_competitors(path: &Path, on: NaiveDate) -> Result<Vec<Competitor>> {
    let requests: Vec<CreateCompetitorRequest> = read_json(path).await?;
    let competitors = register_all(requests).context("Invalid competitor entry")?;

    check_competitors(&competitors, on).into_result()?;
    info!("Loaded {} competitor(s) from {}", competitors.len(), path.display());
    Ok(competitors)
}

pub async fn load_prova(path: &Path) -> Result<Prova> {
    let prova: Prova = read_json(path).await?;
    check_prova(&prova).into_result()?;
    info!(
        "Loaded event '{}' with {} trio(s) and {} result(s)",
        prova.name,
        prova.trios.len(),
        prova.results.len()
    );
    Ok(prova)
}

pub async fn load_scores(path: &Path) -> Result<Vec<ScoreRecord>> {
    let records: Vec<ScoreRecord> = read_json(path).await?;
    info!("Loaded {} score record(s) from {}", records.len(), path.display());
    Ok(records)
}

pub fn check_competitors(competitors: &[Competitor], on: NaiveDate) -> SnapshotReport {
    let mut report = SnapshotReport::default();
    let mut ids = HashSet::new();

    for competitor in competitors {
        if !ids.insert(competitor.competitor_id) {
            report.errors.push(format!(
                "Competitor id {} is listed more than once",
                competitor.competitor_id
            ));
        }
        if competitor.birth_date > on {
            report.warnings.push(format!(
                "{} is born after {}, age counts as 0",
                competitor.name, on
            ));
        }
    }

    report
}

pub fn check_prova(prova: &Prova) -> SnapshotReport {
    let mut report = SnapshotReport::default();

    if prova.name.trim().is_empty() {
        report.warnings.push("Event name is not specified".to_string());
    }

    let mut numbers = HashSet::new();
    for trio in &prova.trios {
        if !numbers.insert(trio.number) {
            report
                .errors
                .push(format!("Trio number {} is used more than once", trio.number));
        }
        if trio.category != prova.category {
            report.warnings.push(format!(
                "Trio {} is a {} trio in a {} event",
                trio.number, trio.category, prova.category
            ));
        }
    }

    if prova.results.is_empty() {
        report.warnings.push("Event has no results".to_string());
    }

    report
}

#[cfg(test)]
mod tests {
    use engine::models::{CategoryKind, Handicap, Sex, Trio};
    use uuid::Uuid;

    use super::*;

    fn competitor(n: u128, born: NaiveDate) -> Competitor {
        Competitor {
            competitor_id: Uuid::from_u128(n),
            name: format!("Competitor {}", n),
            birth_date: born,
            sex: Sex::Male,
            handicap: Handicap::new(1).unwrap(),
        }
    }

    #[test]
    fn test_check_competitors() {
        let on = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let born = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let future = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        let report = check_competitors(
            &[competitor(1, born), competitor(1, born), competitor(2, future)],
            on,
        );
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_check_prova_flags_repeated_numbers() {
        let prova = Prova {
            prova_id: Uuid::nil(),
            name: "Etapa".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            category: CategoryKind::Aberta,
            prize_discount: None,
            trios: vec![
                Trio::new(1, CategoryKind::Aberta, [Uuid::from_u128(1); 3]),
                Trio::new(1, CategoryKind::Mirim, [Uuid::from_u128(2); 3]),
            ],
            results: Vec::new(),
        };

        let report = check_prova(&prova);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 2);
    }
}
