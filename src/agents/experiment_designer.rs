// Experiment designer: fits a classifier on the synthesized dataset

use super::classifier;
use super::{AgentContext, AgentOutcome};
use crate::models::{AccuracySummary, Dataset, ExperimentResult};

/// Fewer rows than this are reported as "not enough data"
pub const MIN_ROWS: usize = 3;

pub struct ExperimentDesigner {
    ctx: AgentContext,
}

impl ExperimentDesigner {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Fit on every row and report in-sample accuracy. The result is stored
    /// in memory under `results` unless fitting failed.
    pub async fn run(&self, dataset: &Dataset, question: &str) -> AgentOutcome<ExperimentResult> {
        let events = &self.ctx.events;
        events.log("ExperimentDesigner: preparing experiment");
        log::debug!("Designing experiment for question: {}", question);

        let features: Vec<Vec<f64>> = dataset.rows.iter().map(|r| vec![r.feature]).collect();
        let labels: Vec<u8> = dataset.rows.iter().map(|r| r.label).collect();
        let n_rows = features.len();

        if n_rows < MIN_ROWS {
            events.log("ExperimentDesigner: not enough data to run experiment");
            let result = ExperimentResult::not_enough_data(n_rows);
            self.remember(&result);
            return AgentOutcome::parsed(result);
        }

        events.log(format!("ExperimentDesigner: running model on {} rows", n_rows));

        let fitted = tokio::task::spawn_blocking(move || {
            classifier::fit_and_score(&features, &labels)
        })
        .await;

        let (model, accuracy) = match fitted {
            Ok(Ok(fit)) => fit,
            Ok(Err(e)) => return self.failed(e.to_string()),
            Err(e) => return self.failed(format!("classifier task failed: {}", e)),
        };

        let result = ExperimentResult::Fitted {
            summary: AccuracySummary { accuracy },
            model_coef: Some(model.coef),
            n_rows,
        };
        self.remember(&result);

        events.log(format!(
            "ExperimentDesigner: finished (accuracy={})",
            accuracy
        ));
        AgentOutcome::parsed(result)
    }

    fn remember(&self, result: &ExperimentResult) {
        if let Err(e) = self.ctx.memory.add_serialized("results", result) {
            self.ctx
                .events
                .log(format!("ExperimentDesigner: memory.add failed: {}", e));
        }
    }

    fn failed(&self, reason: String) -> AgentOutcome<ExperimentResult> {
        self.ctx
            .events
            .log(format!("ExperimentDesigner: unexpected error: {}", reason));
        AgentOutcome::fallback(ExperimentResult::failed(reason.clone()), reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::context_with;
    use crate::llm::testing::ScriptedModel;
    use crate::models::DatasetRow;
    use serde_json::json;

    fn dataset(points: &[(f64, u8)]) -> Dataset {
        Dataset {
            rows: points
                .iter()
                .enumerate()
                .map(|(i, &(feature, label))| DatasetRow {
                    id: i as u32 + 1,
                    feature,
                    label,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_not_enough_data_skips_fit() {
        let (ctx, _) = context_with(ScriptedModel::default());
        let memory = ctx.memory.clone();

        let outcome = ExperimentDesigner::new(ctx)
            .run(&dataset(&[(0.1, 0), (0.9, 1)]), "q")
            .await;
        assert_eq!(outcome.value, ExperimentResult::not_enough_data(2));
        assert_eq!(
            serde_json::to_value(&outcome.value).unwrap()["summary"],
            "not enough data"
        );
        assert_eq!(
            memory.get("results"),
            Some(json!({"summary": "not enough data", "details": {"n_rows": 2}}))
        );
    }

    #[tokio::test]
    async fn test_separable_rows_reach_full_accuracy() {
        let (ctx, _) = context_with(ScriptedModel::default());
        let memory = ctx.memory.clone();
        let rows = dataset(&[(0.0, 0), (0.1, 0), (0.2, 0), (0.8, 1), (0.9, 1), (1.0, 1)]);

        let outcome = ExperimentDesigner::new(ctx).run(&rows, "q").await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.value.accuracy(), Some(1.0));

        let value = serde_json::to_value(&outcome.value).unwrap();
        assert_eq!(value["n_rows"], 6);
        assert_eq!(value["model_coef"].as_array().unwrap().len(), 1);
        assert_eq!(memory.get("results"), Some(value));
    }

    #[tokio::test]
    async fn test_unbalanced_and_narrow_gap_rows_reach_full_accuracy() {
        let cases: [&[(f64, u8)]; 4] = [
            &[(0.1, 0), (0.2, 0), (0.3, 0), (0.4, 0), (0.95, 1)],
            &[(0.4, 0), (0.45, 0), (0.55, 1)],
            &[(0.1, 0), (0.6, 1), (0.7, 1), (0.8, 1), (0.9, 1)],
            &[(0.48, 0), (0.49, 0), (0.51, 1), (0.52, 1)],
        ];

        for points in cases {
            let (ctx, _) = context_with(ScriptedModel::default());
            let outcome = ExperimentDesigner::new(ctx).run(&dataset(points), "q").await;
            assert_eq!(outcome.value.accuracy(), Some(1.0), "rows {:?}", points);
        }
    }

    #[tokio::test]
    async fn test_single_class_reports_error_shape() {
        let (ctx, _) = context_with(ScriptedModel::default());
        let rows = dataset(&[(0.1, 1), (0.5, 1), (0.9, 1)]);

        let outcome = ExperimentDesigner::new(ctx).run(&rows, "q").await;
        assert!(outcome.is_fallback());
        let value = serde_json::to_value(&outcome.value).unwrap();
        assert_eq!(value["summary"], "error");
        assert!(value["details"]["error"]
            .as_str()
            .unwrap()
            .contains("only one class"));
    }
}
