use {
    crate::{
        analysis::{CalibrationResult, ConfusionMatrix, Evaluation},
        config::{Margin, RunConfig},
        domain::Move,
    },
    anyhow::{Context, Result},
    chrono::Local,
    serde::{Deserialize, Serialize},
    std::{
        fs::File,
        io::{BufWriter, Write},
        path::Path,
    },
    tabled::{Table, Tabled, settings::Style},
};

#[derive(Tabled)]
struct SweepRow {
    #[tabled(rename = "Margin")]
    margin: String,
    #[tabled(rename = "Macro F1")]
    macro_f1: String,
    #[tabled(rename = "Pairs")]
    evaluated: usize,
    #[tabled(rename = "")]
    chosen: &'static str,
}

#[derive(Tabled)]
struct ClassRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Precision")]
    precision: String,
    #[tabled(rename = "Recall")]
    recall: String,
    #[tabled(rename = "F1")]
    f1: String,
    #[tabled(rename = "Support")]
    support: u64,
}

#[derive(Tabled)]
struct MatrixRow {
    #[tabled(rename = "")]
    truth: String,
    #[tabled(rename = "pred_down")]
    down: u64,
    #[tabled(rename = "pred_neutral")]
    neutral: u64,
    #[tabled(rename = "pred_up")]
    up: u64,
}

/// One row per candidate, the retained margin marked.
pub fn format_margin_sweep(result: &CalibrationResult) -> String {
    let rows: Vec<SweepRow> = result
        .scores
        .iter()
        .map(|s| SweepRow {
            margin: s.margin.to_string(),
            macro_f1: format!("{:.4}", s.macro_f1),
            evaluated: s.evaluated,
            chosen: if s.margin == result.best.margin { "<- best" } else { "" },
        })
        .collect();
    Table::new(rows).with(Style::modern()).to_string()
}

/// Per-class precision / recall / F1 plus accuracy, macro and weighted averages.
pub fn format_classification_report(eval: &Evaluation) -> String {
    let mut rows: Vec<ClassRow> = eval
        .per_class
        .iter()
        .map(|m| ClassRow {
            class: m.class.to_string(),
            precision: format!("{:.3}", m.precision),
            recall: format!("{:.3}", m.recall),
            f1: format!("{:.3}", m.f1),
            support: m.support,
        })
        .collect();

    let total = eval.total();
    rows.push(ClassRow {
        class: "accuracy".to_string(),
        precision: String::new(),
        recall: String::new(),
        f1: format!("{:.3}", eval.accuracy),
        support: total,
    });
    rows.push(ClassRow {
        class: "macro avg".to_string(),
        precision: format!("{:.3}", eval.macro_precision),
        recall: format!("{:.3}", eval.macro_recall),
        f1: format!("{:.3}", eval.macro_f1),
        support: total,
    });
    rows.push(ClassRow {
        class: "weighted avg".to_string(),
        precision: format!("{:.3}", eval.weighted_precision),
        recall: format!("{:.3}", eval.weighted_recall),
        f1: format!("{:.3}", eval.weighted_f1),
        support: total,
    });

    Table::new(rows).with(Style::modern()).to_string()
}

pub fn format_confusion(matrix: &ConfusionMatrix) -> String {
    let rows: Vec<MatrixRow> = Move::SCORED
        .iter()
        .map(|&truth| MatrixRow {
            truth: format!("true_{}", truth.as_str()),
            down: matrix.get(truth, Move::Down),
            neutral: matrix.get(truth, Move::Neutral),
            up: matrix.get(truth, Move::Up),
        })
        .collect();
    Table::new(rows).with(Style::modern()).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub margin: f64,
    pub macro_f1: f64,
    pub evaluated: usize,
}

/// Machine-readable record of one calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSummary {
    pub generated_at: String,
    pub window_days: u32,
    pub threshold: f64,
    pub sweep: Vec<SweepEntry>,
    pub chosen_margin: f64,
    pub evaluation: Evaluation,
}

impl CalibrationSummary {
    pub fn new(config: &RunConfig, result: &CalibrationResult, evaluation: &Evaluation) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            window_days: config.window_days,
            threshold: config.threshold.value(),
            sweep: result
                .scores
                .iter()
                .map(|s| SweepEntry {
                    margin: s.margin.value(),
                    macro_f1: s.macro_f1,
                    evaluated: s.evaluated,
                })
                .collect(),
            chosen_margin: result.best.margin.value(),
            evaluation: evaluation.clone(),
        }
    }

    pub fn chosen(&self) -> Margin {
        Margin::new(self.chosen_margin)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Failed to write calibration summary to {:?}", path))?;
        writer.flush()?;
        Ok(())
    }
}

/// Prints the sweep, the chosen margin's report and its confusion matrix to stdout.
pub fn print_report(result: &CalibrationResult, evaluation: &Evaluation) {
    println!("\nMargin sweep (macro F1, first maximum wins):");
    println!("{}", format_margin_sweep(result));
    println!(
        "\nClassification report at margin {} ({} scored events):",
        result.best.margin,
        evaluation.total()
    );
    println!("{}", format_classification_report(evaluation));
    println!("\nConfusion matrix (rows = true move):");
    println!("{}", format_confusion(&evaluation.matrix));
}
