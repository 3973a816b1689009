use {
    crate::{analysis::ConfusionMatrix, domain::Move},
    anyhow::{Context, Result, bail},
    csv::{ReaderBuilder, Writer},
    std::{
        fs::File,
        io::{Read, Write},
        path::Path,
    },
};

fn header_for(class: Move) -> String {
    format!("pred_{}", class.as_str())
}

fn row_label_for(class: Move) -> String {
    format!("true_{}", class.as_str())
}

/// Writes `,pred_down,pred_neutral,pred_up` then one `true_*` row per class.
pub fn write_confusion<W: Write>(matrix: &ConfusionMatrix, writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(Move::SCORED.iter().map(|&c| header_for(c)));
    writer.write_record(&header)?;

    for (i, &class) in Move::SCORED.iter().enumerate() {
        let mut row = vec![row_label_for(class)];
        row.extend(matrix.counts()[i].iter().map(|n| n.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_confusion(matrix: &ConfusionMatrix, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    write_confusion(matrix, file).with_context(|| format!("Failed to write confusion matrix: {:?}", path))
}

/// Reads a matrix written by [`write_confusion`]. Labels must match exactly.
pub fn read_confusion<R: Read>(reader: R) -> Result<ConfusionMatrix> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let header = reader.headers()?.clone();
    let expected: Vec<String> = Move::SCORED.iter().map(|&c| header_for(c)).collect();
    let found: Vec<&str> = header.iter().skip(1).map(str::trim).collect();
    if found != expected {
        bail!("Unexpected confusion matrix header: {:?}", header);
    }

    let mut counts = [[0u64; 3]; 3];
    let mut seen = 0usize;
    for (i, record) in reader.records().enumerate() {
        let record = record.context("Failed to parse confusion matrix row")?;
        let Some(&class) = Move::SCORED.get(i) else {
            bail!("Confusion matrix has more than {} rows", Move::SCORED.len());
        };
        let label = record.get(0).unwrap_or("").trim();
        if label != row_label_for(class) {
            bail!("Row {} label '{}' should be '{}'", i + 1, label, row_label_for(class));
        }
        for (j, slot) in counts[i].iter_mut().enumerate() {
            let raw = record.get(j + 1).unwrap_or("").trim();
            *slot = raw
                .parse()
                .with_context(|| format!("Bad count '{}' in row '{}'", raw, label))?;
        }
        seen += 1;
    }
    if seen != Move::SCORED.len() {
        bail!("Confusion matrix has {} rows, expected {}", seen, Move::SCORED.len());
    }
    Ok(ConfusionMatrix::from_counts(counts))
}

pub fn load_confusion(path: &Path) -> Result<ConfusionMatrix> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    read_confusion(file).with_context(|| format!("Failed to read confusion matrix: {:?}", path))
}
