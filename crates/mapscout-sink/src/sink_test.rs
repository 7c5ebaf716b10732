use super::*;
use mapscout_core::{EmailSet, ListingFields, SearchLocation};
use tempfile::TempDir;

fn record(name: &str, district: &str) -> BusinessRecord {
    let fields = ListingFields {
        name: Some(name.to_string()),
        address: Some(format!("Av. Larco 100, {district}")),
        rating: Some(4.5),
        review_count: Some(87),
        ..ListingFields::default()
    };
    BusinessRecord::assemble(fields, &SearchLocation::new("Lima", "Lima", district), "cevicherías")
        .expect("named record")
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// -----------------------------------------------------------------------
// incremental mode
// -----------------------------------------------------------------------

#[test]
fn incremental_batches_accumulate_without_repeating_header() {
    let dir = TempDir::new().unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Both, SaveMode::Incremental);

    sink.accept(vec![record("La Mar", "Miraflores"), record("Isolina", "Barranco")])
        .unwrap();
    sink.accept(vec![record("Maido", "Miraflores")]).unwrap();

    let json = read_json(&sink.json_path()).unwrap();
    assert_eq!(json.len(), 3);

    let csv = lines(&sink.csv_path());
    assert_eq!(csv.len(), 4);
    assert_eq!(csv.iter().filter(|l| l.contains("search_query")).count(), 1);
}

#[test]
fn csv_catches_up_after_a_failed_write() {
    let dir = TempDir::new().unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Both, SaveMode::Incremental);

    // A directory where the CSV should go makes the first write fail.
    fs::create_dir_all(sink.csv_path()).unwrap();
    let first = sink.accept(vec![record("La Mar", "Miraflores"), record("Isolina", "Barranco")]);
    assert!(matches!(first, Err(SinkError::Io { .. })));
    assert_eq!(read_json(&sink.json_path()).unwrap().len(), 2);

    fs::remove_dir(sink.csv_path()).unwrap();
    sink.accept(vec![record("Maido", "Miraflores")]).unwrap();

    let csv = lines(&sink.csv_path());
    assert_eq!(csv.len(), 4);
    assert_eq!(csv.iter().filter(|l| l.contains("search_query")).count(), 1);
    assert_eq!(read_json(&sink.json_path()).unwrap().len(), 3);
}

#[test]
fn both_mode_csv_starts_with_a_single_bom() {
    let dir = TempDir::new().unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Both, SaveMode::Incremental);
    sink.accept(vec![record("La Mar", "Miraflores")]).unwrap();
    sink.accept(vec![record("Maido", "Miraflores")]).unwrap();

    let bytes = fs::read(sink.csv_path()).unwrap();
    assert!(bytes.starts_with(BOM));
    assert_eq!(bytes.windows(BOM.len()).filter(|w| *w == BOM).count(), 1);
}

#[test]
fn csv_only_mode_has_no_bom_and_no_json() {
    let dir = TempDir::new().unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Csv, SaveMode::Incremental);
    sink.accept(vec![record("La Mar", "Miraflores")]).unwrap();

    let bytes = fs::read(sink.csv_path()).unwrap();
    assert!(bytes.starts_with(b"name,phone,website,email,emails,address"));
    assert!(!sink.json_path().exists());
}

#[test]
fn empty_batch_creates_no_files() {
    let dir = TempDir::new().unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Both, SaveMode::Incremental);
    assert_eq!(sink.accept(Vec::new()).unwrap(), 0);
    assert!(!sink.csv_path().exists());
    assert!(!sink.json_path().exists());
}

#[test]
fn emails_are_flattened_into_one_cell() {
    let dir = TempDir::new().unwrap();
    let fields = ListingFields {
        name: Some("Hotel B".into()),
        emails: ["reservas@hotelb.pe", "gerencia@hotelb.pe"].into_iter().collect::<EmailSet>(),
        ..ListingFields::default()
    };
    let rec =
        BusinessRecord::assemble(fields, &SearchLocation::new("Lima", "Lima", "Barranco"), "hoteles")
            .unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Csv, SaveMode::Incremental);
    sink.accept(vec![rec]).unwrap();

    let mut reader = csv::Reader::from_path(sink.csv_path()).unwrap();
    let row: CsvRow = reader.deserialize().next().unwrap().unwrap();
    assert_eq!(row.email, "reservas@hotelb.pe");
    assert_eq!(row.emails, "reservas@hotelb.pe; gerencia@hotelb.pe");
    assert_eq!(row.age_days, None);
}

#[test]
fn json_keeps_non_ascii_literally() {
    let dir = TempDir::new().unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Json, SaveMode::Incremental);
    sink.accept(vec![record("Cebichería Ñañaque", "Magdalena del Mar")])
        .unwrap();
    let text = fs::read_to_string(sink.json_path()).unwrap();
    assert!(text.contains("Cebichería Ñañaque"));
    assert!(text.starts_with("[\n  {"));
}

// -----------------------------------------------------------------------
// buffered mode
// -----------------------------------------------------------------------

#[test]
fn buffered_mode_writes_once_on_finish() {
    let dir = TempDir::new().unwrap();
    let mut sink = ResultSink::new(dir.path(), "run", OutputFormat::Both, SaveMode::Buffered);
    sink.accept(vec![record("La Mar", "Miraflores"), record("Isolina", "Barranco")])
        .unwrap();
    sink.accept(vec![record("Maido", "Miraflores")]).unwrap();
    assert!(!sink.csv_path().exists());

    let csv_path = sink.csv_path();
    let json_path = sink.json_path();
    let records = sink.finish().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(lines(&csv_path).len(), 4);
    assert_eq!(read_json(&json_path).unwrap().len(), 3);
}

#[test]
fn buffered_and_incremental_agree() {
    let batches = || {
        vec![
            vec![record("La Mar", "Miraflores"), record("Isolina", "Barranco")],
            vec![record("Maido", "Miraflores")],
        ]
    };
    let dir = TempDir::new().unwrap();

    let mut incremental =
        ResultSink::new(dir.path(), "inc", OutputFormat::Both, SaveMode::Incremental);
    let mut buffered = ResultSink::new(dir.path(), "buf", OutputFormat::Both, SaveMode::Buffered);
    for batch in batches() {
        incremental.accept(batch).unwrap();
    }
    for batch in batches() {
        buffered.accept(batch).unwrap();
    }
    let (inc_json, buf_json) = (incremental.json_path(), buffered.json_path());
    let (inc_csv, buf_csv) = (incremental.csv_path(), buffered.csv_path());
    incremental.finish().unwrap();
    buffered.finish().unwrap();

    assert_eq!(read_json(&inc_json).unwrap().len(), read_json(&buf_json).unwrap().len());
    assert_eq!(lines(&inc_csv).len(), lines(&buf_csv).len());
}

#[test]
fn finish_without_records_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let sink = ResultSink::new(dir.path(), "run", OutputFormat::Both, SaveMode::Buffered);
    let csv_path = sink.csv_path();
    assert!(sink.finish().unwrap().is_empty());
    assert!(!csv_path.exists());
}

#[test]
fn output_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("out").join("lima");
    let mut sink = ResultSink::new(&nested, "run", OutputFormat::Json, SaveMode::Incremental);
    sink.accept(vec![record("La Mar", "Miraflores")]).unwrap();
    assert!(nested.join("run.json").exists());
}
