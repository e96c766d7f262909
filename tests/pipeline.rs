// End-to-end tests for the campaign2parquet pipeline
//
// Inputs are JSON Lines tables on an in-memory operator; outputs are read back
// from the committed Parquet partitions.

use arrow::array::{Array, Float64Array, RecordBatch, StringArray};
use bytes::Bytes;
use campaign2parquet::{
    CatalogJsonSource, ErrorKind, PartitionedWriter, Pipeline, PipelineReport, RunFailure,
    RuntimeConfig, Stage,
};
use campaign2parquet_config::{FlattenMode, MalformedRowPolicy};
use opendal::{services, Operator};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

const CAMPAIGN_INFO_PATH: &str = "kgendata/campaigninfo/part-00000.jsonl";
const USER_CAMPAIGN_PATH: &str = "kgendata/user_campaign/part-00000.jsonl";

const SCENARIO_A_CAMPAIGN: &str = r#"{"campaignID":"c1","tasks":[{"taskID":"t1","rewardAmount":10,"taskDeadline":"2024-06-01"}]}"#;
const SCENARIO_A_USER: &str = r#"{"userID":"u1","campaignID":"c1","createdAt":"2024-05-01T00:00:00Z","progressDetails":[{"taskID":"t1","rewardEarned":5}]}"#;

fn memory_operator() -> Operator {
    Operator::new(services::Memory::default())
        .expect("Failed to create memory operator")
        .finish()
}

async fn seed(op: &Operator, campaign_infos: &[&str], user_campaigns: &[&str]) {
    op.write(CAMPAIGN_INFO_PATH, campaign_infos.join("\n").into_bytes())
        .await
        .expect("Failed to seed campaign info");
    op.write(USER_CAMPAIGN_PATH, user_campaigns.join("\n").into_bytes())
        .await
        .expect("Failed to seed user campaigns");
}

fn pipeline(op: &Operator, config: &RuntimeConfig) -> Pipeline<CatalogJsonSource> {
    let source = CatalogJsonSource::from_config(op.clone(), config);
    let writer = PartitionedWriter::from_config(op.clone(), config).expect("Invalid writer config");
    Pipeline::from_config(source, writer, config)
}

async fn run(op: &Operator, config: &RuntimeConfig) -> Result<PipelineReport, RunFailure> {
    pipeline(op, config).run().await
}

async fn read_partition(op: &Operator, path: &str) -> Vec<RecordBatch> {
    let data = op.read(path).await.expect("Failed to read parquet file");
    ParquetRecordBatchReaderBuilder::try_new(Bytes::from(data.to_vec()))
        .expect("Invalid parquet file")
        .build()
        .expect("Failed to build reader")
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to read batches")
}

fn strings<'a>(batch: &'a RecordBatch, column: &str) -> &'a StringArray {
    batch
        .column_by_name(column)
        .unwrap_or_else(|| panic!("missing column {column}"))
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("not a string column")
}

async fn committed_files(op: &Operator) -> Vec<String> {
    let mut files: Vec<String> = op
        .list_with("data/")
        .recursive(true)
        .await
        .expect("Failed to list output")
        .into_iter()
        .filter(|e| e.metadata().is_file())
        .map(|e| e.path().to_string())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn scenario_a_enriches_progress_with_task_deadline() {
    let op = memory_operator();
    seed(&op, &[SCENARIO_A_CAMPAIGN], &[SCENARIO_A_USER]).await;

    let report = run(&op, &RuntimeConfig::default()).await.expect("Run failed");

    assert_eq!(report.campaign_infos, 1);
    assert_eq!(report.user_campaigns, 1);
    assert_eq!(report.join.matched, 1);
    assert_eq!(report.write.total_rows, 1);
    assert_eq!(report.write.partitions.len(), 1);

    let partition = &report.write.partitions[0];
    assert_eq!(partition.value, "2024-05-01");
    assert!(partition
        .path
        .starts_with("data/partitioned/createdat_date=2024-05-01/"));

    let batches = read_partition(&op, &partition.path).await;
    let batch = &batches[0];
    assert_eq!(batch.num_rows(), 1);
    assert_eq!(strings(batch, "userid").value(0), "u1");
    assert_eq!(strings(batch, "campaignid").value(0), "c1");
    assert_eq!(strings(batch, "taskID").value(0), "t1");
    assert_eq!(strings(batch, "taskDeadline").value(0), "2024-06-01");
    let reward = batch
        .column_by_name("rewardEarned")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(reward.value(0), 5.0);

    // createdAt is replaced by the partition directory
    assert!(batch.column_by_name("createdAt").is_none());
    assert!(batch.column_by_name("createdat").is_none());
    assert!(op.exists("data/partitioned/_SUCCESS").await.unwrap());
}

#[tokio::test]
async fn scenario_b_unmatched_progress_keeps_row_with_null_deadline() {
    let op = memory_operator();
    seed(
        &op,
        &[r#"{"campaignID":"c1","tasks":[]}"#],
        &[SCENARIO_A_USER],
    )
    .await;

    let report = run(&op, &RuntimeConfig::default()).await.unwrap();

    assert_eq!(report.campaign_task_rows, 0);
    assert_eq!(report.join.unmatched, 1);
    assert_eq!(report.write.total_rows, 1);

    let batches = read_partition(&op, &report.write.partitions[0].path).await;
    assert_eq!(strings(&batches[0], "userid").value(0), "u1");
    assert!(strings(&batches[0], "taskDeadline").is_null(0));
}

#[tokio::test]
async fn scenario_c_empty_progress_yields_no_rows() {
    let op = memory_operator();
    seed(
        &op,
        &[SCENARIO_A_CAMPAIGN],
        &[r#"{"userID":"u1","campaignID":"c1","createdAt":"2024-05-01T00:00:00Z","progressDetails":[]}"#],
    )
    .await;

    let report = run(&op, &RuntimeConfig::default()).await.unwrap();

    assert_eq!(report.progress_rows, 0);
    assert_eq!(report.write.total_rows, 0);
    assert!(report.write.partitions.is_empty());
    assert_eq!(
        committed_files(&op).await,
        vec!["data/partitioned/_SUCCESS".to_string()]
    );
}

#[tokio::test]
async fn outer_flatten_keeps_parent_with_empty_progress() {
    let op = memory_operator();
    seed(
        &op,
        &[SCENARIO_A_CAMPAIGN],
        &[r#"{"userID":"u1","campaignID":"c1","createdAt":"2024-05-01T00:00:00Z","progressDetails":[]}"#],
    )
    .await;

    let mut config = RuntimeConfig::default();
    config.transform.flatten_mode = FlattenMode::Outer;
    let report = run(&op, &config).await.unwrap();

    assert_eq!(report.progress_rows, 1);
    assert_eq!(report.join.unmatched, 1);

    let batches = read_partition(&op, &report.write.partitions[0].path).await;
    assert!(strings(&batches[0], "taskID").is_null(0));
    assert!(strings(&batches[0], "taskDeadline").is_null(0));
}

#[tokio::test]
async fn duplicate_task_keys_fan_out() {
    let op = memory_operator();
    seed(
        &op,
        &[
            SCENARIO_A_CAMPAIGN,
            r#"{"campaignID":"c1","tasks":[{"taskID":"t1","taskDeadline":"2024-07-01"}]}"#,
        ],
        &[SCENARIO_A_USER],
    )
    .await;

    let report = run(&op, &RuntimeConfig::default()).await.unwrap();

    assert_eq!(report.join.widened, 1);
    assert_eq!(report.write.total_rows, 2);

    let batches = read_partition(&op, &report.write.partitions[0].path).await;
    let deadlines = strings(&batches[0], "taskDeadline");
    let mut values: Vec<_> = (0..deadlines.len()).map(|i| deadlines.value(i)).collect();
    values.sort();
    assert_eq!(values, vec!["2024-06-01", "2024-07-01"]);
}

#[tokio::test]
async fn rows_are_partitioned_by_creation_date() {
    let op = memory_operator();
    seed(
        &op,
        &[SCENARIO_A_CAMPAIGN],
        &[
            SCENARIO_A_USER,
            r#"{"userid":"u2","campaignid":"c1","createdat":"2024-05-02T08:30:00Z","progressdetails":[{"taskID":"t1"},{"taskID":"t9"}]}"#,
        ],
    )
    .await;

    let report = run(&op, &RuntimeConfig::default()).await.unwrap();

    let values: Vec<_> = report
        .write
        .partitions
        .iter()
        .map(|p| (p.value.as_str(), p.rows))
        .collect();
    assert_eq!(values, vec![("2024-05-01", 1), ("2024-05-02", 2)]);
    assert_eq!(report.join.matched, 2);
    assert_eq!(report.join.unmatched, 1);
}

#[tokio::test]
async fn reruns_are_idempotent() {
    let op = memory_operator();
    seed(&op, &[SCENARIO_A_CAMPAIGN], &[SCENARIO_A_USER]).await;
    let config = RuntimeConfig::default();

    let first = run(&op, &config).await.unwrap();
    let files_after_first = committed_files(&op).await;
    let second = run(&op, &config).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.write, second.write);
    assert_eq!(committed_files(&op).await, files_after_first);
}

#[tokio::test]
async fn malformed_date_fails_run_and_keeps_previous_output() {
    let op = memory_operator();
    seed(&op, &[SCENARIO_A_CAMPAIGN], &[SCENARIO_A_USER]).await;
    let config = RuntimeConfig::default();
    let committed = run(&op, &config).await.unwrap();

    seed(
        &op,
        &[SCENARIO_A_CAMPAIGN],
        &[r#"{"userID":"u1","campaignID":"c1","createdAt":"short","progressDetails":[{"taskID":"t1"}]}"#],
    )
    .await;
    let failure = run(&op, &config).await.unwrap_err();

    assert_eq!(failure.stage, Stage::ProjectPartitionKey);
    assert_eq!(failure.source.kind(), ErrorKind::MalformedDate);
    assert_eq!(failure.exit_code(), 3);
    assert!(op.exists(&committed.write.partitions[0].path).await.unwrap());
    assert!(!op.exists("data/_campaign2parquet.lock").await.unwrap());
}

#[tokio::test]
async fn skip_policy_drops_malformed_rows() {
    let op = memory_operator();
    seed(
        &op,
        &[SCENARIO_A_CAMPAIGN],
        &[
            SCENARIO_A_USER,
            r#"{"userID":"u2","campaignID":"c1","createdAt":"2024-5-1","progressDetails":[{"taskID":"t1"}]}"#,
        ],
    )
    .await;

    let mut config = RuntimeConfig::default();
    config.transform.malformed_rows = MalformedRowPolicy::Skip;
    let report = run(&op, &config).await.unwrap();

    assert_eq!(report.skipped_malformed, 1);
    assert_eq!(report.write.total_rows, 1);
}

#[tokio::test]
async fn join_key_type_mismatch_is_reported_at_read() {
    let op = memory_operator();
    seed(
        &op,
        &[r#"{"campaignID":42,"tasks":[]}"#],
        &[SCENARIO_A_USER],
    )
    .await;

    let failure = run(&op, &RuntimeConfig::default()).await.unwrap_err();

    assert_eq!(failure.stage, Stage::ReadInputs);
    assert_eq!(failure.source.code(), "E003");
    assert_eq!(failure.exit_code(), 4);
}

#[tokio::test]
async fn missing_required_field_is_schema_mismatch() {
    let op = memory_operator();
    seed(
        &op,
        &[SCENARIO_A_CAMPAIGN],
        &[r#"{"campaignID":"c1","createdAt":"2024-05-01T00:00:00Z","progressDetails":[]}"#],
    )
    .await;

    let failure = run(&op, &RuntimeConfig::default()).await.unwrap_err();

    assert_eq!(failure.source.kind(), ErrorKind::SchemaMismatch);
    assert_eq!(failure.exit_code(), 2);
}

#[tokio::test]
async fn held_lock_fails_with_concurrent_run() {
    let op = memory_operator();
    seed(&op, &[SCENARIO_A_CAMPAIGN], &[SCENARIO_A_USER]).await;
    op.write("data/_campaign2parquet.lock", b"scheduled-run".to_vec())
        .await
        .unwrap();

    let failure = run(&op, &RuntimeConfig::default()).await.unwrap_err();

    assert_eq!(failure.stage, Stage::WritePartitions);
    assert_eq!(failure.source.kind(), ErrorKind::ConcurrentRun);
    assert_eq!(failure.exit_code(), 7);
}

#[tokio::test]
async fn custom_run_id_and_output_path() {
    let op = memory_operator();
    seed(&op, &[SCENARIO_A_CAMPAIGN], &[SCENARIO_A_USER]).await;

    let mut config = RuntimeConfig::default();
    config.output.base_path = "exports/progress".to_string();
    let job = pipeline(&op, &config).with_run_id("nightly-2024-05-02");
    assert_eq!(job.run_id(), "nightly-2024-05-02");

    let report = job.run().await.unwrap();
    assert_eq!(report.run_id, job.run_id());
    assert!(report.write.partitions[0]
        .path
        .starts_with("exports/progress/partitioned/createdat_date=2024-05-01/"));
}
