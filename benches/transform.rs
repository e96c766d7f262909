// Transform benchmark - measure flatten → join → project → encode
//
// Runs the pure transformation path on synthetic campaigns without storage,
// isolating CPU cost from I/O.

use campaign2parquet_core::parquet::{encode_with_hash, writer_properties};
use campaign2parquet_core::{
    enrich_progress, flatten_all, records_to_batch, CampaignInfo, CampaignTask, FlattenMode,
    MalformedRowPolicy, PartitionKeyProjector, ProgressDetail, UserCampaign,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

#[derive(Debug, Clone, Copy)]
enum WorkloadSize {
    Small,
    Medium,
}

impl WorkloadSize {
    fn users(&self) -> usize {
        match self {
            WorkloadSize::Small => 1_000,
            WorkloadSize::Medium => 20_000,
        }
    }
}

const CAMPAIGNS: usize = 50;
const TASKS_PER_CAMPAIGN: usize = 8;

fn campaign_infos() -> Vec<CampaignInfo> {
    (0..CAMPAIGNS)
        .map(|c| CampaignInfo {
            campaign_id: format!("campaign-{c}"),
            title: Some(format!("Campaign {c}")),
            reward_claim_deadline: Some("2024-12-31T00:00:00Z".to_string()),
            ends_at_timestamp: None,
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            updated_at: None,
            tasks: (0..TASKS_PER_CAMPAIGN)
                .map(|t| CampaignTask {
                    task_id: format!("task-{t}"),
                    reward_amount: Some(10.0),
                    task_deadline: Some(format!("2024-06-{:02}", t + 1)),
                })
                .collect(),
        })
        .collect()
}

fn user_campaigns(size: WorkloadSize) -> Vec<UserCampaign> {
    (0..size.users())
        .map(|u| UserCampaign {
            user_id: format!("user-{u}"),
            campaign_id: format!("campaign-{}", u % CAMPAIGNS),
            created_at: format!("2024-05-{:02}T12:00:00Z", u % 28 + 1),
            total_task_rewards_earned: Some(15.0),
            updated_at: None,
            user_campaign_progress_state: Some("IN_PROGRESS".to_string()),
            progress_details: (0..u % TASKS_PER_CAMPAIGN + 1)
                .map(|t| ProgressDetail {
                    task_id: format!("task-{t}"),
                    user_campaign_task_progress_state: Some("COMPLETED".to_string()),
                    reward_earned: Some(5.0),
                    validated_at: None,
                    validation_failure_reason: None,
                })
                .collect(),
        })
        .collect()
}

/// Benchmark flatten + join + partition-key projection
fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    let infos = campaign_infos();

    for size in [WorkloadSize::Small, WorkloadSize::Medium] {
        let users = user_campaigns(size);
        let rows: usize = users.iter().map(|u| u.progress_details.len()).sum();
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", size)),
            &users,
            |b, users| {
                b.iter(|| {
                    let tasks = flatten_all(&infos, FlattenMode::Inner);
                    let progress = flatten_all(users, FlattenMode::Inner);
                    let (enriched, stats) = enrich_progress(progress, tasks);
                    let projected = PartitionKeyProjector::new(MalformedRowPolicy::Fail)
                        .project_all(enriched)
                        .unwrap();
                    black_box((projected, stats));
                });
            },
        );
    }

    group.finish();
}

/// Benchmark Arrow conversion and Parquet encoding of one partition
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_partition");
    let infos = campaign_infos();
    let users = user_campaigns(WorkloadSize::Medium);
    let (enriched, _) = enrich_progress(
        flatten_all(&users, FlattenMode::Inner),
        flatten_all(&infos, FlattenMode::Inner),
    );
    let records = PartitionKeyProjector::default()
        .project_all(enriched)
        .unwrap()
        .records;
    let props = writer_properties(0);

    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("records_to_parquet", |b| {
        b.iter(|| {
            let batch = records_to_batch(&records).unwrap();
            black_box(encode_with_hash(&batch, &props).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_transform, bench_encode);
criterion_main!(benches);
