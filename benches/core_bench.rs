//! Benchmarks for eksforge core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eksforge::core::annotate::{annotate, OnConflict};
use eksforge::core::logical_id::logical_id;
use eksforge::core::parser::parse_config;
use eksforge::core::synth::synthesize;
use eksforge::core::tree::{Condition, Node, Primitive};
use eksforge::policy::{DeployContext, Identity, PolicyKind};
use eksforge::stack::{baseline, cluster, manifest::Manifests};

const CONFIG: &str = r#"
version: "1.0"
name: bench
env:
  account: "123456789012"
  region: us-east-1
cluster:
  name: bench-cluster
  vpc_id: vpc-0abc
  oidc_issuer: oidc.eks.us-east-1.amazonaws.com/id/BENCH
  kubectl_service_token: arn:aws:lambda:us-east-1:123456789012:function:kubectl
  kubectl_role_arn: arn:aws:iam::123456789012:role/kubectl-provider
nodegroup:
  subnet_ids: [subnet-a, subnet-b]
"#;

/// `width` composites of `width` leaves each.
fn wide_tree(width: usize) -> Node {
    let groups = (0..width)
        .map(|g| {
            let leaves = (0..width)
                .map(|l| {
                    Node::leaf(
                        format!("Leaf{l}"),
                        Primitive::new("AWS::SNS::Topic", serde_json::json!({})),
                    )
                })
                .collect();
            Node::composite(format!("Group{g}"), leaves)
        })
        .collect();
    Node::composite("Root", groups)
}

fn bench_annotate(c: &mut Criterion) {
    let condition = Condition::equals("BenchCondition", "bench", "true");
    let mut group = c.benchmark_group("annotate");
    for width in [4, 16, 64] {
        let tree = wide_tree(width);
        group.bench_with_input(BenchmarkId::from_parameter(width * width), &tree, |b, tree| {
            b.iter(|| {
                let out = annotate(black_box(tree.clone()), &condition, OnConflict::Fail, "");
                black_box(out)
            });
        });
    }
    group.finish();
}

fn bench_logical_id(c: &mut Criterion) {
    c.bench_function("logical_id", |b| {
        b.iter(|| logical_id(black_box("EbsCsiDriver/ServiceAccount/ManifestResource")));
    });
}

fn bench_policies(c: &mut Criterion) {
    let ctx = DeployContext::aws("us-east-1", "123456789012");
    let identity = Identity::new("Addon/ServiceAccount/Role");
    let mut group = c.benchmark_group("policy");
    for kind in PolicyKind::ALL {
        group.bench_function(kind.to_string(), |b| {
            b.iter(|| black_box(kind.build(&ctx, black_box("bench-cluster"), &identity)));
        });
    }
    group.finish();
}

fn bench_synth_baseline(c: &mut Criterion) {
    let config = parse_config(CONFIG).unwrap();
    let ctx = DeployContext::aws("us-east-1", "123456789012");
    let manifests = Manifests::default();
    let stack = baseline::build(&config, ctx.clone(), &manifests).unwrap();

    c.bench_function("baseline_build", |b| {
        b.iter(|| black_box(baseline::build(&config, ctx.clone(), &manifests).unwrap()));
    });
    c.bench_function("baseline_synth", |b| {
        b.iter(|| black_box(synthesize(black_box(&stack)).unwrap()));
    });
}

fn bench_synth_cluster(c: &mut Criterion) {
    let config = parse_config(CONFIG).unwrap();
    let ctx = DeployContext::aws("us-east-1", "123456789012");
    let stack = cluster::build(&config, ctx).unwrap();

    c.bench_function("cluster_synth", |b| {
        b.iter(|| black_box(synthesize(black_box(&stack)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_annotate,
    bench_logical_id,
    bench_policies,
    bench_synth_baseline,
    bench_synth_cluster
);
criterion_main!(benches);
